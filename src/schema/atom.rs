//! Atom syndication format declarations
//!
//! Keys and metadata for the Atom vocabulary (RFC 4287 subset): feeds,
//! entries, the person construct, links, categories, and content with its
//! inline/out-of-line split. `atom:content` demonstrates hook-based
//! narrowing: the variant is chosen by the shape of the element (presence
//! of `src`) rather than a discriminator attribute value.

use std::sync::LazyLock;

use crate::model::element::Element;
use crate::model::key::{AttributeKey, ElementKey};
use crate::model::metadata::Cardinality;
use crate::model::qname::{Namespace, QName};
use crate::model::registry::MetadataRegistry;
use crate::model::value::{Value, ValueType};
use crate::validator::ValidationContext;
use chrono::{DateTime, FixedOffset};

/// The Atom namespace URI.
pub const NS_URI: &str = "http://www.w3.org/2005/Atom";

/// The Atom namespace with its customary alias.
pub fn ns() -> Namespace {
    Namespace::with_alias("atom", NS_URI)
}

fn qname(local: &'static str) -> QName {
    QName::qualified(ns(), local)
}

/// `atom:feed`, the document root for feeds.
pub static FEED: LazyLock<ElementKey> = LazyLock::new(|| ElementKey::of(qname("feed"), "feed"));

/// `atom:entry`, either a feed child or a standalone document root.
pub static ENTRY: LazyLock<ElementKey> = LazyLock::new(|| ElementKey::of(qname("entry"), "entry"));

/// `atom:id`, a permanent IRI for the containing feed or entry.
pub static ID: LazyLock<ElementKey> =
    LazyLock::new(|| ElementKey::of_typed(qname("id"), ValueType::Uri, "id"));

/// `atom:title`.
pub static TITLE: LazyLock<ElementKey> =
    LazyLock::new(|| ElementKey::of_typed(qname("title"), ValueType::String, "title"));

/// `atom:updated`, an RFC 3339 instant.
pub static UPDATED: LazyLock<ElementKey> =
    LazyLock::new(|| ElementKey::of_typed(qname("updated"), ValueType::DateTime, "updated"));

/// `atom:author`, a person construct.
pub static AUTHOR: LazyLock<ElementKey> =
    LazyLock::new(|| ElementKey::of(qname("author"), "person"));

/// `atom:name` inside a person construct.
pub static NAME: LazyLock<ElementKey> =
    LazyLock::new(|| ElementKey::of_typed(qname("name"), ValueType::String, "name"));

/// `atom:email` inside a person construct.
pub static EMAIL: LazyLock<ElementKey> =
    LazyLock::new(|| ElementKey::of_typed(qname("email"), ValueType::String, "email"));

/// `atom:link`.
pub static LINK: LazyLock<ElementKey> = LazyLock::new(|| ElementKey::of(qname("link"), "link"));

/// `atom:category`.
pub static CATEGORY: LazyLock<ElementKey> =
    LazyLock::new(|| ElementKey::of(qname("category"), "category"));

/// `atom:content` before narrowing.
pub static CONTENT: LazyLock<ElementKey> =
    LazyLock::new(|| ElementKey::of_typed(qname("content"), ValueType::String, "content"));

/// `atom:content` carrying inline text.
pub static TEXT_CONTENT: LazyLock<ElementKey> = LazyLock::new(|| CONTENT.variant("textContent"));

/// `atom:content` referencing a remote body via `src`.
pub static OUT_OF_LINE_CONTENT: LazyLock<ElementKey> =
    LazyLock::new(|| CONTENT.variant("outOfLineContent"));

/// `rel` on `atom:link`.
pub static REL: LazyLock<AttributeKey> =
    LazyLock::new(|| AttributeKey::of(QName::unqualified("rel")));

/// `type` on `atom:link` and `atom:content`.
pub static TYPE: LazyLock<AttributeKey> =
    LazyLock::new(|| AttributeKey::of(QName::unqualified("type")));

/// `href` on `atom:link`.
pub static HREF: LazyLock<AttributeKey> =
    LazyLock::new(|| AttributeKey::of_typed(QName::unqualified("href"), ValueType::Uri));

/// `scheme` on `atom:category`.
pub static SCHEME: LazyLock<AttributeKey> =
    LazyLock::new(|| AttributeKey::of_typed(QName::unqualified("scheme"), ValueType::Uri));

/// `term` on `atom:category`.
pub static TERM: LazyLock<AttributeKey> =
    LazyLock::new(|| AttributeKey::of(QName::unqualified("term")));

/// `label` on `atom:category`.
pub static LABEL: LazyLock<AttributeKey> =
    LazyLock::new(|| AttributeKey::of(QName::unqualified("label")));

/// `src` on out-of-line `atom:content`.
pub static SRC: LazyLock<AttributeKey> =
    LazyLock::new(|| AttributeKey::of_typed(QName::unqualified("src"), ValueType::Uri));

/// Declare the Atom vocabulary into a registry. Idempotent.
pub fn register_metadata(registry: &mut MetadataRegistry) {
    if registry.is_registered(&FEED) {
        return;
    }

    registry
        .build(&FEED)
        .add_element(ID.clone())
        .add_element(TITLE.clone())
        .add_element(UPDATED.clone())
        .add_element(AUTHOR.clone())
        .add_element(LINK.clone())
        .add_element(CATEGORY.clone())
        .add_element(ENTRY.clone());

    registry
        .build(&ENTRY)
        .set_cardinality(Cardinality::Multiple)
        .add_element(ID.clone())
        .add_element(TITLE.clone())
        .add_element(UPDATED.clone())
        .add_element(AUTHOR.clone())
        .add_element(LINK.clone())
        .add_element(CATEGORY.clone())
        .add_element(CONTENT.clone());

    registry
        .build(&ID)
        .set_required(true)
        .set_content_required(true);

    registry
        .build(&TITLE)
        .set_required(true)
        .add_attribute(TYPE.clone());

    registry
        .build(&UPDATED)
        .set_required(true)
        .set_content_required(true);

    registry
        .build(&AUTHOR)
        .set_cardinality(Cardinality::Multiple)
        .add_element(NAME.clone())
        .add_element(EMAIL.clone());

    registry
        .build(&NAME)
        .set_required(true)
        .set_content_required(true);

    registry.build(&EMAIL);

    registry
        .build(&LINK)
        .set_cardinality(Cardinality::Multiple)
        .add_attribute(REL.clone())
        .add_attribute(TYPE.clone())
        .add_required_attribute(HREF.clone());

    registry
        .build(&CATEGORY)
        .set_cardinality(Cardinality::Set)
        .add_attribute(SCHEME.clone())
        .add_required_attribute(TERM.clone())
        .add_attribute(LABEL.clone());

    registry
        .build(&CONTENT)
        .add_attribute(TYPE.clone())
        .add_attribute(SRC.clone())
        .set_narrower(|element: &Element| {
            if element.has_attribute(&SRC) {
                Some(OUT_OF_LINE_CONTENT.clone())
            } else {
                Some(TEXT_CONTENT.clone())
            }
        });

    registry
        .build(&TEXT_CONTENT)
        .add_attribute(TYPE.clone())
        .set_resolver(|element: &mut Element, _ctx: &mut ValidationContext| {
            // Inline content with no character data means empty content.
            if element.text_value().is_none() {
                element.set_text_value("");
            }
        });

    registry
        .build(&OUT_OF_LINE_CONTENT)
        .add_attribute(TYPE.clone())
        .add_required_attribute(SRC.clone())
        .set_validator(|element: &Element, ctx: &mut ValidationContext| {
            if element.text_value().is_some() {
                ctx.add_error("content with a 'src' attribute must be empty");
            }
        });
}

/// Read-only view over an `atom:feed` element.
pub struct Feed<'a> {
    element: &'a Element,
}

impl<'a> Feed<'a> {
    /// Wrap an element. The element is expected to be a resolved feed.
    pub fn from_element(element: &'a Element) -> Self {
        Feed { element }
    }

    /// The underlying element.
    pub fn element(&self) -> &'a Element {
        self.element
    }

    /// The feed id text, if present.
    pub fn id(&self) -> Option<&'a str> {
        self.element.element_value(&ID).and_then(Value::as_str)
    }

    /// The feed title text, if present.
    pub fn title(&self) -> Option<&'a str> {
        self.element.element_value(&TITLE).and_then(Value::as_str)
    }

    /// The last-updated instant, if present and typed.
    pub fn updated(&self) -> Option<&'a DateTime<FixedOffset>> {
        self.element
            .element_value(&UPDATED)
            .and_then(Value::as_datetime)
    }

    /// The feed's entries in document order.
    pub fn entries(&self) -> Vec<Entry<'a>> {
        self.element
            .elements(&ENTRY)
            .into_iter()
            .map(Entry::from_element)
            .collect()
    }

    /// The feed's links in document order.
    pub fn links(&self) -> Vec<Link<'a>> {
        self.element
            .elements(&LINK)
            .into_iter()
            .map(Link::from_element)
            .collect()
    }
}

/// Read-only view over an `atom:entry` element.
pub struct Entry<'a> {
    element: &'a Element,
}

impl<'a> Entry<'a> {
    /// Wrap an element. The element is expected to be a resolved entry.
    pub fn from_element(element: &'a Element) -> Self {
        Entry { element }
    }

    /// The underlying element.
    pub fn element(&self) -> &'a Element {
        self.element
    }

    /// The entry id text, if present.
    pub fn id(&self) -> Option<&'a str> {
        self.element.element_value(&ID).and_then(Value::as_str)
    }

    /// The entry title text, if present.
    pub fn title(&self) -> Option<&'a str> {
        self.element.element_value(&TITLE).and_then(Value::as_str)
    }

    /// The last-updated instant, if present and typed.
    pub fn updated(&self) -> Option<&'a DateTime<FixedOffset>> {
        self.element
            .element_value(&UPDATED)
            .and_then(Value::as_datetime)
    }

    /// The entry's links in document order.
    pub fn links(&self) -> Vec<Link<'a>> {
        self.element
            .elements(&LINK)
            .into_iter()
            .map(Link::from_element)
            .collect()
    }

    /// The first link whose `rel` matches.
    pub fn link_by_rel(&self, rel: &str) -> Option<Link<'a>> {
        self.links()
            .into_iter()
            .find(|link| link.rel() == Some(rel))
    }

    /// The entry's content element, narrowed or not.
    pub fn content(&self) -> Option<&'a Element> {
        self.element
            .children()
            .iter()
            .find(|c| c.id() == CONTENT.id())
    }
}

/// Read-only view over an `atom:link` element.
pub struct Link<'a> {
    element: &'a Element,
}

impl<'a> Link<'a> {
    /// Wrap an element.
    pub fn from_element(element: &'a Element) -> Self {
        Link { element }
    }

    /// The link relation, if present.
    pub fn rel(&self) -> Option<&'a str> {
        self.element.attribute_value(&REL).and_then(Value::as_str)
    }

    /// The media type, if present.
    pub fn content_type(&self) -> Option<&'a str> {
        self.element.attribute_value(&TYPE).and_then(Value::as_str)
    }

    /// The link target.
    pub fn href(&self) -> Option<&'a str> {
        self.element
            .attribute_value(&HREF)
            .and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = MetadataRegistry::new();
        register_metadata(&mut registry);
        register_metadata(&mut registry);
        let meta = registry.bind(&LINK).unwrap();
        assert_eq!(meta.cardinality(), Cardinality::Multiple);
        assert_eq!(meta.attributes().len(), 3);
    }

    #[test]
    fn test_content_narrows_by_src_presence() {
        let mut registry = MetadataRegistry::new();
        register_metadata(&mut registry);
        let registry = registry.lock();

        let mut inline = Element::create(&registry, &CONTENT).unwrap();
        inline.set_text_value("hello");
        let mut ctx = ValidationContext::new();
        inline.narrow(&registry, &mut ctx);
        assert_eq!(inline.key().element_type(), TEXT_CONTENT.element_type());

        let mut remote = Element::create(&registry, &CONTENT).unwrap();
        remote.set_attribute_value(&SRC, "http://example.com/body");
        remote.narrow(&registry, &mut ctx);
        assert_eq!(
            remote.key().element_type(),
            OUT_OF_LINE_CONTENT.element_type()
        );
        assert!(ctx.is_valid());
    }

    #[test]
    fn test_out_of_line_content_rejects_inline_text() {
        let mut registry = MetadataRegistry::new();
        register_metadata(&mut registry);
        let registry = registry.lock();

        let mut content = Element::create(&registry, &CONTENT).unwrap();
        content.set_attribute_value(&SRC, "http://example.com/body");
        content.set_text_value("stray");
        let err = content.resolve(&registry).unwrap_err();
        assert!(err.to_string().contains("must be empty"));
    }
}
