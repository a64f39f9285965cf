//! The generic schema-bound element node
//!
//! An [`Element`] is an ordered collection of typed attributes, an ordered
//! collection of child elements, and an optional typed text value, bound to
//! the metadata it was created against. All protocol classes are views over
//! this one structure; they declare keys and metadata once and read/write
//! through the generic accessors here.
//!
//! Setters return `&mut Self` so construction chains:
//!
//! ```ignore
//! let mut link = Element::create(&registry, &LINK)?;
//! link.set_attribute_value(&REL, "self")
//!     .set_attribute_value(&HREF, "http://example.com/feed");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::key::{AttributeKey, ElementKey};
use crate::model::metadata::{Cardinality, ElementMetadata};
use crate::model::qname::QName;
use crate::model::registry::MetadataRegistry;
use crate::model::value::Value;
use crate::validator;
use crate::validator::ValidationContext;

/// One attribute instance: its key plus the typed value.
#[derive(Debug, Clone)]
pub struct Attribute {
    key: AttributeKey,
    value: Value,
}

impl Attribute {
    /// The attribute key.
    pub fn key(&self) -> &AttributeKey {
        &self.key
    }

    /// The typed value.
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// A generic, schema-bound node in the in-memory document tree.
#[derive(Debug, Clone)]
pub struct Element {
    metadata: Arc<ElementMetadata>,
    attributes: Vec<Attribute>,
    children: Vec<Element>,
    text: Option<Value>,
}

impl Element {
    /// Create an empty element bound to the given metadata.
    pub fn new(metadata: Arc<ElementMetadata>) -> Self {
        Element {
            metadata,
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Create an empty element for a registered key.
    pub fn create(registry: &MetadataRegistry, key: &ElementKey) -> Result<Self> {
        Ok(Element::new(registry.bind(key)?))
    }

    /// Create a generic undeclared element, used for arbitrary XML
    /// extension content. String text, permissive metadata.
    pub fn undeclared(id: QName) -> Self {
        Element::new(ElementMetadata::undeclared(id))
    }

    /// The metadata this element is bound to.
    pub fn metadata(&self) -> &Arc<ElementMetadata> {
        &self.metadata
    }

    /// The key of this element.
    pub fn key(&self) -> &ElementKey {
        self.metadata.key()
    }

    /// The qualified name of this element.
    pub fn id(&self) -> &QName {
        self.metadata.key().id()
    }

    // ---- attributes ----

    /// All attributes in the order they were added.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Returns true if an attribute with the key's qualified name is
    /// present.
    pub fn has_attribute(&self, key: &AttributeKey) -> bool {
        self.has_attribute_id(key.id())
    }

    /// Returns true if an attribute with the qualified name is present.
    pub fn has_attribute_id(&self, id: &QName) -> bool {
        self.attributes.iter().any(|a| a.key.id() == id)
    }

    /// The value of the attribute with the key's qualified name.
    pub fn attribute_value(&self, key: &AttributeKey) -> Option<&Value> {
        self.attribute_value_by_id(key.id())
    }

    /// The value of the attribute with the qualified name.
    pub fn attribute_value_by_id(&self, id: &QName) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|a| a.key.id() == id)
            .map(|a| &a.value)
    }

    /// Set an attribute value, replacing any existing value for the same
    /// qualified name.
    pub fn set_attribute_value(&mut self, key: &AttributeKey, value: impl Into<Value>) -> &mut Self {
        let attribute = Attribute {
            key: key.clone(),
            value: value.into(),
        };
        if let Some(existing) = self
            .attributes
            .iter_mut()
            .find(|a| a.key.id() == key.id())
        {
            *existing = attribute;
        } else {
            self.attributes.push(attribute);
        }
        self
    }

    /// Remove an attribute, returning its value if it was present.
    pub fn remove_attribute(&mut self, key: &AttributeKey) -> Option<Value> {
        let pos = self
            .attributes
            .iter()
            .position(|a| a.key.id() == key.id())?;
        Some(self.attributes.remove(pos).value)
    }

    // ---- child elements ----

    /// All child elements in stored order.
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Number of child elements.
    pub fn element_count(&self) -> usize {
        self.children.len()
    }

    /// Returns true if a child with the key's qualified name is present.
    pub fn has_element(&self, key: &ElementKey) -> bool {
        self.children.iter().any(|c| c.id() == key.id())
    }

    /// Add a child element, honoring the cardinality its metadata
    /// declares:
    ///
    /// - `Single`: replaces an existing child with the same name in place;
    /// - `Multiple`: appends, preserving insertion order;
    /// - `Set`: no-op when a structurally equal child with the same name
    ///   is already present.
    pub fn add_element(&mut self, child: Element) -> &mut Self {
        match child.metadata.cardinality() {
            Cardinality::Single => {
                if let Some(pos) = self.children.iter().position(|c| c.id() == child.id()) {
                    self.children[pos] = child;
                } else {
                    self.children.push(child);
                }
            }
            Cardinality::Multiple => self.children.push(child),
            Cardinality::Set => {
                let duplicate = self
                    .children
                    .iter()
                    .any(|c| c.id() == child.id() && *c == child);
                if !duplicate {
                    self.children.push(child);
                }
            }
        }
        self
    }

    /// The first child matching the key's qualified name. Intended for
    /// single-cardinality slots.
    pub fn element(&self, key: &ElementKey) -> Option<&Element> {
        self.children.iter().find(|c| c.id() == key.id())
    }

    /// Mutable access to the first child matching the key's qualified
    /// name.
    pub fn element_mut(&mut self, key: &ElementKey) -> Option<&mut Element> {
        self.children.iter_mut().find(|c| c.id() == key.id())
    }

    /// All children matching the key's qualified name, in stored order.
    pub fn elements(&self, key: &ElementKey) -> Vec<&Element> {
        self.children.iter().filter(|c| c.id() == key.id()).collect()
    }

    /// All children matching a set-cardinality key. Deduplication happened
    /// at attach time, so this is the same view as [`Element::elements`].
    pub fn element_set(&self, key: &ElementKey) -> Vec<&Element> {
        self.elements(key)
    }

    /// Remove every child matching the key's qualified name, returning how
    /// many were removed.
    pub fn remove_element(&mut self, key: &ElementKey) -> usize {
        let before = self.children.len();
        self.children.retain(|c| c.id() != key.id());
        before - self.children.len()
    }

    /// Convenience: the text value of the first child matching the key.
    pub fn element_value(&self, key: &ElementKey) -> Option<&Value> {
        self.element(key).and_then(|c| c.text_value())
    }

    // ---- text content ----

    /// The text value, if any.
    pub fn text_value(&self) -> Option<&Value> {
        self.text.as_ref()
    }

    /// Set the text value.
    pub fn set_text_value(&mut self, value: impl Into<Value>) -> &mut Self {
        self.text = Some(value.into());
        self
    }

    /// Remove the text value.
    pub fn clear_text_value(&mut self) -> Option<Value> {
        self.text.take()
    }

    // ---- narrowing and resolution ----

    /// Swap this element to a more specific registered variant once its
    /// discriminator is known.
    ///
    /// The content-shape [`Narrower`](crate::Narrower) hook is consulted
    /// first; otherwise the declared discriminator attribute's value is
    /// looked up in the adaptation table. Re-binding happens in place:
    /// attributes, children, and text are untouched, so every reference to
    /// this element observes the same data before and after. Elements with
    /// no matching variant stay at their current type.
    pub fn narrow(&mut self, registry: &MetadataRegistry, ctx: &mut ValidationContext) {
        let variant = if let Some(narrower) = self.metadata.narrower() {
            narrower.narrow(self)
        } else if let Some(disc) = self.metadata.discriminator() {
            self.attribute_value_by_id(disc)
                .map(|v| v.to_text())
                .and_then(|text| self.metadata.adaptation(&text).cloned())
        } else {
            None
        };

        if let Some(variant) = variant {
            match registry.bind(&variant) {
                Ok(bound) => self.metadata = bound,
                Err(_) => ctx.add_error(format!(
                    "unable to adapt '{}' to unregistered variant '{}'",
                    self.id(),
                    variant.element_type()
                )),
            }
        }
    }

    /// Resolve and validate this subtree, aggregating every problem into a
    /// single report.
    ///
    /// Returns `Ok(())` for a valid tree and `[E3001]` with the full
    /// report otherwise.
    pub fn resolve(&mut self, registry: &MetadataRegistry) -> Result<()> {
        let mut ctx = ValidationContext::new();
        ctx.push_path(self.id().to_string());
        self.resolve_with(registry, &mut ctx);
        ctx.pop_path();
        if ctx.is_valid() {
            Ok(())
        } else {
            Err(Error::Validation(ctx.into_report()))
        }
    }

    /// Resolution pass against an existing context: narrow, run the
    /// resolver hook, validate against metadata and the validator hook,
    /// then recurse into children post-narrowing. The caller owns the
    /// context's path for this element.
    pub fn resolve_with(&mut self, registry: &MetadataRegistry, ctx: &mut ValidationContext) {
        self.narrow(registry, ctx);

        if let Some(resolver) = self.metadata.resolver().cloned() {
            resolver.resolve(self, ctx);
        }

        let metadata = Arc::clone(&self.metadata);
        validator::check_metadata(self, &metadata, registry, ctx);
        if let Some(element_validator) = metadata.validator() {
            element_validator.validate(self, ctx);
        }

        // Occurrence counts so repeated siblings get indexed path segments.
        let mut totals: HashMap<String, usize> = HashMap::new();
        for child in &self.children {
            *totals.entry(child.id().to_string()).or_default() += 1;
        }
        let mut seen: HashMap<String, usize> = HashMap::new();
        for child in &mut self.children {
            let name = child.id().to_string();
            let index = seen.entry(name.clone()).or_default();
            let segment = if totals[&name] > 1 {
                format!("{}[{}]", name, index)
            } else {
                name.clone()
            };
            *index += 1;
            ctx.push_path(segment);
            child.resolve_with(registry, ctx);
            ctx.pop_path();
        }
    }
}

/// Structural equality: same qualified name, same attributes (order
/// insensitive), same children in order, same text. The bound metadata's
/// element type does not participate, so a narrowed element still equals
/// the generically-typed tree it was parsed from.
impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        if self.id() != other.id()
            || self.text != other.text
            || self.attributes.len() != other.attributes.len()
            || self.children.len() != other.children.len()
        {
            return false;
        }
        for attr in &self.attributes {
            match other.attribute_value_by_id(attr.key.id()) {
                Some(value) if *value == attr.value => {}
                _ => return false,
            }
        }
        self.children == other.children
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::metadata::Cardinality;
    use crate::model::value::ValueType;

    fn registry() -> MetadataRegistry {
        let mut registry = MetadataRegistry::new();
        registry
            .build(&entry_key())
            .add_element(title_key())
            .add_element(link_key())
            .add_element(category_key());
        registry.build(&title_key());
        registry
            .build(&link_key())
            .set_cardinality(Cardinality::Multiple)
            .add_attribute(AttributeKey::of(QName::unqualified("rel")))
            .add_attribute(AttributeKey::of(QName::unqualified("href")));
        registry
            .build(&category_key())
            .set_cardinality(Cardinality::Set)
            .add_attribute(AttributeKey::of(QName::unqualified("term")));
        registry
    }

    fn entry_key() -> ElementKey {
        ElementKey::of(QName::unqualified("entry"), "entry")
    }

    fn title_key() -> ElementKey {
        ElementKey::of_typed(QName::unqualified("title"), ValueType::String, "title")
    }

    fn link_key() -> ElementKey {
        ElementKey::of(QName::unqualified("link"), "link")
    }

    fn category_key() -> ElementKey {
        ElementKey::of(QName::unqualified("category"), "category")
    }

    #[test]
    fn test_single_cardinality_replaces() {
        let registry = registry();
        let mut entry = Element::create(&registry, &entry_key()).unwrap();

        let mut first = Element::create(&registry, &title_key()).unwrap();
        first.set_text_value("one");
        let mut second = Element::create(&registry, &title_key()).unwrap();
        second.set_text_value("two");

        entry.add_element(first).add_element(second);
        assert_eq!(entry.element_count(), 1);
        assert_eq!(
            entry.element_value(&title_key()).unwrap().as_str(),
            Some("two")
        );
    }

    #[test]
    fn test_multiple_cardinality_preserves_order() {
        let registry = registry();
        let mut entry = Element::create(&registry, &entry_key()).unwrap();
        let rel = AttributeKey::of(QName::unqualified("rel"));

        for value in ["self", "alternate"] {
            let mut link = Element::create(&registry, &link_key()).unwrap();
            link.set_attribute_value(&rel, value);
            entry.add_element(link);
        }

        let links = entry.elements(&link_key());
        assert_eq!(links.len(), 2);
        assert_eq!(
            links[0].attribute_value(&rel).unwrap().as_str(),
            Some("self")
        );
        assert_eq!(
            links[1].attribute_value(&rel).unwrap().as_str(),
            Some("alternate")
        );
    }

    #[test]
    fn test_set_cardinality_dedups_structural_equals() {
        let registry = registry();
        let mut entry = Element::create(&registry, &entry_key()).unwrap();
        let term = AttributeKey::of(QName::unqualified("term"));

        for value in ["a", "a", "b"] {
            let mut category = Element::create(&registry, &category_key()).unwrap();
            category.set_attribute_value(&term, value);
            entry.add_element(category);
        }

        assert_eq!(entry.element_set(&category_key()).len(), 2);
    }

    #[test]
    fn test_attribute_replacement_and_removal() {
        let registry = registry();
        let mut link = Element::create(&registry, &link_key()).unwrap();
        let rel = AttributeKey::of(QName::unqualified("rel"));

        link.set_attribute_value(&rel, "self");
        link.set_attribute_value(&rel, "alternate");
        assert_eq!(link.attributes().len(), 1);
        assert_eq!(
            link.attribute_value(&rel).unwrap().as_str(),
            Some("alternate")
        );

        assert!(link.remove_attribute(&rel).is_some());
        assert!(!link.has_attribute(&rel));
        assert!(link.remove_attribute(&rel).is_none());
    }

    #[test]
    fn test_structural_equality_ignores_attribute_order() {
        let registry = registry();
        let rel = AttributeKey::of(QName::unqualified("rel"));
        let href = AttributeKey::of(QName::unqualified("href"));

        let mut a = Element::create(&registry, &link_key()).unwrap();
        a.set_attribute_value(&rel, "self")
            .set_attribute_value(&href, "http://x/1");
        let mut b = Element::create(&registry, &link_key()).unwrap();
        b.set_attribute_value(&href, "http://x/1")
            .set_attribute_value(&rel, "self");

        assert_eq!(a, b);
        b.set_attribute_value(&rel, "alternate");
        assert_ne!(a, b);
    }

    #[test]
    fn test_undeclared_element_accepts_anything() {
        let mut vendor = Element::undeclared(QName::unqualified("x-vendor"));
        assert!(vendor.metadata().arbitrary_xml());
        vendor.set_text_value("payload");
        assert_eq!(vendor.text_value().unwrap().as_str(), Some("payload"));
    }
}
