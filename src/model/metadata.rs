//! Schema metadata bound to element and attribute keys
//!
//! Metadata captures the schema facts for one key: cardinality, required
//! and visibility flags, the declared attributes and child elements, and
//! the optional hooks (narrower, resolver, validator, custom generator)
//! that let schema types layer behavior on top of the generic engine.
//!
//! Declarations are made through [`ElementCreator`] builders obtained from
//! a registry; the engine only ever sees the immutable [`ElementMetadata`]
//! snapshots resolved from them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::model::element::Element;
use crate::model::key::{AttributeKey, ElementKey};
use crate::model::qname::QName;
use crate::validator::ValidationContext;

/// How many instances of a child key an element may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cardinality {
    /// At most one instance; adding a second replaces the first.
    #[default]
    Single,
    /// An ordered list preserving insertion order.
    Multiple,
    /// A set deduplicated by structural equality; adding a duplicate is a
    /// no-op.
    Set,
}

/// Bound metadata for one attribute declaration.
#[derive(Debug, Clone)]
pub struct AttributeMetadata {
    key: AttributeKey,
    required: bool,
    visible: bool,
}

impl AttributeMetadata {
    /// The attribute key this metadata describes.
    pub fn key(&self) -> &AttributeKey {
        &self.key
    }

    /// Whether the attribute must be present on a valid element.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether the attribute is serialized. Invisible attributes are
    /// parse-only: readable in memory, never emitted.
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Hook selecting an adaptation variant from an element's populated state.
///
/// Used when the discriminator is not a single attribute value but a shape
/// heuristic, such as content narrowing on the presence of a `src`
/// attribute. Return `None` to leave the element at its current type.
pub trait Narrower: Send + Sync {
    /// Inspect the element and return the variant key to adapt to, if any.
    fn narrow(&self, element: &Element) -> Option<ElementKey>;
}

impl<F> Narrower for F
where
    F: Fn(&Element) -> Option<ElementKey> + Send + Sync,
{
    fn narrow(&self, element: &Element) -> Option<ElementKey> {
        self(element)
    }
}

/// Post-parse normalization hook, run after a subtree is fully built and
/// narrowed but before validation.
pub trait Resolver: Send + Sync {
    /// Normalize the element in place, reporting problems to the context.
    fn resolve(&self, element: &mut Element, ctx: &mut ValidationContext);
}

impl<F> Resolver for F
where
    F: Fn(&mut Element, &mut ValidationContext) + Send + Sync,
{
    fn resolve(&self, element: &mut Element, ctx: &mut ValidationContext) {
        self(element, ctx)
    }
}

/// Semantic validation hook layered on top of the metadata-driven
/// required-field checks. Errors accumulate in the context instead of
/// aborting the walk.
pub trait ElementValidator: Send + Sync {
    /// Check the element and append any issues to the context.
    fn validate(&self, element: &Element, ctx: &mut ValidationContext);
}

impl<F> ElementValidator for F
where
    F: Fn(&Element, &mut ValidationContext) + Send + Sync,
{
    fn validate(&self, element: &Element, ctx: &mut ValidationContext) {
        self(element, ctx)
    }
}

/// Custom wire-representation hook for elements whose XML form is not a
/// straightforward reflection of their attribute/child model.
pub trait ElementGenerator: Send + Sync {
    /// Produce a raw XML fragment replacing the element's default
    /// emission, or `None` to fall back to the default. The fragment is
    /// written verbatim; the hook is responsible for escaping.
    fn generate(&self, element: &Element) -> Result<Option<String>>;
}

impl<F> ElementGenerator for F
where
    F: Fn(&Element) -> Result<Option<String>> + Send + Sync,
{
    fn generate(&self, element: &Element) -> Result<Option<String>> {
        self(element)
    }
}

/// Immutable, bound schema description for one element key.
///
/// Obtained from [`MetadataRegistry::bind`](crate::MetadataRegistry::bind)
/// and shared behind `Arc`; every parsed element holds a reference to the
/// metadata it was bound against.
#[derive(Clone)]
pub struct ElementMetadata {
    key: ElementKey,
    cardinality: Cardinality,
    required: bool,
    visible: bool,
    content_required: bool,
    attributes: Vec<AttributeMetadata>,
    elements: Vec<ElementKey>,
    arbitrary_xml: bool,
    discriminator: Option<QName>,
    adaptations: Vec<(String, ElementKey)>,
    narrower: Option<Arc<dyn Narrower>>,
    resolver: Option<Arc<dyn Resolver>>,
    validator: Option<Arc<dyn ElementValidator>>,
    generator: Option<Arc<dyn ElementGenerator>>,
}

impl fmt::Debug for ElementMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementMetadata")
            .field("key", &self.key)
            .field("cardinality", &self.cardinality)
            .field("required", &self.required)
            .field("visible", &self.visible)
            .field("attributes", &self.attributes.len())
            .field("elements", &self.elements.len())
            .finish()
    }
}

impl ElementMetadata {
    /// The key this metadata is bound to.
    pub fn key(&self) -> &ElementKey {
        &self.key
    }

    /// How many instances of this element a parent may hold.
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Whether a parent declaring this child requires at least one
    /// instance.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether the element is serialized at all. Invisible elements
    /// contribute to the object model but never appear in output.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether a valid element must carry non-empty text content.
    pub fn is_content_required(&self) -> bool {
        self.content_required
    }

    /// Whether undeclared attributes and child elements are permitted.
    pub fn arbitrary_xml(&self) -> bool {
        self.arbitrary_xml
    }

    /// The declared attributes, in declaration order.
    pub fn attributes(&self) -> &[AttributeMetadata] {
        &self.attributes
    }

    /// The declared child element keys, in declaration order.
    pub fn elements(&self) -> &[ElementKey] {
        &self.elements
    }

    /// Find the declared attribute matching a qualified name.
    pub fn find_attribute(&self, id: &QName) -> Option<&AttributeMetadata> {
        self.attributes.iter().find(|a| a.key.id() == id)
    }

    /// Find the declared child element key matching a qualified name.
    pub fn find_element(&self, id: &QName) -> Option<&ElementKey> {
        self.elements.iter().find(|k| k.id() == id)
    }

    /// The discriminator attribute consulted during narrowing, if any.
    pub fn discriminator(&self) -> Option<&QName> {
        self.discriminator.as_ref()
    }

    /// Look up the adaptation variant registered for a discriminator
    /// value.
    pub fn adaptation(&self, discriminator_value: &str) -> Option<&ElementKey> {
        self.adaptations
            .iter()
            .find(|(v, _)| v == discriminator_value)
            .map(|(_, k)| k)
    }

    /// All registered adaptations in registration order.
    pub fn adaptations(&self) -> impl Iterator<Item = (&str, &ElementKey)> {
        self.adaptations.iter().map(|(v, k)| (v.as_str(), k))
    }

    /// The content-shape narrowing hook, if any.
    pub fn narrower(&self) -> Option<&Arc<dyn Narrower>> {
        self.narrower.as_ref()
    }

    /// The post-parse resolver hook, if any.
    pub fn resolver(&self) -> Option<&Arc<dyn Resolver>> {
        self.resolver.as_ref()
    }

    /// The semantic validator hook, if any.
    pub fn validator(&self) -> Option<&Arc<dyn ElementValidator>> {
        self.validator.as_ref()
    }

    /// The custom generator hook, if any.
    pub fn generator(&self) -> Option<&Arc<dyn ElementGenerator>> {
        self.generator.as_ref()
    }

    /// Synthetic permissive metadata for an undeclared element: string
    /// text, arbitrary XML allowed, no declared attributes or children.
    pub(crate) fn undeclared(id: QName) -> Arc<ElementMetadata> {
        Arc::new(ElementMetadata {
            key: ElementKey::undeclared(id),
            cardinality: Cardinality::Multiple,
            required: false,
            visible: true,
            content_required: false,
            attributes: Vec::new(),
            elements: Vec::new(),
            arbitrary_xml: true,
            discriminator: None,
            adaptations: Vec::new(),
            narrower: None,
            resolver: None,
            validator: None,
            generator: None,
        })
    }
}

/// Mutable builder used to declare the metadata for one element key.
///
/// Obtained from [`MetadataRegistry::build`](crate::MetadataRegistry::build);
/// all setters chain:
///
/// ```ignore
/// registry
///     .build(&LINK)
///     .set_cardinality(Cardinality::Multiple)
///     .add_attribute(AttributeKey::of(QName::unqualified("rel")))
///     .add_required_attribute(AttributeKey::of(QName::unqualified("href")));
/// ```
pub struct ElementCreator {
    key: ElementKey,
    cardinality: Cardinality,
    required: bool,
    visible: bool,
    content_required: bool,
    attributes: Vec<AttributeMetadata>,
    elements: Vec<ElementKey>,
    arbitrary_xml: bool,
    discriminator: Option<QName>,
    adaptations: Vec<(String, ElementKey)>,
    adaptation_index: HashMap<String, usize>,
    narrower: Option<Arc<dyn Narrower>>,
    resolver: Option<Arc<dyn Resolver>>,
    validator: Option<Arc<dyn ElementValidator>>,
    generator: Option<Arc<dyn ElementGenerator>>,
}

impl ElementCreator {
    pub(crate) fn new(key: ElementKey) -> Self {
        ElementCreator {
            key,
            cardinality: Cardinality::Single,
            required: false,
            visible: true,
            content_required: false,
            attributes: Vec::new(),
            elements: Vec::new(),
            arbitrary_xml: false,
            discriminator: None,
            adaptations: Vec::new(),
            adaptation_index: HashMap::new(),
            narrower: None,
            resolver: None,
            validator: None,
            generator: None,
        }
    }

    /// The key being declared.
    pub fn key(&self) -> &ElementKey {
        &self.key
    }

    /// Set how many instances of this element a parent may hold.
    pub fn set_cardinality(&mut self, cardinality: Cardinality) -> &mut Self {
        self.cardinality = cardinality;
        self
    }

    /// Mark the element as required in its parent.
    pub fn set_required(&mut self, required: bool) -> &mut Self {
        self.required = required;
        self
    }

    /// Control whether the element is serialized.
    pub fn set_visible(&mut self, visible: bool) -> &mut Self {
        self.visible = visible;
        self
    }

    /// Require non-empty text content on valid instances.
    pub fn set_content_required(&mut self, required: bool) -> &mut Self {
        self.content_required = required;
        self
    }

    /// Declare an optional, visible attribute. Re-declaring a qualified
    /// name replaces the earlier declaration in place.
    pub fn add_attribute(&mut self, key: AttributeKey) -> &mut Self {
        self.push_attribute(key, false, true)
    }

    /// Declare a required attribute.
    pub fn add_required_attribute(&mut self, key: AttributeKey) -> &mut Self {
        self.push_attribute(key, true, true)
    }

    /// Declare a parse-only attribute that is never serialized.
    pub fn add_hidden_attribute(&mut self, key: AttributeKey) -> &mut Self {
        self.push_attribute(key, false, false)
    }

    fn push_attribute(&mut self, key: AttributeKey, required: bool, visible: bool) -> &mut Self {
        let meta = AttributeMetadata {
            key,
            required,
            visible,
        };
        if let Some(existing) = self
            .attributes
            .iter_mut()
            .find(|a| a.key.id() == meta.key.id())
        {
            *existing = meta;
        } else {
            self.attributes.push(meta);
        }
        self
    }

    /// Declare a child element slot. Re-declaring a qualified name is a
    /// no-op.
    pub fn add_element(&mut self, key: ElementKey) -> &mut Self {
        if !self.elements.iter().any(|k| k.id() == key.id()) {
            self.elements.push(key);
        }
        self
    }

    /// Permit undeclared attributes and child elements on instances of
    /// this key. Undeclared content is stored generically as strings.
    pub fn allow_arbitrary_xml(&mut self) -> &mut Self {
        self.arbitrary_xml = true;
        self
    }

    /// Name the attribute whose value selects among registered adaptation
    /// variants during narrowing.
    pub fn set_discriminator(&mut self, attribute: QName) -> &mut Self {
        self.discriminator = Some(attribute);
        self
    }

    /// Register an adaptation: elements of this key observed with the
    /// given discriminator value re-type to `variant`.
    ///
    /// The first registration for a discriminator value wins; later
    /// registrations of the same value are ignored, which makes repeated
    /// defensive registration idempotent and the tie-break deterministic.
    pub fn adapt(&mut self, discriminator_value: &str, variant: ElementKey) -> &mut Self {
        if !self.adaptation_index.contains_key(discriminator_value) {
            self.adaptation_index
                .insert(discriminator_value.to_string(), self.adaptations.len());
            self.adaptations
                .push((discriminator_value.to_string(), variant));
        }
        self
    }

    /// Install a content-shape narrowing hook. Takes precedence over the
    /// discriminator-attribute lookup.
    pub fn set_narrower(&mut self, narrower: impl Narrower + 'static) -> &mut Self {
        self.narrower = Some(Arc::new(narrower));
        self
    }

    /// Install a post-parse resolver hook.
    pub fn set_resolver(&mut self, resolver: impl Resolver + 'static) -> &mut Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Install a semantic validator hook.
    pub fn set_validator(&mut self, validator: impl ElementValidator + 'static) -> &mut Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Install a custom wire-representation hook.
    pub fn set_generator(&mut self, generator: impl ElementGenerator + 'static) -> &mut Self {
        self.generator = Some(Arc::new(generator));
        self
    }

    /// Resolve this declaration into an immutable metadata snapshot.
    pub(crate) fn to_metadata(&self) -> ElementMetadata {
        ElementMetadata {
            key: self.key.clone(),
            cardinality: self.cardinality,
            required: self.required,
            visible: self.visible,
            content_required: self.content_required,
            attributes: self.attributes.clone(),
            elements: self.elements.clone(),
            arbitrary_xml: self.arbitrary_xml,
            discriminator: self.discriminator.clone(),
            adaptations: self.adaptations.clone(),
            narrower: self.narrower.clone(),
            resolver: self.resolver.clone(),
            validator: self.validator.clone(),
            generator: self.generator.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::value::ValueType;

    fn link_key() -> ElementKey {
        ElementKey::of(QName::unqualified("link"), "link")
    }

    #[test]
    fn test_creator_defaults() {
        let meta = ElementCreator::new(link_key()).to_metadata();
        assert_eq!(meta.cardinality(), Cardinality::Single);
        assert!(!meta.is_required());
        assert!(meta.is_visible());
        assert!(!meta.is_content_required());
        assert!(!meta.arbitrary_xml());
    }

    #[test]
    fn test_attribute_redeclaration_replaces() {
        let rel = QName::unqualified("rel");
        let mut creator = ElementCreator::new(link_key());
        creator.add_attribute(AttributeKey::of(rel.clone()));
        creator.add_required_attribute(AttributeKey::of(rel.clone()));
        let meta = creator.to_metadata();
        assert_eq!(meta.attributes().len(), 1);
        assert!(meta.find_attribute(&rel).unwrap().is_required());
    }

    #[test]
    fn test_child_redeclaration_is_noop() {
        let child = ElementKey::of_typed(QName::unqualified("title"), ValueType::String, "title");
        let mut creator = ElementCreator::new(link_key());
        creator.add_element(child.clone()).add_element(child);
        assert_eq!(creator.to_metadata().elements().len(), 1);
    }

    #[test]
    fn test_first_adaptation_wins() {
        let base = link_key();
        let a = base.variant("variantA");
        let b = base.variant("variantB");
        let mut creator = ElementCreator::new(base);
        creator.adapt("kind", a.clone());
        creator.adapt("kind", b);
        let meta = creator.to_metadata();
        assert_eq!(meta.adaptation("kind"), Some(&a));
    }
}
