//! GData extension element declarations
//!
//! The `gd:` namespace carries structured data riding inside Atom entries:
//! event times, arbitrary name/value extension properties. These elements
//! show the two extension mechanisms side by side: `gd:when` is fully
//! declared with typed attributes and a cross-attribute validator, while
//! `gd:extendedProperty` opens an escape hatch for undeclared foreign
//! children.

use std::sync::LazyLock;

use crate::model::element::Element;
use crate::model::key::{AttributeKey, ElementKey};
use crate::model::metadata::Cardinality;
use crate::model::qname::{Namespace, QName};
use crate::model::registry::MetadataRegistry;
use crate::model::value::{Value, ValueType};
use crate::validator::ValidationContext;
use chrono::{DateTime, FixedOffset};

use super::atom;

/// The GData namespace URI.
pub const NS_URI: &str = "http://schemas.google.com/g/2005";

/// The GData namespace with its customary alias.
pub fn ns() -> Namespace {
    Namespace::with_alias("gd", NS_URI)
}

fn qname(local: &'static str) -> QName {
    QName::qualified(ns(), local)
}

/// `gd:when`, an event time span.
pub static WHEN: LazyLock<ElementKey> = LazyLock::new(|| ElementKey::of(qname("when"), "when"));

/// `gd:extendedProperty`, an open name/value extension slot.
pub static EXTENDED_PROPERTY: LazyLock<ElementKey> =
    LazyLock::new(|| ElementKey::of(qname("extendedProperty"), "extendedProperty"));

/// `startTime` on `gd:when`.
pub static START_TIME: LazyLock<AttributeKey> =
    LazyLock::new(|| AttributeKey::of_typed(QName::unqualified("startTime"), ValueType::DateTime));

/// `endTime` on `gd:when`.
pub static END_TIME: LazyLock<AttributeKey> =
    LazyLock::new(|| AttributeKey::of_typed(QName::unqualified("endTime"), ValueType::DateTime));

/// `name` on `gd:extendedProperty`.
pub static PROPERTY_NAME: LazyLock<AttributeKey> =
    LazyLock::new(|| AttributeKey::of(QName::unqualified("name")));

/// `value` on `gd:extendedProperty`.
pub static PROPERTY_VALUE: LazyLock<AttributeKey> =
    LazyLock::new(|| AttributeKey::of(QName::unqualified("value")));

/// Declare the GData vocabulary into a registry and attach it to the Atom
/// entry. Idempotent.
pub fn register_metadata(registry: &mut MetadataRegistry) {
    if registry.is_registered(&WHEN) {
        return;
    }
    atom::register_metadata(registry);

    registry
        .build(&WHEN)
        .set_cardinality(Cardinality::Multiple)
        .add_required_attribute(START_TIME.clone())
        .add_attribute(END_TIME.clone())
        .set_validator(|element: &Element, ctx: &mut ValidationContext| {
            let start = element
                .attribute_value(&START_TIME)
                .and_then(Value::as_datetime);
            let end = element
                .attribute_value(&END_TIME)
                .and_then(Value::as_datetime);
            if let (Some(start), Some(end)) = (start, end)
                && end < start
            {
                ctx.add_error("'endTime' must not precede 'startTime'");
            }
        });

    registry
        .build(&EXTENDED_PROPERTY)
        .set_cardinality(Cardinality::Multiple)
        .add_required_attribute(PROPERTY_NAME.clone())
        .add_attribute(PROPERTY_VALUE.clone())
        .allow_arbitrary_xml();

    registry
        .build(&atom::ENTRY)
        .add_element(WHEN.clone())
        .add_element(EXTENDED_PROPERTY.clone());
}

/// Read-only view over a `gd:when` element.
pub struct When<'a> {
    element: &'a Element,
}

impl<'a> When<'a> {
    /// Wrap an element.
    pub fn from_element(element: &'a Element) -> Self {
        When { element }
    }

    /// The start of the span, if present and typed.
    pub fn start_time(&self) -> Option<&'a DateTime<FixedOffset>> {
        self.element
            .attribute_value(&START_TIME)
            .and_then(Value::as_datetime)
    }

    /// The end of the span, if present and typed.
    pub fn end_time(&self) -> Option<&'a DateTime<FixedOffset>> {
        self.element
            .attribute_value(&END_TIME)
            .and_then(Value::as_datetime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locked() -> std::sync::Arc<MetadataRegistry> {
        let mut registry = MetadataRegistry::new();
        register_metadata(&mut registry);
        registry.lock()
    }

    #[test]
    fn test_when_rejects_inverted_span() {
        let registry = locked();
        let mut when = Element::create(&registry, &WHEN).unwrap();
        when.set_attribute_value(
            &START_TIME,
            Value::from_text(ValueType::DateTime, "2009-01-02T10:00:00Z").unwrap(),
        );
        when.set_attribute_value(
            &END_TIME,
            Value::from_text(ValueType::DateTime, "2009-01-01T10:00:00Z").unwrap(),
        );
        let err = when.resolve(&registry).unwrap_err();
        assert!(err.to_string().contains("must not precede"));
    }

    #[test]
    fn test_when_accepts_open_ended_span() {
        let registry = locked();
        let mut when = Element::create(&registry, &WHEN).unwrap();
        when.set_attribute_value(
            &START_TIME,
            Value::from_text(ValueType::DateTime, "2009-01-02T10:00:00Z").unwrap(),
        );
        assert!(when.resolve(&registry).is_ok());
    }

    #[test]
    fn test_extended_property_requires_name() {
        let registry = locked();
        let mut prop = Element::create(&registry, &EXTENDED_PROPERTY).unwrap();
        prop.set_attribute_value(&PROPERTY_VALUE, "42");
        let err = prop.resolve(&registry).unwrap_err();
        assert!(err.to_string().contains("'name'"));
    }

    #[test]
    fn test_entry_accepts_gd_children() {
        let registry = locked();
        let meta = registry.bind(&atom::ENTRY).unwrap();
        assert!(meta.find_element(WHEN.id()).is_some());
        assert!(meta.find_element(EXTENDED_PROPERTY.id()).is_some());
    }
}
