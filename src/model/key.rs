//! Strongly-typed keys addressing attributes and child elements
//!
//! Keys are the only way code refers to "the element named X carrying
//! values of type V". An element key additionally carries an element-type
//! tag: two keys sharing a qualified name but differing in element type are
//! adaptation variants of the same logical slot, selected at runtime by a
//! discriminator value.

use crate::model::qname::QName;
use crate::model::value::ValueType;

/// The element-type tag used for generic, undeclared elements.
pub const GENERIC_ELEMENT_TYPE: &str = "element";

/// A key referring to a particular attribute: its qualified name plus the
/// declared value type used to convert its text both ways.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeKey {
    id: QName,
    value_type: ValueType,
}

impl AttributeKey {
    /// Create a string-valued attribute key.
    pub fn of(id: QName) -> Self {
        AttributeKey {
            id,
            value_type: ValueType::String,
        }
    }

    /// Create an attribute key with an explicit value type.
    pub fn of_typed(id: QName, value_type: ValueType) -> Self {
        AttributeKey { id, value_type }
    }

    /// The qualified name of the attribute.
    pub fn id(&self) -> &QName {
        &self.id
    }

    /// The declared value type.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }
}

/// A key referring to a particular element.
///
/// Holds the qualified name, the declared text value type (`None` for
/// elements without text content), and the element-type tag naming the
/// logical subtype instances of this key represent.
///
/// Equality is by value across all three parts, so a generic `content` key
/// and its `textContent` variant are distinct keys that answer to the same
/// qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementKey {
    id: QName,
    value_type: Option<ValueType>,
    element_type: &'static str,
}

impl ElementKey {
    /// Create a key for an element without text content.
    pub fn of(id: QName, element_type: &'static str) -> Self {
        ElementKey {
            id,
            value_type: None,
            element_type,
        }
    }

    /// Create a key for an element carrying text content of the given type.
    pub fn of_typed(id: QName, value_type: ValueType, element_type: &'static str) -> Self {
        ElementKey {
            id,
            value_type: Some(value_type),
            element_type,
        }
    }

    /// Create an adaptation variant of this key: same qualified name and
    /// text type, different element type.
    pub fn variant(&self, element_type: &'static str) -> Self {
        ElementKey {
            id: self.id.clone(),
            value_type: self.value_type,
            element_type,
        }
    }

    /// Create a key for an undeclared element encountered in arbitrary
    /// XML extension content. String-valued, generic element type.
    pub fn undeclared(id: QName) -> Self {
        ElementKey {
            id,
            value_type: Some(ValueType::String),
            element_type: GENERIC_ELEMENT_TYPE,
        }
    }

    /// The qualified name of the element.
    pub fn id(&self) -> &QName {
        &self.id
    }

    /// The declared text value type, or `None` if the element carries no
    /// text content.
    pub fn value_type(&self) -> Option<ValueType> {
        self.value_type
    }

    /// The element-type tag.
    pub fn element_type(&self) -> &'static str {
        self.element_type
    }
}
