//! Error types for feed parsing and generation
//!
//! All errors include error codes for categorization and enough context to
//! point at the offending element or attribute.
//!
//! # Error Codes
//!
//! Error codes follow the pattern: `E<category><number>`
//!
//! Categories:
//! - **E1xxx**: I/O errors
//! - **E2xxx**: XML parsing and structure errors
//! - **E3xxx**: Value conversion and validation errors
//! - **E4xxx**: Metadata registry and configuration errors
//!
//! ## Common Error Codes
//!
//! - `E1001`: I/O error reading or writing a document
//! - `E2001`: XML parsing error (malformed input)
//! - `E2002`: XML attribute error (duplicate or malformed attribute)
//! - `E2003`: Invalid XML structure (undeclared element, wrong root)
//! - `E2005`: XML writing error
//! - `E3001`: Validation failure (aggregated semantic errors)
//! - `E3002`: Value conversion error
//! - `E4002`: Unregistered metadata key

use std::io;
use thiserror::Error;

use crate::validator::ValidationReport;

/// Result type for feedwire operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when parsing or generating feed documents
#[derive(Error, Debug)]
pub enum Error {
    /// IO error occurred while reading or writing a document
    ///
    /// **Error Code**: E1001
    #[error("[E1001] I/O error: {0}")]
    Io(#[from] io::Error),

    /// XML parsing error
    ///
    /// **Error Code**: E2001
    ///
    /// **Common Causes**:
    /// - Malformed XML syntax
    /// - Invalid character encoding
    /// - Unclosed tags
    #[error("[E2001] XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML attribute error
    ///
    /// **Error Code**: E2002
    ///
    /// **Common Causes**:
    /// - Duplicate value for the same attribute
    /// - Attribute syntax the XML reader rejects
    #[error("[E2002] XML attribute error: {0}")]
    XmlAttr(String),

    /// Invalid XML structure
    ///
    /// **Error Code**: E2003
    ///
    /// **Common Causes**:
    /// - Undeclared element where arbitrary extensions are not permitted
    /// - Root element does not match the requested key
    /// - Text content on an element whose key declares none
    #[error("[E2003] Invalid XML structure: {0}")]
    InvalidXml(String),

    /// XML writing error
    ///
    /// **Error Code**: E2005
    ///
    /// **Common Causes**:
    /// - I/O failure while serializing
    /// - Output stream closed mid-document
    #[error("[E2005] XML writing error: {0}")]
    XmlWrite(String),

    /// Semantic validation failure
    ///
    /// **Error Code**: E3001
    ///
    /// Raised after structural parsing completes when the resolved element
    /// tree violates its metadata (missing required attributes or children)
    /// or a schema validator's own rules. Carries every issue found in the
    /// subtree, not just the first one.
    #[error("[E3001] Invalid document: {0}")]
    Validation(ValidationReport),

    /// Value conversion error
    ///
    /// **Error Code**: E3002
    ///
    /// **Common Causes**:
    /// - Non-numeric text where an integer or float is declared
    /// - Date-time text that is not RFC 3339
    /// - Unrecognized boolean token
    #[error("[E3002] Value error: {0}")]
    Value(String),

    /// Unregistered metadata key
    ///
    /// **Error Code**: E4002
    ///
    /// A key was bound against a registry that has no declaration for it,
    /// directly or through its parent chain.
    #[error("[E4002] Unregistered key: {0}")]
    Unregistered(String),
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlAttr(format!("Attribute parsing failed: {}", err))
    }
}

impl Error {
    /// Create an InvalidXml error with element context
    ///
    /// # Example
    /// ```ignore
    /// Error::invalid_element("link", "undeclared child of <entry>")
    /// ```
    pub fn invalid_element(element: &str, message: &str) -> Self {
        Error::InvalidXml(format!("Element '<{}>': {}", element, message))
    }

    /// Create an XmlAttr error for a duplicate attribute value
    pub fn duplicate_attribute(element: &str, attribute: &str) -> Self {
        Error::XmlAttr(format!(
            "Duplicate value for attribute '{}' on element '<{}>'",
            attribute, element
        ))
    }

    /// Create a Value error with context about what was being converted
    ///
    /// # Arguments
    /// * `field` - What was being converted (e.g., "attribute 'href'")
    /// * `text` - The text that failed to convert
    /// * `expected` - The expected value type (e.g., "integer")
    pub fn value_with_context(field: &str, text: &str, expected: &str) -> Self {
        Error::Value(format!(
            "Failed to convert {}: expected {}, got '{}'",
            field, expected, text
        ))
    }

    /// Create an XmlWrite error
    pub fn xml_write(message: String) -> Self {
        Error::XmlWrite(message)
    }
}
