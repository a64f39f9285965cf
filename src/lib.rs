//! # feedwire
//!
//! A metadata-driven XML data binding layer for Atom and GData-style
//! syndication protocols.
//!
//! Instead of one struct per wire element, documents are generic
//! [`Element`] trees whose shape is described by [`ElementMetadata`]
//! declarations in a [`MetadataRegistry`]. The registry decides which
//! attributes and children an element accepts, how text content is typed,
//! and how a base element narrows to a more specific variant once its
//! content is known. Parsing and generation are both driven by the same
//! metadata, so a schema is declared once and works in both directions.
//!
//! ## Features
//!
//! - Pure Rust implementation with no unsafe code
//! - Namespace-aware streaming parser built on `quick-xml`
//! - Typed attribute and text values (string, integer, float, boolean,
//!   URI, RFC 3339 date-time)
//! - Element narrowing: base keys adapt to variants by discriminator
//!   attribute or custom logic after parsing
//! - Batch validation with element paths, reported after a full pass
//! - Metadata-controlled output: hidden attributes and elements parse but
//!   never serialize
//! - Ready-made Atom and GData schema declarations with typed wrappers
//!
//! ## Example
//!
//! ```
//! use feedwire::schema;
//! use feedwire::parser;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = schema::registry();
//! let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom">
//!   <id>urn:example:1</id>
//!   <title>Hello</title>
//!   <updated>2008-09-15T09:00:00Z</updated>
//! </entry>"#;
//!
//! let element = parser::parse_str(xml, &registry, &schema::atom::ENTRY)?;
//! let entry = schema::atom::Entry::from_element(&element);
//! assert_eq!(entry.title(), Some("Hello"));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod model;
pub mod parser;
pub mod schema;
pub mod validator;
pub mod writer;

pub use error::{Error, Result};
pub use model::{
    Attribute, AttributeKey, AttributeMetadata, Cardinality, Element, ElementCreator,
    ElementGenerator, ElementKey, ElementMetadata, ElementValidator, MetadataRegistry, Namespace,
    Narrower, QName, Resolver, Value, ValueType,
};
pub use validator::{ValidationContext, ValidationIssue, ValidationReport};
pub use writer::WriteConfig;
