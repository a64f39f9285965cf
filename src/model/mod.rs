//! The generic element data model
//!
//! Documents are trees of [`Element`] values. What an element may contain
//! is not hard-coded per type; it is described by [`ElementMetadata`]
//! looked up through a [`MetadataRegistry`] keyed by [`ElementKey`]. The
//! same wire name can resolve to different metadata depending on context,
//! which is how protocol variants ("kinds") share one parse path.

pub mod element;
pub mod key;
pub mod metadata;
pub mod qname;
pub mod registry;
pub mod value;

pub use element::{Attribute, Element};
pub use key::{AttributeKey, ElementKey};
pub use metadata::{
    AttributeMetadata, Cardinality, ElementCreator, ElementGenerator, ElementMetadata,
    ElementValidator, Narrower, Resolver,
};
pub use qname::{Namespace, QName};
pub use registry::MetadataRegistry;
pub use value::{Value, ValueType};
