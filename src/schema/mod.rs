//! Ready-made schema declarations
//!
//! Declarations for the Atom syndication format and the `gd:` extension
//! namespace, plus thin typed wrappers over the generic element model.
//! Applications with their own vocabularies register them the same way
//! these modules do: declare keys, describe them in a registry, lock.

use std::sync::Arc;

use crate::model::registry::MetadataRegistry;

pub mod atom;
pub mod gd;

/// Build a locked registry holding the Atom and GData declarations.
///
/// Callers with additional vocabularies should start from
/// [`MetadataRegistry::new`], call the individual `register_metadata`
/// functions along with their own, and lock the result themselves.
pub fn registry() -> Arc<MetadataRegistry> {
    let mut registry = MetadataRegistry::new();
    atom::register_metadata(&mut registry);
    gd::register_metadata(&mut registry);
    registry.lock()
}
