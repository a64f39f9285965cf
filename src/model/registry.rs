//! Process-wide registry of element metadata
//!
//! Schema modules declare their keys into a [`MetadataRegistry`] during
//! startup, then the registry is locked and shared. Locking is expressed in
//! the type system: [`MetadataRegistry::lock`] consumes the registry and
//! returns it behind an `Arc`, after which no mutating method is reachable
//! and concurrent read-only access is safe.
//!
//! Per-request customization uses [`MetadataRegistry::overlay`]: a cheap
//! child registry that answers its own declarations first and falls back to
//! the locked parent for everything else, leaving shared schema untouched.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::key::ElementKey;
use crate::model::metadata::{ElementCreator, ElementMetadata};

/// Registry mapping element keys to their metadata declarations.
#[derive(Default)]
pub struct MetadataRegistry {
    parent: Option<Arc<MetadataRegistry>>,
    creators: HashMap<ElementKey, ElementCreator>,
    bound: HashMap<ElementKey, Arc<ElementMetadata>>,
}

impl MetadataRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        MetadataRegistry::default()
    }

    /// Create a child registry that overrides a locked parent.
    ///
    /// Lookups check this registry's own declarations first and fall back
    /// to the parent chain. The overlay is intended to be populated and
    /// then treated as read-only for the duration of one request.
    pub fn overlay(parent: Arc<MetadataRegistry>) -> Self {
        MetadataRegistry {
            parent: Some(parent),
            creators: HashMap::new(),
            bound: HashMap::new(),
        }
    }

    /// Returns true if the key has been declared in this registry or any
    /// parent.
    pub fn is_registered(&self, key: &ElementKey) -> bool {
        self.creators.contains_key(key)
            || self.bound.contains_key(key)
            || self
                .parent
                .as_ref()
                .is_some_and(|p| p.is_registered(key))
    }

    /// Returns the declaration builder for a key, registering the key as a
    /// side effect.
    ///
    /// Registration is idempotent: building an already-registered key
    /// returns the existing builder unchanged, so schema modules can
    /// defensively re-register their dependencies in any order.
    pub fn build(&mut self, key: &ElementKey) -> &mut ElementCreator {
        self.creators
            .entry(key.clone())
            .or_insert_with(|| ElementCreator::new(key.clone()))
    }

    /// Record that elements declared as `base`, when observed with the
    /// given discriminator value, re-type to `variant`.
    ///
    /// First registration for a discriminator value wins; re-registering
    /// the same value is a no-op.
    pub fn adapt(&mut self, base: &ElementKey, discriminator_value: &str, variant: ElementKey) {
        self.build(base).adapt(discriminator_value, variant);
    }

    /// Freeze the registry for shared use.
    ///
    /// Every declaration is resolved into an immutable metadata snapshot
    /// up front, so binds on the locked registry are cheap lookups. The
    /// returned `Arc` permits no further mutation.
    pub fn lock(mut self) -> Arc<MetadataRegistry> {
        self.bound = self
            .creators
            .iter()
            .map(|(key, creator)| (key.clone(), Arc::new(creator.to_metadata())))
            .collect();
        self.creators.clear();
        Arc::new(self)
    }

    /// Resolve the bound metadata for a key.
    ///
    /// On a locked registry this returns the pre-resolved snapshot; on an
    /// unlocked overlay the declaration is resolved on the fly. Falls back
    /// to the parent chain, and fails with `[E4002]` if the key was never
    /// declared anywhere.
    pub fn bind(&self, key: &ElementKey) -> Result<Arc<ElementMetadata>> {
        if let Some(meta) = self.bound.get(key) {
            return Ok(Arc::clone(meta));
        }
        if let Some(creator) = self.creators.get(key) {
            return Ok(Arc::new(creator.to_metadata()));
        }
        if let Some(parent) = &self.parent {
            return parent.bind(key);
        }
        Err(Error::Unregistered(format!(
            "{} ({})",
            key.id(),
            key.element_type()
        )))
    }
}
