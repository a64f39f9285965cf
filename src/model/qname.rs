//! Qualified names and XML namespaces

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// An XML namespace: a URI plus the alias preferred when serializing.
///
/// Two namespaces are equal when their URIs are equal; the alias is a
/// serialization hint only and never participates in identity. The
/// generator may substitute a different alias if two namespaces in one
/// document prefer the same one.
#[derive(Debug, Clone)]
pub struct Namespace {
    uri: Cow<'static, str>,
    alias: Option<Cow<'static, str>>,
}

impl Namespace {
    /// Create a namespace with no preferred alias.
    pub fn new(uri: impl Into<Cow<'static, str>>) -> Self {
        Namespace {
            uri: uri.into(),
            alias: None,
        }
    }

    /// Create a namespace with a preferred serialization alias.
    pub fn with_alias(
        alias: impl Into<Cow<'static, str>>,
        uri: impl Into<Cow<'static, str>>,
    ) -> Self {
        Namespace {
            uri: uri.into(),
            alias: Some(alias.into()),
        }
    }

    /// The namespace URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The preferred alias, if any.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }
}

impl PartialEq for Namespace {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl Eq for Namespace {}

impl Hash for Namespace {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
    }
}

/// A qualified XML name: an optional namespace plus a local name.
///
/// Identity is by value, so a `QName` can be used directly as a map key.
/// A `None` namespace means the name is unqualified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    ns: Option<Namespace>,
    local: Cow<'static, str>,
}

impl QName {
    /// Create an unqualified name.
    pub fn unqualified(local: impl Into<Cow<'static, str>>) -> Self {
        QName {
            ns: None,
            local: local.into(),
        }
    }

    /// Create a namespace-qualified name.
    pub fn qualified(ns: Namespace, local: impl Into<Cow<'static, str>>) -> Self {
        QName {
            ns: Some(ns),
            local: local.into(),
        }
    }

    /// The namespace, if qualified.
    pub fn ns(&self) -> Option<&Namespace> {
        self.ns.as_ref()
    }

    /// The local part of the name.
    pub fn local_name(&self) -> &str {
        &self.local
    }

    /// Returns true if this name matches the given namespace URI (or lack
    /// of one) and local name.
    pub fn matches(&self, ns_uri: Option<&str>, local: &str) -> bool {
        self.local == local && self.ns.as_ref().map(|n| n.uri()) == ns_uri
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.ns.as_ref().and_then(|n| n.alias()), &self.ns) {
            (Some(alias), _) => write!(f, "{}:{}", alias, self.local),
            (None, Some(ns)) => write!(f, "{{{}}}{}", ns.uri(), self.local),
            (None, None) => write!(f, "{}", self.local),
        }
    }
}
