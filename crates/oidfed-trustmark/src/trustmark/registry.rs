//! Per-type spec registry for issuers and owners.

use std::collections::BTreeMap;

/// A spec that is registered under a trust mark type.
pub trait TypedSpec {
    /// The trust mark type this spec configures.
    fn trust_mark_type(&self) -> &str;
}

/// Mapping of trust mark type → spec.
///
/// Registering a type that is already present replaces the old spec: the
/// last write wins and the replaced entry is handed back. There is no
/// removal operation.
#[derive(Debug, Clone)]
pub struct SpecRegistry<S> {
    entries: BTreeMap<String, S>,
}

impl<S: TypedSpec> SpecRegistry<S> {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Register `spec`, returning the spec it replaced, if any.
    pub fn insert(&mut self, spec: S) -> Option<S> {
        self.entries.insert(spec.trust_mark_type().to_string(), spec)
    }

    /// Look up the spec for a type.
    pub fn get(&self, trust_mark_type: &str) -> Option<&S> {
        self.entries.get(trust_mark_type)
    }

    /// Registered types, in sorted order.
    pub fn types(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.entries.values()
    }
}

impl<S: TypedSpec> Default for SpecRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TypedSpec> FromIterator<S> for SpecRegistry<S> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut registry = Self::new();
        for spec in iter {
            registry.insert(spec);
        }
        registry
    }
}
