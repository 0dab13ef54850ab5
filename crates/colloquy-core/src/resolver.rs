//! Call-scoped identity resolution.
//!
//! Saving and loading both walk a graph in two passes: the first pass creates
//! every group and node and records what each id turned into, the second pass
//! wires choices to their targets by looking those ids up again. The
//! [`IdentityResolver`] is that lookup table.
//!
//! A resolver is created fresh for every save or load call and dropped at the
//! end of it. Nothing here is global, so repeated or interleaved calls never
//! observe each other's bindings.

use std::collections::HashMap;

use log::trace;
use thiserror::Error;

use crate::identifier::ElementId;

/// An id was looked up that was never bound in this call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unresolved reference to `{id}`")]
pub struct UnresolvedReference {
    id: ElementId,
}

impl UnresolvedReference {
    /// Returns the id that failed to resolve.
    pub fn id(&self) -> &ElementId {
        &self.id
    }

    /// Consumes the error, returning the id that failed to resolve.
    pub fn into_id(self) -> ElementId {
        self.id
    }
}

/// Maps transient element ids to whatever they became in this call.
///
/// `T` is a materialized entity reference while saving and an editor handle
/// while loading.
///
/// # Examples
///
/// ```
/// use colloquy_core::identifier::ElementId;
/// use colloquy_core::resolver::IdentityResolver;
///
/// let mut resolver = IdentityResolver::new();
/// resolver.bind(ElementId::new("n1"), "Greeting");
///
/// assert_eq!(resolver.resolve(&ElementId::new("n1")), Ok(&"Greeting"));
/// assert!(resolver.resolve(&ElementId::new("n2")).is_err());
/// ```
#[derive(Debug)]
pub struct IdentityResolver<T> {
    bindings: HashMap<ElementId, T>,
}

impl<T> IdentityResolver<T> {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Binds `id` to `value`.
    ///
    /// Returns the value previously bound to `id`, if any. The new binding
    /// replaces it.
    pub fn bind(&mut self, id: ElementId, value: T) -> Option<T> {
        trace!(id = id.as_str(); "Binding id");
        self.bindings.insert(id, value)
    }

    /// Looks up the value bound to `id`.
    ///
    /// # Errors
    ///
    /// Returns [`UnresolvedReference`] if `id` was never bound.
    pub fn resolve(&self, id: &ElementId) -> Result<&T, UnresolvedReference> {
        self.bindings
            .get(id)
            .ok_or_else(|| UnresolvedReference { id: id.clone() })
    }

    /// Returns `true` if `id` is bound.
    pub fn contains(&self, id: &ElementId) -> bool {
        self.bindings.contains_key(id)
    }

    /// Returns the number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<T> Default for IdentityResolver<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_bound_id() {
        let mut resolver = IdentityResolver::new();
        assert!(resolver.is_empty());

        assert_eq!(resolver.bind(ElementId::new("a"), 1), None);
        assert_eq!(resolver.bind(ElementId::new("b"), 2), None);

        assert_eq!(resolver.len(), 2);
        assert_eq!(resolver.resolve(&ElementId::new("a")), Ok(&1));
        assert_eq!(resolver.resolve(&ElementId::new("b")), Ok(&2));
        assert!(resolver.contains(&ElementId::new("a")));
    }

    #[test]
    fn test_unresolved_reference_reports_id() {
        let resolver: IdentityResolver<u32> = IdentityResolver::new();
        let err = resolver.resolve(&ElementId::new("ghost")).unwrap_err();

        assert_eq!(err.id(), &ElementId::new("ghost"));
        assert_eq!(err.to_string(), "unresolved reference to `ghost`");
    }

    #[test]
    fn test_rebinding_replaces_and_returns_previous() {
        let mut resolver = IdentityResolver::new();
        resolver.bind(ElementId::new("a"), "first");

        assert_eq!(resolver.bind(ElementId::new("a"), "second"), Some("first"));
        assert_eq!(resolver.resolve(&ElementId::new("a")), Ok(&"second"));
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn test_resolvers_do_not_share_bindings() {
        let mut first = IdentityResolver::new();
        first.bind(ElementId::new("a"), 1);

        let second: IdentityResolver<i32> = IdentityResolver::new();
        assert!(second.resolve(&ElementId::new("a")).is_err());
    }
}
