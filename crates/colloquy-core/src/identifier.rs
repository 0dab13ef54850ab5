//! Element identifiers and name validation.
//!
//! This module provides the [`ElementId`] type used to address groups and nodes
//! inside one graph, and [`validate_name`] which checks that a group, node or
//! graph name can be used as a storage path segment.
//!
//! Ids are plain owned strings. They are compared by value and never interned
//! in process-wide state, so two save or load calls never share id tables.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Stable identifier of a group or node within one graph.
///
/// An empty id marks an element the editor created but never saved. Such ids
/// are replaced with [`ElementId::generate`] the first time the element is
/// persisted.
///
/// # Examples
///
/// ```
/// use colloquy_core::identifier::ElementId;
///
/// let id = ElementId::new("intro");
/// assert!(id.is_assigned());
/// assert_eq!(id, "intro");
///
/// let fresh = ElementId::default();
/// assert!(!fresh.is_assigned());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Creates an `ElementId` from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns `true` if the id is non-empty.
    pub fn is_assigned(&self) -> bool {
        !self.0.is_empty()
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl PartialEq<str> for ElementId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ElementId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Reasons a name cannot be used as a storage path segment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("name must not be empty")]
    Empty,

    #[error("name `{0}` must not contain path separators")]
    ContainsSeparator(String),

    #[error("name `{0}` contains control characters")]
    ContainsControl(String),

    #[error("name `{0}` is reserved")]
    Reserved(String),
}

/// Checks that `name` can be used as one path segment.
///
/// # Errors
///
/// Returns a [`NameError`] if the name is blank, contains `/` or `\`,
/// contains control characters, or is `.` or `..`.
///
/// # Examples
///
/// ```
/// use colloquy_core::identifier::{NameError, validate_name};
///
/// assert!(validate_name("Tavern Keeper").is_ok());
/// assert_eq!(validate_name("  "), Err(NameError::Empty));
/// assert!(validate_name("a/b").is_err());
/// ```
pub fn validate_name(name: &str) -> Result<(), NameError> {
    if name.trim().is_empty() {
        return Err(NameError::Empty);
    }
    if name.contains(['/', '\\']) {
        return Err(NameError::ContainsSeparator(name.to_string()));
    }
    if name.chars().any(char::is_control) {
        return Err(NameError::ContainsControl(name.escape_debug().to_string()));
    }
    if name == "." || name == ".." {
        return Err(NameError::Reserved(name.to_string()));
    }
    Ok(())
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    fn id_strategy() -> impl Strategy<Value = ElementId> {
        any::<String>().prop_map(ElementId::new)
    }

    fn segment_strategy() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 _-]{0,15}"
    }

    /// An id is stored as the same JSON string its text would be.
    fn check_id_serializes_as_its_text(id: ElementId) -> Result<(), TestCaseError> {
        let json = serde_json::to_string(&id).unwrap();
        prop_assert_eq!(&json, &serde_json::to_string(id.as_str()).unwrap());

        let back: ElementId = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, id);
        Ok(())
    }

    fn check_plain_segment_is_valid(name: &str) -> Result<(), TestCaseError> {
        prop_assert_eq!(validate_name(name), Ok(()));
        Ok(())
    }

    /// Joining two segments with a separator never yields a valid name.
    fn check_separator_is_rejected(
        left: &str,
        right: &str,
        separator: char,
    ) -> Result<(), TestCaseError> {
        let name = format!("{left}{separator}{right}");
        prop_assert_eq!(
            validate_name(&name),
            Err(NameError::ContainsSeparator(name.clone()))
        );
        Ok(())
    }

    proptest! {
        #[test]
        fn id_serializes_as_its_text(id in id_strategy()) {
            check_id_serializes_as_its_text(id)?;
        }

        #[test]
        fn plain_segment_is_valid(name in segment_strategy()) {
            check_plain_segment_is_valid(&name)?;
        }

        #[test]
        fn separator_is_rejected(
            left in segment_strategy(),
            right in segment_strategy(),
            separator in prop_oneof![Just('/'), Just('\\')],
        ) {
            check_separator_is_rejected(&left, &right, separator)?;
        }
    }
}
