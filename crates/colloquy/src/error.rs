//! Error types for Colloquy operations.
//!
//! This module provides the main error type [`ColloquyError`] which covers
//! everything a save, load or catalog lookup can fail with.

use std::{fmt, io};

use thiserror::Error;

use colloquy_core::identifier::{ElementId, NameError};

use crate::{layout::AssetPath, store::StoreError};

/// What kind of element a dangling reference was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// A node's group reference.
    Group,
    /// A choice's target node reference.
    Choice,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group => f.write_str("group"),
            Self::Choice => f.write_str("choice"),
        }
    }
}

/// The main error type for Colloquy operations.
///
/// Duplicate names are not errors: the last writer wins and the collision is
/// reported in the save report.
#[derive(Debug, Error)]
pub enum ColloquyError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The graph has never been saved. Nothing was changed.
    #[error("graph `{graph}` not found at `{path}`")]
    DocumentNotFound { graph: String, path: AssetPath },

    /// A group or choice reference points at an id that does not exist.
    #[error("dangling {kind} reference to `{id}` from node `{owner}`")]
    DanglingReference {
        kind: ReferenceKind,
        id: ElementId,
        owner: String,
    },

    /// The container lists a dialogue whose entity is missing.
    #[error("dialogue entity missing at `{0}`")]
    MissingEntity(AssetPath),

    /// A name cannot be used as a storage path segment.
    #[error("invalid {what} name: {source}")]
    InvalidName {
        what: &'static str,
        #[source]
        source: NameError,
    },

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    #[error("malformed record at `{path}`: {source}")]
    Encoding {
        path: AssetPath,
        #[source]
        source: serde_json::Error,
    },
}

impl ColloquyError {
    /// Create a new `DanglingReference` error.
    pub fn dangling(kind: ReferenceKind, id: ElementId, owner: impl Into<String>) -> Self {
        Self::DanglingReference {
            kind,
            id,
            owner: owner.into(),
        }
    }

    /// Create a new `InvalidName` error.
    pub fn invalid_name(what: &'static str, source: NameError) -> Self {
        Self::InvalidName { what, source }
    }

    /// Returns `true` if the caller may recover by presenting the error and
    /// carrying on (nothing was attempted).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::DocumentNotFound { .. })
    }
}
