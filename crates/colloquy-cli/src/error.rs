//! Error types for the CLI.
//!
//! [`CliError`] wraps the library's [`ColloquyError`] and adds what only the
//! command line can get wrong: the configuration file and the snapshot files
//! it reads and writes.

use std::{io, path::PathBuf};

use thiserror::Error;

use colloquy::ColloquyError;

use crate::config::ConfigError;

/// The main error type for CLI runs.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Colloquy(#[from] ColloquyError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A snapshot file is not a valid snapshot, or one could not be encoded.
    #[error("snapshot file `{}`: {source}", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Returns `true` if nothing was attempted and the user only needs to be
    /// told (see [`ColloquyError::is_recoverable`]).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Colloquy(err) if err.is_recoverable())
    }
}
