//! Error adapter for converting CliError to miette diagnostics.
//!
//! This module provides the bridge between the CLI's error types and miette's
//! rich diagnostic formatting.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use colloquy::{ColloquyError, ReferenceKind};

use crate::{config::ConfigError, error::CliError};

/// Adapter for [`CliError`] variants.
///
/// None of the errors carry source spans, so only the code and help text are
/// filled in.
pub struct ErrorAdapter<'a>(pub &'a CliError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            CliError::Colloquy(err) => colloquy_code(err),
            CliError::Config(_) => "colloquy::config",
            CliError::Snapshot { .. } => "colloquy::snapshot",
            CliError::Io(_) => "colloquy::io",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            CliError::Colloquy(err) => colloquy_help(err)?,
            CliError::Config(ConfigError::MissingFile(_)) => {
                "check the `--config` path, or leave it out to use the default locations"
            }
            CliError::Config(ConfigError::Parse { .. }) => {
                "the file must be TOML with optional `[layout]` and `[store]` tables"
            }
            CliError::Snapshot { .. } => {
                "snapshots are JSON with `groups` and `nodes`, as written by `colloquy load`"
            }
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

fn colloquy_code(err: &ColloquyError) -> &'static str {
    match err {
        ColloquyError::Io(_) => "colloquy::io",
        ColloquyError::DocumentNotFound { .. } => "colloquy::document_not_found",
        ColloquyError::DanglingReference { .. } => "colloquy::dangling_reference",
        ColloquyError::MissingEntity(_) => "colloquy::missing_entity",
        ColloquyError::InvalidName { .. } => "colloquy::invalid_name",
        ColloquyError::Storage(_) => "colloquy::storage",
        ColloquyError::Encoding { .. } => "colloquy::encoding",
    }
}

fn colloquy_help(err: &ColloquyError) -> Option<&'static str> {
    let help = match err {
        ColloquyError::DocumentNotFound { .. } => {
            "save the graph first, or check the graph name and store root"
        }
        ColloquyError::DanglingReference {
            kind: ReferenceKind::Group,
            ..
        } => "add the group to the snapshot or clear the node's group",
        ColloquyError::DanglingReference {
            kind: ReferenceKind::Choice,
            ..
        } => "add the target node to the snapshot or clear the choice's target",
        ColloquyError::MissingEntity(_) => "save the graph again to rebuild its dialogues",
        ColloquyError::InvalidName { .. } => {
            "names must be non-empty, not reserved and free of path separators"
        }
        _ => return None,
    };
    Some(help)
}

/// Convert a [`CliError`] into a reportable error.
pub fn to_reportable(err: &CliError) -> ErrorAdapter<'_> {
    ErrorAdapter(err)
}
