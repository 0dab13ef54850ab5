//! Configuration types for Colloquy persistence.
//!
//! This module provides configuration structures that control where graph
//! assets live and how they are written. All types implement
//! [`serde::Deserialize`] for loading from external sources.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining layout and store settings.
//! - [`LayoutConfig`] - The two asset roots graph documents and entities live under.
//! - [`StoreConfig`] - Where the filesystem store is rooted and how records are encoded.
//!
//! # Example
//!
//! ```
//! # use colloquy::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.layout().graphs_root(), "Editor/DialogueSystem/Graphs");
//! assert!(config.store().pretty());
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

const DEFAULT_GRAPHS_ROOT: &str = "Editor/DialogueSystem/Graphs";
const DEFAULT_DIALOGUES_ROOT: &str = "DialogueSystem/Dialogues";
const DEFAULT_STORE_ROOT: &str = "Assets";

/// Top-level configuration combining layout and store settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Asset layout section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Store section.
    #[serde(default)]
    store: StoreConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified layout and store configurations.
    pub fn new(layout: LayoutConfig, store: StoreConfig) -> Self {
        Self { layout, store }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the store configuration.
    pub fn store(&self) -> &StoreConfig {
        &self.store
    }

    /// Replaces the store configuration (builder style).
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }
}

/// The roots the asset layout hangs off.
///
/// Both roots are `/`-separated asset paths relative to the store root.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Folder holding one graph document per graph.
    graphs_root: String,

    /// Folder holding one entity folder per graph.
    dialogues_root: String,
}

impl LayoutConfig {
    /// Creates a new [`LayoutConfig`] with the given roots.
    pub fn new(graphs_root: impl Into<String>, dialogues_root: impl Into<String>) -> Self {
        Self {
            graphs_root: graphs_root.into(),
            dialogues_root: dialogues_root.into(),
        }
    }

    /// Returns the graph document root.
    pub fn graphs_root(&self) -> &str {
        &self.graphs_root
    }

    /// Returns the materialized entity root.
    pub fn dialogues_root(&self) -> &str {
        &self.dialogues_root
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::new(DEFAULT_GRAPHS_ROOT, DEFAULT_DIALOGUES_ROOT)
    }
}

/// Filesystem store settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory every asset path is resolved against.
    root: PathBuf,

    /// Whether records are written as indented JSON.
    pretty: bool,
}

impl StoreConfig {
    /// Creates a new [`StoreConfig`].
    pub fn new(root: impl Into<PathBuf>, pretty: bool) -> Self {
        Self {
            root: root.into(),
            pretty,
        }
    }

    /// Returns the store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns `true` if records are written as indented JSON.
    pub fn pretty(&self) -> bool {
        self.pretty
    }

    /// Replaces the root directory (builder style).
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_ROOT, true)
    }
}
