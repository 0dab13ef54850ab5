//! Colloquy - persistence for branching dialogue graphs.
//!
//! An editor hands Colloquy a [`GraphSnapshot`](snapshot::GraphSnapshot) of a
//! dialogue graph. Colloquy writes two things for it: a graph document that a
//! later load rebuilds the editor view from, and a set of name-keyed dialogue
//! entities a runtime walks through choice by choice. Artifacts whose element
//! disappeared since the previous save are removed.

pub mod catalog;
pub mod changeset;
pub mod config;
pub mod layout;
pub mod load;
pub mod rebuild;
pub mod reconcile;
pub mod save;
pub mod store;

mod error;
mod structure;

pub use colloquy_core::{geometry, identifier, payload, record, resolver, snapshot};

pub use error::{ColloquyError, ReferenceKind};

use log::info;

use catalog::DialogueCatalog;
use config::AppConfig;
use layout::AssetLayout;
use load::{GraphFactory, LoadCoordinator, LoadReport};
use rebuild::SnapshotBuilder;
use record::DialogueGraphDocument;
use save::{PreparedSave, SaveCoordinator, SaveReport};
use snapshot::GraphSnapshot;
use store::{AssetStore, FsAssetStore, MemoryAssetStore, read_record};

/// Saves, loads and inspects dialogue graphs kept in an [`AssetStore`].
///
/// # Examples
///
/// ```
/// use colloquy::DialogueIo;
/// use colloquy::payload::NodeKind;
/// use colloquy::snapshot::{ChoiceSnapshot, GraphSnapshot, NodeSnapshot};
///
/// let mut io = DialogueIo::default();
///
/// let snapshot = GraphSnapshot::new()
///     .with_node(
///         NodeSnapshot::new("n1", "Greeting", NodeKind::SingleChoice)
///             .with_choice(ChoiceSnapshot::new("Hello").with_target("n2")),
///     )
///     .with_node(NodeSnapshot::new("n2", "Reply", NodeKind::SingleChoice));
///
/// let report = io.save("Quest", &snapshot).expect("Failed to save");
/// assert_eq!(report.starting_dialogues().len(), 1);
///
/// let loaded = io.load_snapshot("Quest").expect("Failed to load");
/// assert_eq!(loaded.nodes().len(), 2);
/// ```
#[derive(Debug)]
pub struct DialogueIo<S> {
    config: AppConfig,
    store: S,
}

impl<S: AssetStore> DialogueIo<S> {
    /// Create a new instance over `store`.
    pub fn new(config: AppConfig, store: S) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Returns the asset layout of `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`ColloquyError::InvalidName`] if `graph` is not a usable name.
    pub fn layout(&self, graph: &str) -> Result<AssetLayout, ColloquyError> {
        AssetLayout::new(self.config.layout(), graph)
    }

    /// Reads the graph document of `graph`, if it was ever saved.
    pub fn document(&self, graph: &str) -> Result<Option<DialogueGraphDocument>, ColloquyError> {
        let layout = self.layout(graph)?;
        read_record(&self.store, layout.document())
    }

    /// Validates `snapshot` and plans its save without writing anything.
    ///
    /// # Errors
    ///
    /// See [`SaveCoordinator::prepare`]. Also fails if the existing document
    /// cannot be read.
    pub fn prepare_save(
        &self,
        graph: &str,
        snapshot: &GraphSnapshot,
    ) -> Result<PreparedSave, ColloquyError> {
        let layout = self.layout(graph)?;
        let previous: Option<DialogueGraphDocument> = read_record(&self.store, layout.document())?;
        SaveCoordinator::new(&layout, self.config.store().pretty())
            .prepare(snapshot, previous.as_ref())
    }

    /// Saves `snapshot` as `graph`.
    ///
    /// Either the whole snapshot validates and is committed, or nothing is
    /// written. See [`PreparedSave::commit`] for store failures mid-commit.
    pub fn save(&mut self, graph: &str, snapshot: &GraphSnapshot) -> Result<SaveReport, ColloquyError> {
        let prepared = self.prepare_save(graph, snapshot)?;
        prepared.commit(&mut self.store)
    }

    /// Loads `graph` into `factory`.
    ///
    /// # Errors
    ///
    /// Returns [`ColloquyError::DocumentNotFound`] if `graph` was never saved.
    pub fn load<F: GraphFactory>(
        &self,
        graph: &str,
        factory: &mut F,
    ) -> Result<LoadReport, ColloquyError> {
        let layout = self.layout(graph)?;
        let document: DialogueGraphDocument = read_record(&self.store, layout.document())?
            .ok_or_else(|| ColloquyError::DocumentNotFound {
                graph: graph.to_string(),
                path: layout.document().clone(),
            })?;

        LoadCoordinator::new(factory).run(&document)
    }

    /// Loads `graph` back into a [`GraphSnapshot`].
    pub fn load_snapshot(&self, graph: &str) -> Result<GraphSnapshot, ColloquyError> {
        let mut builder = SnapshotBuilder::new();
        self.load(graph, &mut builder)?;
        Ok(builder.into_snapshot())
    }

    /// Opens the materialized dialogues of `graph`.
    pub fn catalog(&self, graph: &str) -> Result<DialogueCatalog, ColloquyError> {
        let layout = self.layout(graph)?;
        DialogueCatalog::open(&self.store, &layout)
    }
}

impl DialogueIo<FsAssetStore> {
    /// Create an instance over a filesystem store rooted at the configured
    /// store root.
    pub fn open(config: AppConfig) -> Self {
        let store = FsAssetStore::new(config.store().root());
        info!(root = store.root().display().to_string(); "Opening asset store");
        Self::new(config, store)
    }
}

impl Default for DialogueIo<MemoryAssetStore> {
    fn default() -> Self {
        Self::new(AppConfig::default(), MemoryAssetStore::new())
    }
}
