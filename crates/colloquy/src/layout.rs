//! Asset addressing.
//!
//! Every persisted artifact of a graph lives at a path derived purely from
//! names. For a graph `G` the [`AssetLayout`] produces:
//!
//! | Artifact         | Path                                              |
//! |------------------|---------------------------------------------------|
//! | graph document   | `{graphs_root}/{G}Graph`                          |
//! | container        | `{dialogues_root}/{G}/{G}`                        |
//! | group entity     | `{dialogues_root}/{G}/Groups/{group}/{group}`     |
//! | grouped dialogue | `{dialogues_root}/{G}/Groups/{group}/Dialogues/{name}` |
//! | ungrouped dialogue | `{dialogues_root}/{G}/Global/Dialogues/{name}`  |
//!
//! Names are checked with [`validate_name`] before they are ever turned into
//! a path, so a path segment never contains a separator.

use std::fmt;

use colloquy_core::{identifier::validate_name, record::EntityRef};

use crate::{config::LayoutConfig, error::ColloquyError};

const GROUPS_FOLDER: &str = "Groups";
const GLOBAL_FOLDER: &str = "Global";
const DIALOGUES_FOLDER: &str = "Dialogues";
const DOCUMENT_SUFFIX: &str = "Graph";

/// A `/`-separated, store-relative asset path without extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetPath(String);

impl AssetPath {
    /// Parses a path, dropping empty segments.
    pub fn parse(path: &str) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        Self(segments.join("/"))
    }

    /// Appends one segment.
    pub fn join(&self, segment: &str) -> Self {
        if self.0.is_empty() {
            Self(segment.to_string())
        } else {
            Self(format!("{}/{}", self.0, segment))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the path's segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Returns the last segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Returns `true` if `self` equals `folder` or lies somewhere below it.
    pub fn is_within(&self, folder: &AssetPath) -> bool {
        match self.0.strip_prefix(folder.as_str()) {
            Some(rest) => folder.0.is_empty() || rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Asset paths of one named graph.
#[derive(Debug, Clone)]
pub struct AssetLayout {
    graph: String,
    document: AssetPath,
    graph_folder: AssetPath,
}

impl AssetLayout {
    /// Creates the layout for `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`ColloquyError::InvalidName`] if `graph` is not a usable name.
    pub fn new(config: &LayoutConfig, graph: &str) -> Result<Self, ColloquyError> {
        validate_name(graph).map_err(|err| ColloquyError::invalid_name("graph", err))?;

        let document =
            AssetPath::parse(config.graphs_root()).join(&format!("{graph}{DOCUMENT_SUFFIX}"));
        let graph_folder = AssetPath::parse(config.dialogues_root()).join(graph);

        Ok(Self {
            graph: graph.to_string(),
            document,
            graph_folder,
        })
    }

    /// Returns the graph name.
    pub fn graph(&self) -> &str {
        &self.graph
    }

    /// Path of the graph document.
    pub fn document(&self) -> &AssetPath {
        &self.document
    }

    /// Folder holding every materialized entity of the graph.
    pub fn graph_folder(&self) -> &AssetPath {
        &self.graph_folder
    }

    /// Path of the dialogue container.
    pub fn container(&self) -> AssetPath {
        self.graph_folder.join(&self.graph)
    }

    /// Folder of one group, including all of its dialogues.
    pub fn group_folder(&self, group: &str) -> AssetPath {
        self.graph_folder.join(GROUPS_FOLDER).join(group)
    }

    /// Path of one group entity.
    pub fn group_entity(&self, group: &str) -> AssetPath {
        self.group_folder(group).join(group)
    }

    /// Folder of the ungrouped bucket.
    pub fn global_folder(&self) -> AssetPath {
        self.graph_folder.join(GLOBAL_FOLDER)
    }

    /// Path of one dialogue entity.
    pub fn dialogue(&self, entity: &EntityRef) -> AssetPath {
        let bucket = match entity.group() {
            Some(group) => self.group_folder(group),
            None => self.global_folder(),
        };
        bucket.join(DIALOGUES_FOLDER).join(entity.name())
    }
}
