//! Saving a graph snapshot.
//!
//! [`SaveCoordinator::prepare`] turns a [`GraphSnapshot`] into a
//! [`PreparedSave`] without touching the store:
//!
//! 1. Pass 1 materializes every group, then every node, binding each id to
//!    what it became. Choice targets stay unresolved, so a choice may point
//!    at a node that comes later in the snapshot.
//! 2. Pass 2 resolves every choice target and links the dialogues. The
//!    resulting choice graph decides which dialogues are starting ones.
//! 3. The new key sets are reconciled against the previous document's
//!    baselines to find stale artifacts.
//!
//! Any validation failure returns early, and since nothing was written the
//! previous document stays exactly as it was. [`PreparedSave::commit`] then
//! applies the buffered changeset, rolling it back if the store fails.

use indexmap::IndexMap;
use log::{debug, info, warn};

use colloquy_core::{
    identifier::{ElementId, validate_name},
    record::{
        Baselines, ContainerEntity, DialogueEntity, DialogueGraphDocument, EntityRef,
        GroupEntity, GroupRecord, NodeRecord,
    },
    resolver::IdentityResolver,
    snapshot::GraphSnapshot,
};

use crate::{
    changeset::{Changeset, Removal},
    error::{ColloquyError, ReferenceKind},
    layout::{AssetLayout, AssetPath},
    reconcile::reconcile,
    store::AssetStore,
    structure::ChoiceGraph,
};

/// Outcome of a committed save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveReport {
    written: Vec<AssetPath>,
    removed: Vec<AssetPath>,
    duplicates: Vec<AssetPath>,
    starting_dialogues: Vec<EntityRef>,
    unreachable_dialogues: Vec<EntityRef>,
}

impl SaveReport {
    /// Paths written, the graph document last.
    pub fn written(&self) -> &[AssetPath] {
        &self.written
    }

    /// Stale entities and group folders that were actually deleted.
    pub fn removed(&self) -> &[AssetPath] {
        &self.removed
    }

    /// Entity paths more than one element was saved to.
    pub fn duplicates(&self) -> &[AssetPath] {
        &self.duplicates
    }

    /// Dialogues no choice leads to, sorted.
    pub fn starting_dialogues(&self) -> &[EntityRef] {
        &self.starting_dialogues
    }

    /// Dialogues no starting dialogue can reach, sorted.
    pub fn unreachable_dialogues(&self) -> &[EntityRef] {
        &self.unreachable_dialogues
    }
}

/// A fully validated save that has not been written yet.
#[derive(Debug)]
pub struct PreparedSave {
    changeset: Changeset,
    document: DialogueGraphDocument,
    duplicates: Vec<AssetPath>,
    starting_dialogues: Vec<EntityRef>,
    unreachable_dialogues: Vec<EntityRef>,
}

impl PreparedSave {
    /// The document as it will be persisted, ids assigned.
    pub fn document(&self) -> &DialogueGraphDocument {
        &self.document
    }

    /// Entity paths that will be written, in order. The document comes after.
    pub fn writes(&self) -> impl Iterator<Item = &AssetPath> {
        self.changeset.writes()
    }

    /// Removals that will be applied.
    pub fn removals(&self) -> &[Removal] {
        self.changeset.removals()
    }

    /// Entity paths more than one element maps to.
    pub fn duplicates(&self) -> impl Iterator<Item = &AssetPath> {
        self.duplicates.iter().chain(self.changeset.duplicates())
    }

    pub fn starting_dialogues(&self) -> &[EntityRef] {
        &self.starting_dialogues
    }

    pub fn unreachable_dialogues(&self) -> &[EntityRef] {
        &self.unreachable_dialogues
    }

    /// Writes entities, removes stale artifacts, then writes the document.
    ///
    /// # Errors
    ///
    /// Returns [`ColloquyError::Storage`] on the first store failure. Every
    /// asset touched before it is restored, so the store is left as it was.
    pub fn commit<S: AssetStore + ?Sized>(self, store: &mut S) -> Result<SaveReport, ColloquyError> {
        let mut duplicates = self.duplicates;
        duplicates.extend(self.changeset.duplicates().iter().cloned());

        let summary = self.changeset.commit(store)?;

        info!(
            graph = self.document.file_name(),
            written = summary.written.len(),
            removed = summary.removed.len();
            "Graph saved"
        );

        Ok(SaveReport {
            written: summary.written,
            removed: summary.removed,
            duplicates,
            starting_dialogues: self.starting_dialogues,
            unreachable_dialogues: self.unreachable_dialogues,
        })
    }
}

/// Returns `id`, or a fresh one if it is still empty.
fn assign_id(id: &ElementId) -> ElementId {
    if id.is_assigned() {
        return id.clone();
    }
    let id = ElementId::generate();
    debug!(id = id.as_str(); "Assigned id to new element");
    id
}

/// A materialized dialogue and the snapshot node it came from.
#[derive(Debug)]
struct Materialized {
    node_index: usize,
    entity: DialogueEntity,
}

/// Plans the save of one graph.
#[derive(Debug)]
pub struct SaveCoordinator<'a> {
    layout: &'a AssetLayout,
    pretty: bool,
}

impl<'a> SaveCoordinator<'a> {
    pub fn new(layout: &'a AssetLayout, pretty: bool) -> Self {
        Self { layout, pretty }
    }

    /// Validates `snapshot` and plans everything a save of it writes and
    /// removes.
    ///
    /// `previous` is the graph's current document, if it was saved before.
    ///
    /// # Errors
    ///
    /// - [`ColloquyError::InvalidName`] if a group or node name cannot be a
    ///   path segment.
    /// - [`ColloquyError::DanglingReference`] if a node's group or a choice's
    ///   target does not exist in the snapshot.
    /// - [`ColloquyError::Encoding`] if a record cannot be encoded.
    pub fn prepare(
        &self,
        snapshot: &GraphSnapshot,
        previous: Option<&DialogueGraphDocument>,
    ) -> Result<PreparedSave, ColloquyError> {
        let layout = self.layout;
        info!(
            graph = layout.graph(),
            groups = snapshot.groups().len(),
            nodes = snapshot.nodes().len();
            "Saving graph"
        );

        let mut changeset = Changeset::new(self.pretty);
        let mut current = Baselines::default();
        let mut container = ContainerEntity::new(layout.graph());
        let mut duplicates = Vec::new();

        // Pass 1: groups
        let mut groups: IdentityResolver<String> = IdentityResolver::new();
        let mut group_records = Vec::with_capacity(snapshot.groups().len());

        for group in snapshot.groups() {
            let name = group.name();
            validate_name(name).map_err(|err| ColloquyError::invalid_name("group", err))?;

            let id = assign_id(group.id());
            if let Some(replaced) = groups.bind(id.clone(), name.to_string()) {
                warn!(id = id.as_str(), replaced = replaced.as_str(); "Duplicate group id");
            }

            changeset.stage(layout.group_entity(name), &GroupEntity::new(name))?;
            container.add_group(name);
            current.group_names.insert(name.to_string());
            current.grouped_node_names.entry(name.to_string()).or_default();
            group_records.push(GroupRecord::from_snapshot(group, id));
        }

        // Pass 1: nodes, choice targets left unresolved
        let mut nodes: IdentityResolver<EntityRef> = IdentityResolver::new();
        let mut dialogues: IndexMap<EntityRef, Materialized> = IndexMap::new();
        let mut node_records = Vec::with_capacity(snapshot.nodes().len());

        for (node_index, node) in snapshot.nodes().iter().enumerate() {
            let name = node.name();
            validate_name(name).map_err(|err| ColloquyError::invalid_name("node", err))?;

            let id = assign_id(node.id());
            let entity_ref = match node.group_id() {
                Some(group_id) => {
                    let group = groups.resolve(group_id).map_err(|err| {
                        ColloquyError::dangling(ReferenceKind::Group, err.into_id(), name)
                    })?;
                    current
                        .grouped_node_names
                        .entry(group.clone())
                        .or_default()
                        .insert(name.to_string());
                    EntityRef::grouped(group.as_str(), name)
                }
                None => {
                    current.ungrouped_node_names.insert(name.to_string());
                    EntityRef::ungrouped(name)
                }
            };

            if nodes.bind(id.clone(), entity_ref.clone()).is_some() {
                warn!(id = id.as_str(); "Duplicate node id");
            }

            let materialized = Materialized {
                node_index,
                entity: DialogueEntity::from_snapshot(node),
            };
            if dialogues.insert(entity_ref.clone(), materialized).is_some() {
                let path = layout.dialogue(&entity_ref);
                warn!(path = path.as_str(); "Duplicate entity key, last writer wins");
                duplicates.push(path);
            }

            node_records.push(NodeRecord::from_snapshot(node, id, node.group_id().cloned()));
        }

        // Pass 2: choices. Every node is checked, including ones a later
        // duplicate replaced, since their records still go into the document.
        let mut links: Vec<Vec<Option<EntityRef>>> = Vec::with_capacity(snapshot.nodes().len());
        for node in snapshot.nodes() {
            let targets = node
                .choices()
                .iter()
                .map(|choice| match choice.target() {
                    Some(target) => nodes.resolve(target).cloned().map(Some).map_err(|err| {
                        ColloquyError::dangling(ReferenceKind::Choice, err.into_id(), node.name())
                    }),
                    None => Ok(None),
                })
                .collect::<Result<Vec<_>, _>>()?;
            links.push(targets);
        }

        let mut graph = ChoiceGraph::new();
        for entity_ref in dialogues.keys() {
            graph.add_node(entity_ref.clone());
        }

        for (entity_ref, materialized) in dialogues.iter_mut() {
            for (slot, next) in links[materialized.node_index].iter().enumerate() {
                let Some(next) = next else {
                    continue;
                };
                materialized.entity.link_choice(slot, next.clone());
                graph.add_edge(entity_ref, next);
            }
        }

        let mut starting_dialogues = Vec::new();
        for (entity_ref, materialized) in dialogues.iter_mut() {
            let starting = graph.is_root(entity_ref);
            materialized.entity.set_starting_dialogue(starting);
            if starting {
                starting_dialogues.push(entity_ref.clone());
            }
        }
        starting_dialogues.sort();

        let mut unreachable_dialogues: Vec<EntityRef> =
            graph.unreachable().into_iter().cloned().collect();
        unreachable_dialogues.sort();
        if !unreachable_dialogues.is_empty() {
            warn!(count = unreachable_dialogues.len(); "Dialogues unreachable from any starting dialogue");
        }
        debug!(
            dialogues = graph.nodes_count(),
            choices = graph.edges_count(),
            starting = starting_dialogues.len();
            "Choices resolved"
        );

        // Reconciliation
        let empty = Baselines::default();
        let previous_baselines = previous.map_or(&empty, DialogueGraphDocument::baselines);
        let (removals, baselines) = reconcile(layout, previous_baselines, current).into_parts();
        for removal in removals {
            debug!(path = removal.path().as_str(); "Stale artifact");
            changeset.stage_removal(removal);
        }

        for (entity_ref, materialized) in &dialogues {
            changeset.stage(layout.dialogue(entity_ref), &materialized.entity)?;
            container.add_dialogue(entity_ref);
        }
        changeset.stage(layout.container(), &container)?;

        let mut document = DialogueGraphDocument::new(layout.graph());
        document.set_contents(group_records, node_records);
        document.set_baselines(baselines);
        changeset.stage_document(layout.document().clone(), &document)?;

        Ok(PreparedSave {
            changeset,
            document,
            duplicates,
            starting_dialogues,
            unreachable_dialogues,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use colloquy_core::{
        payload::NodeKind,
        snapshot::{ChoiceSnapshot, GroupSnapshot, NodeSnapshot},
    };

    use crate::config::LayoutConfig;

    fn layout() -> AssetLayout {
        AssetLayout::new(&LayoutConfig::new("G", "D"), "Q").unwrap()
    }

    fn node(id: &str, name: &str) -> NodeSnapshot {
        NodeSnapshot::new(id, name, NodeKind::SingleChoice)
    }

    #[test]
    fn test_forward_reference_resolves() {
        let snapshot = GraphSnapshot::new()
            .with_node(node("n1", "First").with_choice(ChoiceSnapshot::new("go").with_target("n2")))
            .with_node(node("n2", "Second"));

        let layout = layout();
        let prepared = SaveCoordinator::new(&layout, false)
            .prepare(&snapshot, None)
            .unwrap();

        assert_eq!(
            prepared.starting_dialogues(),
            &[EntityRef::ungrouped("First")]
        );
        assert!(prepared.unreachable_dialogues().is_empty());
        assert!(prepared.removals().is_empty());
    }

    #[test]
    fn test_dangling_choice_is_rejected() {
        let snapshot = GraphSnapshot::new()
            .with_node(node("n1", "First").with_choice(ChoiceSnapshot::new("go").with_target("n9")));

        let layout = layout();
        let err = SaveCoordinator::new(&layout, false)
            .prepare(&snapshot, None)
            .unwrap_err();

        match err {
            ColloquyError::DanglingReference { kind, id, owner } => {
                assert_eq!(kind, ReferenceKind::Choice);
                assert_eq!(id, ElementId::new("n9"));
                assert_eq!(owner, "First");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_dangling_group_is_rejected() {
        let snapshot = GraphSnapshot::new().with_node(node("n1", "First").with_group("g9"));

        let layout = layout();
        let err = SaveCoordinator::new(&layout, false)
            .prepare(&snapshot, None)
            .unwrap_err();

        assert!(matches!(
            err,
            ColloquyError::DanglingReference {
                kind: ReferenceKind::Group,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_node_name_is_rejected() {
        let snapshot = GraphSnapshot::new().with_node(node("n1", "../escape"));

        let layout = layout();
        let err = SaveCoordinator::new(&layout, false)
            .prepare(&snapshot, None)
            .unwrap_err();

        assert!(matches!(err, ColloquyError::InvalidName { what: "node", .. }));
    }

    #[test]
    fn test_empty_ids_are_assigned() {
        let snapshot = GraphSnapshot::new()
            .with_group(GroupSnapshot::new("", "Inn"))
            .with_node(node("", "Lonely"));

        let layout = layout();
        let prepared = SaveCoordinator::new(&layout, false)
            .prepare(&snapshot, None)
            .unwrap();

        let document = prepared.document();
        assert!(document.groups()[0].id().is_assigned());
        assert!(document.nodes()[0].id().is_assigned());
        assert_ne!(document.groups()[0].id(), document.nodes()[0].id());
    }

    #[test]
    fn test_duplicate_names_are_reported() {
        let snapshot = GraphSnapshot::new()
            .with_group(GroupSnapshot::new("g1", "Inn"))
            .with_group(GroupSnapshot::new("g2", "Inn"))
            .with_node(node("n1", "Same").with_text("first"))
            .with_node(node("n2", "Same").with_text("second"));

        let layout = layout();
        let prepared = SaveCoordinator::new(&layout, false)
            .prepare(&snapshot, None)
            .unwrap();

        let duplicates: Vec<&str> = prepared.duplicates().map(AssetPath::as_str).collect();
        assert_eq!(
            duplicates,
            vec!["D/Q/Global/Dialogues/Same", "D/Q/Groups/Inn/Inn"]
        );
        // Both records survive in the document.
        assert_eq!(prepared.document().nodes().len(), 2);
    }

    #[test]
    fn test_replaced_duplicate_is_still_checked() {
        let snapshot = GraphSnapshot::new()
            .with_node(node("n1", "Same").with_choice(ChoiceSnapshot::new("go").with_target("n9")))
            .with_node(node("n2", "Same"));

        let layout = layout();
        let err = SaveCoordinator::new(&layout, false)
            .prepare(&snapshot, None)
            .unwrap_err();

        match err {
            ColloquyError::DanglingReference { kind, id, .. } => {
                assert_eq!(kind, ReferenceKind::Choice);
                assert_eq!(id, ElementId::new("n9"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_self_loop_is_not_starting() {
        let snapshot = GraphSnapshot::new()
            .with_node(node("n1", "Loop").with_choice(ChoiceSnapshot::new("again").with_target("n1")));

        let layout = layout();
        let prepared = SaveCoordinator::new(&layout, false)
            .prepare(&snapshot, None)
            .unwrap();

        assert!(prepared.starting_dialogues().is_empty());
        assert_eq!(
            prepared.unreachable_dialogues(),
            &[EntityRef::ungrouped("Loop")]
        );
    }

    #[test]
    fn test_writes_end_with_container() {
        let snapshot = GraphSnapshot::new()
            .with_group(GroupSnapshot::new("g1", "Inn"))
            .with_node(node("n1", "Hello").with_group("g1"));

        let layout = layout();
        let prepared = SaveCoordinator::new(&layout, false)
            .prepare(&snapshot, None)
            .unwrap();

        let writes: Vec<&str> = prepared.writes().map(AssetPath::as_str).collect();
        assert_eq!(
            writes,
            vec![
                "D/Q/Groups/Inn/Inn",
                "D/Q/Groups/Inn/Dialogues/Hello",
                "D/Q/Q"
            ]
        );
    }
}
