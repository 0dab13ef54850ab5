//! Persisted record types.
//!
//! Two persisted forms exist for every graph:
//!
//! - The **graph document** ([`DialogueGraphDocument`]) mirrors the editor's
//!   view: groups and nodes addressed by [`ElementId`], choice targets kept as
//!   ids, plus the diff baselines of the last successful save. It is what a
//!   load reads back.
//! - The **materialized entities** ([`GroupEntity`], [`DialogueEntity`],
//!   [`ContainerEntity`]) are name-keyed records a runtime consumes. Choices
//!   point at other dialogues by [`EntityRef`], never by id.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    geometry::Position,
    identifier::ElementId,
    payload::NodeKind,
    snapshot::{ChoiceSnapshot, GroupSnapshot, NodeSnapshot},
};

// =============================================================================
// Graph document records
// =============================================================================

/// A persisted group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    id: ElementId,
    name: String,
    position: Position,
}

impl GroupRecord {
    /// Builds a record from a snapshot group and the id it is saved under.
    pub fn from_snapshot(group: &GroupSnapshot, id: ElementId) -> Self {
        Self {
            id,
            name: group.name().to_string(),
            position: group.position(),
        }
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Position {
        self.position
    }
}

/// A persisted choice. The target is still an unresolved node id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceRecord {
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_node_id: Option<ElementId>,
}

impl ChoiceRecord {
    pub fn new(text: impl Into<String>, target_node_id: Option<ElementId>) -> Self {
        Self {
            text: text.into(),
            target_node_id,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the target node id; empty ids count as no target.
    pub fn target(&self) -> Option<&ElementId> {
        self.target_node_id.as_ref().filter(|id| id.is_assigned())
    }
}

impl From<&ChoiceSnapshot> for ChoiceRecord {
    fn from(choice: &ChoiceSnapshot) -> Self {
        Self::new(choice.text(), choice.target().cloned())
    }
}

/// A persisted node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    id: ElementId,
    name: String,
    #[serde(default)]
    text: String,
    #[serde(flatten)]
    kind: NodeKind,
    #[serde(default)]
    choices: Vec<ChoiceRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group_id: Option<ElementId>,
    position: Position,
}

impl NodeRecord {
    /// Builds a record from a snapshot node, the id it is saved under and the
    /// (already assigned) id of its group.
    pub fn from_snapshot(node: &NodeSnapshot, id: ElementId, group_id: Option<ElementId>) -> Self {
        Self {
            id,
            name: node.name().to_string(),
            text: node.text().to_string(),
            kind: node.kind().clone(),
            choices: node.choices().iter().map(ChoiceRecord::from).collect(),
            group_id,
            position: node.position(),
        }
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn choices(&self) -> &[ChoiceRecord] {
        &self.choices
    }

    /// Returns the owning group's id; empty ids count as ungrouped.
    pub fn group_id(&self) -> Option<&ElementId> {
        self.group_id.as_ref().filter(|id| id.is_assigned())
    }

    pub fn position(&self) -> Position {
        self.position
    }
}

/// Key sets recorded by the last successful save.
///
/// A save compares these against the keys of the snapshot it is writing to
/// find artifacts that no longer have an element behind them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baselines {
    #[serde(default)]
    pub group_names: BTreeSet<String>,
    #[serde(default)]
    pub grouped_node_names: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    pub ungrouped_node_names: BTreeSet<String>,
}

impl Baselines {
    /// Returns `true` if no keys are recorded at all.
    pub fn is_empty(&self) -> bool {
        self.group_names.is_empty()
            && self.grouped_node_names.is_empty()
            && self.ungrouped_node_names.is_empty()
    }
}

/// The persisted editor-side document of one named graph.
///
/// There is exactly one document per graph. Every save rewrites its group and
/// node lists from the snapshot and replaces its [`Baselines`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogueGraphDocument {
    file_name: String,
    #[serde(default)]
    groups: Vec<GroupRecord>,
    #[serde(default)]
    nodes: Vec<NodeRecord>,
    #[serde(default)]
    baselines: Baselines,
}

impl DialogueGraphDocument {
    /// Creates an empty document for the named graph.
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Self::default()
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn groups(&self) -> &[GroupRecord] {
        &self.groups
    }

    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn baselines(&self) -> &Baselines {
        &self.baselines
    }

    /// Replaces the group and node lists, keeping the baselines untouched.
    pub fn set_contents(&mut self, groups: Vec<GroupRecord>, nodes: Vec<NodeRecord>) {
        self.groups = groups;
        self.nodes = nodes;
    }

    /// Replaces the baselines.
    pub fn set_baselines(&mut self, baselines: Baselines) {
        self.baselines = baselines;
    }
}

// =============================================================================
// Materialized entities
// =============================================================================

/// Identity of a materialized dialogue: its bucket and its name.
///
/// This is a reference by identity only. Holding an `EntityRef` does not
/// imply ownership, and references may form cycles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    group: Option<String>,
    name: String,
}

impl EntityRef {
    /// A dialogue stored under the named group.
    pub fn grouped(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: Some(group.into()),
            name: name.into(),
        }
    }

    /// A dialogue stored in the ungrouped bucket.
    pub fn ungrouped(name: impl Into<String>) -> Self {
        Self {
            group: None,
            name: name.into(),
        }
    }

    /// Returns the group name, or `None` for the ungrouped bucket.
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The materialized form of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEntity {
    name: String,
}

impl GroupEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A choice whose target has been resolved to another dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedChoice {
    text: String,
    #[serde(default)]
    next_dialogue: Option<EntityRef>,
}

impl ResolvedChoice {
    /// Creates a choice that leads nowhere yet.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            next_dialogue: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn next_dialogue(&self) -> Option<&EntityRef> {
        self.next_dialogue.as_ref()
    }
}

/// The materialized form of a dialogue node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueEntity {
    name: String,
    #[serde(default)]
    text: String,
    #[serde(flatten)]
    kind: NodeKind,
    #[serde(default)]
    is_starting_dialogue: bool,
    #[serde(default)]
    choices: Vec<ResolvedChoice>,
}

impl DialogueEntity {
    /// Materializes a snapshot node. Choice targets are left unresolved.
    pub fn from_snapshot(node: &NodeSnapshot) -> Self {
        Self {
            name: node.name().to_string(),
            text: node.text().to_string(),
            kind: node.kind().clone(),
            is_starting_dialogue: false,
            choices: node
                .choices()
                .iter()
                .map(|choice| ResolvedChoice::new(choice.text()))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_starting_dialogue(&self) -> bool {
        self.is_starting_dialogue
    }

    pub fn choices(&self) -> &[ResolvedChoice] {
        &self.choices
    }

    /// Marks whether no choice anywhere in the graph leads to this dialogue.
    pub fn set_starting_dialogue(&mut self, starting: bool) {
        self.is_starting_dialogue = starting;
    }

    /// Points the choice at `slot` to `next`.
    ///
    /// Returns `false` if the dialogue has no such slot.
    pub fn link_choice(&mut self, slot: usize, next: EntityRef) -> bool {
        match self.choices.get_mut(slot) {
            Some(choice) => {
                choice.next_dialogue = Some(next);
                true
            }
            None => false,
        }
    }
}

/// Per-graph index of every materialized dialogue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerEntity {
    file_name: String,
    #[serde(default)]
    groups: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    ungrouped: Vec<String>,
}

impl ContainerEntity {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Self::default()
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Registers a group, even if it ends up holding no dialogues.
    pub fn add_group(&mut self, group: impl Into<String>) {
        self.groups.entry(group.into()).or_default();
    }

    /// Registers a dialogue under its bucket.
    pub fn add_dialogue(&mut self, entity: &EntityRef) {
        match entity.group() {
            Some(group) => self
                .groups
                .entry(group.to_string())
                .or_default()
                .push(entity.name().to_string()),
            None => self.ungrouped.push(entity.name().to_string()),
        }
    }

    /// Returns the group names in sorted order.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Returns the dialogues of one group, or `None` if the group is unknown.
    pub fn group_dialogues(&self, group: &str) -> Option<impl Iterator<Item = EntityRef> + '_> {
        self.groups.get_key_value(group).map(|(group, names)| {
            names
                .iter()
                .map(move |name| EntityRef::grouped(group.as_str(), name.as_str()))
        })
    }

    /// Returns the ungrouped dialogues.
    pub fn ungrouped_dialogues(&self) -> impl Iterator<Item = EntityRef> + '_ {
        self.ungrouped
            .iter()
            .map(|name| EntityRef::ungrouped(name.as_str()))
    }

    /// Returns every dialogue, grouped ones first.
    pub fn all_dialogues(&self) -> impl Iterator<Item = EntityRef> + '_ {
        self.groups
            .iter()
            .flat_map(|(group, names)| {
                names
                    .iter()
                    .map(move |name| EntityRef::grouped(group.as_str(), name.as_str()))
            })
            .chain(self.ungrouped_dialogues())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::PayloadRef;

    fn sample_node() -> NodeSnapshot {
        NodeSnapshot::new("n1", "Greeting", NodeKind::Event(PayloadRef::new("Ev", "e/1")))
            .with_text("Hello there")
            .with_group("g1")
            .with_choice(ChoiceSnapshot::new("Hi").with_target("n2"))
            .with_choice(ChoiceSnapshot::new("Bye"))
    }

    #[test]
    fn test_node_record_keeps_unresolved_targets() {
        let record = NodeRecord::from_snapshot(
            &sample_node(),
            ElementId::new("n1"),
            Some(ElementId::new("g1")),
        );

        assert_eq!(record.name(), "Greeting");
        assert_eq!(record.kind().payload_type(), Some("Ev"));
        assert_eq!(record.choices()[0].target(), Some(&ElementId::new("n2")));
        assert_eq!(record.choices()[1].target(), None);
        assert_eq!(record.group_id(), Some(&ElementId::new("g1")));
    }

    #[test]
    fn test_dialogue_entity_starts_unlinked() {
        let mut entity = DialogueEntity::from_snapshot(&sample_node());

        assert_eq!(entity.choices().len(), 2);
        assert!(entity.choices().iter().all(|c| c.next_dialogue().is_none()));

        assert!(entity.link_choice(0, EntityRef::ungrouped("Reply")));
        assert!(!entity.link_choice(5, EntityRef::ungrouped("Reply")));
        assert_eq!(
            entity.choices()[0].next_dialogue(),
            Some(&EntityRef::ungrouped("Reply"))
        );
    }

    #[test]
    fn test_node_record_json_round_trip() {
        let record = NodeRecord::from_snapshot(&sample_node(), ElementId::new("n1"), None);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["kind"], "event");
        assert_eq!(json["payload"]["type_name"], "Ev");
        assert!(json.get("group_id").is_none());

        let back: NodeRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_document_defaults_missing_baselines() {
        let json = r#"{ "file_name": "Quest" }"#;
        let document: DialogueGraphDocument = serde_json::from_str(json).unwrap();

        assert_eq!(document.file_name(), "Quest");
        assert!(document.groups().is_empty());
        assert!(document.baselines().is_empty());
    }

    #[test]
    fn test_container_lists_groups_then_ungrouped() {
        let mut container = ContainerEntity::new("Quest");
        container.add_group("Empty");
        container.add_dialogue(&EntityRef::grouped("Inn", "Hello"));
        container.add_dialogue(&EntityRef::ungrouped("Narrator"));

        let names: Vec<&str> = container.group_names().collect();
        assert_eq!(names, vec!["Empty", "Inn"]);
        assert_eq!(container.group_dialogues("Empty").unwrap().count(), 0);
        assert!(container.group_dialogues("Missing").is_none());

        let all: Vec<EntityRef> = container.all_dialogues().collect();
        assert_eq!(
            all,
            vec![
                EntityRef::grouped("Inn", "Hello"),
                EntityRef::ungrouped("Narrator")
            ]
        );
    }
}
