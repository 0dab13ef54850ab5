//! The editor's view of a dialogue graph.
//!
//! A [`GraphSnapshot`] is what the editing surface hands to the engine when a
//! graph is saved, and what a snapshot-building factory produces when a graph
//! is loaded back. It is a read-only value: the engine never keeps a snapshot
//! past the call it was given to.

use serde::{Deserialize, Serialize};

use crate::{geometry::Position, identifier::ElementId, payload::NodeKind};

/// A named cluster of nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    #[serde(default)]
    id: ElementId,
    name: String,
    #[serde(default)]
    position: Position,
}

impl GroupSnapshot {
    /// Creates a group snapshot at the origin.
    pub fn new(id: impl Into<ElementId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position: Position::default(),
        }
    }

    /// Sets the position (builder style).
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Returns the group's id. Empty for groups that were never saved.
    pub fn id(&self) -> &ElementId {
        &self.id
    }

    /// Returns the group's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the group's position.
    pub fn position(&self) -> Position {
        self.position
    }
}

/// One outgoing choice of a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoiceSnapshot {
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_node_id: Option<ElementId>,
}

impl ChoiceSnapshot {
    /// Creates a choice with no outgoing edge.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target_node_id: None,
        }
    }

    /// Sets the target node (builder style).
    pub fn with_target(mut self, target: impl Into<ElementId>) -> Self {
        self.target_node_id = Some(target.into());
        self
    }

    /// Returns the choice text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the id of the node this choice leads to.
    ///
    /// An empty id counts as no target.
    pub fn target(&self) -> Option<&ElementId> {
        self.target_node_id.as_ref().filter(|id| id.is_assigned())
    }

    /// Replaces the target node.
    pub fn set_target(&mut self, target: Option<ElementId>) {
        self.target_node_id = target;
    }
}

/// A dialogue node as seen by the editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    #[serde(default)]
    id: ElementId,
    name: String,
    #[serde(default)]
    text: String,
    #[serde(flatten)]
    kind: NodeKind,
    #[serde(default)]
    choices: Vec<ChoiceSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group_id: Option<ElementId>,
    #[serde(default)]
    position: Position,
}

impl NodeSnapshot {
    /// Creates an ungrouped node with no text and no choices.
    pub fn new(id: impl Into<ElementId>, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            ..Self::default()
        }
    }

    /// Sets the dialogue text (builder style).
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Appends a choice (builder style).
    pub fn with_choice(mut self, choice: ChoiceSnapshot) -> Self {
        self.choices.push(choice);
        self
    }

    /// Places the node into a group (builder style).
    pub fn with_group(mut self, group_id: impl Into<ElementId>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Sets the position (builder style).
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Returns the node's id. Empty for nodes that were never saved.
    pub fn id(&self) -> &ElementId {
        &self.id
    }

    /// Returns the node's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the dialogue text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the node kind, including its payload when it has one.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns the node's choices in slot order.
    pub fn choices(&self) -> &[ChoiceSnapshot] {
        &self.choices
    }

    /// Returns the choice at `slot` for editing.
    pub fn choice_mut(&mut self, slot: usize) -> Option<&mut ChoiceSnapshot> {
        self.choices.get_mut(slot)
    }

    /// Moves the node into a group, or out of any group with `None`.
    pub fn set_group(&mut self, group_id: Option<ElementId>) {
        self.group_id = group_id;
    }

    /// Returns the id of the group the node belongs to, if any.
    ///
    /// An empty id counts as ungrouped.
    pub fn group_id(&self) -> Option<&ElementId> {
        self.group_id.as_ref().filter(|id| id.is_assigned())
    }

    /// Returns the node's position.
    pub fn position(&self) -> Position {
        self.position
    }
}

/// A complete, unordered view of one dialogue graph.
///
/// # Examples
///
/// ```
/// use colloquy_core::payload::NodeKind;
/// use colloquy_core::snapshot::{ChoiceSnapshot, GraphSnapshot, GroupSnapshot, NodeSnapshot};
///
/// let snapshot = GraphSnapshot::new()
///     .with_group(GroupSnapshot::new("g1", "Tavern"))
///     .with_node(
///         NodeSnapshot::new("n1", "Greeting", NodeKind::SingleChoice)
///             .with_text("Welcome!")
///             .with_group("g1")
///             .with_choice(ChoiceSnapshot::new("Hello").with_target("n2")),
///     )
///     .with_node(NodeSnapshot::new("n2", "Reply", NodeKind::SingleChoice));
///
/// assert_eq!(snapshot.groups().len(), 1);
/// assert_eq!(snapshot.nodes().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    groups: Vec<GroupSnapshot>,
    #[serde(default)]
    nodes: Vec<NodeSnapshot>,
}

impl GraphSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a group (builder style).
    pub fn with_group(mut self, group: GroupSnapshot) -> Self {
        self.groups.push(group);
        self
    }

    /// Adds a node (builder style).
    pub fn with_node(mut self, node: NodeSnapshot) -> Self {
        self.nodes.push(node);
        self
    }

    /// Adds a group.
    pub fn add_group(&mut self, group: GroupSnapshot) {
        self.groups.push(group);
    }

    /// Adds a node.
    pub fn add_node(&mut self, node: NodeSnapshot) {
        self.nodes.push(node);
    }

    /// Returns all groups.
    pub fn groups(&self) -> &[GroupSnapshot] {
        &self.groups
    }

    /// Returns all nodes.
    pub fn nodes(&self) -> &[NodeSnapshot] {
        &self.nodes
    }

    /// Returns mutable access to the nodes.
    pub fn nodes_mut(&mut self) -> &mut Vec<NodeSnapshot> {
        &mut self.nodes
    }

    /// Returns mutable access to the groups.
    pub fn groups_mut(&mut self) -> &mut Vec<GroupSnapshot> {
        &mut self.groups
    }

    /// Returns `true` if the snapshot has neither groups nor nodes.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.nodes.is_empty()
    }
}
