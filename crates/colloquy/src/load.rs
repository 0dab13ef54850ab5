//! Rebuilding a graph from its persisted document.
//!
//! Loading mirrors saving. Pass 1 asks the [`GraphFactory`] to create every
//! group and node and binds each record's id to the handle it got back.
//! Pass 2 walks every choice that has a target and asks the factory to
//! connect the two handles.
//!
//! Loading is best-effort: if pass 2 hits a dangling target, the elements
//! already created stay with the factory. Nothing persisted is touched.

use log::{debug, info};

use colloquy_core::{
    geometry::Position,
    identifier::ElementId,
    payload::NodeKind,
    record::{DialogueGraphDocument, NodeRecord},
    resolver::IdentityResolver,
};

use crate::error::{ColloquyError, ReferenceKind};

/// Everything the factory needs to create one group.
#[derive(Debug, Clone, Copy)]
pub struct GroupTemplate<'a> {
    pub id: &'a ElementId,
    pub name: &'a str,
    pub position: Position,
}

/// Everything the factory needs to create one node.
#[derive(Debug, Clone)]
pub struct NodeTemplate<'a> {
    pub id: &'a ElementId,
    pub name: &'a str,
    pub text: &'a str,
    pub kind: &'a NodeKind,
    /// Declared payload type for `Event` and `Audio` nodes.
    pub payload_type: Option<&'a str>,
    /// Choice texts, one per output port, in slot order.
    pub choices: Vec<&'a str>,
    pub position: Position,
}

impl<'a> NodeTemplate<'a> {
    fn from_record(record: &'a NodeRecord) -> Self {
        let payload_type = match record.kind() {
            NodeKind::SingleChoice | NodeKind::MultipleChoice => None,
            NodeKind::Event(payload) | NodeKind::Audio(payload) => Some(payload.type_name()),
        };

        Self {
            id: record.id(),
            name: record.name(),
            text: record.text(),
            kind: record.kind(),
            payload_type,
            choices: record.choices().iter().map(|choice| choice.text()).collect(),
            position: record.position(),
        }
    }
}

/// The editing surface a graph is loaded into.
pub trait GraphFactory {
    /// Handle to a created group.
    type Group;
    /// Handle to a created node.
    type Node;

    fn create_group(&mut self, template: GroupTemplate<'_>) -> Self::Group;

    fn create_node(&mut self, template: NodeTemplate<'_>) -> Self::Node;

    fn attach_to_group(&mut self, node: &Self::Node, group: &Self::Group);

    /// Connects choice `slot` of `source` to `target`.
    fn connect(&mut self, source: &Self::Node, slot: usize, target: &Self::Node);
}

/// Counts of what a load created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub groups: usize,
    pub nodes: usize,
    pub connections: usize,
}

/// Replays one document into a [`GraphFactory`].
pub struct LoadCoordinator<'f, F: GraphFactory> {
    factory: &'f mut F,
}

impl<'f, F: GraphFactory> LoadCoordinator<'f, F> {
    pub fn new(factory: &'f mut F) -> Self {
        Self { factory }
    }

    /// Creates every element of `document` and connects the choices.
    ///
    /// # Errors
    ///
    /// Returns [`ColloquyError::DanglingReference`] for a group id or choice
    /// target that no record carries.
    pub fn run(self, document: &DialogueGraphDocument) -> Result<LoadReport, ColloquyError> {
        info!(
            graph = document.file_name(),
            groups = document.groups().len(),
            nodes = document.nodes().len();
            "Loading graph"
        );

        let mut report = LoadReport::default();

        // Pass 1: groups
        let mut groups: IdentityResolver<F::Group> = IdentityResolver::new();
        for record in document.groups() {
            let handle = self.factory.create_group(GroupTemplate {
                id: record.id(),
                name: record.name(),
                position: record.position(),
            });
            groups.bind(record.id().clone(), handle);
            report.groups += 1;
        }

        // Pass 1: nodes
        let mut nodes: IdentityResolver<F::Node> = IdentityResolver::new();
        for record in document.nodes() {
            debug!(name = record.name(), kind = record.kind().label(); "Creating node");
            let handle = self.factory.create_node(NodeTemplate::from_record(record));

            if let Some(group_id) = record.group_id() {
                let group = groups.resolve(group_id).map_err(|err| {
                    ColloquyError::dangling(ReferenceKind::Group, err.into_id(), record.name())
                })?;
                self.factory.attach_to_group(&handle, group);
            }

            nodes.bind(record.id().clone(), handle);
            report.nodes += 1;
        }

        // Pass 2: edges
        for record in document.nodes() {
            let source = nodes.resolve(record.id()).map_err(|err| {
                ColloquyError::dangling(ReferenceKind::Choice, err.into_id(), record.name())
            })?;

            for (slot, choice) in record.choices().iter().enumerate() {
                let Some(target) = choice.target() else {
                    continue;
                };
                let target = nodes.resolve(target).map_err(|err| {
                    ColloquyError::dangling(ReferenceKind::Choice, err.into_id(), record.name())
                })?;
                self.factory.connect(source, slot, target);
                report.connections += 1;
            }
        }

        info!(
            groups = report.groups,
            nodes = report.nodes,
            connections = report.connections;
            "Graph loaded"
        );
        Ok(report)
    }
}
