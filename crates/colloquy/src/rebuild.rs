//! A [`GraphFactory`] that rebuilds a [`GraphSnapshot`].
//!
//! Handles are indices into the snapshot being built, and every element
//! keeps the id it was saved under, so saving the rebuilt snapshot again
//! produces the same document.

use colloquy_core::snapshot::{ChoiceSnapshot, GraphSnapshot, GroupSnapshot, NodeSnapshot};

use crate::load::{GraphFactory, GroupTemplate, NodeTemplate};

/// Builds a [`GraphSnapshot`] out of factory calls.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    snapshot: GraphSnapshot,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the snapshot built so far.
    pub fn snapshot(&self) -> &GraphSnapshot {
        &self.snapshot
    }

    pub fn into_snapshot(self) -> GraphSnapshot {
        self.snapshot
    }
}

impl GraphFactory for SnapshotBuilder {
    type Group = usize;
    type Node = usize;

    fn create_group(&mut self, template: GroupTemplate<'_>) -> usize {
        self.snapshot.add_group(
            GroupSnapshot::new(template.id.clone(), template.name).with_position(template.position),
        );
        self.snapshot.groups().len() - 1
    }

    fn create_node(&mut self, template: NodeTemplate<'_>) -> usize {
        let node = template.choices.iter().fold(
            NodeSnapshot::new(template.id.clone(), template.name, template.kind.clone())
                .with_text(template.text)
                .with_position(template.position),
            |node, text| node.with_choice(ChoiceSnapshot::new(*text)),
        );
        self.snapshot.add_node(node);
        self.snapshot.nodes().len() - 1
    }

    fn attach_to_group(&mut self, node: &usize, group: &usize) {
        let group_id = self.snapshot.groups().get(*group).map(|g| g.id().clone());
        if let Some(node) = self.snapshot.nodes_mut().get_mut(*node) {
            node.set_group(group_id);
        }
    }

    fn connect(&mut self, source: &usize, slot: usize, target: &usize) {
        let target_id = self.snapshot.nodes().get(*target).map(|n| n.id().clone());
        if let Some(choice) = self
            .snapshot
            .nodes_mut()
            .get_mut(*source)
            .and_then(|node| node.choice_mut(slot))
        {
            choice.set_target(target_id);
        }
    }
}
