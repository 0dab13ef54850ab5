//! Read-side view over a graph's materialized dialogues.
//!
//! A runtime does not read the graph document. It opens the container and
//! the dialogue entities it lists, picks dialogues by bucket, and follows
//! resolved choices from one dialogue to the next.

use std::collections::BTreeMap;

use log::debug;

use colloquy_core::record::{ContainerEntity, DialogueEntity, EntityRef};

use crate::{
    error::ColloquyError,
    layout::AssetLayout,
    store::{AssetStore, read_record},
};

/// Which bucket a [`DialogueFilter`] selects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Bucket {
    /// Every dialogue.
    #[default]
    All,
    /// Dialogues of one group.
    Group(String),
    /// Dialogues outside any group.
    Ungrouped,
}

/// Selects dialogues from a [`DialogueCatalog`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogueFilter {
    bucket: Bucket,
    starting_only: bool,
}

impl DialogueFilter {
    pub fn new(bucket: Bucket) -> Self {
        Self {
            bucket,
            starting_only: false,
        }
    }

    /// Keeps only starting dialogues (builder style).
    pub fn starting_only(mut self, starting_only: bool) -> Self {
        self.starting_only = starting_only;
        self
    }

    fn matches(&self, entity_ref: &EntityRef, entity: &DialogueEntity) -> bool {
        let in_bucket = match &self.bucket {
            Bucket::All => true,
            Bucket::Group(group) => entity_ref.group() == Some(group.as_str()),
            Bucket::Ungrouped => entity_ref.group().is_none(),
        };
        in_bucket && (!self.starting_only || entity.is_starting_dialogue())
    }
}

/// The materialized dialogues of one graph.
#[derive(Debug, Clone)]
pub struct DialogueCatalog {
    container: ContainerEntity,
    dialogues: BTreeMap<EntityRef, DialogueEntity>,
}

impl DialogueCatalog {
    /// Reads the container of `layout`'s graph and every dialogue it lists.
    ///
    /// # Errors
    ///
    /// - [`ColloquyError::DocumentNotFound`] if the graph has no container.
    /// - [`ColloquyError::MissingEntity`] if a listed dialogue is absent.
    pub fn open<S: AssetStore + ?Sized>(store: &S, layout: &AssetLayout) -> Result<Self, ColloquyError> {
        let container_path = layout.container();
        let container: ContainerEntity =
            read_record(store, &container_path)?.ok_or_else(|| ColloquyError::DocumentNotFound {
                graph: layout.graph().to_string(),
                path: container_path.clone(),
            })?;

        let mut dialogues = BTreeMap::new();
        for entity_ref in container.all_dialogues() {
            let path = layout.dialogue(&entity_ref);
            let entity: DialogueEntity =
                read_record(store, &path)?.ok_or(ColloquyError::MissingEntity(path))?;
            dialogues.insert(entity_ref, entity);
        }

        debug!(graph = layout.graph(), dialogues = dialogues.len(); "Catalog opened");
        Ok(Self {
            container,
            dialogues,
        })
    }

    pub fn container(&self) -> &ContainerEntity {
        &self.container
    }

    /// Returns the group names, including groups without dialogues.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.container.group_names()
    }

    /// Returns the dialogues `filter` selects, sorted by bucket then name.
    pub fn dialogues<'a>(
        &'a self,
        filter: &'a DialogueFilter,
    ) -> impl Iterator<Item = (&'a EntityRef, &'a DialogueEntity)> {
        self.dialogues
            .iter()
            .filter(move |(entity_ref, entity)| filter.matches(entity_ref, entity))
    }

    pub fn dialogue(&self, entity_ref: &EntityRef) -> Option<&DialogueEntity> {
        self.dialogues.get(entity_ref)
    }

    /// Follows choice `slot` of `from` to the dialogue it leads to.
    ///
    /// Returns `None` if there is no such dialogue, slot or target.
    pub fn follow(&self, from: &EntityRef, slot: usize) -> Option<(&EntityRef, &DialogueEntity)> {
        let next = self
            .dialogue(from)?
            .choices()
            .get(slot)?
            .next_dialogue()?;
        self.dialogues.get_key_value(next)
    }

    pub fn len(&self) -> usize {
        self.dialogues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialogues.is_empty()
    }
}
