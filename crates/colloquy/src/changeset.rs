//! Buffered store mutations.
//!
//! A save never touches the store while it is still validating. Every write
//! and removal is staged into a [`Changeset`] first; only once the whole
//! snapshot has been resolved is the changeset committed, in this order:
//!
//! 1. entity writes, in staging order, the container last among them
//! 2. removals of stale entities and group folders
//! 3. the graph document, last
//!
//! The document carries the baselines the next save diffs against, so it is
//! only advanced after everything it describes has been written.
//!
//! Before touching an asset the commit journals its prior bytes. If any step
//! fails, the journal is replayed backwards and the store ends up as it was
//! before the commit started.

use indexmap::IndexMap;
use log::{debug, error, warn};
use serde::Serialize;

use crate::{
    error::ColloquyError,
    layout::AssetPath,
    store::{AssetStore, StoreError, encode_record},
};

/// A staged removal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Removal {
    /// One entity asset.
    Asset(AssetPath),
    /// A folder and everything below it.
    Folder(AssetPath),
}

impl Removal {
    pub fn path(&self) -> &AssetPath {
        match self {
            Self::Asset(path) | Self::Folder(path) => path,
        }
    }
}

/// What a committed changeset actually did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub written: Vec<AssetPath>,
    pub removed: Vec<AssetPath>,
}

/// Staged writes and removals of one save.
#[derive(Debug, Default)]
pub struct Changeset {
    writes: IndexMap<AssetPath, Vec<u8>>,
    removals: Vec<Removal>,
    document: Option<(AssetPath, Vec<u8>)>,
    duplicates: Vec<AssetPath>,
    pretty: bool,
}

impl Changeset {
    pub fn new(pretty: bool) -> Self {
        Self {
            pretty,
            ..Self::default()
        }
    }

    /// Stages an entity write.
    ///
    /// Staging a second record at the same path replaces the first; the path
    /// is remembered as a duplicate.
    pub fn stage<T: Serialize>(&mut self, path: AssetPath, record: &T) -> Result<(), ColloquyError> {
        let bytes = encode_record(&path, record, self.pretty)?;
        if self.writes.contains_key(&path) {
            warn!(path = path.as_str(); "Duplicate entity key, last writer wins");
            self.duplicates.push(path.clone());
        }
        self.writes.insert(path, bytes);
        Ok(())
    }

    /// Stages a removal.
    pub fn stage_removal(&mut self, removal: Removal) {
        if !self.removals.contains(&removal) {
            self.removals.push(removal);
        }
    }

    /// Stages the graph document.
    pub fn stage_document<T: Serialize>(
        &mut self,
        path: AssetPath,
        document: &T,
    ) -> Result<(), ColloquyError> {
        let bytes = encode_record(&path, document, self.pretty)?;
        self.document = Some((path, bytes));
        Ok(())
    }

    /// Returns the staged entity paths in write order.
    pub fn writes(&self) -> impl Iterator<Item = &AssetPath> {
        self.writes.keys()
    }

    pub fn removals(&self) -> &[Removal] {
        &self.removals
    }

    /// Returns the paths that were staged more than once.
    pub fn duplicates(&self) -> &[AssetPath] {
        &self.duplicates
    }

    /// Applies the changeset to `store`.
    ///
    /// Stops at the first store failure and rolls back everything applied so
    /// far. A failure while rolling back is logged; the original error is
    /// returned either way.
    pub fn commit<S: AssetStore + ?Sized>(self, store: &mut S) -> Result<CommitSummary, ColloquyError> {
        let mut journal = Journal::default();

        match self.apply(store, &mut journal) {
            Ok(summary) => Ok(summary),
            Err(err) => {
                warn!(assets = journal.len(); "Commit failed, rolling back");
                journal.roll_back(store);
                Err(err)
            }
        }
    }

    fn apply<S: AssetStore + ?Sized>(
        self,
        store: &mut S,
        journal: &mut Journal,
    ) -> Result<CommitSummary, ColloquyError> {
        let mut summary = CommitSummary::default();

        for (path, bytes) in self.writes {
            journal.record(store, &path)?;
            store.write(&path, &bytes)?;
            summary.written.push(path);
        }

        for removal in self.removals {
            let removed = match &removal {
                Removal::Asset(path) => {
                    journal.record(store, path)?;
                    store.remove(path)?
                }
                Removal::Folder(path) => {
                    for asset in store.list(path)? {
                        journal.record(store, &asset)?;
                    }
                    store.remove_folder(path)?
                }
            };
            if removed {
                debug!(path = removal.path().as_str(); "Removed stale asset");
                summary.removed.push(removal.path().clone());
            }
        }

        if let Some((path, bytes)) = self.document {
            journal.record(store, &path)?;
            store.write(&path, &bytes)?;
            summary.written.push(path);
        }

        Ok(summary)
    }
}

/// Prior contents of every asset a commit touched, oldest first.
#[derive(Debug, Default)]
struct Journal {
    entries: Vec<(AssetPath, Option<Vec<u8>>)>,
}

impl Journal {
    fn len(&self) -> usize {
        self.entries.len()
    }

    /// Remembers what `path` holds right now.
    fn record<S: AssetStore + ?Sized>(&mut self, store: &S, path: &AssetPath) -> Result<(), StoreError> {
        let prior = store.read(path)?;
        self.entries.push((path.clone(), prior));
        Ok(())
    }

    /// Restores every journaled asset, newest change first.
    fn roll_back<S: AssetStore + ?Sized>(self, store: &mut S) {
        for (path, prior) in self.entries.into_iter().rev() {
            let restored = match &prior {
                Some(bytes) => store.write(&path, bytes),
                None => store.remove(&path).map(|_| ()),
            };
            if let Err(err) = restored {
                error!(path = path.as_str(), error = err.to_string(); "Failed to roll back asset");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use colloquy_core::record::GroupEntity;

    use crate::store::MemoryAssetStore;

    /// Fails every write to one path.
    struct FailOn {
        inner: MemoryAssetStore,
        path: AssetPath,
    }

    impl AssetStore for FailOn {
        fn read(&self, path: &AssetPath) -> Result<Option<Vec<u8>>, StoreError> {
            self.inner.read(path)
        }

        fn write(&mut self, path: &AssetPath, bytes: &[u8]) -> Result<(), StoreError> {
            if *path == self.path {
                return Err(StoreError::Rejected {
                    path: path.clone(),
                    reason: "disk full".to_string(),
                });
            }
            self.inner.write(path, bytes)
        }

        fn remove(&mut self, path: &AssetPath) -> Result<bool, StoreError> {
            self.inner.remove(path)
        }

        fn remove_folder(&mut self, path: &AssetPath) -> Result<bool, StoreError> {
            self.inner.remove_folder(path)
        }

        fn list(&self, folder: &AssetPath) -> Result<Vec<AssetPath>, StoreError> {
            self.inner.list(folder)
        }
    }

    fn dump(store: &MemoryAssetStore) -> Vec<(AssetPath, Vec<u8>)> {
        store
            .paths()
            .map(|path| (path.clone(), store.read(path).unwrap().unwrap()))
            .collect()
    }

    #[test]
    fn test_commit_order() {
        let mut store = MemoryAssetStore::new();
        store.write(&AssetPath::parse("old"), b"{}").unwrap();

        let mut changeset = Changeset::new(false);
        changeset
            .stage_document(AssetPath::parse("doc"), &GroupEntity::new("d"))
            .unwrap();
        changeset
            .stage(AssetPath::parse("a"), &GroupEntity::new("a"))
            .unwrap();
        changeset.stage_removal(Removal::Asset(AssetPath::parse("old")));
        changeset.stage_removal(Removal::Asset(AssetPath::parse("never-existed")));

        let summary = changeset.commit(&mut store).unwrap();

        assert_eq!(
            summary.written,
            vec![AssetPath::parse("a"), AssetPath::parse("doc")]
        );
        assert_eq!(summary.removed, vec![AssetPath::parse("old")]);
        assert!(!store.exists(&AssetPath::parse("old")).unwrap());
    }

    #[test]
    fn test_duplicate_keys_last_writer_wins() {
        let mut changeset = Changeset::new(false);
        changeset
            .stage(AssetPath::parse("a"), &GroupEntity::new("first"))
            .unwrap();
        changeset
            .stage(AssetPath::parse("a"), &GroupEntity::new("second"))
            .unwrap();

        assert_eq!(changeset.duplicates(), &[AssetPath::parse("a")]);
        assert_eq!(changeset.writes().count(), 1);

        let mut store = MemoryAssetStore::new();
        changeset.commit(&mut store).unwrap();

        let bytes = store.read(&AssetPath::parse("a")).unwrap().unwrap();
        let entity: GroupEntity = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(entity.name(), "second");
    }

    #[test]
    fn test_failed_write_leaves_document_untouched() {
        let mut store = FailOn {
            inner: MemoryAssetStore::new(),
            path: AssetPath::parse("b"),
        };
        store.inner.write(&AssetPath::parse("doc"), b"\"old\"").unwrap();

        let mut changeset = Changeset::new(false);
        changeset.stage(AssetPath::parse("a"), &1).unwrap();
        changeset.stage(AssetPath::parse("b"), &2).unwrap();
        changeset.stage_document(AssetPath::parse("doc"), &"new").unwrap();

        let err = changeset.commit(&mut store).unwrap_err();
        assert!(matches!(err, ColloquyError::Storage(StoreError::Rejected { .. })));
        assert_eq!(
            store.read(&AssetPath::parse("doc")).unwrap(),
            Some(b"\"old\"".to_vec())
        );
        assert!(!store.exists(&AssetPath::parse("a")).unwrap());
    }

    #[test]
    fn test_failed_document_write_rolls_back_everything() {
        let mut store = FailOn {
            inner: MemoryAssetStore::new(),
            path: AssetPath::parse("doc"),
        };
        for (path, contents) in [
            ("doc", "\"old\""),
            ("a", "1"),
            ("stale", "2"),
            ("g/g", "3"),
            ("g/Dialogues/x", "4"),
        ] {
            store
                .inner
                .write(&AssetPath::parse(path), contents.as_bytes())
                .unwrap();
        }
        let before = dump(&store.inner);

        let mut changeset = Changeset::new(false);
        changeset.stage(AssetPath::parse("a"), &10).unwrap();
        changeset.stage(AssetPath::parse("fresh"), &11).unwrap();
        changeset.stage_removal(Removal::Asset(AssetPath::parse("stale")));
        changeset.stage_removal(Removal::Folder(AssetPath::parse("g")));
        changeset.stage_document(AssetPath::parse("doc"), &"new").unwrap();

        let err = changeset.commit(&mut store).unwrap_err();
        assert!(matches!(err, ColloquyError::Storage(StoreError::Rejected { .. })));
        assert_eq!(dump(&store.inner), before);
    }

    #[test]
    fn test_repeated_removal_is_staged_once() {
        let mut changeset = Changeset::new(false);
        changeset.stage_removal(Removal::Folder(AssetPath::parse("g")));
        changeset.stage_removal(Removal::Folder(AssetPath::parse("g")));

        assert_eq!(changeset.removals().len(), 1);
    }
}
