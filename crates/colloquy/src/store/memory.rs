//! In-memory asset store.

use std::collections::BTreeMap;

use log::trace;

use super::{AssetStore, StoreError};
use crate::layout::AssetPath;

/// An [`AssetStore`] that keeps every asset in a sorted map.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetStore {
    assets: BTreeMap<AssetPath, Vec<u8>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored path in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &AssetPath> {
        self.assets.keys()
    }

    /// Returns the stored paths that lie within `folder`.
    pub fn paths_within<'a>(&'a self, folder: &'a AssetPath) -> impl Iterator<Item = &'a AssetPath> {
        self.assets.keys().filter(move |path| path.is_within(folder))
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetStore for MemoryAssetStore {
    fn read(&self, path: &AssetPath) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.assets.get(path).cloned())
    }

    fn write(&mut self, path: &AssetPath, bytes: &[u8]) -> Result<(), StoreError> {
        trace!(path = path.as_str(), len = bytes.len(); "Writing asset");
        self.assets.insert(path.clone(), bytes.to_vec());
        Ok(())
    }

    fn remove(&mut self, path: &AssetPath) -> Result<bool, StoreError> {
        Ok(self.assets.remove(path).is_some())
    }

    fn remove_folder(&mut self, path: &AssetPath) -> Result<bool, StoreError> {
        let before = self.assets.len();
        self.assets.retain(|asset, _| !asset.is_within(path));
        Ok(self.assets.len() != before)
    }

    fn list(&self, folder: &AssetPath) -> Result<Vec<AssetPath>, StoreError> {
        Ok(self.paths_within(folder).cloned().collect())
    }

    fn exists(&self, path: &AssetPath) -> Result<bool, StoreError> {
        Ok(self.assets.contains_key(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_folder_only_touches_folder() {
        let mut store = MemoryAssetStore::new();
        for path in ["g/Groups/Inn/Inn", "g/Groups/Inn/Dialogues/a", "g/Groups/Inner/Inner", "g/g"] {
            store.write(&AssetPath::parse(path), b"{}").unwrap();
        }

        assert!(store.remove_folder(&AssetPath::parse("g/Groups/Inn")).unwrap());
        assert!(!store.remove_folder(&AssetPath::parse("g/Groups/Inn")).unwrap());

        let left: Vec<&str> = store.paths().map(AssetPath::as_str).collect();
        assert_eq!(left, vec!["g/Groups/Inner/Inner", "g/g"]);
    }

    #[test]
    fn test_list_is_segment_aware() {
        let mut store = MemoryAssetStore::new();
        for path in ["g/Groups/Inn/Inn", "g/Groups/Inn/Dialogues/a", "g/Groups/Inner/Inner"] {
            store.write(&AssetPath::parse(path), b"{}").unwrap();
        }

        let listed = store.list(&AssetPath::parse("g/Groups/Inn")).unwrap();
        assert_eq!(
            listed,
            vec![
                AssetPath::parse("g/Groups/Inn/Dialogues/a"),
                AssetPath::parse("g/Groups/Inn/Inn")
            ]
        );
        assert!(store.list(&AssetPath::parse("nowhere")).unwrap().is_empty());
    }

    #[test]
    fn test_remove_reports_presence() {
        let mut store = MemoryAssetStore::new();
        let path = AssetPath::parse("x/y");
        store.write(&path, b"1").unwrap();

        assert!(store.remove(&path).unwrap());
        assert!(!store.remove(&path).unwrap());
        assert!(store.is_empty());
    }
}
