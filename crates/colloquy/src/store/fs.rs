//! Filesystem asset store.
//!
//! Asset `a/b/c` is stored as `{root}/a/b/c.json`; folder `a/b` is the
//! directory `{root}/a/b`. Writes go to a temporary file in the target
//! directory first and are then renamed over the destination, so a reader
//! sees either the old or the new record, never a partial one.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use log::{debug, trace};
use tempfile::NamedTempFile;

use super::{AssetStore, StoreError};
use crate::layout::AssetPath;

const EXTENSION: &str = "json";

/// An [`AssetStore`] backed by a directory tree.
#[derive(Debug, Clone)]
pub struct FsAssetStore {
    root: PathBuf,
}

impl FsAssetStore {
    /// Creates a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the directory an asset folder maps to.
    pub fn folder_path(&self, path: &AssetPath) -> PathBuf {
        path.segments()
            .fold(self.root.clone(), |dir, segment| dir.join(segment))
    }

    /// Returns the file an asset maps to.
    pub fn file_path(&self, path: &AssetPath) -> PathBuf {
        let mut file = self.folder_path(path);
        file.set_file_name(format!("{}.{EXTENSION}", path.file_name()));
        file
    }
}

fn not_found_as<T>(result: io::Result<T>, missing: T) -> io::Result<T> {
    match result {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(missing),
        other => other,
    }
}

impl AssetStore for FsAssetStore {
    fn read(&self, path: &AssetPath) -> Result<Option<Vec<u8>>, StoreError> {
        let file = self.file_path(path);
        not_found_as(fs::read(&file).map(Some), None).map_err(|err| StoreError::io(path, err))
    }

    fn write(&mut self, path: &AssetPath, bytes: &[u8]) -> Result<(), StoreError> {
        let file = self.file_path(path);
        let dir = file.parent().unwrap_or(&self.root);
        trace!(file = file.display().to_string(), len = bytes.len(); "Writing asset");

        fs::create_dir_all(dir).map_err(|err| StoreError::io(path, err))?;

        let mut temp = NamedTempFile::new_in(dir).map_err(|err| StoreError::io(path, err))?;
        temp.write_all(bytes)
            .and_then(|()| temp.flush())
            .map_err(|err| StoreError::io(path, err))?;
        temp.persist(&file)
            .map_err(|err| StoreError::io(path, err.error))?;

        Ok(())
    }

    fn remove(&mut self, path: &AssetPath) -> Result<bool, StoreError> {
        let file = self.file_path(path);
        debug!(file = file.display().to_string(); "Removing asset");
        not_found_as(fs::remove_file(&file).map(|()| true), false)
            .map_err(|err| StoreError::io(path, err))
    }

    fn remove_folder(&mut self, path: &AssetPath) -> Result<bool, StoreError> {
        let dir = self.folder_path(path);
        debug!(dir = dir.display().to_string(); "Removing asset folder");
        not_found_as(fs::remove_dir_all(&dir).map(|()| true), false)
            .map_err(|err| StoreError::io(path, err))
    }

    fn list(&self, folder: &AssetPath) -> Result<Vec<AssetPath>, StoreError> {
        let suffix = format!(".{EXTENSION}");
        let mut assets = Vec::new();
        let mut pending = vec![(self.folder_path(folder), folder.clone())];

        while let Some((dir, at)) = pending.pop() {
            let entries = not_found_as(fs::read_dir(&dir).map(Some), None)
                .map_err(|err| StoreError::io(&at, err))?;
            let Some(entries) = entries else {
                continue;
            };

            for entry in entries {
                let entry = entry.map_err(|err| StoreError::io(&at, err))?;
                let file_type = entry.file_type().map_err(|err| StoreError::io(&at, err))?;
                // Names that are not UTF-8 were never written by this store.
                let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                    continue;
                };

                if file_type.is_dir() {
                    pending.push((entry.path(), at.join(&name)));
                } else if let Some(stem) = name.strip_suffix(&suffix) {
                    assets.push(at.join(stem));
                }
            }
        }

        assets.sort();
        Ok(assets)
    }

    fn exists(&self, path: &AssetPath) -> Result<bool, StoreError> {
        Ok(self.file_path(path).is_file())
    }
}
