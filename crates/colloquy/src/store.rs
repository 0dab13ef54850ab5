//! Persistent asset storage.
//!
//! The engine never touches files directly. Everything it persists goes
//! through an [`AssetStore`], which moves opaque bytes to and from
//! [`AssetPath`]s. Two stores ship with the crate:
//!
//! - [`MemoryAssetStore`] keeps assets in a sorted map. Used by tests and
//!   by hosts that persist elsewhere.
//! - [`FsAssetStore`] maps every asset path onto a `.json` file below a
//!   root directory and replaces files atomically.
//!
//! Records are encoded as JSON by [`encode_record`] and decoded by
//! [`read_record`].

mod fs;
mod memory;

pub use fs::FsAssetStore;
pub use memory::MemoryAssetStore;

use std::io;

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::{error::ColloquyError, layout::AssetPath};

/// Errors raised by an [`AssetStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at `{path}`: {source}")]
    Io {
        path: AssetPath,
        #[source]
        source: io::Error,
    },

    /// The store refused the operation.
    #[error("store rejected `{path}`: {reason}")]
    Rejected { path: AssetPath, reason: String },
}

impl StoreError {
    pub fn io(path: &AssetPath, source: io::Error) -> Self {
        Self::Io {
            path: path.clone(),
            source,
        }
    }

    /// Returns the path the failed operation targeted.
    pub fn path(&self) -> &AssetPath {
        match self {
            Self::Io { path, .. } | Self::Rejected { path, .. } => path,
        }
    }
}

/// A byte-oriented asset store addressed by [`AssetPath`].
pub trait AssetStore {
    /// Reads an asset. Returns `Ok(None)` if it does not exist.
    fn read(&self, path: &AssetPath) -> Result<Option<Vec<u8>>, StoreError>;

    /// Creates or replaces an asset.
    fn write(&mut self, path: &AssetPath, bytes: &[u8]) -> Result<(), StoreError>;

    /// Removes one asset. Returns `false` if there was nothing to remove.
    fn remove(&mut self, path: &AssetPath) -> Result<bool, StoreError>;

    /// Removes a folder and everything below it. Returns `false` if there
    /// was nothing to remove.
    fn remove_folder(&mut self, path: &AssetPath) -> Result<bool, StoreError>;

    /// Returns every asset below `folder`, at any depth. A missing folder
    /// has no assets.
    fn list(&self, folder: &AssetPath) -> Result<Vec<AssetPath>, StoreError>;

    /// Returns `true` if the asset exists.
    fn exists(&self, path: &AssetPath) -> Result<bool, StoreError> {
        Ok(self.read(path)?.is_some())
    }
}

impl<S: AssetStore + ?Sized> AssetStore for &mut S {
    fn read(&self, path: &AssetPath) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).read(path)
    }

    fn write(&mut self, path: &AssetPath, bytes: &[u8]) -> Result<(), StoreError> {
        (**self).write(path, bytes)
    }

    fn remove(&mut self, path: &AssetPath) -> Result<bool, StoreError> {
        (**self).remove(path)
    }

    fn remove_folder(&mut self, path: &AssetPath) -> Result<bool, StoreError> {
        (**self).remove_folder(path)
    }

    fn list(&self, folder: &AssetPath) -> Result<Vec<AssetPath>, StoreError> {
        (**self).list(folder)
    }

    fn exists(&self, path: &AssetPath) -> Result<bool, StoreError> {
        (**self).exists(path)
    }
}

/// Encodes a record as JSON.
pub fn encode_record<T: Serialize>(
    path: &AssetPath,
    record: &T,
    pretty: bool,
) -> Result<Vec<u8>, ColloquyError> {
    let encoded = if pretty {
        serde_json::to_vec_pretty(record)
    } else {
        serde_json::to_vec(record)
    };
    encoded.map_err(|source| ColloquyError::Encoding {
        path: path.clone(),
        source,
    })
}

/// Reads and decodes a record. Returns `Ok(None)` if the asset does not exist.
pub fn read_record<T, S>(store: &S, path: &AssetPath) -> Result<Option<T>, ColloquyError>
where
    T: DeserializeOwned,
    S: AssetStore + ?Sized,
{
    let Some(bytes) = store.read(path)? else {
        return Ok(None);
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| ColloquyError::Encoding {
            path: path.clone(),
            source,
        })
}
