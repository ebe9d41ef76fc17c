use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::file::FileStorage;
use crate::memory::InMemoryStorage;
use crate::traits::Storage;

/// Which storage backend to open.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Volatile in-process storage.
    #[default]
    Memory,
    /// Files under `root`.
    Filesystem { root: PathBuf },
}

impl StorageConfig {
    pub fn open(&self) -> Arc<dyn Storage> {
        match self {
            Self::Memory => Arc::new(InMemoryStorage::new()),
            Self::Filesystem { root } => Arc::new(FileStorage::new(root.clone())),
        }
    }
}
