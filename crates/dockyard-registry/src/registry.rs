use std::sync::Arc;

use dockyard_store::Storage;
use dockyard_types::{DigestAlgorithm, RepoName};

use crate::blobs::StorageBlobs;
use crate::config::RegistryConfig;
use crate::repo::Repo;
use crate::staging::Staging;

/// Entry point tying a storage backend, a staging area and a digest
/// algorithm together. Cheap to clone.
#[derive(Clone)]
pub struct Registry {
    blobs: StorageBlobs,
    storage: Arc<dyn Storage>,
}

impl Registry {
    pub fn new(storage: Arc<dyn Storage>, staging: Staging) -> Self {
        Self {
            blobs: StorageBlobs::new(storage.clone(), staging),
            storage,
        }
    }

    /// Open the configured storage backend and staging directory.
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(config.storage.open(), config.staging())
            .with_algorithm(config.digest_algorithm)
    }

    pub fn with_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.blobs = self.blobs.with_algorithm(algorithm);
        self
    }

    pub fn blobs(&self) -> &StorageBlobs {
        &self.blobs
    }

    pub fn repo(&self, name: RepoName) -> Repo {
        Repo::new(self.storage.clone(), name)
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("blobs", &self.blobs).finish_non_exhaustive()
    }
}
