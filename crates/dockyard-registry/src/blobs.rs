use std::sync::Arc;

use async_trait::async_trait;
use dockyard_store::{Content, Storage};
use dockyard_types::{Digest, DigestAlgorithm, DigestHasher};
use futures::StreamExt;
use tracing::{debug, warn};

use crate::blob::Blob;
use crate::error::{RegistryError, RegistryResult};
use crate::keys::BlobKey;
use crate::staging::{Staging, StagingFile};

/// Digest-keyed blob storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Check whether content with this digest is stored.
    async fn exists(&self, digest: &Digest) -> RegistryResult<bool>;

    /// Handle to stored content, or `Ok(None)` if nothing is stored under
    /// the digest. Content is not read.
    async fn blob(&self, digest: &Digest) -> RegistryResult<Option<Blob>>;

    /// Store a stream of unknown length under the digest of its bytes.
    async fn put(&self, content: Content) -> RegistryResult<Blob>;
}

/// [`BlobStore`] over any [`Storage`] backend.
///
/// Uploads go through a [`StagingFile`]: each chunk is hashed and appended
/// to the staging file, and only once the stream ends and the digest is
/// known is the staged data saved under its [`BlobKey`]. The store never
/// sees bytes under a key they do not hash to.
#[derive(Clone)]
pub struct StorageBlobs {
    storage: Arc<dyn Storage>,
    staging: Staging,
    algorithm: DigestAlgorithm,
}

impl StorageBlobs {
    pub fn new(storage: Arc<dyn Storage>, staging: Staging) -> Self {
        Self {
            storage,
            staging,
            algorithm: DigestAlgorithm::default(),
        }
    }

    /// Use `algorithm` for the digests of new uploads.
    pub fn with_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Copy `content` into `staged` chunk by chunk, returning its digest.
    ///
    /// Each chunk is handed to the hasher as its own `Bytes` view while the
    /// original is written out; both finish before the next chunk is pulled.
    async fn stage(&self, staged: &mut StagingFile, content: Content) -> RegistryResult<Digest> {
        let mut hasher = DigestHasher::new(self.algorithm);
        let mut chunks = content.into_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(RegistryError::Source)?;
            let view = chunk.clone();
            let hashing = async {
                hasher.update(&view);
            };
            let ((), written) = tokio::join!(hashing, staged.write_chunk(&chunk));
            written.map_err(RegistryError::Staging)?;
        }
        staged.finish().await.map_err(RegistryError::Staging)?;
        Ok(hasher.finalize())
    }
}

#[async_trait]
impl BlobStore for StorageBlobs {
    async fn exists(&self, digest: &Digest) -> RegistryResult<bool> {
        let key = BlobKey::new(digest)?;
        Ok(self.storage.exists(key.key()).await?)
    }

    async fn blob(&self, digest: &Digest) -> RegistryResult<Option<Blob>> {
        if self.exists(digest).await? {
            Ok(Some(Blob::new(self.storage.clone(), digest.clone())))
        } else {
            Ok(None)
        }
    }

    async fn put(&self, content: Content) -> RegistryResult<Blob> {
        // Dropping `staged` on any early return deletes the staging file.
        let mut staged = self.staging.create().await.map_err(RegistryError::Staging)?;
        let digest = self.stage(&mut staged, content).await?;
        let key = BlobKey::new(&digest)?;

        let upload = staged.content().await.map_err(RegistryError::Staging)?;
        self.storage.save(key.key(), upload).await?;
        debug!(digest = %digest, bytes = staged.len(), "committed blob");

        let path = staged.path().to_path_buf();
        if let Err(e) = staged.close() {
            warn!(digest = %digest, path = %path.display(), error = %e, "failed to remove staging file");
        }
        Ok(Blob::new(self.storage.clone(), digest))
    }
}

impl std::fmt::Debug for StorageBlobs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageBlobs")
            .field("staging", &self.staging)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}
