use std::sync::Arc;

use bytes::Bytes;
use dockyard_store::{Content, Storage, StoreError};
use dockyard_types::Digest;

use crate::error::RegistryResult;
use crate::keys::BlobKey;

/// Handle to content stored under a digest.
///
/// A `Blob` holds no bytes. Reading goes back to the store each time, so a
/// handle is cheap to create and is not meant to be cached.
#[derive(Clone)]
pub struct Blob {
    storage: Arc<dyn Storage>,
    digest: Digest,
}

impl Blob {
    pub fn new(storage: Arc<dyn Storage>, digest: Digest) -> Self {
        Self { storage, digest }
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    pub fn key(&self) -> RegistryResult<BlobKey> {
        Ok(BlobKey::new(&self.digest)?)
    }

    /// Stream the stored bytes.
    pub async fn content(&self) -> RegistryResult<Content> {
        let key = self.key()?;
        Ok(self.storage.value(key.key()).await?)
    }

    /// Read the stored bytes into memory.
    pub async fn bytes(&self) -> RegistryResult<Bytes> {
        let content = self.content().await?;
        Ok(content.collect_bytes().await.map_err(StoreError::from)?)
    }

    /// Size in bytes, reading the content only if the store cannot say.
    pub async fn size(&self) -> RegistryResult<u64> {
        let content = self.content().await?;
        match content.size() {
            Some(size) => Ok(size),
            None => {
                let bytes = content.collect_bytes().await.map_err(StoreError::from)?;
                Ok(bytes.len() as u64)
            }
        }
    }
}

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blob").field("digest", &self.digest).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use dockyard_store::InMemoryStorage;

    #[tokio::test]
    async fn reads_lazily_through_store() {
        let storage = Arc::new(InMemoryStorage::new());
        let digest = Digest::sha256(b"data");
        let blob = Blob::new(storage.clone(), digest.clone());

        // Handle exists before the content does; reading fails until it lands.
        assert!(matches!(
            blob.bytes().await,
            Err(RegistryError::Store(StoreError::NotFound(_)))
        ));

        let key = BlobKey::new(&digest).unwrap();
        storage
            .save(key.key(), Content::from_bytes(&b"data"[..]))
            .await
            .unwrap();
        assert_eq!(blob.bytes().await.unwrap(), Bytes::from_static(b"data"));
        assert_eq!(blob.size().await.unwrap(), 4);
        assert_eq!(blob.digest(), &digest);
    }
}
