use std::sync::Arc;

use dockyard_store::{Storage, StoreError};
use dockyard_types::{Digest, ManifestRef, RepoName};
use tracing::debug;

use crate::blob::Blob;
use crate::error::{RegistryError, RegistryResult};
use crate::keys::{BlobKey, ManifestLinkKey};
use crate::manifest::Manifest;

/// Read access to one repository's manifests.
///
/// Resolution goes through two records: a small link file under the
/// repository that holds a digest string, then the blob stored under that
/// digest. Moving a tag rewrites only the link.
#[derive(Clone)]
pub struct Repo {
    storage: Arc<dyn Storage>,
    name: RepoName,
}

impl Repo {
    pub fn new(storage: Arc<dyn Storage>, name: RepoName) -> Self {
        Self { storage, name }
    }

    pub fn name(&self) -> &RepoName {
        &self.name
    }

    /// Resolve a tag or digest reference to its manifest.
    ///
    /// Returns `Ok(None)` only when the reference has no link record. A link
    /// that does not hold a digest fails with
    /// [`RegistryError::MalformedReference`]; a link naming a digest with no
    /// stored blob fails with [`RegistryError::Store`] carrying
    /// [`StoreError::NotFound`]; blob bytes that are not a manifest fail with
    /// [`RegistryError::MalformedContent`].
    pub async fn manifest(&self, reference: &ManifestRef) -> RegistryResult<Option<Manifest>> {
        let link = ManifestLinkKey::new(&self.name, reference)?;
        if !self.storage.exists(link.key()).await? {
            debug!(repo = %self.name, reference = %reference, "no link for reference");
            return Ok(None);
        }

        let text = match self.storage.value(link.key()).await?.into_text().await {
            Ok(text) => text,
            Err(StoreError::InvalidUtf8(e)) => {
                return Err(RegistryError::MalformedReference {
                    key: link.to_string(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        let digest = Digest::parse(&text).map_err(|e| RegistryError::MalformedReference {
            key: link.to_string(),
            reason: e.to_string(),
        })?;

        // A link whose blob is gone is a broken record, not an unknown
        // reference: the store's `NotFound` surfaces as `RegistryError::Store`.
        let blob_key = BlobKey::new(&digest)?;
        let raw = self
            .storage
            .value(blob_key.key())
            .await?
            .collect_bytes()
            .await
            .map_err(StoreError::from)?;

        let manifest = Manifest::parse(digest.algorithm(), raw)
            .map_err(|source| RegistryError::MalformedContent {
                digest: digest.clone(),
                source,
            })?;
        Ok(Some(manifest))
    }

    /// Look up a blob by algorithm and hex digest within this repository.
    ///
    /// Not implemented: always fails with [`RegistryError::Unsupported`],
    /// never with an empty result.
    pub async fn layer(&self, _algorithm: &str, _hex: &str) -> RegistryResult<Option<Blob>> {
        Err(RegistryError::Unsupported("repository layer lookup"))
    }
}

impl std::fmt::Debug for Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repo").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use dockyard_store::{Content, InMemoryStorage};
    use dockyard_types::DigestAlgorithm;
    use serde_json::json;

    const TAG_LINK: &str =
        "docker/registry/v2/repositories/test/_manifests/tags/latest/current/link";

    fn manifest_bytes() -> Bytes {
        let layer = Digest::sha256(b"layer");
        let doc = json!({
            "schemaVersion": 2,
            "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
            "config": {
                "mediaType": "application/vnd.docker.container.image.v1+json",
                "size": 2,
                "digest": Digest::sha256(b"{}").to_string(),
            },
            "layers": [{
                "mediaType": "application/vnd.docker.image.rootfs.diff.tar.gzip",
                "size": 5,
                "digest": layer.to_string(),
            }],
        });
        Bytes::from(serde_json::to_vec(&doc).unwrap())
    }

    fn repo(storage: &Arc<InMemoryStorage>) -> Repo {
        Repo::new(storage.clone(), RepoName::new("test").unwrap())
    }

    async fn put_raw(storage: &InMemoryStorage, path: &str, data: impl Into<Bytes>) {
        let key = dockyard_store::Key::parse(path).unwrap();
        storage.save(&key, Content::from_bytes(data)).await.unwrap();
    }

    async fn put_blob(storage: &InMemoryStorage, data: Bytes) -> Digest {
        let digest = Digest::sha256(&data);
        let key = BlobKey::new(&digest).unwrap();
        storage.save(key.key(), Content::from_bytes(data)).await.unwrap();
        digest
    }

    fn latest() -> ManifestRef {
        ManifestRef::tag("latest").unwrap()
    }

    #[tokio::test]
    async fn resolves_tag_through_link() {
        let storage = Arc::new(InMemoryStorage::new());
        let digest = put_blob(&storage, manifest_bytes()).await;
        put_raw(&storage, TAG_LINK, digest.to_string()).await;

        let manifest = repo(&storage).manifest(&latest()).await.unwrap().expect("should resolve");
        assert_eq!(manifest.digest(), &digest);
        assert_eq!(manifest.layers().len(), 1);
        assert_eq!(manifest.layers()[0].digest, Digest::sha256(b"layer"));
    }

    #[tokio::test]
    async fn resolves_digest_reference() {
        let storage = Arc::new(InMemoryStorage::new());
        let digest = put_blob(&storage, manifest_bytes()).await;
        let link = format!(
            "docker/registry/v2/repositories/test/_manifests/revisions/sha256/{}/link",
            digest.hex()
        );
        put_raw(&storage, &link, digest.to_string()).await;

        let reference = ManifestRef::Digest(digest.clone());
        let manifest = repo(&storage).manifest(&reference).await.unwrap().unwrap();
        assert_eq!(manifest.digest(), &digest);
    }

    #[tokio::test]
    async fn unknown_tag_is_absent() {
        let storage = Arc::new(InMemoryStorage::new());
        assert!(repo(&storage).manifest(&latest()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_digest_is_absent() {
        let storage = Arc::new(InMemoryStorage::new());
        let reference = ManifestRef::Digest(Digest::sha256(b"nothing"));
        assert!(repo(&storage).manifest(&reference).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn link_to_missing_blob_is_an_error() {
        let storage = Arc::new(InMemoryStorage::new());
        let gone = Digest::sha256(b"gone");
        put_raw(&storage, TAG_LINK, gone.to_string()).await;

        let err = repo(&storage).manifest(&latest()).await.unwrap_err();
        let expected = BlobKey::new(&gone).unwrap();
        match err {
            RegistryError::Store(StoreError::NotFound(key)) => assert_eq!(&key, expected.key()),
            other => panic!("expected Store(NotFound), got {other:?}"),
        }
    }

    #[tokio::test]
    async fn tags_are_scoped_per_repository() {
        let storage = Arc::new(InMemoryStorage::new());
        let digest = put_blob(&storage, manifest_bytes()).await;
        put_raw(&storage, TAG_LINK, digest.to_string()).await;

        let other = Repo::new(storage.clone(), RepoName::new("other").unwrap());
        assert!(other.manifest(&latest()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_link_text_is_an_error() {
        let storage = Arc::new(InMemoryStorage::new());
        put_raw(&storage, TAG_LINK, "not-a-digest").await;

        let err = repo(&storage).manifest(&latest()).await.unwrap_err();
        match err {
            RegistryError::MalformedReference { key, .. } => assert_eq!(key, TAG_LINK),
            other => panic!("expected MalformedReference, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn link_with_trailing_newline_is_malformed() {
        let storage = Arc::new(InMemoryStorage::new());
        let digest = put_blob(&storage, manifest_bytes()).await;
        put_raw(&storage, TAG_LINK, format!("{digest}\n")).await;

        let err = repo(&storage).manifest(&latest()).await.unwrap_err();
        assert!(matches!(err, RegistryError::MalformedReference { .. }));
    }

    #[tokio::test]
    async fn non_utf8_link_is_malformed() {
        let storage = Arc::new(InMemoryStorage::new());
        put_raw(&storage, TAG_LINK, vec![0xffu8, 0x00]).await;

        let err = repo(&storage).manifest(&latest()).await.unwrap_err();
        assert!(matches!(err, RegistryError::MalformedReference { .. }));
    }

    #[tokio::test]
    async fn malformed_manifest_is_an_error() {
        let storage = Arc::new(InMemoryStorage::new());
        let digest = put_blob(&storage, Bytes::from_static(b"{\"not\": \"a manifest\"}")).await;
        put_raw(&storage, TAG_LINK, digest.to_string()).await;

        let err = repo(&storage).manifest(&latest()).await.unwrap_err();
        match err {
            RegistryError::MalformedContent { digest: d, .. } => assert_eq!(d, digest),
            other => panic!("expected MalformedContent, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn repointing_a_tag_keeps_old_blob() {
        let storage = Arc::new(InMemoryStorage::new());
        let old = put_blob(&storage, manifest_bytes()).await;
        put_raw(&storage, TAG_LINK, old.to_string()).await;

        let mut doc: serde_json::Value = serde_json::from_slice(&manifest_bytes()).unwrap();
        doc["layers"] = json!([]);
        let new = put_blob(&storage, Bytes::from(serde_json::to_vec(&doc).unwrap())).await;
        put_raw(&storage, TAG_LINK, new.to_string()).await;

        let repo = repo(&storage);
        let manifest = repo.manifest(&latest()).await.unwrap().unwrap();
        assert_eq!(manifest.digest(), &new);
        assert!(manifest.layers().is_empty());
        let old_ref = ManifestRef::Digest(old.clone());
        let old_key = BlobKey::new(&old).unwrap();
        assert!(storage.exists(old_key.key()).await.unwrap());
        // No revision link was written for the old digest.
        assert!(repo.manifest(&old_ref).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sha512_link_recomputes_sha512_digest() {
        let storage = Arc::new(InMemoryStorage::new());
        let raw = manifest_bytes();
        let digest = Digest::of(DigestAlgorithm::Sha512, &raw);
        let key = BlobKey::new(&digest).unwrap();
        storage.save(key.key(), Content::from_bytes(raw)).await.unwrap();
        put_raw(&storage, TAG_LINK, digest.to_string()).await;

        let manifest = repo(&storage).manifest(&latest()).await.unwrap().unwrap();
        assert_eq!(manifest.digest(), &digest);
    }

    #[tokio::test]
    async fn layer_lookup_is_unsupported() {
        let storage = Arc::new(InMemoryStorage::new());
        let digest = put_blob(&storage, Bytes::from_static(b"layer")).await;
        let repo = repo(&storage);

        for (alg, hex) in [("sha256", digest.hex()), ("sha256", "nope"), ("", "")] {
            let err = repo.layer(alg, hex).await.unwrap_err();
            assert!(matches!(err, RegistryError::Unsupported(_)));
        }
    }
}
