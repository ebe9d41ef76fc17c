use std::fmt;

use dockyard_store::{Key, StoreResult};
use dockyard_types::{Digest, ManifestRef, RepoName};

/// Root of every key the registry writes.
pub const REGISTRY_ROOT: &str = "docker/registry/v2";

/// Storage key of a blob's bytes: one deterministic key per digest.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlobKey(Key);

impl BlobKey {
    pub fn new(digest: &Digest) -> StoreResult<Self> {
        let hex = digest.hex();
        let path = format!(
            "{REGISTRY_ROOT}/blobs/{}/{}/{}/data",
            digest.algorithm(),
            &hex[..2],
            hex
        );
        Ok(Self(Key::parse(&path)?))
    }

    pub fn key(&self) -> &Key {
        &self.0
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Storage key of the link record that maps a repository-scoped reference
/// to a manifest digest.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ManifestLinkKey(Key);

impl ManifestLinkKey {
    pub fn new(repo: &RepoName, reference: &ManifestRef) -> StoreResult<Self> {
        let path = format!(
            "{REGISTRY_ROOT}/repositories/{repo}/_manifests/{}",
            reference.link()
        );
        Ok(Self(Key::parse(&path)?))
    }

    pub fn key(&self) -> &Key {
        &self.0
    }
}

impl fmt::Display for ManifestLinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA_SHA256: &str =
        "3a6eb0790f39ac87c94f3856b2dd2c5d110e6811602261a9a923d3bb23adc8b7";

    #[test]
    fn blob_key_layout() {
        let key = BlobKey::new(&Digest::sha256(b"data")).unwrap();
        assert_eq!(
            key.to_string(),
            format!("docker/registry/v2/blobs/sha256/3a/{DATA_SHA256}/data")
        );
    }

    #[test]
    fn blob_key_is_deterministic() {
        let a = BlobKey::new(&Digest::sha256(b"same")).unwrap();
        let b = BlobKey::new(&Digest::sha256(b"same")).unwrap();
        let c = BlobKey::new(&Digest::sha256(b"other")).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn tag_link_key_layout() {
        let repo = RepoName::new("library/alpine").unwrap();
        let key = ManifestLinkKey::new(&repo, &ManifestRef::tag("3.19").unwrap()).unwrap();
        assert_eq!(
            key.to_string(),
            "docker/registry/v2/repositories/library/alpine/_manifests/tags/3.19/current/link"
        );
    }

    #[test]
    fn digest_link_key_layout() {
        let repo = RepoName::new("test").unwrap();
        let digest = Digest::sha256(b"data");
        let key = ManifestLinkKey::new(&repo, &ManifestRef::Digest(digest)).unwrap();
        assert_eq!(
            key.to_string(),
            format!("docker/registry/v2/repositories/test/_manifests/revisions/sha256/{DATA_SHA256}/link")
        );
    }
}
