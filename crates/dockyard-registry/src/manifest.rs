//! Image manifests and manifest lists.
//!
//! Schema version 2 documents only: Docker v2 schema 2 and OCI image
//! manifests (`config` + `layers`), and Docker manifest lists and OCI image
//! indexes (`manifests`).

use bytes::Bytes;
use dockyard_types::{Digest, DigestAlgorithm};
use serde::{Deserialize, Serialize};

pub mod media_types {
    pub const DOCKER_MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";
    pub const DOCKER_MANIFEST_LIST: &str =
        "application/vnd.docker.distribution.manifest.list.v2+json";
    pub const OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";
    pub const OCI_INDEX: &str = "application/vnd.oci.image.index.v1+json";
}

/// Reference from a manifest to another piece of content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub media_type: String,
    pub size: u64,
    pub digest: Digest,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
}

/// Target platform of a manifest listed in an index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub architecture: String,
    pub os: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

/// What a manifest describes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ManifestBody {
    /// A single image: its config blob and ordered layers.
    Image {
        config: Descriptor,
        layers: Vec<Descriptor>,
    },
    /// A list of per-platform manifests.
    Index { manifests: Vec<Descriptor> },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    schema_version: u32,
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default)]
    config: Option<Descriptor>,
    #[serde(default)]
    layers: Option<Vec<Descriptor>>,
    #[serde(default)]
    manifests: Option<Vec<Descriptor>>,
}

/// A parsed manifest together with the exact bytes it was parsed from.
#[derive(Clone, Debug)]
pub struct Manifest {
    digest: Digest,
    raw: Bytes,
    schema_version: u32,
    media_type: Option<String>,
    body: ManifestBody,
}

impl Manifest {
    /// Parse `raw`, recording its digest under `algorithm`.
    pub fn parse(algorithm: DigestAlgorithm, raw: Bytes) -> Result<Self, ManifestError> {
        let doc: RawManifest = serde_json::from_slice(&raw)?;
        if doc.schema_version != 2 {
            return Err(ManifestError::UnsupportedSchemaVersion(doc.schema_version));
        }
        let body = match (doc.manifests, doc.config, doc.layers) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                return Err(ManifestError::Ambiguous);
            }
            (Some(manifests), None, None) => ManifestBody::Index { manifests },
            (None, Some(config), Some(layers)) => ManifestBody::Image { config, layers },
            (None, None, _) => return Err(ManifestError::MissingField("config")),
            (None, Some(_), None) => return Err(ManifestError::MissingField("layers")),
        };
        Ok(Self {
            digest: Digest::of(algorithm, &raw),
            raw,
            schema_version: doc.schema_version,
            media_type: doc.media_type,
            body,
        })
    }

    /// Digest of the raw bytes.
    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Media type declared in the document, if any.
    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub fn body(&self) -> &ManifestBody {
        &self.body
    }

    pub fn is_index(&self) -> bool {
        matches!(self.body, ManifestBody::Index { .. })
    }

    pub fn config(&self) -> Option<&Descriptor> {
        match &self.body {
            ManifestBody::Image { config, .. } => Some(config),
            ManifestBody::Index { .. } => None,
        }
    }

    /// Layer descriptors in application order; empty for an index.
    pub fn layers(&self) -> &[Descriptor] {
        match &self.body {
            ManifestBody::Image { layers, .. } => layers,
            ManifestBody::Index { .. } => &[],
        }
    }

    /// Child manifests; empty for an image manifest.
    pub fn manifests(&self) -> &[Descriptor] {
        match &self.body {
            ManifestBody::Index { manifests } => manifests,
            ManifestBody::Image { .. } => &[],
        }
    }
}

/// Reasons bytes fail to parse as a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("invalid manifest JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported schema version {0}")]
    UnsupportedSchemaVersion(u32),

    #[error("missing required field {0:?}")]
    MissingField(&'static str),

    #[error("document has both `manifests` and image fields")]
    Ambiguous,
}
