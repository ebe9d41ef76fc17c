use dockyard_store::StoreError;
use dockyard_types::Digest;
use thiserror::Error;

use crate::manifest::ManifestError;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// Creating, writing or reading back a staging file failed.
    #[error("staging I/O error: {0}")]
    Staging(#[source] std::io::Error),

    /// The caller's input stream failed mid-upload.
    #[error("upload stream failed: {0}")]
    Source(#[source] std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A link record does not hold a well-formed digest.
    #[error("malformed reference at {key}: {reason}")]
    MalformedReference { key: String, reason: String },

    /// Bytes stored under a digest are not a valid manifest.
    #[error("malformed manifest {digest}: {source}")]
    MalformedContent {
        digest: Digest,
        #[source]
        source: ManifestError,
    },

    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
