use thiserror::Error;

/// Errors produced when parsing or validating dockyard value types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("malformed digest {input:?}: {reason}")]
    MalformedDigest { input: String, reason: String },

    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid repository name {name:?}: {reason}")]
    InvalidRepoName { name: String, reason: String },

    #[error("invalid tag {tag:?}: {reason}")]
    InvalidTag { tag: String, reason: String },
}
