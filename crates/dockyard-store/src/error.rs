use crate::key::Key;

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No value is stored under the key.
    #[error("value not found: {0}")]
    NotFound(Key),

    /// The key cannot be constructed or mapped onto the backend.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// Content decoded as text is not valid UTF-8.
    #[error("content is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
