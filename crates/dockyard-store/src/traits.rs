use async_trait::async_trait;

use crate::content::Content;
use crate::error::StoreResult;
use crate::key::Key;

/// Asynchronous key-value store.
///
/// All implementations must satisfy these invariants:
/// - `save` acknowledges only once the value is durable and visible.
/// - Per-key replacement is atomic: a reader never observes a partial value,
///   and a failed `save` (including a failing input stream) leaves the
///   previous value, or absence, intact.
/// - No cross-key transactions. An `exists` followed by `value` may race
///   with an external deletion.
/// - The store never interprets values.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Check whether a value is stored under `key`.
    async fn exists(&self, key: &Key) -> StoreResult<bool>;

    /// Stream the value stored under `key`.
    ///
    /// Returns `Err(StoreError::NotFound)` if there is no value.
    async fn value(&self, key: &Key) -> StoreResult<Content>;

    /// Store `content` under `key`, replacing any previous value.
    async fn save(&self, key: &Key, content: Content) -> StoreResult<()>;
}
