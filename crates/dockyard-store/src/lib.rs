//! Asynchronous key-value storage for dockyard.
//!
//! The registry core never touches files or maps directly; it talks to a
//! [`Storage`] backend through three operations, all asynchronous:
//!
//! - `exists(key)` -- is there a value under this key?
//! - `value(key)` -- stream the value back as [`Content`]
//! - `save(key, content)` -- durably store a streamed value
//!
//! # Storage Backends
//!
//! - [`InMemoryStorage`] -- `HashMap`-based store for tests and embedding
//! - [`FileStorage`] -- one file per key under a root directory
//!
//! # Design Rules
//!
//! 1. `save` is the durability point: once it returns `Ok`, the value is
//!    visible to every later `exists`/`value` call.
//! 2. Per-key writes are atomic. A reader sees the old value or the new one,
//!    never a prefix; a failed `save` leaves the key as it was.
//! 3. Concurrent `save`s to one key are not ordered here: the last to finish
//!    wins.
//! 4. The store never interprets values.

pub mod config;
pub mod content;
pub mod error;
pub mod file;
pub mod key;
pub mod memory;
pub mod traits;

pub use config::StorageConfig;
pub use content::Content;
pub use error::{StoreError, StoreResult};
pub use file::FileStorage;
pub use key::Key;
pub use memory::InMemoryStorage;
pub use traits::Storage;
