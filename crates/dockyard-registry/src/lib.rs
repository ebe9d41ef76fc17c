//! Content-addressed blob storage and manifest resolution for dockyard.
//!
//! This crate is the registry's storage core. It sits on top of any
//! [`Storage`](dockyard_store::Storage) backend and provides:
//!
//! - [`StorageBlobs`] -- streams uploads through a staging file while hashing
//!   them, then commits the bytes under a key derived from their digest
//! - [`Blob`] -- a lazy handle to stored content
//! - [`Repo`] -- resolves tags and digests to parsed [`Manifest`]s through a
//!   small pointer ("link") record
//! - [`Registry`] -- wires storage, staging and digest algorithm together
//!
//! # Storage Layout
//!
//! Keys follow the Docker distribution on-disk layout:
//!
//! ```text
//! docker/registry/v2/blobs/<alg>/<hex[..2]>/<hex>/data
//! docker/registry/v2/repositories/<name>/_manifests/tags/<tag>/current/link
//! docker/registry/v2/repositories/<name>/_manifests/revisions/<alg>/<hex>/link
//! ```
//!
//! # Design Rules
//!
//! 1. Bytes under a blob key always hash to that key's digest. Digests that
//!    name storage locations come from hashing, never from callers.
//! 2. Link records are small and mutable; blob bytes are never rewritten
//!    or removed here when a tag moves.
//! 3. Absence is `Ok(None)`. Malformed links, links to missing blobs,
//!    malformed manifests and unsupported operations are distinct errors.
//! 4. Staging files are removed on every exit path.

pub mod blob;
pub mod blobs;
pub mod config;
pub mod error;
pub mod keys;
pub mod manifest;
pub mod registry;
pub mod repo;
pub mod staging;

pub use blob::Blob;
pub use blobs::{BlobStore, StorageBlobs};
pub use config::RegistryConfig;
pub use error::{RegistryError, RegistryResult};
pub use keys::{BlobKey, ManifestLinkKey, REGISTRY_ROOT};
pub use manifest::{Descriptor, Manifest, ManifestBody, ManifestError, Platform};
pub use registry::Registry;
pub use repo::Repo;
pub use staging::{Staging, StagingFile};
