//! Foundation types for dockyard.
//!
//! This crate provides the value types shared by every other dockyard crate.
//! None of them perform I/O; they are computed on demand and compared by
//! value.
//!
//! # Key Types
//!
//! - [`Digest`] -- Content identity: algorithm tag plus lowercase hex value
//! - [`DigestAlgorithm`] -- Supported hash algorithms (`sha256`, `sha512`)
//! - [`DigestHasher`] -- Incremental accumulator that produces a [`Digest`]
//! - [`RepoName`] -- Validated repository identifier
//! - [`ManifestRef`] -- Tag or digest reference to a manifest
//! - [`Tag`] -- Validated single-segment tag name

pub mod digest;
pub mod error;
pub mod hasher;
pub mod name;
pub mod reference;

pub use digest::{Digest, DigestAlgorithm};
pub use error::TypeError;
pub use hasher::DigestHasher;
pub use name::RepoName;
pub use reference::{ManifestRef, Tag};
