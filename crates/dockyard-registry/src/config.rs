use std::path::{Path, PathBuf};

use dockyard_store::StorageConfig;
use dockyard_types::DigestAlgorithm;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};
use crate::staging::Staging;

/// Registry configuration, usually read from a TOML file.
///
/// ```toml
/// digest_algorithm = "sha256"
/// staging_dir = "/var/lib/dockyard/staging"
/// max_blob_size = 10737418240
///
/// [storage]
/// kind = "filesystem"
/// root = "/var/lib/dockyard/data"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub storage: StorageConfig,
    /// Directory for upload staging files; the system temp dir when unset.
    pub staging_dir: Option<PathBuf>,
    /// Algorithm used to digest new uploads.
    pub digest_algorithm: DigestAlgorithm,
    /// Largest upload accepted, in bytes; unlimited when unset.
    pub max_blob_size: Option<u64>,
}

impl RegistryConfig {
    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> RegistryResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| RegistryError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
            .map_err(|e| RegistryError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(text: &str) -> RegistryResult<Self> {
        toml::from_str(text).map_err(|e| RegistryError::Config(e.to_string()))
    }

    pub fn staging(&self) -> Staging {
        let staging = match &self.staging_dir {
            Some(dir) => Staging::new(dir.clone()),
            None => Staging::system(),
        };
        match self.max_blob_size {
            Some(max) => staging.with_max_size(max),
            None => staging,
        }
    }
}
