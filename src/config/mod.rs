//! Configuration
//!
//! Layered with the `config` crate: built-in defaults, the global file under
//! the XDG config home, an explicit file, then `PREFIXFS__*` environment
//! variables.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use facade::ConfigLoader;

/// Which `object_store` backend to build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    #[default]
    Local,
    S3,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Root directory for the local backend
    #[serde(default)]
    pub root: Option<PathBuf>,

    #[serde(default)]
    pub bucket: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    /// Custom S3 endpoint (localstack, minio)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Base URL that public object links are resolved against
    #[serde(default)]
    pub public_base_url: Option<String>,
}

fn default_list_limit() -> usize {
    1000
}

fn default_transfer_concurrency() -> usize {
    8
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpsConfig {
    /// Maximum entries per single-level listing
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,

    /// Per-object transfers in flight during directory move/copy
    #[serde(default = "default_transfer_concurrency")]
    pub transfer_concurrency: usize,
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            list_limit: default_list_limit(),
            transfer_concurrency: default_transfer_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferencesConfig {
    /// Preference file; defaults to `$XDG_CONFIG_HOME/prefixfs/preferences.json`
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrefixFsConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub ops: OpsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub preferences: PreferencesConfig,
}
