//! Store configuration via `revsearch.toml`
//!
//! On first open a default `revsearch.toml` can be written to the data
//! directory. To change settings, edit the file and restart.

use crate::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file name placed in the data directory.
pub const CONFIG_FILE_NAME: &str = "revsearch.toml";

/// Default vector blob file name.
pub const DEFAULT_VECTORS_FILE: &str = "vectors.bin";

/// Default metadata document file name.
pub const DEFAULT_METADATA_FILE: &str = "metadata.json";

/// Result cache settings, persisted under the `[cache]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    /// Whether search results are memoized (default: false)
    #[serde(default)]
    pub enabled: bool,
    /// Expiry of a cached search result in seconds (default: 3600)
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Upper bound on a single cache round-trip in milliseconds (default: 250)
    #[serde(default = "default_cache_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_cache_timeout_ms() -> u64 {
    250
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_secs: default_ttl_secs(),
            timeout_ms: default_cache_timeout_ms(),
        }
    }
}

impl CacheConfig {
    /// Expiry as a Duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Round-trip bound as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Store configuration loaded from `revsearch.toml`.
///
/// # Example
///
/// ```toml
/// dimension = 512
/// max_results = 20
/// max_distance = 0.632
/// snapshot_interval = 10
/// data_dir = "./features"
///
/// [cache]
/// enabled = true
/// ttl_secs = 3600
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Vector dimension D; every stored and query vector must match it.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Upper bound on `k` for a single search.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Results farther than this (L2, on unit vectors) are dropped.
    #[serde(default = "default_max_distance")]
    pub max_distance: f32,
    /// Number of adds between periodic snapshots.
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: usize,
    /// Directory holding the snapshot artifacts.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Vector blob file name inside `data_dir`.
    #[serde(default = "default_vectors_file")]
    pub vectors_file: String,
    /// Metadata document file name inside `data_dir`.
    #[serde(default = "default_metadata_file")]
    pub metadata_file: String,
    /// Result cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_dimension() -> usize {
    512
}

fn default_max_results() -> usize {
    20
}

// Unit vectors with cosine similarity 0.8 sit at L2 distance sqrt(0.4) ~ 0.632.
fn default_max_distance() -> f32 {
    0.632
}

fn default_snapshot_interval() -> usize {
    10
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./features")
}

fn default_vectors_file() -> String {
    DEFAULT_VECTORS_FILE.to_string()
}

fn default_metadata_file() -> String {
    DEFAULT_METADATA_FILE.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            max_results: default_max_results(),
            max_distance: default_max_distance(),
            snapshot_interval: default_snapshot_interval(),
            data_dir: default_data_dir(),
            vectors_file: default_vectors_file(),
            metadata_file: default_metadata_file(),
            cache: CacheConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Config for a given dimension rooted at `data_dir`, other fields default.
    pub fn new(dimension: usize, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            dimension,
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Full path of the vector blob.
    pub fn vectors_path(&self) -> PathBuf {
        self.data_dir.join(&self.vectors_file)
    }

    /// Full path of the metadata document.
    pub fn metadata_path(&self) -> PathBuf {
        self.data_dir.join(&self.metadata_file)
    }

    /// Check every field is in range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDimension` for a zero dimension and `InvalidConfig`
    /// for any other out-of-range field.
    pub fn validate(&self) -> StoreResult<()> {
        if self.dimension == 0 {
            return Err(StoreError::InvalidDimension {
                dimension: self.dimension,
            });
        }
        if self.max_results == 0 {
            return Err(StoreError::invalid_config("max_results", "must be > 0"));
        }
        if !self.max_distance.is_finite() || self.max_distance < 0.0 {
            return Err(StoreError::invalid_config(
                "max_distance",
                "must be a finite, non-negative number",
            ));
        }
        if self.snapshot_interval == 0 {
            return Err(StoreError::invalid_config("snapshot_interval", "must be > 0"));
        }
        if self.vectors_file.is_empty() || self.metadata_file.is_empty() {
            return Err(StoreError::invalid_config(
                "vectors_file/metadata_file",
                "file names cannot be empty",
            ));
        }
        if self.vectors_file == self.metadata_file {
            return Err(StoreError::invalid_config(
                "vectors_file/metadata_file",
                "artifacts must use distinct file names",
            ));
        }
        if self.cache.enabled && self.cache.timeout_ms == 0 {
            return Err(StoreError::invalid_config("cache.timeout_ms", "must be > 0"));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# revsearch vector store configuration
#
# Vector dimension produced by the embedding model (512, 1280, 4096, ...)
dimension = 512

# Largest k accepted by a single search
max_results = 20

# Results farther than this L2 distance are dropped (vectors are unit-norm,
# so 0.632 ~ sqrt(0.4) is cosine similarity 0.8)
max_distance = 0.632

# Snapshot to disk every N adds (removals always snapshot)
snapshot_interval = 10

# Directory and file names of the two snapshot artifacts
data_dir = "./features"
vectors_file = "vectors.bin"
metadata_file = "metadata.json"

[cache]
# Memoize search results (invalidated on every add/remove)
enabled = false
ttl_secs = 3600
timeout_ms = 250
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StoreError::invalid_config(
                "file",
                format!("Failed to read config file '{}': {}", path.display(), e),
            )
        })?;
        let config: StoreConfig = toml::from_str(&content).map_err(|e| {
            StoreError::invalid_config(
                "file",
                format!("Failed to parse config file '{}': {}", path.display(), e),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> StoreResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                StoreError::Persistence(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> StoreResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StoreError::Serialization(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            StoreError::Persistence(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
