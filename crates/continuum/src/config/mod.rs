use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{ContinuumError, Result};
use crate::storage::consolidation::ConsolidationConfig;

/// Main configuration structure for Continuum
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Snapshot persistence configuration
    #[serde(default)]
    pub store: StoreConfig,
    /// Hashing vectorizer configuration
    #[serde(default)]
    pub vectorizer: VectorizerConfig,
    /// Consolidation thresholds and clustering parameters
    #[serde(default)]
    pub consolidation: ConsolidationConfig,
}

impl Config {
    /// Load configuration from an explicit path, or from the first default
    /// location that exists, falling back to built-in defaults.
    ///
    /// Default locations, in order: `~/.continuum/config.toml`,
    /// `<config_dir>/continuum/config.toml`, `./config.toml`.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_path {
            tracing::info!("Loading config from: {}", path.display());
            return Self::from_file(path);
        }

        let default_paths = [
            dirs::home_dir().map(|h| h.join(".continuum").join("config.toml")),
            dirs::config_dir().map(|c| c.join("continuum").join("config.toml")),
            Some(PathBuf::from("config.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Read and parse a TOML config file, then validate it
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ContinuumError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config = Self::from_toml(&content)?;
        Ok(config)
    }

    /// Parse configuration from a TOML string and validate it
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| ContinuumError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde defaults cannot express
    pub fn validate(&self) -> Result<()> {
        self.vectorizer.validate()?;
        self.consolidation.validate()
    }
}

/// Snapshot persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path of the JSON snapshot holding the whole store
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

fn default_snapshot_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".continuum"))
        .unwrap_or_else(|| PathBuf::from(".continuum"))
        .join("continuum_memory.json")
}

/// Hashing vectorizer configuration
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct VectorizerConfig {
    /// Number of hash buckets, i.e. the embedding dimension
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Maximum number of whitespace tokens hashed per payload
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    /// Seed mixed into the token hash. Changing it invalidates stored embeddings.
    #[serde(default = "default_hash_seed")]
    pub hash_seed: u64,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            max_tokens: default_max_tokens(),
            hash_seed: default_hash_seed(),
        }
    }
}

impl VectorizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(ContinuumError::Config(
                "vectorizer.dimension must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_dimension() -> usize {
    128
}

fn default_max_tokens() -> usize {
    100
}

fn default_hash_seed() -> u64 {
    0
}
