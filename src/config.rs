//! Configuration for dirdb
//!
//! Centralized configuration with sensible defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DbError, Result};

/// Main configuration for a dirdb instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory that holds every database directory
    /// Internal structure:
    ///   {data_dir}/
    ///     └── {database}/
    ///           ├── {table}                  (JSON array)
    ///           └── {table}_formatted.txt    (text export)
    pub data_dir: PathBuf,

    /// How table files are rewritten after a mutation
    pub write_mode: WriteMode,

    // -------------------------------------------------------------------------
    // Export Configuration
    // -------------------------------------------------------------------------
    /// Suffix appended to a table name for its formatted export
    pub formatted_suffix: String,
}

/// Table rewrite strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Write a sibling temp file, then rename it over the table
    AtomicRename,

    /// Truncate the table file and write the new contents into it
    InPlace,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            write_mode: WriteMode::AtomicRename,
            formatted_suffix: "_formatted.txt".to_string(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load a config from a JSON file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read(path)?;
        serde_json::from_slice(&raw).map_err(|e| {
            DbError::Parse(format!("config file {}: {}", path.display(), e))
        })
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Start from an existing config instead of the defaults
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Set the data directory (root for all databases)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the table rewrite strategy
    pub fn write_mode(mut self, mode: WriteMode) -> Self {
        self.config.write_mode = mode;
        self
    }

    /// Set the suffix used for formatted exports
    pub fn formatted_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.formatted_suffix = suffix.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
