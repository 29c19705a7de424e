//! Application configuration.
//!
//! Aggregates storage and per-sequence settings into a single [`Settings`]
//! struct that can be loaded from YAML files or environment variables.

mod sequence;
mod storage;

use std::collections::HashMap;

use serde::Deserialize;

pub use sequence::{SequenceSpec, DEFAULT_KEY_COLUMN, DEFAULT_POSITION_COLUMN, DEFAULT_TABLE};
pub use storage::{PostgresConfig, SqliteConfig, StorageConfig, StorageType};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "positional.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "POSITIONAL_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "POSITIONAL";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "POSITIONAL_LOG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Named sequence types.
    pub sequences: HashMap<String, SequenceSpec>,
}

impl Settings {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `positional.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix, `__` separated
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// Look up a named sequence type.
    pub fn sequence(&self, name: &str) -> Option<&SequenceSpec> {
        self.sequences.get(name)
    }
}
