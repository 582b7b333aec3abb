//! Engine configuration
//!
//! Layered configuration for the engine's CLI callers: defaults, then an
//! optional TOML file, then `FILEMEM_*` environment variables (highest
//! precedence). Nested keys use `__` in the environment, e.g.
//! `FILEMEM_LOGGING__LEVEL=debug`.

use crate::logging::LoggingConfig;
use crate::walker::WalkerConfig;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Working directory holding the status store; None leaves the choice
    /// to the caller.
    pub working_directory: Option<PathBuf>,

    /// Run actions even for files whose status is up to date.
    pub force: bool,

    /// Candidate-selection filters.
    pub walker: WalkerConfig,

    /// Logging setup.
    pub logging: LoggingConfig,
}

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from an optional file and the environment.
    ///
    /// A missing file is not an error; a present-but-invalid one is.
    pub fn load(config_file: Option<&Path>) -> Result<EngineConfig, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path.to_path_buf()).required(false));
        }
        builder
            .add_source(Environment::with_prefix("FILEMEM").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a specific file, which must exist.
    pub fn load_from_file(path: &Path) -> Result<EngineConfig, ConfigError> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()))
            .build()?
            .try_deserialize()
    }

    /// Create default configuration.
    pub fn default() -> EngineConfig {
        EngineConfig::default()
    }
}
