//! Configuration management for Iconsight.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. All config structs implement `Default`.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Iconsight.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Classifier model settings
    pub models: ModelsConfig,

    /// Rasterization settings
    pub raster: RasterConfig,

    /// Ensemble labeling settings
    pub labeling: LabelingConfig,

    /// Icon candidate selection
    pub discovery: DiscoveryConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.iconsight.iconsight/config.toml
    /// - Linux: ~/.config/iconsight/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\iconsight\config\config.toml
    ///
    /// Falls back to ~/.iconsight/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "iconsight", "iconsight")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".iconsight").join("config.toml")
            })
    }

    /// Resolve a model identifier: URLs pass through, local paths get `~` expansion.
    pub fn resolve_model_source(source: &str) -> String {
        if is_remote(source) {
            source.to_string()
        } else {
            shellexpand::tilde(source).into_owned()
        }
    }

    /// Get the resolved taxonomy file path (with ~ expansion).
    pub fn taxonomy_path(&self) -> PathBuf {
        let path_str = self.models.taxonomy.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Whether an identifier points at an http(s) resource.
pub(crate) fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
