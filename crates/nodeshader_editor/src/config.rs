// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor configuration.
//!
//! Stored as RON next to the graph documents:
//!
//! ```ron
//! EditorConfig(
//!     version: 1,
//!     history_capacity: 50,
//!     default_backend: wgsl,
//!     output_dir: "shaders",
//!     log_filter: "info",
//!     watch_debounce_ms: 200,
//! )
//! ```

use crate::history::DEFAULT_HISTORY_CAPACITY;
use nodeshader_graph::BackendKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Current config format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "nodeshader.ron";

/// Error type for config files
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File access failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed config file
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// Written by a newer version of the editor
    #[error("Config version {0} is newer than supported version {v}", v = CONFIG_FORMAT_VERSION)]
    UnsupportedVersion(u32),
}

/// Editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Settings format version
    pub version: u32,
    /// Maximum undo entries
    pub history_capacity: usize,
    /// Backend used when none is requested
    pub default_backend: BackendKind,
    /// Directory compiled shaders are written to
    pub output_dir: PathBuf,
    /// Default `tracing` filter directive, overridden by `RUST_LOG`
    pub log_filter: String,
    /// Quiet period before a changed document is reloaded, in milliseconds
    pub watch_debounce_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            default_backend: BackendKind::default(),
            output_dir: PathBuf::from("shaders"),
            log_filter: "info".to_string(),
            watch_debounce_ms: 200,
        }
    }
}

impl EditorConfig {
    /// Load config from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: EditorConfig = ron::from_str(&content)?;

        if config.version > CONFIG_FORMAT_VERSION {
            return Err(ConfigError::UnsupportedVersion(config.version));
        }

        Ok(config)
    }

    /// Load `nodeshader.ron` from `dir`, or defaults if there is none
    pub fn load_or_default(dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::config_file_path(dir);
        if !path.exists() {
            return Ok(Self::default());
        }
        let config = Self::load(&path)?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, pretty)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the config file path for a directory
    pub fn config_file_path(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE_NAME)
    }

    /// Debounce window for the file watcher
    pub fn watch_debounce(&self) -> Duration {
        Duration::from_millis(self.watch_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.version, CONFIG_FORMAT_VERSION);
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.default_backend, BackendKind::Wgsl);
        assert_eq!(config.watch_debounce(), Duration::from_millis(200));
    }

    #[test]
    fn test_serialization() {
        let config = EditorConfig {
            history_capacity: 10,
            default_backend: BackendKind::Glsl,
            ..EditorConfig::default()
        };
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        let loaded: EditorConfig = ron::from_str(&ron_str).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let loaded: EditorConfig = ron::from_str("(default_backend: glsl)").unwrap();
        assert_eq!(loaded.default_backend, BackendKind::Glsl);
        assert_eq!(loaded.history_capacity, DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    fn test_newer_version_rejected() {
        let dir = std::env::temp_dir().join(format!("nodeshader_config_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = EditorConfig::config_file_path(&dir);

        let config = EditorConfig {
            version: CONFIG_FORMAT_VERSION + 1,
            ..EditorConfig::default()
        };
        config.save(&path).unwrap();
        let err = EditorConfig::load_or_default(&dir).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedVersion(2)));
        assert_eq!(err.to_string(), "Config version 2 is newer than supported version 1");

        std::fs::remove_dir_all(&dir).ok();
        assert_eq!(
            EditorConfig::load_or_default(&dir).unwrap(),
            EditorConfig::default()
        );
    }
}
