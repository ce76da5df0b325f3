//! Locating, parsing and validating the engine configuration file.

use std::path::{Path, PathBuf};

use super::EngineConfig;
use crate::protocol::InvalidMarker;

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".vampire-supervisor.toml";

/// Loads an [`EngineConfig`] from the first config file that exists.
///
/// Without any file the built-in defaults apply. A file that exists is
/// parsed as a partial table over the defaults and its marker table is
/// validated before the config is handed out.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Candidate files, highest priority first.
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Look in the working directory, then in the user config directory
    /// (`<config_dir>/vampire-supervisor/config.toml`).
    #[must_use]
    pub fn new() -> Self {
        let mut search_paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("vampire-supervisor").join("config.toml"));
        }
        Self { search_paths }
    }

    /// Only consider `path`, as given by `--config`.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            search_paths: vec![path],
        }
    }

    /// Load and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or
    /// parsed, or if its markers cannot classify lines unambiguously.
    pub fn load(&self) -> Result<EngineConfig, ConfigError> {
        let Some(path) = self.find_config_file() else {
            tracing::debug!(searched = ?self.search_paths, "No config file found, using defaults");
            return Ok(EngineConfig::default());
        };

        let config = parse_file(path)?;
        config
            .markers
            .validate()
            .map_err(|source| ConfigError::InvalidMarker {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!(
            path = %path.display(),
            binary = %config.binary.display(),
            input_syntax = %config.input_syntax,
            "Loaded config file"
        );
        Ok(config)
    }

    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// The first candidate file that exists.
    #[must_use]
    pub fn find_config_file(&self) -> Option<&Path> {
        self.search_paths
            .iter()
            .map(PathBuf::as_path)
            .find(|p| p.is_file())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_file(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    })
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid markers in config file {}: {source}", path.display())]
    InvalidMarker {
        path: PathBuf,
        source: InvalidMarker,
    },
}
