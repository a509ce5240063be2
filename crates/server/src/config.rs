// Local server configuration.
//
// Config file: `~/.lectern/config.toml`
// Database: `<data_dir>/lectern.db` (data_dir defaults to `~/.lectern/`)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Root directory for Lectern state: `~/.lectern/`.
pub fn global_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".lectern"))
}

/// Path to the config file: `~/.lectern/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    global_dir().map(|d| d.join("config.toml"))
}

/// Server configuration at `~/.lectern/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for the HTTP API.
    pub listen_addr: String,
    /// Directory for the course database; `None` means `~/.lectern/`.
    pub data_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { listen_addr: "127.0.0.1:4810".to_string(), data_dir: None }
    }
}

impl ServerConfig {
    /// Load from `~/.lectern/config.toml`. Returns defaults if the file
    /// doesn't exist or can't be parsed.
    pub fn load() -> Self {
        config_path().and_then(|p| Self::load_from(&p).ok()).unwrap_or_default()
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        toml::from_str(&contents).map_err(ConfigError::Parse)
    }

    /// Save to a specific path (creates parent directories).
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    /// Resolved path of the course database file.
    pub fn database_path(&self) -> Option<PathBuf> {
        let dir = self.data_dir.clone().or_else(global_dir)?;
        Some(dir.join("lectern.db"))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_addr, "127.0.0.1:4810");
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn partial_config_files_fall_back_to_defaults_per_field() {
        let config: ServerConfig =
            toml::from_str("listen_addr = \"0.0.0.0:8080\"").expect("config should parse");
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = dir.path().join("config.toml");

        let config = ServerConfig {
            listen_addr: "127.0.0.1:9000".to_string(),
            data_dir: Some(dir.path().join("data")),
        };
        config.save_to(&path).expect("save should succeed");

        let loaded = ServerConfig::load_from(&path).expect("load should succeed");
        assert_eq!(loaded, config);
    }

    #[test]
    fn database_path_prefers_the_configured_data_dir() {
        let config = ServerConfig {
            listen_addr: "127.0.0.1:4810".to_string(),
            data_dir: Some(PathBuf::from("/tmp/lectern-data")),
        };
        assert_eq!(
            config.database_path(),
            Some(PathBuf::from("/tmp/lectern-data/lectern.db"))
        );
    }
}
