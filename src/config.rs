//! Unified configuration for garmen.
//!
//! Settings are read from `garmen.toml` in the working directory and
//! layered: file → environment (`GARMEN_PORT`, `GARMEN_DB_PATH`) → CLI
//! flags. Every field has a sensible default so the file is optional.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! port = 8950
//! dev = false
//!
//! [database]
//! path = ".garmen/garmen.db"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "garmen.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub database: DatabaseSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Dev mode: bind on all interfaces and allow permissive CORS.
    #[serde(default)]
    pub dev: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            dev: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSection {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_port() -> u16 {
    8950
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".garmen/garmen.db")
}

impl AppConfig {
    /// Load configuration from `garmen.toml` in `dir`, falling back to
    /// defaults when the file does not exist, then apply environment
    /// overrides.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Environment overrides: `GARMEN_PORT` and `GARMEN_DB_PATH`.
    /// A malformed port is ignored rather than fatal.
    fn apply_env(&mut self) {
        if let Ok(port) = std::env::var("GARMEN_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(db_path) = std::env::var("GARMEN_DB_PATH") {
            if !db_path.is_empty() {
                self.database.path = PathBuf::from(db_path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_file_missing() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(dir.path()).unwrap();
        assert_eq!(config.server.port, 8950);
        assert!(!config.server.dev);
        assert_eq!(config.database.path, PathBuf::from(".garmen/garmen.db"));
    }

    #[test]
    fn reads_partial_file_with_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[server]\nport = 9000\n").unwrap();
        let config = AppConfig::load(dir.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        // Unspecified sections fall back to defaults.
        assert_eq!(config.database.path, PathBuf::from(".garmen/garmen.db"));
    }

    #[test]
    fn reads_full_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[server]\nport = 9100\ndev = true\n\n[database]\npath = \"data/pabrik.db\"\n",
        )
        .unwrap();
        let config = AppConfig::load(dir.path()).unwrap();
        assert_eq!(config.server.port, 9100);
        assert!(config.server.dev);
        assert_eq!(config.database.path, PathBuf::from("data/pabrik.db"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[server\nport = banyak").unwrap();
        assert!(AppConfig::load(dir.path()).is_err());
    }
}
