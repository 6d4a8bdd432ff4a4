//! Startup configuration. Everything has a default so the application runs
//! without a config file; the optional TOML file only overrides paths and the
//! log level.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use tracing::Level;

/// Database location relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "database/songs.db";
/// Log file written next to the database; the terminal belongs to the UI.
pub const DEFAULT_LOG_PATH: &str = "database/songbook.log";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub log_path: PathBuf,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load `config.toml` from the platform config directory, falling back to
    /// defaults when there is no such directory or file.
    pub fn load() -> Result<Self> {
        match config_file_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(raw).context("failed to parse TOML")?;
        config.level()?;
        Ok(config)
    }

    /// Parsed tracing level.
    pub fn level(&self) -> Result<Level> {
        Level::from_str(self.log_level.trim())
            .map_err(|_| anyhow!("unknown log level '{}'", self.log_level))
    }
}

/// Where the optional config file would live on this platform.
pub fn config_file_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "songbook").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.database_path, PathBuf::from("database/songs.db"));
        assert_eq!(config.level().unwrap(), Level::INFO);
    }

    #[test]
    fn fields_override_defaults() {
        let config = AppConfig::from_toml(
            r#"
            database_path = "/srv/music/songs.db"
            log_level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/srv/music/songs.db"));
        assert_eq!(config.log_path, PathBuf::from(DEFAULT_LOG_PATH));
        assert_eq!(config.level().unwrap(), Level::DEBUG);
    }

    #[test]
    fn bad_level_and_unknown_keys_are_rejected() {
        assert!(AppConfig::from_toml(r#"log_level = "loud""#).is_err());
        assert!(AppConfig::from_toml(r#"colour = "blue""#).is_err());
    }

    #[test]
    fn from_file_reports_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "log_level = 3").unwrap();

        let err = AppConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }
}
