//! Store configuration persisted as JSON.
//!
//! Lives at an OS-appropriate location by default; every field has a default
//! so a partial or missing file still yields a usable configuration.

use crate::{DeletePolicy, MatchMode, PurgeStrategy, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings that shape how a [`NoteStore`](crate::NoteStore) behaves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// SQLite file to open. `None` means [`default_database_path`].
    pub database_path: Option<PathBuf>,
    pub match_mode: MatchMode,
    pub delete_policy: DeletePolicy,
    pub operation_log: PurgeStrategy,
}

impl StoreConfig {
    /// Resolves the database file this configuration points at.
    pub fn resolved_database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }
}

/// Returns the default configuration file path.
///
/// - Linux: `~/.config/stashnotes/config.json`
/// - macOS: `~/Library/Application Support/stashnotes/config.json`
/// - Windows: `%APPDATA%/stashnotes/config.json`
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stashnotes")
        .join("config.json")
}

/// Returns the default database path under the user's data directory.
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local")
                .join("share")
        })
        .join("stashnotes")
        .join("notes.db")
}

/// Loads configuration from `path`; returns defaults if the file is missing or corrupt.
pub fn load_config(path: &Path) -> StoreConfig {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return StoreConfig::default(),
    };
    match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("ignoring unreadable config {}: {e}", path.display());
            StoreConfig::default()
        }
    }
}

/// Saves configuration to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`crate::StashError::Io`] or [`crate::StashError::Json`] on failure.
pub fn save_config(path: &Path, config: &StoreConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("absent.json"));
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.delete_policy, DeletePolicy::Strict);
        assert_eq!(config.match_mode, MatchMode::IgnoreCase);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = StoreConfig {
            database_path: Some(dir.path().join("notes.db")),
            match_mode: MatchMode::CaseSensitive,
            delete_policy: DeletePolicy::Idempotent,
            operation_log: PurgeStrategy::KeepLast { keep_last: 10 },
        };

        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path), config);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "deletePolicy": "Idempotent" }"#).unwrap();

        let config = load_config(&path);
        assert_eq!(config.delete_policy, DeletePolicy::Idempotent);
        assert_eq!(config.match_mode, MatchMode::IgnoreCase);
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_corrupt_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_config(&path), StoreConfig::default());
    }

    #[test]
    fn test_default_database_path_is_named() {
        assert!(default_database_path().ends_with("stashnotes/notes.db"));
        assert!(config_file_path().ends_with("stashnotes/config.json"));
    }
}
