use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::feed::DEFAULT_PAGE_SIZE;
use crate::storage::ensure_parent_dir;

pub const DEFAULT_CONFIG_PATH: &str = "config/warung.json";
pub const DEFAULT_DATABASE_PATH: &str = "data/warung.db";
pub const DEFAULT_SENDER: &str = "Bunda";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: String,
    /// History page size for the chat feed.
    pub page_size: usize,
    pub default_sender: String,
    /// Ring the terminal bell when a live message lands.
    pub chime: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            default_sender: DEFAULT_SENDER.to_string(),
            chime: true,
        }
    }
}

impl AppConfig {
    pub fn page_size(&self) -> usize {
        self.page_size.max(1)
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}

pub fn save_config(path: &str, config: &AppConfig) -> std::io::Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let config = load_config(path.to_str().unwrap());
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.page_size(), 100);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warung.json");
        fs::write(&path, r#"{ "default_sender": "Ayah", "page_size": 0 }"#).unwrap();

        let config = load_config(path.to_str().unwrap());
        assert_eq!(config.default_sender, "Ayah");
        assert_eq!(config.page_size(), 1);
        assert_eq!(config.database_path, DEFAULT_DATABASE_PATH);
        assert!(config.chime);
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/warung.json");
        let path = path.to_str().unwrap();
        let config = AppConfig {
            chime: false,
            ..AppConfig::default()
        };

        save_config(path, &config).unwrap();
        assert_eq!(load_config(path), config);
    }

    #[test]
    fn garbage_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warung.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(load_config(path.to_str().unwrap()), AppConfig::default());
    }
}
