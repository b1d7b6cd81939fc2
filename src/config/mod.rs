// SPDX-License-Identifier: MPL-2.0
//! This module handles the application's configuration, including loading and
//! saving user preferences to a `settings.toml` file.
//!
//! Preferences are user-editable TOML; transient session state (the cached
//! zoom level) lives in a separate CBOR file, see [`crate::app::session`].

pub mod defaults;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "settings.toml";
const APP_NAME: &str = "Folio";

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Path or URL of the content map to open at startup.
    pub content_map: Option<String>,

    /// Disables loupe zoomability and shortens transitions.
    #[serde(default)]
    pub reduced_motion: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            content_map: None,
            reduced_motion: Some(false),
        }
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

pub fn load() -> Result<Config> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(Config::default())
}

pub fn save(config: &Config) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

pub fn load_from_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)?;
    let config = toml::from_str(&contents)?;
    Ok(config)
}

pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = toml::to_string(config)?;
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_has_no_map_override() {
        let config = Config::default();
        assert!(config.content_map.is_none());
        assert_eq!(config.reduced_motion, Some(false));
    }

    #[test]
    fn round_trip_preserves_settings() {
        let temp_dir = tempdir().expect("create temp dir");
        let path = temp_dir.path().join("settings.toml");

        let config = Config {
            content_map: Some("maps/portfolio.xml".to_string()),
            reduced_motion: Some(true),
        };

        save_to_path(&config, &path).expect("save config");
        let loaded = load_from_path(&path).expect("load config");

        assert_eq!(loaded.content_map, config.content_map);
        assert_eq!(loaded.reduced_motion, Some(true));
    }

    #[test]
    fn missing_optional_fields_fall_back() {
        let temp_dir = tempdir().expect("create temp dir");
        let path = temp_dir.path().join("settings.toml");
        fs::write(&path, "content_map = \"a.xml\"\n").expect("write config");

        let loaded = load_from_path(&path).expect("load config");
        assert_eq!(loaded.content_map.as_deref(), Some("a.xml"));
        assert!(loaded.reduced_motion.is_none());
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let temp_dir = tempdir().expect("create temp dir");
        let path = temp_dir.path().join("settings.toml");
        fs::write(&path, "content_map = [").expect("write config");

        match load_from_path(&path) {
            Err(crate::error::Error::Config(_)) => {}
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn save_creates_parent_directories() {
        let temp_dir = tempdir().expect("create temp dir");
        let nested = temp_dir.path().join("nested").join("settings.toml");

        save_to_path(&Config::default(), &nested).expect("save config");
        assert!(nested.exists());
    }
}
