// SPDX-License-Identifier: MPL-2.0
//! Session state persistence using CBOR format.
//!
//! The viewer persists exactly one transient value across sessions: the last
//! loupe zoom level, under a fixed key (last value wins, not scoped
//! per-image). It is not user-configurable, so it lives apart from the TOML
//! preferences, in a compact CBOR state file.
//!
//! # Path Resolution
//!
//! 1. Explicit base directory passed to [`SessionStore::at`] (tests,
//!    portable deployments)
//! 2. `FOLIO_DATA_DIR` environment variable
//! 3. Platform data directory
//!
//! All failures here are reported as warnings and swallowed by callers:
//! zoom restoration degrades to the default level, never to an error.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

const STATE_FILE: &str = "session.cbor";
const APP_NAME: &str = "Folio";
const DATA_DIR_ENV: &str = "FOLIO_DATA_DIR";

/// Transient state persisted across sessions.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    /// Last loupe zoom level; restored (re-clamped) by the next magnifier.
    #[serde(default)]
    pub zoom_level: Option<f32>,
}

/// Resolves the state file location and reads/writes [`SessionState`].
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    base_dir: Option<PathBuf>,
}

impl SessionStore {
    /// Store using the standard path resolution.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store rooted at an explicit directory.
    #[must_use]
    pub fn at(base_dir: PathBuf) -> Self {
        Self {
            base_dir: Some(base_dir),
        }
    }

    fn state_file_path(&self) -> Option<PathBuf> {
        let base = match &self.base_dir {
            Some(dir) => Some(dir.clone()),
            None => match std::env::var_os(DATA_DIR_ENV) {
                Some(dir) => Some(PathBuf::from(dir)),
                None => dirs::data_dir().map(|mut dir| {
                    dir.push(APP_NAME);
                    dir
                }),
            },
        };

        base.map(|mut path| {
            path.push(STATE_FILE);
            path
        })
    }

    /// Loads the session state.
    ///
    /// Never fails: a missing file is the default state, and an unreadable
    /// or corrupt file is the default state plus a warning message.
    pub fn load(&self) -> (SessionState, Option<String>) {
        let Some(path) = self.state_file_path() else {
            return (SessionState::default(), None);
        };

        if !path.exists() {
            return (SessionState::default(), None);
        }

        match fs::File::open(&path) {
            Ok(file) => {
                let reader = BufReader::new(file);
                match ciborium::from_reader(reader) {
                    Ok(state) => (state, None),
                    Err(_) => (
                        SessionState::default(),
                        Some(format!("session state at {} is unreadable", path.display())),
                    ),
                }
            }
            Err(error) => (
                SessionState::default(),
                Some(format!("cannot open session state: {error}")),
            ),
        }
    }

    /// Saves the session state, creating parent directories as needed.
    /// Returns a warning message on failure.
    pub fn save(&self, state: &SessionState) -> Option<String> {
        let Some(path) = self.state_file_path() else {
            return Some("no data directory available for session state".to_string());
        };

        if let Some(parent) = path.parent() {
            if fs::create_dir_all(parent).is_err() {
                return Some(format!("cannot create {}", parent.display()));
            }
        }

        match fs::File::create(&path) {
            Ok(file) => {
                let writer = BufWriter::new(file);
                if ciborium::into_writer(state, writer).is_err() {
                    return Some(format!("cannot write {}", path.display()));
                }
                None
            }
            Err(error) => Some(format!("cannot create session state: {error}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_state_has_no_zoom() {
        assert!(SessionState::default().zoom_level.is_none());
    }

    #[test]
    fn round_trip_preserves_zoom_level() {
        let temp_dir = tempdir().expect("create temp dir");
        let store = SessionStore::at(temp_dir.path().to_path_buf());

        let state = SessionState {
            zoom_level: Some(2.25),
        };
        assert!(store.save(&state).is_none(), "save should succeed");

        let (loaded, warning) = store.load();
        assert!(warning.is_none());
        assert_eq!(loaded, state);
    }

    #[test]
    fn load_from_empty_directory_returns_default() {
        let temp_dir = tempdir().expect("create temp dir");
        let store = SessionStore::at(temp_dir.path().to_path_buf());

        let (state, warning) = store.load();
        assert!(warning.is_none(), "missing file is not a warning");
        assert_eq!(state, SessionState::default());
    }

    #[test]
    fn corrupt_state_degrades_to_default_with_warning() {
        let temp_dir = tempdir().expect("create temp dir");
        fs::write(temp_dir.path().join(STATE_FILE), "not cbor").expect("write junk");

        let store = SessionStore::at(temp_dir.path().to_path_buf());
        let (state, warning) = store.load();

        assert_eq!(state, SessionState::default());
        assert!(warning.is_some(), "corrupt file should warn");
    }

    #[test]
    fn save_creates_parent_directories() {
        let temp_dir = tempdir().expect("create temp dir");
        let nested = temp_dir.path().join("deep").join("nested");
        let store = SessionStore::at(nested.clone());

        let warning = store.save(&SessionState {
            zoom_level: Some(1.0),
        });
        assert!(warning.is_none());
        assert!(nested.join(STATE_FILE).exists());
    }

    #[test]
    fn last_save_wins() {
        let temp_dir = tempdir().expect("create temp dir");
        let store = SessionStore::at(temp_dir.path().to_path_buf());

        store.save(&SessionState {
            zoom_level: Some(1.5),
        });
        store.save(&SessionState {
            zoom_level: Some(3.0),
        });

        let (state, _) = store.load();
        assert_eq!(state.zoom_level, Some(3.0));
    }
}
