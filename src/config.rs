//! Application configuration
//!
//! Read from `<config-dir>/lernbox/config.toml`. Every field is optional;
//! a missing file means defaults.

use std::path::PathBuf;

use serde::Deserialize;

use crate::store::FileStore;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Overrides the platform data directory holding the card store.
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Path of the config file on this platform, if one can be resolved.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("lernbox").join("config.toml"))
    }

    /// Load the config file if present. A malformed file is reported and
    /// ignored rather than blocking startup.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        let Ok(raw) = std::fs::read_to_string(&path) else {
            return Self::default();
        };

        match toml::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring malformed config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Effective storage directory: the override if set, else the
    /// platform default.
    pub fn storage_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone().or_else(FileStore::default_data_dir)
    }
}
