//! # Config Module
//!
//! Persisted settings: the last source directory, target directory and
//! overwrite choice. Stored as pretty JSON in the platform config directory,
//! e.g. `~/.config/nas-media-uploader/settings.json` on Linux.
//!
//! The core never reads these; front ends load them at startup, pass the
//! values into a scan, and save after each change.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "nas-media-uploader";
const SETTINGS_FILE: &str = "settings.json";

/// User settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source_directory: String,
    pub target_directory: String,
    pub overwrite_duplicates: bool,
}

impl Settings {
    /// Source directory, if one has been chosen
    pub fn source(&self) -> Option<PathBuf> {
        non_empty_path(&self.source_directory)
    }

    /// Target directory, if one has been chosen
    pub fn target(&self) -> Option<PathBuf> {
        non_empty_path(&self.target_directory)
    }
}

fn non_empty_path(s: &str) -> Option<PathBuf> {
    if s.trim().is_empty() {
        None
    } else {
        Some(PathBuf::from(s))
    }
}

/// Reads and writes [`Settings`] at a fixed path
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store at the platform default location
    pub fn open_default() -> Result<Self, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDirectory)?;
        Ok(Self::at(dir.join(APP_DIR).join(SETTINGS_FILE)))
    }

    /// Store at an explicit path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings; a missing file yields defaults
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No settings at {}, using defaults", self.path.display());
                return Ok(Settings::default());
            }
            Err(e) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Save settings, creating the parent directory if needed
    pub fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::write(&self.path, json).map_err(|e| ConfigError::Write {
            path: self.path.clone(),
            source: e,
        })?;

        tracing::debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}
