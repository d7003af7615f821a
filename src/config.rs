//! Persistent settings.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tool configuration, stored as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// MIDI channel the synth listens on (1-16).
    pub midi_channel: u8,
    /// Quiet period before a program write, in milliseconds.
    pub sysex_write_debounce_ms: u64,
    /// Patch library location. Defaults to the platform data directory.
    pub library_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            midi_channel: 1,
            sysex_write_debounce_ms: 150,
            library_root: None,
        }
    }
}

impl Config {
    /// Loads from the standard location.
    /// Returns defaults if the file doesn't exist or is malformed.
    pub fn load() -> Self {
        match Self::try_load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("CONFIG: failed to load config: {}, using defaults", e);
                Self::default()
            }
        }
    }

    fn try_load() -> Result<Self> {
        Self::try_load_from(&Self::config_path()?)
    }

    /// Loads from `path`, falling back to defaults like [`Config::load`].
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load_from(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!(
                    "CONFIG: failed to load {}: {}, using defaults",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Loads from `path`. A missing file gives the defaults.
    pub fn try_load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves to the standard location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Saves atomically (write to temp, then rename).
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, json)?;
        fs::rename(temp_path, path)?;
        Ok(())
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if !(1..=16).contains(&self.midi_channel) {
            return Err(Error::Validation(format!(
                "midi_channel must be 1-16 (got {})",
                self.midi_channel
            )));
        }
        if self.sysex_write_debounce_ms == 0 {
            return Err(Error::Validation(
                "sysex_write_debounce_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Write quiet period as a duration.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.sysex_write_debounce_ms)
    }

    /// Configured library root, or the platform data directory.
    pub fn library_root(&self) -> Result<PathBuf> {
        if let Some(root) = &self.library_root {
            return Ok(root.clone());
        }
        Ok(Self::project_dirs()?.data_dir().join("library"))
    }

    /// Cross-platform config file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.json"))
    }

    fn project_dirs() -> Result<directories::ProjectDirs> {
        directories::ProjectDirs::from("", "", "rkpatch")
            .ok_or_else(|| Error::Config("Failed to determine config directory".to_string()))
    }
}
