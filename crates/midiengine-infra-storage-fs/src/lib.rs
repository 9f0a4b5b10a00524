//! Settings persistence as a single pretty-printed JSON file.

use midiengine_ports::storage::{SettingsDto, StorageError, StoragePort};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

const APP_DIR: &str = "MidiEngine";
const SETTINGS_FILE: &str = "settings.json";

pub struct FsStorage {
    config_dir: PathBuf,
}

impl FsStorage {
    pub fn new(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// `<platform config dir>/MidiEngine`.
    pub fn platform_config_dir() -> Result<PathBuf, StorageError> {
        dirs_next::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| StorageError::Io("no platform config directory".to_string()))
    }

    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    fn io_error(&self, action: &str, err: std::io::Error) -> StorageError {
        StorageError::Io(format!(
            "{action} {}: {err}",
            self.settings_path().display()
        ))
    }
}

impl Default for FsStorage {
    fn default() -> Self {
        let config_dir = Self::platform_config_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { config_dir }
    }
}

impl StoragePort for FsStorage {
    fn load_settings(&self) -> Result<SettingsDto, StorageError> {
        let data = match fs::read(self.settings_path()) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(SettingsDto::default()),
            Err(err) => return Err(self.io_error("reading", err)),
        };
        serde_json::from_slice(&data).map_err(|e| StorageError::Serde(e.to_string()))
    }

    /// Writes next to the target and renames over it, so a crash mid-write
    /// leaves the previous file intact.
    fn save_settings(&self, settings: &SettingsDto) -> Result<(), StorageError> {
        fs::create_dir_all(&self.config_dir).map_err(|e| self.io_error("creating", e))?;

        let data =
            serde_json::to_vec_pretty(settings).map_err(|e| StorageError::Serde(e.to_string()))?;
        let staging = self.config_dir.join(format!("{SETTINGS_FILE}.tmp"));
        fs::write(&staging, data).map_err(|e| self.io_error("writing", e))?;
        fs::rename(&staging, self.settings_path()).map_err(|e| self.io_error("replacing", e))
    }
}
