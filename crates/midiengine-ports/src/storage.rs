use crate::types::Volume01;
use serde::{Deserialize, Serialize};

fn default_autoload_soundfont() -> bool {
    true
}

fn default_sample_rate_hz() -> u32 {
    44_100
}

fn default_master_volume() -> Volume01 {
    Volume01::new(0.5)
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(String),
    #[error("serialization error: {0}")]
    Serde(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsDto {
    pub default_soundfont_path: Option<String>,
    #[serde(default = "default_autoload_soundfont")]
    pub autoload_soundfont: bool,
    #[serde(default = "default_sample_rate_hz")]
    pub sample_rate_hz: u32,
    #[serde(default = "default_master_volume")]
    pub master_volume: Volume01,
}

impl Default for SettingsDto {
    fn default() -> Self {
        Self {
            default_soundfont_path: None,
            autoload_soundfont: true,
            sample_rate_hz: 44_100,
            master_volume: Volume01::new(0.5),
        }
    }
}

pub trait StoragePort: Send + Sync {
    fn load_settings(&self) -> Result<SettingsDto, StorageError>;
    fn save_settings(&self, s: &SettingsDto) -> Result<(), StorageError>;
}
