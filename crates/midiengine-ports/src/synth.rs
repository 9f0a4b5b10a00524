use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum SynthError {
    #[error("soundfont not found: {0}")]
    NotFound(String),
    #[error("soundfont unreadable: {0}")]
    Unreadable(String),
    #[error("soundfont rejected: {0}")]
    Rejected(String),
    #[error("no soundfont accepted")]
    NoSoundFont,
    #[error("malformed message: {0:02X?}")]
    MalformedMessage(Vec<u8>),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Soundfont bytes read from disk, not yet accepted by any engine.
#[derive(Clone, Debug)]
pub struct SoundFontResource {
    pub path: PathBuf,
    pub data: Arc<[u8]>,
}

impl SoundFontResource {
    pub fn read(path: &Path) -> Result<Self, SynthError> {
        let data = fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SynthError::NotFound(path.display().to_string()),
            _ => SynthError::Unreadable(format!("{}: {}", path.display(), e)),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            data: data.into(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundFontInfo {
    pub name: String,
    pub preset_count: usize,
}

/// Capability set every platform synthesis engine provides.
///
/// Thread model: all methods are called with the engine lock held, one call
/// at a time per engine. `send_bytes` receives a complete 1-3 byte channel
/// message.
pub trait SynthBackend: Send + Sync {
    /// Verify the resource exists and read it.
    fn load_resource(&self, path: &Path) -> Result<SoundFontResource, SynthError> {
        SoundFontResource::read(path)
    }

    /// Hand a resource to the engine. Replaces any previously accepted bank.
    fn accept_soundfont(&self, resource: SoundFontResource) -> Result<SoundFontInfo, SynthError>;

    fn release_soundfont(&self) -> Result<(), SynthError>;

    fn send_bytes(&self, message: &[u8]) -> Result<(), SynthError>;

    /// Platform audio-session activation. Most engines need nothing here.
    fn activate_audio_session(&self) -> Result<(), SynthError> {
        Ok(())
    }
}
