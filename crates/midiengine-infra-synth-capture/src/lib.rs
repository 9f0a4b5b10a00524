//! Synthesis backend that records what it is handed instead of making sound.

use midiengine_ports::synth::{SoundFontInfo, SoundFontResource, SynthBackend, SynthError};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

pub struct CaptureSynth {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    messages: Vec<Vec<u8>>,
    accepted: Option<PathBuf>,
    accept_count: usize,
    release_count: usize,
    session_active: bool,
    reject_soundfonts: bool,
    fail_sends: bool,
}

impl CaptureSynth {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Every message accepted so far, oldest first.
    pub fn messages(&self) -> Vec<Vec<u8>> {
        self.inner.lock().messages.clone()
    }

    pub fn take_messages(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.inner.lock().messages)
    }

    pub fn accepted_soundfont(&self) -> Option<PathBuf> {
        self.inner.lock().accepted.clone()
    }

    pub fn accept_count(&self) -> usize {
        self.inner.lock().accept_count
    }

    pub fn release_count(&self) -> usize {
        self.inner.lock().release_count
    }

    pub fn session_active(&self) -> bool {
        self.inner.lock().session_active
    }

    /// While set, `accept_soundfont` declines every resource.
    pub fn set_reject_soundfonts(&self, reject: bool) {
        self.inner.lock().reject_soundfonts = reject;
    }

    /// While set, `send_bytes` fails without recording.
    pub fn set_fail_sends(&self, fail: bool) {
        self.inner.lock().fail_sends = fail;
    }
}

impl Default for CaptureSynth {
    fn default() -> Self {
        Self::new()
    }
}

fn display_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("SoundFont")
        .to_string()
}

impl SynthBackend for CaptureSynth {
    fn accept_soundfont(&self, resource: SoundFontResource) -> Result<SoundFontInfo, SynthError> {
        let mut inner = self.inner.lock();
        if inner.reject_soundfonts {
            return Err(SynthError::Rejected(format!(
                "capture backend declined {}",
                resource.path.display()
            )));
        }
        inner.accept_count += 1;
        inner.accepted = Some(resource.path.clone());
        tracing::debug!(path = %resource.path.display(), bytes = resource.data.len(), "capture accepted soundfont");
        Ok(SoundFontInfo {
            name: display_name(&resource.path),
            preset_count: 0,
        })
    }

    fn release_soundfont(&self) -> Result<(), SynthError> {
        let mut inner = self.inner.lock();
        inner.accepted = None;
        inner.release_count += 1;
        Ok(())
    }

    fn send_bytes(&self, message: &[u8]) -> Result<(), SynthError> {
        let mut inner = self.inner.lock();
        if inner.fail_sends {
            return Err(SynthError::Backend("capture send failure".to_string()));
        }
        inner.messages.push(message.to_vec());
        Ok(())
    }

    fn activate_audio_session(&self) -> Result<(), SynthError> {
        self.inner.lock().session_active = true;
        Ok(())
    }
}
