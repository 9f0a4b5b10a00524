//! Soundfont/engine pairing state.
//!
//! ```text
//! Unloaded --load--> Loading --accepted--> Ready --unload--> Unloaded
//!                       |                    |
//!                       +--failed--> Failed  +--load--> Loading
//!                                      |
//!                                      +--load--> Loading
//! ```

use midiengine_ports::synth::SoundFontInfo;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason")]
pub enum EngineState {
    Unloaded,
    Loading,
    Ready,
    Failed(String),
}

impl EngineState {
    pub fn is_ready(&self) -> bool {
        matches!(self, EngineState::Ready)
    }
}

/// The bank currently accepted by the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoundfontHandle {
    generation: u64,
    path: PathBuf,
    info: SoundFontInfo,
}

impl SoundfontHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self) -> &SoundFontInfo {
        &self.info
    }
}

#[derive(Debug)]
pub struct Lifecycle {
    state: EngineState,
    handle: Option<SoundfontHandle>,
    generation: u64,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: EngineState::Unloaded,
            handle: None,
            generation: 0,
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    pub fn handle(&self) -> Option<&SoundfontHandle> {
        self.handle.as_ref()
    }

    /// Enter `Loading` from any state. The previous handle is released
    /// whatever the outcome of the new load.
    pub fn begin_load(&mut self) -> Option<SoundfontHandle> {
        self.state = EngineState::Loading;
        self.handle.take()
    }

    pub fn complete_load(&mut self, path: &Path, info: SoundFontInfo) -> &SoundfontHandle {
        self.generation += 1;
        self.state = EngineState::Ready;
        self.handle.insert(SoundfontHandle {
            generation: self.generation,
            path: path.to_path_buf(),
            info,
        })
    }

    pub fn fail_load(&mut self, reason: impl Into<String>) {
        self.state = EngineState::Failed(reason.into());
        self.handle = None;
    }

    pub fn unload(&mut self) -> Option<SoundfontHandle> {
        self.state = EngineState::Unloaded;
        self.handle.take()
    }
}
