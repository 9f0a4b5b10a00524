use crate::engine::SynthEngine;
use crate::error::EngineError;
use crate::ipc::{Command, MethodCall, Reply};
use midiengine_ports::storage::{SettingsDto, StoragePort};
use midiengine_ports::synth::{SoundFontInfo, SynthBackend};
use serde_json::{json, Value};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Command boundary: decodes host calls, drives the engine and keeps the
/// persisted settings in step.
pub struct AppCore {
    engine: SynthEngine,
    storage: Option<Box<dyn StoragePort>>,
    settings: SettingsDto,
}

impl AppCore {
    pub fn new(backend: Arc<dyn SynthBackend>, storage: Option<Box<dyn StoragePort>>) -> Self {
        let settings = if let Some(storage) = storage.as_ref() {
            storage.load_settings().unwrap_or_else(|err| {
                tracing::warn!(error = %err, "settings unreadable, using defaults");
                SettingsDto::default()
            })
        } else {
            SettingsDto::default()
        };
        Self::with_settings(backend, storage, settings)
    }

    pub fn with_settings(
        backend: Arc<dyn SynthBackend>,
        storage: Option<Box<dyn StoragePort>>,
        settings: SettingsDto,
    ) -> Self {
        Self {
            engine: SynthEngine::new(backend),
            storage,
            settings,
        }
    }

    pub fn engine(&self) -> &SynthEngine {
        &self.engine
    }

    pub fn settings(&self) -> &SettingsDto {
        &self.settings
    }

    /// Load the remembered soundfont, if autoload is on and one is known.
    pub fn autoload(&mut self) -> Option<Result<SoundFontInfo, EngineError>> {
        if !self.settings.autoload_soundfont {
            return None;
        }
        let path = self.settings.default_soundfont_path.clone()?;
        Some(self.engine.load(&path))
    }

    /// Decode and run one host call. Never panics: a panic anywhere below
    /// is reported as an internal error.
    pub fn handle_call(&mut self, call: &MethodCall) -> Reply {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            Command::from_call(call).and_then(|command| self.handle_command(command))
        }));

        match outcome {
            Ok(result) => result.into(),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(method = %call.method, %message, "command panicked");
                EngineError::Internal(message).into()
            }
        }
    }

    pub fn handle_command(&mut self, command: Command) -> Result<Value, EngineError> {
        match command {
            Command::LoadSoundfont { path } => {
                let info = self.engine.load(&path)?;
                self.settings.default_soundfont_path = Some(path);
                self.save_settings();
                Ok(json!(info))
            }
            Command::UnloadSoundfont => {
                self.engine.unload()?;
                Ok(Value::Bool(true))
            }
            Command::PlayNote {
                note,
                velocity,
                channel,
            } => self.engine.play_note(note, velocity, channel).map(|_| Value::Null),
            Command::StopNote {
                note,
                velocity,
                channel,
            } => self.engine.stop_note(note, velocity, channel).map(|_| Value::Null),
            Command::ChangeProgram { program, channel } => self
                .engine
                .change_program(program, channel)
                .map(|_| Value::Null),
            Command::SetVolume { volume, channel } => {
                self.engine.set_volume(volume, channel).map(|_| Value::Null)
            }
            Command::SetPan { pan, channel } => {
                self.engine.set_pan(pan, channel).map(|_| Value::Null)
            }
            Command::SetReverb(params) => self.engine.set_reverb(params).map(|_| Value::Null),
            Command::SetChorus(params) => self.engine.set_chorus(params).map(|_| Value::Null),
            Command::StopAllNotes => self.engine.stop_all_notes().map(|_| Value::Null),
            Command::ResetAllControllers => {
                self.engine.reset_all_controllers().map(|_| Value::Null)
            }
            Command::SendControlChange {
                controller,
                value,
                channel,
            } => self
                .engine
                .send_control_change(controller, value, channel)
                .map(|_| Value::Null),
            Command::SendPitchBend { value, channel } => {
                self.engine.send_pitch_bend(value, channel).map(|_| Value::Null)
            }
            Command::Unmute => self.engine.unmute().map(|_| Value::Null),
            Command::GetEngineState => {
                let soundfont = self.engine.soundfont().map(|handle| {
                    json!({
                        "path": handle.path().display().to_string(),
                        "info": handle.info(),
                    })
                });
                Ok(json!({
                    "engine": self.engine.state(),
                    "soundfont": soundfont,
                }))
            }
            Command::GetChannelState { channel } => Ok(json!({
                "channel": channel & 0x0F,
                "state": self.engine.channel_state(channel),
            })),
        }
    }

    fn save_settings(&self) {
        if let Some(storage) = self.storage.as_ref() {
            if let Err(err) = storage.save_settings(&self.settings) {
                tracing::warn!(error = %err, "saving settings failed");
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
