use crate::error::EngineError;
use crate::lifecycle::{EngineState, Lifecycle, SoundfontHandle};
use midiengine_domain_midi::{
    encode_control_change, encode_note_off, encode_note_on, encode_pitch_bend,
    encode_program_change, level_to_cc, ChannelState, ChannelStateTable, MidiMessage,
    CC_ALL_NOTES_OFF, CC_CHORUS, CC_PAN, CC_RESET_ALL_CONTROLLERS, CC_REVERB, CC_VOLUME,
};
use midiengine_ports::synth::{SoundFontInfo, SynthBackend, SynthError};
use midiengine_ports::types::{ChorusParams, ReverbParams, CHANNEL_COUNT};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

struct EngineInner {
    lifecycle: Lifecycle,
    channels: ChannelStateTable,
}

/// One synthesizer instance: lifecycle, channel table and the backend they
/// drive.
///
/// Every sound-producing call holds the engine lock from validation through
/// the backend send, and updates the channel table before the bytes go out.
/// Calls made while the engine is not `Ready` are dropped and report
/// success. A failed send is reported but the table keeps the new value.
pub struct SynthEngine {
    backend: Arc<dyn SynthBackend>,
    inner: Mutex<EngineInner>,
    // Serializes load/unload so the slow part of a load can run without
    // holding `inner`.
    load_gate: Mutex<()>,
}

fn classify_load_error(err: SynthError) -> EngineError {
    match err {
        SynthError::NotFound(path) => EngineError::ResourceNotFound(path),
        SynthError::Unreadable(reason) => EngineError::ResourceNotFound(reason),
        other => EngineError::EngineRejected(other.to_string()),
    }
}

impl SynthEngine {
    pub fn new(backend: Arc<dyn SynthBackend>) -> Self {
        Self {
            backend,
            inner: Mutex::new(EngineInner {
                lifecycle: Lifecycle::new(),
                channels: ChannelStateTable::new(),
            }),
            load_gate: Mutex::new(()),
        }
    }

    pub fn state(&self) -> EngineState {
        self.inner.lock().lifecycle.state().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.lock().lifecycle.is_ready()
    }

    pub fn soundfont(&self) -> Option<SoundfontHandle> {
        self.inner.lock().lifecycle.handle().cloned()
    }

    pub fn channel_state(&self, channel: i32) -> ChannelState {
        self.inner.lock().channels.snapshot(channel)
    }

    /// Load a soundfont, replacing whatever was loaded before. Every channel
    /// starts from defaults afterwards, whether the load succeeds or not.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<SoundFontInfo, EngineError> {
        let path = path.as_ref();
        let _gate = self.load_gate.lock();

        let previous = self.inner.lock().lifecycle.begin_load();
        if let Some(previous) = previous.as_ref() {
            tracing::debug!(path = %previous.path().display(), "releasing previous soundfont");
        }

        let result = self
            .backend
            .load_resource(path)
            .and_then(|resource| self.backend.accept_soundfont(resource))
            .map_err(classify_load_error);

        let mut inner = self.inner.lock();
        match result {
            Ok(info) => {
                inner.channels.reset_all();
                let handle = inner.lifecycle.complete_load(path, info.clone());
                tracing::info!(
                    path = %path.display(),
                    name = %info.name,
                    generation = handle.generation(),
                    "soundfont loaded"
                );
                Ok(info)
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "soundfont load failed");
                if previous.is_some() {
                    if let Err(release_err) = self.backend.release_soundfont() {
                        tracing::warn!(error = %release_err, "releasing previous soundfont failed");
                    }
                }
                inner.channels.reset_all();
                inner.lifecycle.fail_load(err.to_string());
                Err(err)
            }
        }
    }

    /// Release the current soundfont. Succeeds without touching the backend
    /// when nothing is loaded. If the backend refuses, the engine stays
    /// `Ready`.
    pub fn unload(&self) -> Result<(), EngineError> {
        let _gate = self.load_gate.lock();
        let mut inner = self.inner.lock();

        match inner.lifecycle.state() {
            EngineState::Unloaded => return Ok(()),
            EngineState::Failed(_) => {}
            EngineState::Ready | EngineState::Loading => {
                self.backend
                    .release_soundfont()
                    .map_err(|e| EngineError::SinkFailure(e.to_string()))?;
            }
        }

        if let Some(handle) = inner.lifecycle.unload() {
            tracing::info!(path = %handle.path().display(), "soundfont unloaded");
        }
        inner.channels.reset_all();
        Ok(())
    }

    pub fn play_note(&self, note: i32, velocity: i32, channel: i32) -> Result<(), EngineError> {
        self.dispatch("play_note", |_| vec![encode_note_on(note, velocity, channel)])
    }

    pub fn stop_note(&self, note: i32, velocity: i32, channel: i32) -> Result<(), EngineError> {
        self.dispatch("stop_note", |_| vec![encode_note_off(note, velocity, channel)])
    }

    pub fn change_program(&self, program: i32, channel: i32) -> Result<(), EngineError> {
        self.dispatch("change_program", |channels| {
            let program = channels.set_program(channel, program);
            vec![encode_program_change(program as i32, channel)]
        })
    }

    pub fn set_volume(&self, volume: i32, channel: i32) -> Result<(), EngineError> {
        self.dispatch("set_volume", |channels| {
            let volume = channels.set_volume(channel, volume);
            vec![encode_control_change(CC_VOLUME as i32, volume as i32, channel)]
        })
    }

    pub fn set_pan(&self, pan: i32, channel: i32) -> Result<(), EngineError> {
        self.dispatch("set_pan", |channels| {
            let pan = channels.set_pan(channel, pan);
            vec![encode_control_change(CC_PAN as i32, pan as i32, channel)]
        })
    }

    pub fn send_control_change(
        &self,
        controller: i32,
        value: i32,
        channel: i32,
    ) -> Result<(), EngineError> {
        self.dispatch("send_control_change", |channels| {
            let value = channels.set_controller(channel, controller, value);
            vec![encode_control_change(controller, value as i32, channel)]
        })
    }

    pub fn send_pitch_bend(&self, value: i32, channel: i32) -> Result<(), EngineError> {
        self.dispatch("send_pitch_bend", |channels| {
            let value = channels.set_pitch_bend(channel, value);
            vec![encode_pitch_bend(value as i32, channel)]
        })
    }

    /// Sends CC91 from `params.level` on every channel. Room size, damping
    /// and width have no MIDI controller and are ignored.
    pub fn set_reverb(&self, params: ReverbParams) -> Result<(), EngineError> {
        let level = level_to_cc(params.level);
        self.dispatch("set_reverb", |channels| {
            fan_out(|channel| {
                let value = channels.set_controller(channel, CC_REVERB as i32, level);
                encode_control_change(CC_REVERB as i32, value as i32, channel)
            })
        })
    }

    /// Sends CC93 from `params.level` on every channel. Voices, speed and
    /// depth are ignored.
    pub fn set_chorus(&self, params: ChorusParams) -> Result<(), EngineError> {
        let level = level_to_cc(params.level);
        self.dispatch("set_chorus", |channels| {
            fan_out(|channel| {
                let value = channels.set_controller(channel, CC_CHORUS as i32, level);
                encode_control_change(CC_CHORUS as i32, value as i32, channel)
            })
        })
    }

    pub fn stop_all_notes(&self) -> Result<(), EngineError> {
        self.dispatch("stop_all_notes", |_| {
            fan_out(|channel| encode_control_change(CC_ALL_NOTES_OFF as i32, 0, channel))
        })
    }

    pub fn reset_all_controllers(&self) -> Result<(), EngineError> {
        self.dispatch("reset_all_controllers", |channels| {
            channels.reset_all();
            fan_out(|channel| encode_control_change(CC_RESET_ALL_CONTROLLERS as i32, 0, channel))
        })
    }

    /// Platform audio-session activation; permitted in every state.
    pub fn unmute(&self) -> Result<(), EngineError> {
        let _inner = self.inner.lock();
        self.backend
            .activate_audio_session()
            .map_err(|e| EngineError::SinkFailure(e.to_string()))
    }

    pub fn shutdown(&self) -> Result<(), EngineError> {
        self.unload()
    }

    fn dispatch(
        &self,
        op: &'static str,
        apply: impl FnOnce(&mut ChannelStateTable) -> Vec<MidiMessage>,
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        if !inner.lifecycle.is_ready() {
            tracing::warn!(op, state = ?inner.lifecycle.state(), "no soundfont loaded, dropping command");
            return Ok(());
        }

        let messages = apply(&mut inner.channels);
        for message in &messages {
            self.send(op, message)?;
        }
        Ok(())
    }

    fn send(&self, op: &'static str, message: &MidiMessage) -> Result<(), EngineError> {
        tracing::debug!(op, bytes = ?message.as_bytes(), "send");
        self.backend.send_bytes(message.as_bytes()).map_err(|e| {
            tracing::error!(op, bytes = ?message.as_bytes(), error = %e, "backend refused message");
            EngineError::SinkFailure(e.to_string())
        })
    }
}

fn fan_out(message_for: impl FnMut(i32) -> MidiMessage) -> Vec<MidiMessage> {
    (0..CHANNEL_COUNT as i32).map(message_for).collect()
}

impl Drop for SynthEngine {
    fn drop(&mut self) {
        if let Err(err) = self.unload() {
            tracing::warn!(error = %err, "unload on drop failed");
        }
    }
}
