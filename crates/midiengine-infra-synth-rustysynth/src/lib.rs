use midiengine_domain_midi::decode;
use midiengine_ports::synth::{SoundFontInfo, SoundFontResource, SynthBackend, SynthError};
use midiengine_ports::types::Volume01;
use parking_lot::Mutex;
use rustysynth::{SoundFont, Synthesizer, SynthesizerSettings};
use std::io::Cursor;
use std::sync::Arc;

/// Software synthesizer backend. The host's audio graph pulls samples with
/// [`RustySynth::render`]; everything else arrives through [`SynthBackend`].
pub struct RustySynth {
    sample_rate_hz: u32,
    master_volume: Volume01,
    synth: Mutex<Option<Synthesizer>>,
}

impl Default for RustySynth {
    fn default() -> Self {
        Self::new(44_100, Volume01::new(0.5))
    }
}

impl RustySynth {
    pub fn new(sample_rate_hz: u32, master_volume: Volume01) -> Self {
        Self {
            sample_rate_hz,
            master_volume,
            synth: Mutex::new(None),
        }
    }

    fn build_synthesizer(&self, sound_font: &Arc<SoundFont>) -> Result<Synthesizer, SynthError> {
        let settings = SynthesizerSettings::new(self.sample_rate_hz as i32);
        let mut synth = Synthesizer::new(sound_font, &settings)
            .map_err(|e| SynthError::Rejected(e.to_string()))?;
        synth.set_master_volume(self.master_volume.get());
        Ok(synth)
    }

    /// Called by the audio thread. Writes silence when no soundfont is
    /// accepted or the synthesizer is busy.
    pub fn render(&self, out_l: &mut [f32], out_r: &mut [f32]) {
        out_l.fill(0.0);
        out_r.fill(0.0);

        let Some(mut guard) = self.synth.try_lock() else {
            return;
        };
        if let Some(synth) = guard.as_mut() {
            let frames = out_l.len().min(out_r.len());
            synth.render(&mut out_l[..frames], &mut out_r[..frames]);
        }
    }
}

impl SynthBackend for RustySynth {
    fn accept_soundfont(&self, resource: SoundFontResource) -> Result<SoundFontInfo, SynthError> {
        let mut reader = Cursor::new(&resource.data[..]);
        let sound_font = Arc::new(
            SoundFont::new(&mut reader).map_err(|e| SynthError::Rejected(e.to_string()))?,
        );

        let name = sound_font.get_info().get_bank_name().trim().to_string();
        let name = if name.is_empty() {
            resource
                .path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("SoundFont")
                .to_string()
        } else {
            name
        };
        let preset_count = sound_font.get_presets().len();

        let synth = self.build_synthesizer(&sound_font)?;
        *self.synth.lock() = Some(synth);

        tracing::info!(%name, preset_count, "rustysynth accepted soundfont");
        Ok(SoundFontInfo { name, preset_count })
    }

    fn release_soundfont(&self) -> Result<(), SynthError> {
        *self.synth.lock() = None;
        Ok(())
    }

    fn send_bytes(&self, message: &[u8]) -> Result<(), SynthError> {
        let decoded = decode(message).ok_or_else(|| SynthError::MalformedMessage(message.to_vec()))?;

        let mut guard = self.synth.lock();
        let synth = guard.as_mut().ok_or(SynthError::NoSoundFont)?;

        let command = (message[0] & 0xF0) as i32;
        let data1 = message.get(1).copied().unwrap_or(0) as i32;
        let data2 = message.get(2).copied().unwrap_or(0) as i32;
        synth.process_midi_message(decoded.channel() as i32, command, data1, data2);
        Ok(())
    }
}
