use serde::{Deserialize, Serialize};

/// Number of MIDI channels addressed by the engine.
pub const CHANNEL_COUNT: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Volume01(pub f32);

impl Volume01 {
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

/// Reverb parameters as accepted on the command surface.
///
/// Only `level` reaches the synthesizer (as CC91); the remaining fields are
/// kept so hosts can round-trip their presets.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReverbParams {
    pub room_size: f64,
    pub damping: f64,
    pub width: f64,
    pub level: f64,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            room_size: 0.2,
            damping: 0.5,
            width: 0.5,
            level: 0.3,
        }
    }
}

/// Chorus parameters as accepted on the command surface. Only `level` is
/// applied (as CC93).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChorusParams {
    pub voices: i32,
    pub level: f64,
    pub speed: f64,
    pub depth: f64,
}

impl Default for ChorusParams {
    fn default() -> Self {
        Self {
            voices: 3,
            level: 0.5,
            speed: 0.3,
            depth: 0.8,
        }
    }
}
