use crate::codec::{CC_CHANNEL_MODE_FIRST, CC_PAN, CC_VOLUME, PITCH_BEND_MAX, PITCH_BEND_MIN};
use midiengine_ports::types::CHANNEL_COUNT;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_PROGRAM: u8 = 0;
pub const DEFAULT_VOLUME: u8 = 100;
pub const DEFAULT_PAN: u8 = 64;
pub const DEFAULT_PITCH_BEND: i16 = 0;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelState {
    pub program: u8,
    pub volume: u8,
    pub pan: u8,
    pub pitch_bend: i16,
    /// Last value sent per controller. Volume and pan live in their own
    /// fields; channel mode controllers are never cached.
    pub controllers: BTreeMap<u8, u8>,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM,
            volume: DEFAULT_VOLUME,
            pan: DEFAULT_PAN,
            pitch_bend: DEFAULT_PITCH_BEND,
            controllers: BTreeMap::new(),
        }
    }
}

impl ChannelState {
    pub fn controller(&self, controller: u8) -> Option<u8> {
        match controller {
            CC_VOLUME => Some(self.volume),
            CC_PAN => Some(self.pan),
            _ => self.controllers.get(&controller).copied(),
        }
    }
}

/// Per-channel configuration for all 16 channels.
///
/// Setters clamp into protocol range and return the stored value. Channel
/// arguments wrap with `& 0x0F`, the same way the encoder addresses them.
#[derive(Clone, Debug, Default)]
pub struct ChannelStateTable {
    channels: [ChannelState; CHANNEL_COUNT],
}

fn index(channel: i32) -> usize {
    (channel & 0x0F) as usize
}

fn clamp_data(value: i32) -> u8 {
    value.clamp(0, 127) as u8
}

impl ChannelStateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_program(&mut self, channel: i32, program: i32) -> u8 {
        let program = clamp_data(program);
        self.channels[index(channel)].program = program;
        program
    }

    pub fn set_volume(&mut self, channel: i32, volume: i32) -> u8 {
        let volume = clamp_data(volume);
        self.channels[index(channel)].volume = volume;
        volume
    }

    pub fn set_pan(&mut self, channel: i32, pan: i32) -> u8 {
        let pan = clamp_data(pan);
        self.channels[index(channel)].pan = pan;
        pan
    }

    pub fn set_pitch_bend(&mut self, channel: i32, value: i32) -> i16 {
        let value = value.clamp(PITCH_BEND_MIN, PITCH_BEND_MAX) as i16;
        self.channels[index(channel)].pitch_bend = value;
        value
    }

    /// Record a controller value. The controller number is masked to 7 bits
    /// like the encoder does; the value is clamped.
    pub fn set_controller(&mut self, channel: i32, controller: i32, value: i32) -> u8 {
        let controller = (controller & 0x7F) as u8;
        let value = clamp_data(value);
        let state = &mut self.channels[index(channel)];
        match controller {
            CC_VOLUME => state.volume = value,
            CC_PAN => state.pan = value,
            c if c >= CC_CHANNEL_MODE_FIRST => {}
            c => {
                state.controllers.insert(c, value);
            }
        }
        value
    }

    pub fn reset(&mut self, channel: i32) {
        self.channels[index(channel)] = ChannelState::default();
    }

    pub fn reset_all(&mut self) {
        for state in &mut self.channels {
            *state = ChannelState::default();
        }
    }

    pub fn snapshot(&self, channel: i32) -> ChannelState {
        self.channels[index(channel)].clone()
    }
}
