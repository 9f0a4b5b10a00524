//! Channel voice message encoding.
//!
//! Every function here is total: channels are masked into `0..=15`, data
//! bytes into `0..=127`, and pitch bend is clamped into its signed 14-bit
//! range before the offset is applied.

pub const NOTE_OFF: u8 = 0x80;
pub const NOTE_ON: u8 = 0x90;
pub const POLY_PRESSURE: u8 = 0xA0;
pub const CONTROL_CHANGE: u8 = 0xB0;
pub const PROGRAM_CHANGE: u8 = 0xC0;
pub const CHANNEL_PRESSURE: u8 = 0xD0;
pub const PITCH_BEND: u8 = 0xE0;

pub const CC_VOLUME: u8 = 7;
pub const CC_PAN: u8 = 10;
pub const CC_REVERB: u8 = 91;
pub const CC_CHORUS: u8 = 93;
pub const CC_RESET_ALL_CONTROLLERS: u8 = 121;
pub const CC_ALL_NOTES_OFF: u8 = 123;

/// First controller number of the channel mode range (120..=127).
pub const CC_CHANNEL_MODE_FIRST: u8 = 120;

pub const PITCH_BEND_MIN: i32 = -8192;
pub const PITCH_BEND_MAX: i32 = 8191;
const PITCH_BEND_OFFSET: i32 = 8192;

/// A complete 2 or 3 byte channel message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MidiMessage {
    bytes: [u8; 3],
    len: usize,
}

impl MidiMessage {
    fn two(status: u8, data1: u8) -> Self {
        Self {
            bytes: [status, data1, 0],
            len: 2,
        }
    }

    fn three(status: u8, data1: u8, data2: u8) -> Self {
        Self {
            bytes: [status, data1, data2],
            len: 3,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn status(&self) -> u8 {
        self.bytes[0]
    }

    pub fn channel(&self) -> u8 {
        self.bytes[0] & 0x0F
    }
}

impl AsRef<[u8]> for MidiMessage {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

fn status(kind: u8, channel: i32) -> u8 {
    kind | (channel & 0x0F) as u8
}

fn data(value: i32) -> u8 {
    (value & 0x7F) as u8
}

pub fn encode_note_on(note: i32, velocity: i32, channel: i32) -> MidiMessage {
    MidiMessage::three(status(NOTE_ON, channel), data(note), data(velocity))
}

pub fn encode_note_off(note: i32, velocity: i32, channel: i32) -> MidiMessage {
    MidiMessage::three(status(NOTE_OFF, channel), data(note), data(velocity))
}

pub fn encode_program_change(program: i32, channel: i32) -> MidiMessage {
    MidiMessage::two(status(PROGRAM_CHANGE, channel), data(program))
}

pub fn encode_control_change(controller: i32, value: i32, channel: i32) -> MidiMessage {
    MidiMessage::three(
        status(CONTROL_CHANGE, channel),
        data(controller),
        data(value),
    )
}

/// Encode a signed bend in `-8192..=8191` as `[status, lsb, msb]` of
/// `value + 8192`.
pub fn encode_pitch_bend(value: i32, channel: i32) -> MidiMessage {
    let unsigned = value.clamp(PITCH_BEND_MIN, PITCH_BEND_MAX) + PITCH_BEND_OFFSET;
    let lsb = (unsigned & 0x7F) as u8;
    let msb = ((unsigned >> 7) & 0x7F) as u8;
    MidiMessage::three(status(PITCH_BEND, channel), lsb, msb)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelMessage {
    NoteOff { channel: u8, note: u8, velocity: u8 },
    NoteOn { channel: u8, note: u8, velocity: u8 },
    PolyPressure { channel: u8, note: u8, pressure: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    ChannelPressure { channel: u8, pressure: u8 },
    /// Signed, centered at zero.
    PitchBend { channel: u8, value: i32 },
}

impl ChannelMessage {
    pub fn channel(&self) -> u8 {
        match *self {
            ChannelMessage::NoteOff { channel, .. }
            | ChannelMessage::NoteOn { channel, .. }
            | ChannelMessage::PolyPressure { channel, .. }
            | ChannelMessage::ControlChange { channel, .. }
            | ChannelMessage::ProgramChange { channel, .. }
            | ChannelMessage::ChannelPressure { channel, .. }
            | ChannelMessage::PitchBend { channel, .. } => channel,
        }
    }
}

/// Parse one channel voice message. Returns `None` for system messages,
/// running status, truncated input or data bytes with the high bit set.
pub fn decode(message: &[u8]) -> Option<ChannelMessage> {
    let (&status, rest) = message.split_first()?;
    if !(0x80..0xF0).contains(&status) {
        return None;
    }
    if rest.iter().any(|byte| byte & 0x80 != 0) {
        return None;
    }

    let channel = status & 0x0F;
    let data2 = |rest: &[u8]| -> Option<(u8, u8)> {
        match rest {
            [a, b] => Some((*a, *b)),
            _ => None,
        }
    };
    let data1 = |rest: &[u8]| -> Option<u8> {
        match rest {
            [a] => Some(*a),
            _ => None,
        }
    };

    match status & 0xF0 {
        NOTE_OFF => {
            let (note, velocity) = data2(rest)?;
            Some(ChannelMessage::NoteOff {
                channel,
                note,
                velocity,
            })
        }
        NOTE_ON => {
            let (note, velocity) = data2(rest)?;
            Some(ChannelMessage::NoteOn {
                channel,
                note,
                velocity,
            })
        }
        POLY_PRESSURE => {
            let (note, pressure) = data2(rest)?;
            Some(ChannelMessage::PolyPressure {
                channel,
                note,
                pressure,
            })
        }
        CONTROL_CHANGE => {
            let (controller, value) = data2(rest)?;
            Some(ChannelMessage::ControlChange {
                channel,
                controller,
                value,
            })
        }
        PROGRAM_CHANGE => Some(ChannelMessage::ProgramChange {
            channel,
            program: data1(rest)?,
        }),
        CHANNEL_PRESSURE => Some(ChannelMessage::ChannelPressure {
            channel,
            pressure: data1(rest)?,
        }),
        PITCH_BEND => {
            let (lsb, msb) = data2(rest)?;
            let unsigned = ((msb as i32) << 7) | lsb as i32;
            Some(ChannelMessage::PitchBend {
                channel,
                value: unsigned - PITCH_BEND_OFFSET,
            })
        }
        _ => None,
    }
}

/// Map an effect level in `[0, 1]` to a controller value. NaN maps to 0.
pub fn level_to_cc(level: f64) -> i32 {
    if level.is_nan() {
        return 0;
    }
    (level.clamp(0.0, 1.0) * 127.0).round() as i32
}
