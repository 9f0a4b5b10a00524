use crate::error::EngineError;
use midiengine_ports::types::{ChorusParams, ReverbParams};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A remote call as delivered by the host transport.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Command {
    LoadSoundfont { path: String },
    UnloadSoundfont,
    PlayNote { note: i32, velocity: i32, channel: i32 },
    StopNote { note: i32, velocity: i32, channel: i32 },
    ChangeProgram { program: i32, channel: i32 },
    SetVolume { volume: i32, channel: i32 },
    SetPan { pan: i32, channel: i32 },
    SetReverb(ReverbParams),
    SetChorus(ChorusParams),
    StopAllNotes,
    ResetAllControllers,
    SendControlChange { controller: i32, value: i32, channel: i32 },
    SendPitchBend { value: i32, channel: i32 },
    Unmute,
    GetEngineState,
    GetChannelState { channel: i32 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Reply {
    Success { value: Value },
    Error { code: String, message: String },
}

impl Reply {
    pub fn success(value: Value) -> Self {
        Reply::Success { value }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Reply::Success { .. })
    }
}

impl From<EngineError> for Reply {
    fn from(err: EngineError) -> Self {
        Reply::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<Result<Value, EngineError>> for Reply {
    fn from(result: Result<Value, EngineError>) -> Self {
        match result {
            Ok(value) => Reply::success(value),
            Err(err) => err.into(),
        }
    }
}

/// Argument lookup with per-method defaults. Absent or `null` arguments mean
/// "use the default"; present arguments of the wrong type are rejected.
struct Args<'a> {
    method: &'a str,
    map: Option<&'a Map<String, Value>>,
}

impl<'a> Args<'a> {
    fn new(call: &'a MethodCall) -> Result<Self, EngineError> {
        let map = match &call.arguments {
            Value::Null => None,
            Value::Object(map) => Some(map),
            other => {
                return Err(EngineError::InvalidArgument(format!(
                    "{}: arguments must be an object, got {}",
                    call.method, other
                )))
            }
        };
        Ok(Self {
            method: &call.method,
            map,
        })
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map
            .and_then(|map| map.get(key))
            .filter(|value| !value.is_null())
    }

    fn wrong_type(&self, key: &str, expected: &str) -> EngineError {
        EngineError::InvalidArgument(format!("{}: '{}' must be {}", self.method, key, expected))
    }

    fn int(&self, key: &str, default: i32) -> Result<i32, EngineError> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_i64()
                .map(saturate)
                .ok_or_else(|| self.wrong_type(key, "an integer")),
        }
    }

    /// Channels keep their low bits so `& 0x0F` sees what the caller sent.
    fn channel(&self) -> Result<i32, EngineError> {
        match self.get("channel") {
            None => Ok(0),
            Some(value) => value
                .as_i64()
                .map(|channel| (channel & 0x0F) as i32)
                .ok_or_else(|| self.wrong_type("channel", "an integer")),
        }
    }

    fn float(&self, key: &str, default: f64) -> Result<f64, EngineError> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_f64()
                .ok_or_else(|| self.wrong_type(key, "a number")),
        }
    }

    fn required_str(&self, key: &str) -> Result<String, EngineError> {
        match self.get(key) {
            None => Err(EngineError::InvalidArgument(format!(
                "{}: '{}' is required",
                self.method, key
            ))),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(self.wrong_type(key, "a string")),
        }
    }
}

fn saturate(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

impl Command {
    /// Decode a host call, applying the documented defaults.
    pub fn from_call(call: &MethodCall) -> Result<Self, EngineError> {
        let args = Args::new(call)?;
        let command = match call.method.as_str() {
            "loadSoundfont" => Command::LoadSoundfont {
                path: args.required_str("path")?,
            },
            "unloadSoundfont" => Command::UnloadSoundfont,
            "playNote" => Command::PlayNote {
                note: args.int("note", 60)?,
                velocity: args.int("velocity", 64)?,
                channel: args.channel()?,
            },
            "stopNote" => Command::StopNote {
                note: args.int("note", 60)?,
                velocity: args.int("velocity", 64)?,
                channel: args.channel()?,
            },
            "changeProgram" => Command::ChangeProgram {
                program: args.int("program", 0)?,
                channel: args.channel()?,
            },
            "setVolume" => Command::SetVolume {
                volume: args.int("volume", 100)?,
                channel: args.channel()?,
            },
            "setPan" => Command::SetPan {
                pan: args.int("pan", 64)?,
                channel: args.channel()?,
            },
            "setReverb" => {
                let defaults = ReverbParams::default();
                Command::SetReverb(ReverbParams {
                    room_size: args.float("roomSize", defaults.room_size)?,
                    damping: args.float("damping", defaults.damping)?,
                    width: args.float("width", defaults.width)?,
                    level: args.float("level", defaults.level)?,
                })
            }
            "setChorus" => {
                let defaults = ChorusParams::default();
                Command::SetChorus(ChorusParams {
                    voices: args.int("voices", defaults.voices)?,
                    level: args.float("level", defaults.level)?,
                    speed: args.float("speed", defaults.speed)?,
                    depth: args.float("depth", defaults.depth)?,
                })
            }
            "stopAllNotes" => Command::StopAllNotes,
            "resetAllControllers" => Command::ResetAllControllers,
            "sendControlChange" => Command::SendControlChange {
                controller: args.int("controller", 0)?,
                value: args.int("value", 0)?,
                channel: args.channel()?,
            },
            "sendPitchBend" => Command::SendPitchBend {
                value: args.int("value", 0)?,
                channel: args.channel()?,
            },
            "unmute" => Command::Unmute,
            "getEngineState" => Command::GetEngineState,
            "getChannelState" => Command::GetChannelState {
                channel: args.channel()?,
            },
            other => return Err(EngineError::NotImplemented(other.to_string())),
        };
        Ok(command)
    }
}
