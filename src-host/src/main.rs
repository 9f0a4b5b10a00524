//! Line-oriented host for the synth engine.
//!
//! Reads one JSON method call per line on stdin, for example
//! `{"id": 1, "method": "playNote", "arguments": {"note": 60}}`, and writes
//! one JSON reply per line on stdout. Logs go to stderr; set `RUST_LOG` to
//! see them.

use anyhow::{bail, Context, Result};
use midiengine_core::{AppCore, EngineError, MethodCall, Reply};
use midiengine_infra_storage_fs::FsStorage;
use midiengine_infra_synth_capture::CaptureSynth;
use midiengine_infra_synth_rustysynth::RustySynth;
use midiengine_ports::storage::{SettingsDto, StoragePort};
use midiengine_ports::synth::SynthBackend;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

struct CliOptions {
    /// Directory holding `settings.json`.
    config_dir: Option<PathBuf>,
    /// Soundfont to load before reading commands. Overrides the remembered one.
    soundfont: Option<PathBuf>,
    /// Record messages instead of synthesizing, and echo them in replies.
    capture: bool,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut options = Self {
            config_dir: None,
            soundfont: None,
            capture: false,
        };
        let mut i = 1;

        while i < args.len() {
            match args[i].as_str() {
                "--config-dir" => {
                    i += 1;
                    let Some(dir) = args.get(i) else {
                        bail!("--config-dir requires a path argument");
                    };
                    options.config_dir = Some(PathBuf::from(dir));
                }
                "--soundfont" | "-sf" => {
                    i += 1;
                    let Some(path) = args.get(i) else {
                        bail!("--soundfont requires a path argument");
                    };
                    options.soundfont = Some(PathBuf::from(path));
                }
                "--capture" => options.capture = true,
                "--help" | "-h" => {
                    eprintln!("midiengine-host - JSON-lines front end for the MIDI synth engine");
                    eprintln!();
                    eprintln!("Options:");
                    eprintln!("  --config-dir DIR       Read and write settings.json in DIR");
                    eprintln!("  -sf, --soundfont PATH  Load a SoundFont (.sf2) at startup");
                    eprintln!("  --capture              Record MIDI bytes instead of synthesizing");
                    eprintln!("  -h, --help             Print this help message");
                    std::process::exit(0);
                }
                other => bail!("unknown option: {other} (use --help for usage)"),
            }
            i += 1;
        }

        Ok(options)
    }
}

#[derive(Deserialize)]
struct Request {
    #[serde(default)]
    id: Option<Value>,
    #[serde(flatten)]
    call: MethodCall,
}

#[derive(Serialize)]
struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    #[serde(flatten)]
    reply: Reply,
    /// Messages the capture backend received while handling this call.
    #[serde(skip_serializing_if = "Option::is_none")]
    sent: Option<Vec<Vec<u8>>>,
}

fn load_settings(storage: &FsStorage, options: &CliOptions) -> SettingsDto {
    let mut settings = storage.load_settings().unwrap_or_else(|err| {
        tracing::warn!(error = %err, path = %storage.settings_path().display(), "settings unreadable, using defaults");
        SettingsDto::default()
    });
    if let Some(soundfont) = options.soundfont.as_ref() {
        settings.default_soundfont_path = Some(soundfont.display().to_string());
        settings.autoload_soundfont = true;
    }
    settings
}

fn main() -> Result<()> {
    let options = CliOptions::parse()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let storage = match options.config_dir.clone() {
        Some(dir) => FsStorage::new(dir),
        None => FsStorage::default(),
    };
    let settings = load_settings(&storage, &options);

    let capture = options.capture.then(|| Arc::new(CaptureSynth::new()));
    let backend: Arc<dyn SynthBackend> = match capture.as_ref() {
        Some(capture) => capture.clone() as Arc<dyn SynthBackend>,
        None => Arc::new(RustySynth::new(
            settings.sample_rate_hz,
            settings.master_volume,
        )),
    };

    let mut core = AppCore::with_settings(backend, Some(Box::new(storage)), settings);
    match core.autoload() {
        Some(Ok(info)) => tracing::info!(name = %info.name, "autoloaded soundfont"),
        Some(Err(err)) => tracing::warn!(error = %err, "autoload failed"),
        None => {}
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read command line")?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                let reply = core.handle_call(&request.call);
                Response {
                    id: request.id,
                    reply,
                    sent: capture.as_ref().map(|capture| capture.take_messages()),
                }
            }
            Err(err) => Response {
                id: None,
                reply: EngineError::InvalidArgument(format!("malformed request: {err}")).into(),
                sent: None,
            },
        };

        serde_json::to_writer(&mut stdout, &response).context("failed to write reply")?;
        writeln!(stdout).context("failed to write reply")?;
        stdout.flush().context("failed to flush reply")?;
    }

    if let Err(err) = core.engine().shutdown() {
        tracing::warn!(error = %err, "shutdown failed");
    }
    Ok(())
}
