use midiengine_core::{EngineError, EngineState, SynthEngine};
use midiengine_domain_midi::ChannelState;
use midiengine_infra_synth_capture::CaptureSynth;
use midiengine_ports::types::{ChorusParams, ReverbParams};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn soundfont(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"RIFF\0\0\0\0sfbk").expect("write soundfont fixture");
    path
}

fn new_engine() -> (SynthEngine, Arc<CaptureSynth>) {
    let capture = Arc::new(CaptureSynth::new());
    (SynthEngine::new(capture.clone()), capture)
}

fn ready_engine() -> (SynthEngine, Arc<CaptureSynth>, TempDir) {
    let (engine, capture) = new_engine();
    let dir = tempfile::tempdir().expect("tempdir");
    engine
        .load(soundfont(&dir, "piano.sf2"))
        .expect("capture accepts any file");
    (engine, capture, dir)
}

#[test]
fn starts_unloaded_with_default_channels() {
    let (engine, _capture) = new_engine();
    assert_eq!(engine.state(), EngineState::Unloaded);
    assert!(!engine.is_ready());
    assert!(engine.soundfont().is_none());
    assert_eq!(engine.channel_state(0), ChannelState::default());
}

#[test]
fn play_note_before_load_is_dropped_without_error() {
    let (engine, capture) = new_engine();

    assert_eq!(engine.play_note(60, 64, 0), Ok(()));
    assert_eq!(engine.set_volume(20, 0), Ok(()));
    assert_eq!(engine.stop_all_notes(), Ok(()));

    assert!(capture.messages().is_empty());
    assert_eq!(engine.channel_state(0), ChannelState::default());
}

#[test]
fn load_reaches_ready_and_records_the_handle() {
    let (engine, capture, dir) = ready_engine();

    assert_eq!(engine.state(), EngineState::Ready);
    let handle = engine.soundfont().expect("handle after load");
    assert_eq!(handle.path(), dir.path().join("piano.sf2").as_path());
    assert_eq!(handle.info().name, "piano");
    assert_eq!(capture.accept_count(), 1);
}

#[test]
fn missing_soundfont_fails_with_resource_not_found() {
    let (engine, capture) = new_engine();
    let dir = tempfile::tempdir().expect("tempdir");

    let result = engine.load(dir.path().join("missing.sf2"));

    assert!(matches!(result, Err(EngineError::ResourceNotFound(_))));
    assert!(matches!(engine.state(), EngineState::Failed(reason) if reason.contains("missing.sf2")));
    assert_eq!(capture.accept_count(), 0);
}

#[test]
fn rejected_soundfont_fails_and_can_be_retried() {
    let (engine, capture) = new_engine();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = soundfont(&dir, "broken.sf2");

    capture.set_reject_soundfonts(true);
    let result = engine.load(&path);
    assert!(matches!(result, Err(EngineError::EngineRejected(_))));
    assert!(matches!(engine.state(), EngineState::Failed(_)));

    engine.play_note(60, 64, 0).expect("dropped, not an error");
    assert!(capture.messages().is_empty());

    capture.set_reject_soundfonts(false);
    engine.load(&path).expect("retry succeeds");
    assert_eq!(engine.state(), EngineState::Ready);
}

#[test]
fn reload_resets_channel_state() {
    let (engine, _capture, dir) = ready_engine();

    engine.set_pan(10, 2).expect("pan");
    engine.send_pitch_bend(-300, 2).expect("bend");
    assert_eq!(engine.channel_state(2).pan, 10);

    engine.load(soundfont(&dir, "strings.sf2")).expect("second load");

    assert_eq!(engine.channel_state(2).pan, 64);
    assert_eq!(engine.channel_state(2), ChannelState::default());
}

#[test]
fn reload_while_ready_always_hands_the_bank_to_the_backend() {
    let (engine, capture, dir) = ready_engine();

    engine.load(dir.path().join("piano.sf2")).expect("same path again");

    assert_eq!(capture.accept_count(), 2);
    assert_eq!(engine.soundfont().map(|h| h.generation()), Some(2));
}

#[test]
fn failed_reload_releases_the_previous_bank() {
    let (engine, capture, dir) = ready_engine();

    let result = engine.load(dir.path().join("nope.sf2"));

    assert!(result.is_err());
    assert!(engine.soundfont().is_none());
    assert_eq!(capture.release_count(), 1);
    assert!(capture.accepted_soundfont().is_none());
}

#[test]
fn failed_reload_clears_channel_state() {
    let (engine, _capture, dir) = ready_engine();
    engine.set_pan(10, 2).expect("pan");
    engine.change_program(40, 2).expect("program");

    let result = engine.load(dir.path().join("nope.sf2"));

    assert!(matches!(result, Err(EngineError::ResourceNotFound(_))));
    assert!(matches!(engine.state(), EngineState::Failed(_)));
    assert_eq!(engine.channel_state(2), ChannelState::default());
}

#[test]
fn note_messages_have_expected_bytes() {
    let (engine, capture, _dir) = ready_engine();

    engine.play_note(60, 100, 0).expect("note on");
    engine.stop_note(60, 64, 0).expect("note off");
    engine.play_note(62, 90, 20).expect("wrapped channel");

    assert_eq!(
        capture.messages(),
        vec![vec![0x90, 60, 100], vec![0x80, 60, 64], vec![0x94, 62, 90]]
    );
}

#[test]
fn volume_is_clamped_before_state_and_bytes() {
    let (engine, capture, _dir) = ready_engine();

    engine.set_volume(200, 1).expect("volume");
    assert_eq!(engine.channel_state(1).volume, 127);

    engine.set_volume(-5, 1).expect("volume");
    assert_eq!(engine.channel_state(1).volume, 0);

    assert_eq!(
        capture.messages(),
        vec![vec![0xB1, 7, 127], vec![0xB1, 7, 0]]
    );
}

#[test]
fn program_pan_and_pitch_bend_update_state() {
    let (engine, capture, _dir) = ready_engine();

    engine.change_program(41, 3).expect("program");
    engine.set_pan(0, 3).expect("pan");
    engine.send_pitch_bend(8191, 3).expect("bend");

    let state = engine.channel_state(3);
    assert_eq!(state.program, 41);
    assert_eq!(state.pan, 0);
    assert_eq!(state.pitch_bend, 8191);
    assert_eq!(
        capture.messages(),
        vec![vec![0xC3, 41], vec![0xB3, 10, 0], vec![0xE3, 0x7F, 0x7F]]
    );
}

#[test]
fn raw_control_change_is_cached() {
    let (engine, capture, _dir) = ready_engine();

    engine.send_control_change(74, 90, 5).expect("cc");
    engine.send_control_change(7, 300, 5).expect("cc volume");

    let state = engine.channel_state(5);
    assert_eq!(state.controller(74), Some(90));
    assert_eq!(state.volume, 127);
    assert_eq!(capture.messages(), vec![vec![0xB5, 74, 90], vec![0xB5, 7, 127]]);
}

#[test]
fn stop_all_notes_fans_out_in_channel_order() {
    let (engine, capture, _dir) = ready_engine();

    engine.stop_all_notes().expect("all notes off");

    let expected: Vec<Vec<u8>> = (0..16u8).map(|ch| vec![0xB0 | ch, 123, 0]).collect();
    assert_eq!(capture.messages(), expected);
}

#[test]
fn reset_all_controllers_sends_cc121_and_restores_defaults() {
    let (engine, capture, _dir) = ready_engine();
    engine.set_volume(20, 0).expect("volume");
    engine.change_program(12, 9).expect("program");
    capture.take_messages();

    engine.reset_all_controllers().expect("reset");

    let expected: Vec<Vec<u8>> = (0..16u8).map(|ch| vec![0xB0 | ch, 121, 0]).collect();
    assert_eq!(capture.messages(), expected);
    assert_eq!(engine.channel_state(0), ChannelState::default());
    assert_eq!(engine.channel_state(9), ChannelState::default());
}

#[test]
fn reverb_and_chorus_send_level_only() {
    let (engine, capture, _dir) = ready_engine();

    engine
        .set_reverb(ReverbParams {
            room_size: 0.9,
            damping: 0.1,
            width: 1.0,
            level: 0.3,
        })
        .expect("reverb");
    engine
        .set_chorus(ChorusParams {
            level: 1.0,
            ..ChorusParams::default()
        })
        .expect("chorus");

    let messages = capture.messages();
    assert_eq!(messages.len(), 32);
    for ch in 0..16u8 {
        assert_eq!(messages[ch as usize], vec![0xB0 | ch, 91, 38]);
        assert_eq!(messages[16 + ch as usize], vec![0xB0 | ch, 93, 127]);
    }
    assert_eq!(engine.channel_state(15).controller(91), Some(38));
    assert_eq!(engine.channel_state(15).controller(93), Some(127));
}

#[test]
fn sink_failure_is_reported_and_state_is_kept() {
    let (engine, capture, _dir) = ready_engine();
    capture.set_fail_sends(true);

    let result = engine.set_volume(20, 0);

    assert!(matches!(result, Err(EngineError::SinkFailure(_))));
    assert_eq!(engine.channel_state(0).volume, 20);
    assert_eq!(engine.state(), EngineState::Ready);
}

#[test]
fn unload_is_idempotent() {
    let (engine, capture, _dir) = ready_engine();
    engine.set_pan(1, 0).expect("pan");

    assert_eq!(engine.unload(), Ok(()));
    assert_eq!(engine.unload(), Ok(()));

    assert_eq!(engine.state(), EngineState::Unloaded);
    assert_eq!(capture.release_count(), 1);
    assert_eq!(engine.channel_state(0), ChannelState::default());
}

#[test]
fn unload_after_failure_returns_to_unloaded() {
    let (engine, _capture) = new_engine();
    let dir = tempfile::tempdir().expect("tempdir");
    let _ = engine.load(dir.path().join("missing.sf2"));

    engine.unload().expect("unload from failed");

    assert_eq!(engine.state(), EngineState::Unloaded);
}

#[test]
fn unmute_is_permitted_before_load() {
    let (engine, capture) = new_engine();

    engine.unmute().expect("unmute");

    assert!(capture.session_active());
}

#[test]
fn dropping_the_engine_releases_the_soundfont() {
    let (engine, capture, _dir) = ready_engine();

    drop(engine);

    assert_eq!(capture.release_count(), 1);
}

#[test]
fn concurrent_callers_are_serialized() {
    let (engine, capture, _dir) = ready_engine();
    let engine = Arc::new(engine);

    let workers: Vec<_> = (0..4)
        .map(|channel| {
            let engine = engine.clone();
            std::thread::spawn(move || {
                for note in 0..50 {
                    engine.play_note(note, 100, channel).expect("note");
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker");
    }

    let messages = capture.messages();
    assert_eq!(messages.len(), 200);
    assert!(messages.iter().all(|m| m.len() == 3));
}
