use midiengine_infra_storage_fs::FsStorage;
use midiengine_ports::storage::{SettingsDto, StorageError, StoragePort};
use midiengine_ports::types::Volume01;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = FsStorage::new(dir.path().join("nested"));

    let settings = storage.load_settings().expect("defaults");

    assert_eq!(settings, SettingsDto::default());
    assert!(settings.autoload_soundfont);
    assert_eq!(settings.sample_rate_hz, 44_100);
}

#[test]
fn saved_settings_load_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = FsStorage::new(dir.path().join("nested"));
    let settings = SettingsDto {
        default_soundfont_path: Some("/sf/gm.sf2".to_string()),
        autoload_soundfont: false,
        ..SettingsDto::default()
    };

    storage.save_settings(&settings).expect("save");

    assert!(storage.settings_path().exists());
    assert_eq!(storage.load_settings().expect("load"), settings);
}

#[test]
fn partial_file_fills_in_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = FsStorage::new(dir.path().to_path_buf());
    std::fs::write(
        storage.settings_path(),
        br#"{ "default_soundfont_path": "/sf/a.sf2", "sample_rate_hz": 48000 }"#,
    )
    .expect("write");

    let settings = storage.load_settings().expect("load");

    assert_eq!(settings.default_soundfont_path.as_deref(), Some("/sf/a.sf2"));
    assert!(settings.autoload_soundfont);
    assert_eq!(settings.sample_rate_hz, 48_000);
    assert_eq!(settings.master_volume.get(), 0.5);
}

#[test]
fn corrupt_file_is_a_serde_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = FsStorage::new(dir.path().to_path_buf());
    std::fs::write(storage.settings_path(), b"{ not json").expect("write");

    assert!(matches!(
        storage.load_settings(),
        Err(StorageError::Serde(_))
    ));
}

#[test]
fn save_replaces_existing_file_without_leftovers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = FsStorage::new(dir.path().to_path_buf());

    storage.save_settings(&SettingsDto::default()).expect("first save");
    let updated = SettingsDto {
        master_volume: Volume01::new(0.8),
        ..SettingsDto::default()
    };
    storage.save_settings(&updated).expect("second save");

    assert_eq!(storage.load_settings().expect("load").master_volume.get(), 0.8);
    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .expect("read dir")
        .map(|entry| entry.expect("entry").file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("settings.json")]);
}
