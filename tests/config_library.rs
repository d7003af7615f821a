use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use rkpatch::library::{Bank, Library, Patch};
use rkpatch::{Config, Error};

#[test]
fn test_config_round_trip() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let config = Config {
        midi_channel: 9,
        sysex_write_debounce_ms: 400,
        library_root: Some(PathBuf::from("/tmp/patches")),
    };
    config.save_to(&path).unwrap();
    assert!(!path.with_extension("json.tmp").exists());

    let loaded = Config::try_load_from(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.debounce(), Duration::from_millis(400));
    assert_eq!(loaded.library_root().unwrap(), PathBuf::from("/tmp/patches"));
}

#[test]
fn test_config_fallbacks() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("missing.json");
    assert_eq!(Config::try_load_from(&missing).unwrap(), Config::default());

    let partial = dir.path().join("partial.json");
    fs::write(&partial, r#"{ "sysex_write_debounce_ms": 75 }"#).unwrap();
    let config = Config::load_from(&partial);
    assert_eq!(config.sysex_write_debounce_ms, 75);
    assert_eq!(config.midi_channel, 1);

    let malformed = dir.path().join("malformed.json");
    fs::write(&malformed, "{ midi_channel: ").unwrap();
    assert!(matches!(
        Config::try_load_from(&malformed),
        Err(Error::Format(_))
    ));
    assert_eq!(Config::load_from(&malformed), Config::default());

    let invalid = dir.path().join("invalid.json");
    fs::write(&invalid, r#"{ "midi_channel": 0 }"#).unwrap();
    assert!(matches!(
        Config::try_load_from(&invalid),
        Err(Error::Validation(_))
    ));
    assert_eq!(Config::load_from(&invalid), Config::default());
}

#[test]
fn test_patch_save_and_list() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().unwrap();
    let library = Library::open(dir.path().join("lib")).unwrap();

    let mut patch = Patch::new("Warm Pad", 12).with_sysex(vec![1, 2, 3]);
    patch.category = "Pad".to_string();
    patch.notes = "slow attack".to_string();

    let first = library.save_patch(&patch).unwrap();
    let second = library.save_patch(&patch).unwrap();
    assert_eq!(first.file_name().unwrap(), "warm-pad.json");
    assert_eq!(second.file_name().unwrap(), "warm-pad-1.json");
    assert!(first.with_extension("syx").exists());

    let loaded = Patch::load(&first).unwrap();
    assert_eq!(loaded, patch);

    library.save_patch(&Patch::new("Bass", 0)).unwrap();
    fs::write(library.patches_dir().join("broken.json"), "not json").unwrap();

    let names: Vec<_> = library
        .list_patches()
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Bass", "Warm Pad", "Warm Pad"]);

    library.delete_patch(&second).unwrap();
    assert!(!second.exists());
    assert!(!second.with_extension("syx").exists());
    assert_eq!(library.list_patches().unwrap().len(), 2);
}

#[test]
fn test_patch_without_usable_name() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().unwrap();
    let library = Library::open(dir.path()).unwrap();

    assert!(matches!(
        library.save_patch(&Patch::new("!!!", 0)),
        Err(Error::Validation(_))
    ));
}

#[test]
fn test_missing_sysex_file_leaves_patch_empty() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().unwrap();
    let library = Library::open(dir.path()).unwrap();

    let path = library
        .save_patch(&Patch::new("Lead", 3).with_sysex(vec![0x10; 8]))
        .unwrap();
    fs::remove_file(path.with_extension("syx")).unwrap();

    let loaded = Patch::load(&path).unwrap();
    assert_eq!(loaded.name, "Lead");
    assert_eq!(loaded.sysex, None);
}

#[test]
fn test_bank_save_and_list() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().unwrap();
    let library = Library::open(dir.path()).unwrap();

    let mut bank = Bank::new("Live Set");
    bank.assign(10, "patches/lead.json");
    bank.assign(2, "patches/pad.json");
    let path = library.save_bank(&bank).unwrap();
    assert_eq!(path.file_name().unwrap(), "live-set.json");

    let loaded = Bank::load(&path).unwrap();
    assert_eq!(loaded, bank);
    let slots: Vec<_> = loaded.ordered_slots().into_iter().map(|(s, _)| s).collect();
    assert_eq!(slots, vec![2, 10]);

    assert_eq!(library.list_banks().unwrap(), vec![bank]);
}

#[test]
fn test_bank_names_stay_inside_the_library() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().unwrap();
    let library = Library::open(dir.path().join("lib")).unwrap();

    let path = library.save_bank(&Bank::new("../../escaped")).unwrap();
    assert_eq!(path.parent().unwrap(), library.banks_dir());
    assert_eq!(path.file_name().unwrap(), "escaped.json");
    assert!(!dir.path().join("escaped.json").exists());

    assert!(matches!(
        library.save_bank(&Bank::new("/..")),
        Err(Error::Validation(_))
    ));
}
