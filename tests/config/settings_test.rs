use std::fs;
use std::path::PathBuf;

use strata::config::{Settings, SettingsError, CONFIG_FILE_NAME};

/// Fresh scratch directory under the system temp dir.
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("strata-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_parse_full_config() {
    let settings: Settings = r#"
        [model]
        default_namespace = "Acme.Sales"

        [resolution]
        memoize_complete = false
        narrow_entity_references = false

        [logging]
        level = "DEBUG"
    "#
    .parse()
    .unwrap();

    assert_eq!(settings.model.default_namespace.as_deref(), Some("Acme.Sales"));
    assert!(!settings.resolution.memoize_complete);
    assert!(!settings.resolve_options().narrow_entity_references);
    assert_eq!(settings.logging.level, "DEBUG");
}

#[test]
fn test_empty_config_is_default() {
    let settings: Settings = "".parse().unwrap();
    assert!(settings.resolution.memoize_complete);
    assert!(settings.resolve_options().narrow_entity_references);
    assert_eq!(settings.logging.level, "info");
}

#[test]
fn test_blank_namespace_rejected() {
    let err = "[model]\ndefault_namespace = \"  \"\n"
        .parse::<Settings>()
        .unwrap_err();
    assert!(err.to_string().contains("default_namespace"));
}

#[test]
fn test_malformed_toml() {
    let err = "[resolution\nmemoize_complete = true".parse::<Settings>().unwrap_err();
    assert!(matches!(err, SettingsError::ParseError(_)));
}

#[test]
fn test_load_missing_file() {
    let path = scratch_dir("missing").join("nope.toml");
    let err = Settings::load(&path).unwrap_err();
    assert!(matches!(err, SettingsError::FileNotFound(ref p) if *p == path));
}

#[test]
fn test_load_file() {
    let dir = scratch_dir("load");
    let path = dir.join(CONFIG_FILE_NAME);
    fs::write(&path, "[model]\ndefault_namespace = \"Hr\"\n").unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.model.default_namespace.as_deref(), Some("Hr"));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_settings_round_trip_through_toml() {
    let mut settings = Settings::default();
    settings.model.default_namespace = Some("Hr".into());
    settings.logging.level = "warn".into();

    let text = toml::to_string(&settings).unwrap();
    let back: Settings = text.parse().unwrap();
    assert_eq!(back.model.default_namespace.as_deref(), Some("Hr"));
    assert_eq!(back.logging.level, "warn");
}
