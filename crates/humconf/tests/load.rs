use humconf::{ConfigError, HumConfig};
use std::io::Write;

#[test]
fn cli_path_is_loaded_and_reported() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[humanize]\nstyle = \"classical\"\nseed = 11").unwrap();

    let (config, sources) = HumConfig::load_with_sources_from(Some(file.path())).unwrap();
    assert_eq!(config.humanize.seed, Some(11));
    assert!(sources.files.iter().any(|p| p == file.path()));
}

#[test]
fn missing_cli_path_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    let err = HumConfig::load_from(Some(&missing)).unwrap_err();
    assert!(matches!(err, ConfigError::FileRead { .. }));
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[humanize\nstyle = ").unwrap();
    let err = HumConfig::load_from(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("bad.toml"));
}

#[test]
fn printed_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("humanize.toml");

    let mut config = HumConfig::default();
    config.humanize.phrase_detection = "harmonic".to_string();
    config.analysis.chord_window_ticks = 1920;
    std::fs::write(&path, config.to_toml()).unwrap();

    let loaded = HumConfig::load_from(Some(&path)).unwrap();
    assert_eq!(loaded.humanize.phrase_detection, "harmonic");
    assert_eq!(loaded.analysis.chord_window_ticks, 1920);
}
