//! Unit tests for config module
//!
//! Tests defaults, parsing, validation and file loading.

use std::{fs, path::PathBuf, time::Duration};

use crate::config::{Config, ConfigError, LogFormat, LogLevel};

#[test]
fn config_default() {
    let config = Config::default();

    assert_eq!(config.general.log_level, LogLevel::Info);
    assert_eq!(config.general.log_format, LogFormat::Pretty);
    assert!(!config.general.log_to_file);
    assert_eq!(config.bridge.poll_interval(), Duration::from_secs(1));
    assert!(config.desktop.entries);
    assert!(config.desktop.purge_indicator);
}

#[test]
fn config_empty_toml_is_default() {
    let config = Config::parse("", None).unwrap();

    assert_eq!(config, Config::default());
}

#[test]
fn config_partial_sections_keep_other_defaults() {
    let toml_str = r#"
        [general]
        log_level = "debug"
        log_format = "json"

        [bridge]
        poll_interval_ms = 250

        [desktop]
        applications_dir = "/tmp/apps"
        refresh_menu = false
    "#;

    let config = Config::parse(toml_str, None).unwrap();

    assert_eq!(config.general.log_level, LogLevel::Debug);
    assert_eq!(config.general.log_format, LogFormat::Json);
    assert_eq!(config.bridge.poll_interval_ms, 250);
    assert_eq!(config.bridge.art_url, Config::default().bridge.art_url);
    assert_eq!(
        config.desktop.applications_dir,
        Some(PathBuf::from("/tmp/apps"))
    );
    assert!(!config.desktop.refresh_menu);
    assert!(config.desktop.entries);
}

#[test]
fn config_serialize_roundtrip() {
    let original = Config::default();

    let toml_str = toml::to_string(&original).unwrap();
    let deserialized = Config::parse(&toml_str, None).unwrap();

    assert_eq!(original, deserialized);
}

#[test]
fn zero_poll_interval_is_rejected() {
    let result = Config::parse("[bridge]\npoll_interval_ms = 0\n", None);

    assert!(matches!(
        result,
        Err(ConfigError::InvalidField { ref field, .. }) if field == "poll_interval_ms"
    ));
}

#[test]
fn unknown_log_level_is_parse_error() {
    let result = Config::parse("[general]\nlog_level = \"loud\"\n", None);

    assert!(matches!(result, Err(ConfigError::TomlParse { ref location, .. }) if location == "string"));
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();

    let config = Config::load(&dir.path().join("config.toml")).unwrap();

    assert_eq!(config, Config::default());
}

#[test]
fn file_parse_error_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[bridge\n").unwrap();

    let Err(ConfigError::TomlParse { location, .. }) = Config::load(&path) else {
        panic!("expected parse error");
    };

    assert!(location.ends_with("config.toml"));
}

#[test]
fn log_level_from_str() {
    assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warn));
    assert!("verbose".parse::<LogLevel>().is_err());
}

#[test]
fn json_schema_names_every_section() {
    let schema = Config::json_schema().unwrap();

    assert!(schema.contains("poll_interval_ms"));
    assert!(schema.contains("purge_indicator"));
    assert!(schema.contains("log_format"));
}
