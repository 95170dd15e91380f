use std::fs;
use std::path::PathBuf;

use clap::Parser;
use domain_check_app::cli::Cli;
use domain_check_app::settings::{Renderer, Settings, SettingsError};
use pretty_assertions::assert_eq;

#[test]
fn partial_settings_file_keeps_defaults() {
    let settings = Settings::parse("(concurrency: 4, max_timeout_ms: Some(60000))").unwrap();

    assert_eq!(settings.concurrency, 4);
    assert_eq!(settings.max_timeout_ms, Some(60000));
    assert_eq!(settings.timeout_ms, 10_000);
    assert_eq!(settings.multiplier, 2.0);
    assert_eq!(settings.max_retries, 3);
    assert_eq!(settings.renderer, Renderer::Http);
}

#[test]
fn command_line_overrides_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("check.ron");
    fs::write(&config, "(concurrency: 4, timeout_ms: 5000, user_agent: Some(\"probe\"))").unwrap();

    let cli = Cli::try_parse_from([
        "domain-check",
        "in.csv",
        "--config",
        config.to_str().unwrap(),
        "-c",
        "7",
        "--renderer",
        "chrome",
    ])
    .unwrap();
    let settings = Settings::resolve(&cli).unwrap();

    assert_eq!(settings.concurrency, 7);
    assert_eq!(settings.timeout_ms, 5000);
    assert_eq!(settings.renderer, Renderer::Chrome);
    assert_eq!(settings.fetch_settings().user_agent, "probe");

    let policy = settings.retry_policy();
    assert_eq!(policy.concurrency, 7);
    assert_eq!(policy.base_timeout_ms, 5000);
}

#[test]
fn unreadable_settings_file_is_reported() {
    let cli = Cli {
        input: PathBuf::from("in.csv"),
        config: Some(PathBuf::from("/definitely/not/here.ron")),
        ..Cli::default()
    };
    let err = Settings::resolve(&cli).unwrap_err();
    assert!(matches!(err, SettingsError::Read { .. }));
}

#[test]
fn malformed_settings_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bad.ron");
    fs::write(&config, "(concurrency: \"lots\")").unwrap();

    let err = Settings::load(&config).unwrap_err();
    assert!(matches!(err, SettingsError::Parse { .. }));
}
