//! Configuration file loading as the CLI performs it at startup.

use std::time::Duration;

use waypoint_engine::{
    AppOptions, ConfigError, DEFAULT_START_PATH, NotificationSettings, WaypointConfig,
};

fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, contents).expect("write config");
    (dir, path)
}

#[test]
fn missing_file_means_defaults() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = WaypointConfig::load_from(&dir.path().join("config.toml")).expect("no error");
    assert!(config.is_none());

    let options = AppOptions::from_config(config.as_ref());
    assert_eq!(options.start_path, DEFAULT_START_PATH);
    assert_eq!(options.notifications, NotificationSettings::default());
}

#[test]
fn full_file_drives_app_options() {
    let (_dir, path) = write_config(
        r#"
[app]
ascii_only = true
high_contrast = true
start_path = "/assessment"

[notifications]
max_visible = 5
ttl_secs = 2
"#,
    );
    let config = WaypointConfig::load_from(&path)
        .expect("parses")
        .expect("present");

    let options = AppOptions::from_config(Some(&config));
    assert!(options.ui.ascii_only);
    assert!(options.ui.high_contrast);
    assert_eq!(options.start_path, "/assessment");
    assert_eq!(options.notifications.max_visible, 5);
    assert_eq!(options.notifications.ttl, Duration::from_secs(2));
}

#[test]
fn malformed_file_reports_its_path() {
    let (_dir, path) = write_config("[app\nascii_only = yes");
    let err = WaypointConfig::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "{err:?}");
    assert_eq!(err.path(), &path);
}
