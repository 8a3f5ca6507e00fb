use framevault::config::ArchiveConfig;
use framevault::error::ConfigError;
use tempfile::tempdir;

#[test]
fn test_load_config_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("framevault.json");
    std::fs::write(
        &path,
        r#"{
            "jpeg_root": "/data/jpeg",
            "hls_root": "/data/hls",
            "handoff_capacity": 600,
            "frame_rate": 10,
            "unknown_field": true
        }"#,
    )
    .unwrap();

    let config = ArchiveConfig::load(&path).unwrap();
    assert_eq!(config.stream_jpeg_dir("cam").to_str(), Some("/data/jpeg/cam"));
    assert_eq!(config.stream_hls_dir("cam").to_str(), Some("/data/hls/cam"));
    assert_eq!(config.handoff_capacity, 600);
    assert_eq!(config.frame_rate, 10);
    assert_eq!(config.rotation_window_ms, 60_000);
}

#[test]
fn test_missing_config_file() {
    let dir = tempdir().unwrap();
    let result = ArchiveConfig::load(dir.path().join("absent.json"));
    assert!(matches!(result, Err(ConfigError::Read { .. })));
}

#[test]
fn test_malformed_config_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{ handoff_capacity: ").unwrap();

    assert!(matches!(ArchiveConfig::load(&path), Err(ConfigError::Parse(_))));
}

#[test]
fn test_zero_capacity_rejected() {
    let result = ArchiveConfig::from_json(serde_json::json!({"handoff_capacity": 0}));
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}
