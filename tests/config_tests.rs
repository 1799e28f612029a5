// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use ayurtrace_scanner::frame_processor::DecodeRegion;
use ayurtrace_scanner::{AppError, Config};

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.frame_rate, 10);
    assert_eq!(config.decode_region, Some(DecodeRegion::square(250)));
    assert_eq!(config.target_id, "reader");
    assert!(config.print_trace, "Trace output should be on by default");
}

#[test]
fn test_scan_config_follows_config() {
    let config = Config {
        frame_rate: 5,
        decode_region: None,
        target_id: "kiosk".to_string(),
        ..Config::default()
    };

    let scan = config.scan_config();
    assert_eq!(scan.frame_rate, 5);
    assert_eq!(scan.decode_region, None);
    assert_eq!(scan.target_id, "kiosk");
    assert_eq!(scan.resolution, config.resolution);
}

#[test]
fn test_config_save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let config = Config {
        frame_rate: 15,
        print_trace: false,
        ..Config::default()
    };
    config.save(&path).unwrap();

    assert_eq!(Config::load(&path).unwrap(), config);
}

#[test]
fn test_missing_config_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_partial_config_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "frame_rate": 2 }"#).unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.frame_rate, 2);
    assert_eq!(config.target_id, "reader");
    assert_eq!(config.decode_region, Some(DecodeRegion::square(250)));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "not json").unwrap();

    match Config::load(&path) {
        Err(AppError::Config(msg)) => assert!(msg.contains("config.json")),
        other => panic!("expected config error, got {:?}", other),
    }
}
