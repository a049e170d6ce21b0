// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{LogConfig, LogLevel};

#[test]
fn test_log_level_conversion() {
    assert_eq!(LogLevel::from_int(0), LogLevel::SILENT);
    assert_eq!(LogLevel::from_int(3), LogLevel::INFO);
    assert_eq!(LogLevel::from_int(5), LogLevel::TRACE);
    assert_eq!(LogLevel::from_int(100), LogLevel::DUMP);
    assert_eq!(LogLevel::from_u8(7), None);
    assert_eq!(LogLevel::INFO.to_filter_string(), "info");
    assert_eq!(LogLevel::DUMP.to_filter_string(), "trace");
    assert!(LogLevel::SILENT.to_tracing_level().is_none());
}

#[test]
fn test_log_level_validation() {
    assert!(LogLevel::new(6).is_ok());
    assert!(LogLevel::new(7).is_err());
    assert_eq!(u8::from(LogLevel::DEBUG), 4);
}

#[test]
fn test_log_config_builder_defaults() {
    let config = LogConfig::default();
    assert_eq!(config.console_level(), LogLevel::INFO);
    assert_eq!(config.file_level(), LogLevel::TRACE);
    assert!(config.log_file().is_none());
    assert!(config.show_timestamps());
    assert!(!config.show_target());

    let custom = LogConfig::builder()
        .with_console_level(LogLevel::WARN)
        .with_log_file("out.log".to_string())
        .build();
    assert_eq!(custom.console_level(), LogLevel::WARN);
    assert_eq!(custom.log_file(), Some("out.log"));
}
