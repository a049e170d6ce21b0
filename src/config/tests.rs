// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use super::Config;
use super::types::BuildConfiguration;
use crate::logging::LogLevel;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert!(!config.probes.real_probes);
    assert_eq!(config.probes.timeout_ms, 30_000);
    assert_eq!(config.evaluator.max_genex_depth, 64);
    assert_eq!(
        config.evaluator.default_configuration,
        BuildConfiguration::Release
    );
}

#[test]
fn test_parse_toml_sections() {
    let config = Config::parse(
        r#"
        [logging]
        output_log_level = 4

        [paths]
        cmake_root = "/opt/cmake"
        module_path = ["/opt/modules", "/usr/share/modules"]

        [probes]
        real_probes = true
        c_compiler = "clang"
        timeout_ms = 5000

        [evaluator]
        continue_on_fatal_error = true
        default_configuration = "Debug"
        "#,
    )
    .unwrap();

    assert_eq!(config.logging.output_log_level, LogLevel::DEBUG);
    assert_eq!(config.paths.cmake_root.to_str().unwrap(), "/opt/cmake");
    assert_eq!(config.paths.module_path.len(), 2);
    assert!(config.probes.real_probes);
    assert_eq!(config.probes.c_compiler.to_str().unwrap(), "clang");
    assert_eq!(config.probes.timeout_ms, 5000);
    assert!(config.evaluator.continue_on_fatal_error);
    assert_eq!(
        config.evaluator.default_configuration,
        BuildConfiguration::Debug
    );
}

#[test]
fn test_parse_rejects_unknown_keys() {
    let result = Config::parse(
        r"
        [probes]
        no_such_key = 1
        ",
    );
    assert!(result.is_err());
}

#[test]
fn test_build_configuration_parse() {
    assert_eq!(
        BuildConfiguration::parse("debug"),
        Some(BuildConfiguration::Debug)
    );
    assert_eq!(
        BuildConfiguration::parse("RELWITHDEBINFO"),
        Some(BuildConfiguration::RelWithDebInfo)
    );
    assert_eq!(BuildConfiguration::parse("Nightly"), None);
    assert_eq!(BuildConfiguration::MinSizeRel.as_str(), "MinSizeRel");
}

#[test]
fn test_format_options_sorted_and_aligned() {
    let config = Config::default();
    let options = config.format_options();
    assert!(!options.is_empty());

    let keys: Vec<_> = options
        .iter()
        .map(|line| line.split_whitespace().next().unwrap().to_string())
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted, "options should be sorted by key");

    let eq_columns: Vec<_> = options.iter().map(|line| line.find(" = ")).collect();
    assert!(
        eq_columns.windows(2).all(|w| w[0] == w[1]),
        "keys should be padded to a common width"
    );
}
