// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use clap::Parser;

use super::{Cli, Command};

#[test]
fn test_version_command() {
    let cli = Cli::try_parse_from(["nobify", "version"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Version)));
}

#[test]
fn test_transpile_minimal() {
    let cli = Cli::try_parse_from(["nobify", "transpile", "proj"]).unwrap();
    let Some(Command::Transpile(args)) = cli.command else {
        panic!("expected transpile command");
    };
    assert_eq!(args.source_dir.to_str().unwrap(), "proj");
    assert!(args.build_dir.is_none());
    assert!(!args.real_probes);
}

#[test]
fn test_transpile_full_flags() {
    let cli = Cli::try_parse_from([
        "nobify",
        "-l",
        "4",
        "--ini",
        "extra.toml",
        "transpile",
        "proj",
        "-B",
        "out",
        "-o",
        "driver.c",
        "-D",
        "CMAKE_BUILD_TYPE=Debug",
        "-D",
        "FEATURE=ON",
        "--real-probes",
        "--keep-going",
    ])
    .unwrap();

    assert_eq!(cli.global.log_level, Some(4));
    assert_eq!(cli.global.inis.len(), 1);
    let Some(Command::Transpile(args)) = cli.command else {
        panic!("expected transpile command");
    };
    assert_eq!(args.build_dir.unwrap().to_str().unwrap(), "out");
    assert_eq!(args.output.unwrap().to_str().unwrap(), "driver.c");
    assert_eq!(args.defines, vec!["CMAKE_BUILD_TYPE=Debug", "FEATURE=ON"]);
    assert!(args.real_probes);
    assert!(args.keep_going);
}

#[test]
fn test_global_overrides_mapping() {
    let cli = Cli::try_parse_from([
        "nobify",
        "-l",
        "2",
        "--set",
        "probes.real_probes=true",
        "options",
    ])
    .unwrap();
    let overrides = cli.global.to_config_overrides();
    assert!(overrides.contains(&"probes.real_probes=true".to_string()));
    assert!(overrides.contains(&"logging.output_log_level=2".to_string()));
    assert!(overrides.contains(&"logging.file_log_level=2".to_string()));
}

#[test]
fn test_invalid_log_level_rejected() {
    assert!(Cli::try_parse_from(["nobify", "-l", "9", "options"]).is_err());
}
