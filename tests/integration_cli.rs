// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for CLI parsing.
//!
//! Tests the CLI module with realistic command-line argument patterns.

use clap::Parser;
use nobify_rs::cli::{Cli, Command};

// =============================================================================
// Version Command
// =============================================================================

#[test]
fn cli_version_command() {
    let cli = Cli::try_parse_from(["nobify", "version"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Version)));
}

#[test]
fn cli_version_alias() {
    let cli = Cli::try_parse_from(["nobify", "-v"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Version)));
}

// =============================================================================
// Transpile Command
// =============================================================================

#[test]
fn cli_transpile_requires_source_dir() {
    assert!(Cli::try_parse_from(["nobify", "transpile"]).is_err());
}

#[test]
fn cli_transpile_with_defines_and_dirs() {
    let cli = Cli::try_parse_from([
        "nobify",
        "transpile",
        "demo",
        "-B",
        "demo/out",
        "-D",
        "CMAKE_BUILD_TYPE=Debug",
        "-D",
        "WITH_TESTS=ON",
    ])
    .unwrap();
    let Some(Command::Transpile(args)) = cli.command else {
        panic!("expected transpile");
    };
    assert_eq!(args.source_dir.to_str().unwrap(), "demo");
    assert_eq!(args.build_dir.unwrap().to_str().unwrap(), "demo/out");
    assert_eq!(args.defines.len(), 2);
}

#[test]
fn cli_global_options_before_command() {
    let cli = Cli::try_parse_from([
        "nobify",
        "--ini",
        "ci.toml",
        "--log-file",
        "transpile.log",
        "-l",
        "5",
        "transpile",
        "proj",
        "--real-probes",
    ])
    .unwrap();
    assert_eq!(cli.global.inis.len(), 1);
    assert_eq!(cli.global.log_level, Some(5));
    assert_eq!(
        cli.global.log_file.as_ref().unwrap().to_str().unwrap(),
        "transpile.log"
    );
    let Some(Command::Transpile(args)) = cli.command else {
        panic!("expected transpile");
    };
    assert!(args.real_probes);
}

#[test]
fn cli_options_and_inis_commands() {
    assert!(matches!(
        Cli::try_parse_from(["nobify", "options"]).unwrap().command,
        Some(Command::Options)
    ));
    assert!(matches!(
        Cli::try_parse_from(["nobify", "inis"]).unwrap().command,
        Some(Command::Inis)
    ));
}
