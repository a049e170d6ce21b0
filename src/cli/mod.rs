// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for nobify-rs using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! nobify [global options] <command>
//! transpile <source-dir> [-B dir] [-o file] [-D K=V] [--real-probes]
//! options
//! inis
//! version
//! ```

pub mod global;
pub mod transpile;

#[cfg(test)]
mod tests;

use crate::cli::global::GlobalOptions;
use crate::cli::transpile::TranspileArgs;
use clap::{Parser, Subcommand};

/// CMake to C Build Driver Transpiler - Rust Port
///
/// Converts CMake build descriptions into a self-contained C build driver.
#[derive(Debug, Parser)]
#[command(
    name = "nobify",
    author,
    version,
    about = "CMake to C Build Driver Transpiler",
    long_about = "nobify-rs Copyright (C) 2026 nobify-rs contributors\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  nobify reads a project's CMakeLists.txt, evaluates it and emits\n\
                  an equivalent C build driver. Invoke `nobify transpile <dir>` to\n\
                  transpile a project. See `nobify <command> --help` for more\n\
                  information about a command.",
    after_help = "INI FILES:\n\n\
                  By default, nobify will look for `nobify.toml` in the current\n\
                  directory. Additional TOML files can be specified with --ini;\n\
                  those are loaded after the default and override it. Use\n\
                  --no-default-inis to disable auto detection and only use --ini."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shows the version.
    #[command(visible_alias = "-v")]
    Version,

    /// Lists all options and their values from the configuration.
    Options,

    /// Lists the configuration files used by nobify.
    Inis,

    /// Transpiles a CMake project into a C build driver.
    Transpile(TranspileArgs),
}

/// Parses the process command line.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
