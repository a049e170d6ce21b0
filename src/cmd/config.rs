// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! `options` and `inis` commands.

use crate::config::Config;

/// Prints every configuration option with its effective value.
pub fn run_options_command(config: &Config) {
    for line in config.format_options() {
        println!("{line}");
    }
}

/// Prints the configuration files that were loaded, in order.
pub fn run_inis_command(loaded: &[String]) {
    if loaded.is_empty() {
        println!("no configuration files loaded");
        return;
    }
    for line in loaded {
        println!("{line}");
    }
}
