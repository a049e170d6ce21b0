// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! `transpile` command arguments.
//!
//! ```text
//! nobify transpile <source-dir>
//!   -B/--build-dir DIR     binary directory (default: <source>/build)
//!   -o/--output FILE       generated driver path (default: <build>/nob_build.c)
//!   -D KEY=VALUE           seed a cache entry (repeatable)
//!   --real-probes          invoke the host toolchain for try_compile/check_*
//!   --keep-going           record FATAL diagnostics but keep evaluating
//! ```

use clap::Args;
use std::path::PathBuf;

/// Arguments for the `transpile` command.
#[derive(Debug, Clone, Args)]
pub struct TranspileArgs {
    /// Source directory holding the root CMakeLists.txt.
    #[arg(value_name = "SOURCE_DIR")]
    pub source_dir: PathBuf,

    /// Binary (build) directory for the generated driver.
    #[arg(short = 'B', long = "build-dir", value_name = "DIR")]
    pub build_dir: Option<PathBuf>,

    /// Output path for the generated C driver.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Seeds a cache entry, such as -D CMAKE_BUILD_TYPE=Debug.
    /// Can be specified multiple times.
    #[arg(short = 'D', value_name = "KEY=VALUE", action = clap::ArgAction::Append)]
    pub defines: Vec<String>,

    /// Invokes the real host toolchain for try_compile/try_run/check_*.
    #[arg(long = "real-probes")]
    pub real_probes: bool,

    /// Records FATAL diagnostics but keeps evaluating (diff/repair use).
    #[arg(long = "keep-going")]
    pub keep_going: bool,
}
