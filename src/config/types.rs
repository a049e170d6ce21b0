// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration section types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::logging::LogLevel;

/// Build configuration the transpiled driver defaults to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BuildConfiguration {
    /// Debug build with symbols.
    Debug,
    /// Optimized release build.
    #[default]
    Release,
    /// Release with debug info.
    RelWithDebInfo,
    /// Size-optimized release.
    MinSizeRel,
}

impl BuildConfiguration {
    /// Parse from a CMake `CMAKE_BUILD_TYPE` value (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "release" => Some(Self::Release),
            "relwithdebinfo" => Some(Self::RelWithDebInfo),
            "minsizerel" => Some(Self::MinSizeRel),
            _ => None,
        }
    }

    /// Canonical CMake spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
            Self::RelWithDebInfo => "RelWithDebInfo",
            Self::MinSizeRel => "MinSizeRel",
        }
    }
}

impl fmt::Display for BuildConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging section (`[logging]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Console log level (0-6).
    pub output_log_level: LogLevel,
    /// File log level (0-6).
    pub file_log_level: LogLevel,
    /// Log file path; empty disables the file layer.
    pub log_file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            output_log_level: LogLevel::INFO,
            file_log_level: LogLevel::TRACE,
            log_file: PathBuf::new(),
        }
    }
}

/// Paths section (`[paths]`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Root of the emulated CMake installation; `<cmake_root>/Modules` is
    /// the built-in module search directory.
    pub cmake_root: PathBuf,
    /// Extra module search directories, highest priority first.
    pub module_path: Vec<PathBuf>,
    /// Binary (build) directory for the transpiled driver.
    pub build_dir: Option<PathBuf>,
    /// Output path for the generated C driver.
    pub output: Option<PathBuf>,
}

/// Probes section (`[probes]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbesConfig {
    /// Invoke the real toolchain for `try_compile`/`check_*`; when false,
    /// deterministic fallbacks are used.
    pub real_probes: bool,
    /// C compiler driver; empty means `$CC`, then `cc`.
    pub c_compiler: PathBuf,
    /// Per-probe timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ProbesConfig {
    fn default() -> Self {
        Self {
            real_probes: false,
            c_compiler: PathBuf::new(),
            timeout_ms: 30_000,
        }
    }
}

/// Evaluator section (`[evaluator]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvaluatorConfig {
    /// Record FATAL diagnostics but keep evaluating (diff/repair tooling).
    pub continue_on_fatal_error: bool,
    /// Default configuration when `CMAKE_BUILD_TYPE` is unset.
    pub default_configuration: BuildConfiguration,
    /// Generator expression recursion bound.
    pub max_genex_depth: usize,
    /// TARGET_PROPERTY cycle-guard stack bound.
    pub max_genex_property_depth: usize,
    /// Maximum include/subdirectory nesting.
    pub max_file_depth: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            continue_on_fatal_error: false,
            default_configuration: BuildConfiguration::default(),
            max_genex_depth: 64,
            max_genex_property_depth: 64,
            max_file_depth: 64,
        }
    }
}
