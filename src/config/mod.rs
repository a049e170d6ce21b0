// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management for nobify-rs.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. nobify.toml (cwd)
//! 3. --ini files
//! 4. NOBIFY_* env vars
//! 5. CLI overrides
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! NOBIFY_PROBES_REAL_PROBES=true     → probes.real_probes = true
//! NOBIFY_PATHS_CMAKE_ROOT=/opt/cmake → paths.cmake_root = "/opt/cmake"
//! ```

pub mod loader;
pub mod types;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;

use loader::ConfigLoader;
use types::{EvaluatorConfig, LoggingConfig, PathsConfig, ProbesConfig};

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Logging options.
    pub logging: LoggingConfig,
    /// Search paths and output locations.
    pub paths: PathsConfig,
    /// Toolchain probe options.
    pub probes: ProbesConfig,
    /// Evaluator options.
    pub evaluator: EvaluatorConfig,
}

impl Config {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use nobify_rs::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_toml_file_optional("nobify.toml")
    ///     .with_env_prefix("NOBIFY")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a single TOML file (simple API).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// does not match the `Config` structure.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::builder().add_toml_file(path).build()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or does not match the
    /// `Config` structure.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Format configuration options for display.
    ///
    /// Returns a vector of formatted strings representing all configuration
    /// options. Output is deterministically ordered using `BTreeMap`.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();
        self.format_logging_options(&mut options);
        self.format_paths_options(&mut options);
        self.format_probes_options(&mut options);
        self.format_evaluator_options(&mut options);

        let max_key_len = options.keys().map(String::len).max().unwrap_or(0);

        options
            .into_iter()
            .map(|(key, value)| format!("{key:<max_key_len$} = {value}"))
            .collect()
    }

    fn format_logging_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "logging.output_log_level".into(),
            self.logging.output_log_level.as_u8().to_string(),
        );
        options.insert(
            "logging.file_log_level".into(),
            self.logging.file_log_level.as_u8().to_string(),
        );
        options.insert(
            "logging.log_file".into(),
            self.logging.log_file.display().to_string(),
        );
    }

    fn format_paths_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "paths.cmake_root".into(),
            self.paths.cmake_root.display().to_string(),
        );
        options.insert(
            "paths.module_path".into(),
            self.paths
                .module_path
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(";"),
        );
        options.insert(
            "paths.build_dir".into(),
            self.paths
                .build_dir
                .as_ref()
                .map_or_else(String::new, |p| p.display().to_string()),
        );
        options.insert(
            "paths.output".into(),
            self.paths
                .output
                .as_ref()
                .map_or_else(String::new, |p| p.display().to_string()),
        );
    }

    fn format_probes_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "probes.real_probes".into(),
            self.probes.real_probes.to_string(),
        );
        options.insert(
            "probes.c_compiler".into(),
            self.probes.c_compiler.display().to_string(),
        );
        options.insert(
            "probes.timeout_ms".into(),
            self.probes.timeout_ms.to_string(),
        );
    }

    fn format_evaluator_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "evaluator.continue_on_fatal_error".into(),
            self.evaluator.continue_on_fatal_error.to_string(),
        );
        options.insert(
            "evaluator.default_configuration".into(),
            self.evaluator.default_configuration.to_string(),
        );
        options.insert(
            "evaluator.max_genex_depth".into(),
            self.evaluator.max_genex_depth.to_string(),
        );
        options.insert(
            "evaluator.max_genex_property_depth".into(),
            self.evaluator.max_genex_property_depth.to_string(),
        );
        options.insert(
            "evaluator.max_file_depth".into(),
            self.evaluator.max_file_depth.to_string(),
        );
    }
}
