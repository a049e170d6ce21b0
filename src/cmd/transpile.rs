// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! The `transpile` command: evaluate a CMake project and emit the C
//! build driver.
//!
//! ```text
//! run_transpile_command
//!   Evaluator::evaluate_source_dir
//!        |
//!   diagnostics -> stderr summary, exit non-zero on severity >= ERROR
//!        |
//!   validate_dependencies + link_output_commands
//!        |
//!   codegen::generate -> <build>/nob_build.c
//! ```

use std::path::PathBuf;

use anyhow::Context;
use tracing::{error, info};

use crate::cli::transpile::TranspileArgs;
use crate::codegen;
use crate::config::Config;
use crate::effects::RealExecutor;
use crate::effects::toolchain::cleanup_probe_dir;
use crate::error::Result;
use crate::eval::{EvalOptions, Evaluator, Severity};

/// Runs the transpile command end to end. Returns `Ok(false)` when
/// diagnostics of severity >= ERROR were emitted.
pub fn run_transpile_command(args: &TranspileArgs, config: &Config) -> Result<bool> {
    let source_dir = args.source_dir.clone();
    let build_dir: PathBuf = args
        .build_dir
        .clone()
        .or_else(|| config.paths.build_dir.clone())
        .unwrap_or_else(|| source_dir.join("build"));
    let output = args
        .output
        .clone()
        .or_else(|| config.paths.output.clone())
        .unwrap_or_else(|| build_dir.join("nob_build.c"));

    let mut options = EvalOptions::from_config(config);
    options.real_probes |= args.real_probes;
    options.continue_on_fatal_error |= args.keep_going;

    let effects = RealExecutor::new()?;
    let mut evaluator = Evaluator::new(options, &effects);

    // -D seeds land in the cache before evaluation starts.
    for define in &args.defines {
        let (key, value) = define
            .split_once('=')
            .map_or((define.as_str(), ""), |(key, value)| (key, value));
        evaluator.model.set_cache_entry(key, value, "STRING", "", true);
    }

    info!(source = %source_dir.display(), build = %build_dir.display(), "transpiling");
    evaluator.evaluate_source_dir(&source_dir, &build_dir)?;

    let failed = evaluator.has_errors();
    if failed {
        // Summarize the first error's code and class.
        if let Some(first) = evaluator
            .diagnostics()
            .iter()
            .find(|d| d.severity >= Severity::Error)
        {
            error!(
                code = first.code.as_str(),
                class = first.class.as_str(),
                "transpilation failed: {}",
                first.cause
            );
        }
    }

    let (mut model, events, diagnostics) = evaluator.into_parts();
    for diagnostic in &diagnostics {
        tracing::debug!(%diagnostic, "recorded diagnostic");
    }

    if !model.validate_dependencies() {
        error!("dependency validation failed");
        cleanup_probe_dir(&build_dir);
        return Ok(false);
    }
    model.link_output_commands();

    let driver = codegen::generate(&model, &events);
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&output, driver)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(output = %output.display(), "driver written");

    // Probe intermediates are never part of the deliverable.
    cleanup_probe_dir(&build_dir);
    Ok(!failed)
}
