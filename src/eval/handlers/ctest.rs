// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! CTest script mode: `ctest_start` through `ctest_run_script`.
//!
//! ```text
//! every step populates its documented return-value variables
//! (CTEST_CONFIGURE_RETURN_VALUE, ...) and the dashboard state
//! (CTEST_DASHBOARD_MODEL, CTEST_DASHBOARD_TRACK, CTEST_TESTS_RUN)
//!
//! ctest_coverage writes the gcov bundle:
//!   Testing/CoverageInfo/data.json    (cmk2nob-cdash-gcov-v1)
//!   Testing/CoverageInfo/Labels.json  ("{}\n")
//!   Testing/CoverageInfo/Coverage.xml (<Site BuildName="cmk2nob" ...>)
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::effects::FsRequest;
use crate::eval::opt::{OptKind, OptSpec, parse_opts};
use crate::eval::{Evaluator, Flow, Invocation};
use crate::utility::fs as fsutil;

/// Dashboard state threaded between the ctest steps.
#[derive(Debug, Clone, Default)]
pub(crate) struct CtestState {
    pub(crate) started: bool,
    pub(crate) model: String,
    pub(crate) track: String,
}

fn ctest_build_dir(ev: &Evaluator<'_>) -> String {
    ev.variable("CTEST_BINARY_DIRECTORY")
        .or_else(|| ev.variable("CMAKE_CURRENT_BINARY_DIR"))
        .unwrap_or_else(|| ".".to_string())
}

fn set_return_value(ev: &mut Evaluator<'_>, parsed_var: Option<&str>, name: &str, value: &str) {
    ev.set_variable(name, value);
    if let Some(variable) = parsed_var {
        let variable = variable.to_string();
        ev.set_variable(&variable, value);
    }
}

/// `ctest_start(<model> [TRACK <track>] [APPEND])`.
pub(crate) fn cmd_ctest_start(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    const SPECS: [OptSpec; 2] = [
        OptSpec::new("TRACK", OptKind::Single),
        OptSpec::new("APPEND", OptKind::Flag),
    ];
    let values = inv.values();
    let parsed = match parse_opts(&values, 0, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("ctest_start", message);
            return Flow::Normal;
        }
    };
    let model = parsed
        .positionals()
        .first()
        .cloned()
        .unwrap_or_else(|| "Experimental".to_string());
    let track = parsed
        .one("TRACK")
        .map_or_else(|| model.clone(), str::to_string);

    ev.ctest_state = CtestState {
        started: true,
        model: model.clone(),
        track: track.clone(),
    };
    ev.set_variable("CTEST_DASHBOARD_MODEL", &model);
    ev.set_variable("CTEST_DASHBOARD_TRACK", &track);
    debug!(model = %model, track = %track, "ctest dashboard started");
    Flow::Normal
}

fn require_started(ev: &mut Evaluator<'_>, command: &str) -> bool {
    if ev.ctest_state.started {
        return true;
    }
    ev.error(command, format!("{command}() before ctest_start()"));
    false
}

/// `ctest_configure([BUILD <dir>] [RETURN_VALUE <var>] ...)`.
pub(crate) fn cmd_ctest_configure(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    const SPECS: [OptSpec; 3] = [
        OptSpec::new("BUILD", OptKind::Single),
        OptSpec::new("RETURN_VALUE", OptKind::Single),
        OptSpec::new("CAPTURE_CMAKE_ERROR", OptKind::Single),
    ];
    let values = inv.values();
    let parsed = match parse_opts(&values, 0, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("ctest_configure", message);
            return Flow::Normal;
        }
    };
    if !require_started(ev, "ctest_configure") {
        return Flow::Normal;
    }
    set_return_value(ev, parsed.one("RETURN_VALUE"), "CTEST_CONFIGURE_RETURN_VALUE", "0");
    if let Some(variable) = parsed.one("CAPTURE_CMAKE_ERROR").map(str::to_string) {
        ev.set_variable(&variable, "0");
    }
    Flow::Normal
}

/// `ctest_build([RETURN_VALUE <var>] [NUMBER_ERRORS <var>]
/// [NUMBER_WARNINGS <var>] ...)`.
pub(crate) fn cmd_ctest_build(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    const SPECS: [OptSpec; 4] = [
        OptSpec::new("BUILD", OptKind::Single),
        OptSpec::new("RETURN_VALUE", OptKind::Single),
        OptSpec::new("NUMBER_ERRORS", OptKind::Single),
        OptSpec::new("NUMBER_WARNINGS", OptKind::Single),
    ];
    let values = inv.values();
    let parsed = match parse_opts(&values, 0, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("ctest_build", message);
            return Flow::Normal;
        }
    };
    if !require_started(ev, "ctest_build") {
        return Flow::Normal;
    }
    set_return_value(ev, parsed.one("RETURN_VALUE"), "CTEST_BUILD_RETURN_VALUE", "0");
    if let Some(variable) = parsed.one("NUMBER_ERRORS").map(str::to_string) {
        ev.set_variable(&variable, "0");
    }
    if let Some(variable) = parsed.one("NUMBER_WARNINGS").map(str::to_string) {
        ev.set_variable(&variable, "0");
    }
    Flow::Normal
}

/// `ctest_test([RETURN_VALUE <var>] ...)`; records the number of
/// registered tests in `CTEST_TESTS_RUN`.
pub(crate) fn cmd_ctest_test(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    const SPECS: [OptSpec; 4] = [
        OptSpec::new("BUILD", OptKind::Single),
        OptSpec::new("RETURN_VALUE", OptKind::Single),
        OptSpec::new("PARALLEL_LEVEL", OptKind::Single),
        OptSpec::new("INCLUDE", OptKind::Single),
    ];
    let values = inv.values();
    let parsed = match parse_opts(&values, 0, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("ctest_test", message);
            return Flow::Normal;
        }
    };
    if !require_started(ev, "ctest_test") {
        return Flow::Normal;
    }
    let tests_run = ev.model.tests.len().to_string();
    ev.set_variable("CTEST_TESTS_RUN", &tests_run);
    set_return_value(ev, parsed.one("RETURN_VALUE"), "CTEST_TEST_RETURN_VALUE", "0");
    Flow::Normal
}

/// `ctest_memcheck([RETURN_VALUE <var>] [DEFECT_COUNT <var>])`.
pub(crate) fn cmd_ctest_memcheck(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    const SPECS: [OptSpec; 2] = [
        OptSpec::new("RETURN_VALUE", OptKind::Single),
        OptSpec::new("DEFECT_COUNT", OptKind::Single),
    ];
    let values = inv.values();
    let parsed = match parse_opts(&values, 0, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("ctest_memcheck", message);
            return Flow::Normal;
        }
    };
    if !require_started(ev, "ctest_memcheck") {
        return Flow::Normal;
    }
    set_return_value(
        ev,
        parsed.one("RETURN_VALUE"),
        "CTEST_MEMCHECK_RETURN_VALUE",
        "0",
    );
    if let Some(variable) = parsed.one("DEFECT_COUNT").map(str::to_string) {
        ev.set_variable(&variable, "0");
    }
    Flow::Normal
}

/// `ctest_coverage([RETURN_VALUE <var>])` - writes the gcov bundle.
pub(crate) fn cmd_ctest_coverage(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    const SPECS: [OptSpec; 2] = [
        OptSpec::new("RETURN_VALUE", OptKind::Single),
        OptSpec::new("CAPTURE_CMAKE_ERROR", OptKind::Single),
    ];
    let values = inv.values();
    let parsed = match parse_opts(&values, 0, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("ctest_coverage", message);
            return Flow::Normal;
        }
    };
    if !require_started(ev, "ctest_coverage") {
        return Flow::Normal;
    }

    let source_dir = ev
        .variable("CTEST_SOURCE_DIRECTORY")
        .or_else(|| ev.variable("CMAKE_CURRENT_SOURCE_DIR"))
        .unwrap_or_else(|| ".".to_string());
    let build_dir = ctest_build_dir(ev);
    let gcov_command = ev
        .variable("CTEST_COVERAGE_COMMAND")
        .unwrap_or_else(|| "gcov".to_string());

    match write_coverage_bundle(ev, &source_dir, &build_dir, &gcov_command) {
        Ok(count) => {
            debug!(files = count, "coverage bundle written");
            set_return_value(
                ev,
                parsed.one("RETURN_VALUE"),
                "CTEST_COVERAGE_RETURN_VALUE",
                "0",
            );
        }
        Err(message) => {
            ev.error("ctest_coverage", message);
            set_return_value(
                ev,
                parsed.one("RETURN_VALUE"),
                "CTEST_COVERAGE_RETURN_VALUE",
                "1",
            );
        }
    }
    Flow::Normal
}

fn json_escape(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push('?'),
            c => out.push(c),
        }
    }
}

/// Collects gcov artifacts and writes data.json / Labels.json /
/// Coverage.xml under `<build>/Testing/CoverageInfo/`.
fn write_coverage_bundle(
    ev: &mut Evaluator<'_>,
    source_dir: &str,
    build_dir: &str,
    gcov_command: &str,
) -> Result<usize, String> {
    let mut files: Vec<String> = Vec::new();
    if Path::new(build_dir).is_dir() {
        let options = fsutil::WalkOptions::default();
        if let Ok(entries) = fsutil::walk_entries(build_dir, &options) {
            for entry in entries {
                let is_artifact = entry
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| {
                        ext.eq_ignore_ascii_case("gcda")
                            || ext.eq_ignore_ascii_case("gcno")
                            || ext.eq_ignore_ascii_case("gcov")
                    });
                if is_artifact {
                    files.push(entry.to_string_lossy().replace('\\', "/"));
                }
            }
        }
    }
    files.sort();

    let coverage_dir = PathBuf::from(build_dir).join("Testing/CoverageInfo");

    let mut data_json = String::new();
    data_json.push_str("{\n");
    data_json.push_str("  \"format\": \"cmk2nob-cdash-gcov-v1\",\n");
    data_json.push_str("  \"source\": \"");
    json_escape(&mut data_json, source_dir);
    data_json.push_str("\",\n  \"build\": \"");
    json_escape(&mut data_json, build_dir);
    data_json.push_str("\",\n  \"gcov_command\": \"");
    json_escape(&mut data_json, gcov_command);
    data_json.push_str("\",\n  \"gcov_options\": [");
    data_json.push_str("],\n  \"files\": [");
    for (i, file) in files.iter().enumerate() {
        if i > 0 {
            data_json.push_str(", ");
        }
        data_json.push('"');
        json_escape(&mut data_json, file);
        data_json.push('"');
    }
    data_json.push_str("]\n}\n");

    let mut coverage_xml = String::new();
    coverage_xml.push_str("<Site BuildName=\"cmk2nob\" Name=\"cmk2nob\">\n");
    coverage_xml.push_str("  <Coverage>\n");
    coverage_xml.push_str("    <CoverageLog>\n");
    for file in &files {
        coverage_xml.push_str("      <File>");
        json_escape(&mut coverage_xml, file);
        coverage_xml.push_str("</File>\n");
    }
    coverage_xml.push_str("    </CoverageLog>\n");
    coverage_xml.push_str("  </Coverage>\n");
    coverage_xml.push_str("</Site>\n");

    let writes = [
        (coverage_dir.join("data.json"), data_json.into_bytes()),
        (coverage_dir.join("Labels.json"), b"{}\n".to_vec()),
        (coverage_dir.join("Coverage.xml"), coverage_xml.into_bytes()),
    ];
    for (path, bytes) in writes {
        let outcome = ev
            .effects
            .run_fs(&FsRequest::EnsureParentDirs { path: path.clone() });
        if !outcome.status.is_ok() {
            return Err(outcome.log);
        }
        let outcome = ev.effects.run_fs(&FsRequest::WriteFileBytes { path, bytes });
        if !outcome.status.is_ok() {
            return Err(outcome.log);
        }
    }
    Ok(files.len())
}

/// `ctest_submit([RETURN_VALUE <var>])` - recorded, never networked.
pub(crate) fn cmd_ctest_submit(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    const SPECS: [OptSpec; 2] = [
        OptSpec::new("RETURN_VALUE", OptKind::Single),
        OptSpec::new("PARTS", OptKind::Multi),
    ];
    let values = inv.values();
    let parsed = match parse_opts(&values, 0, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("ctest_submit", message);
            return Flow::Normal;
        }
    };
    if !require_started(ev, "ctest_submit") {
        return Flow::Normal;
    }
    set_return_value(ev, parsed.one("RETURN_VALUE"), "CTEST_SUBMIT_RETURN_VALUE", "0");
    Flow::Normal
}

/// `ctest_upload(FILES <file>...)`.
pub(crate) fn cmd_ctest_upload(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    const SPECS: [OptSpec; 2] = [
        OptSpec::new("FILES", OptKind::Multi),
        OptSpec::new("QUIET", OptKind::Flag),
    ];
    let values = inv.values();
    let parsed = match parse_opts(&values, 0, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("ctest_upload", message);
            return Flow::Normal;
        }
    };
    if !require_started(ev, "ctest_upload") {
        return Flow::Normal;
    }
    let count = parsed.many("FILES").len().to_string();
    ev.set_variable("CTEST_UPLOAD_FILE_COUNT", &count);
    Flow::Normal
}

/// `ctest_read_custom_files(<dir>)`.
pub(crate) fn cmd_ctest_read_custom_files(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let directory = inv.value(0).to_string();
    ev.set_variable("CTEST_CUSTOM_FILES_DIRECTORY", &directory);
    Flow::Normal
}

/// `ctest_empty_binary_directory(<dir>)`.
pub(crate) fn cmd_ctest_empty_binary_directory(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let raw = inv.value(0);
    if raw.is_empty() {
        ev.error("ctest_empty_binary_directory", "missing directory");
        return Flow::Normal;
    }
    let path = super::files::resolve_output_path(ev, raw);
    // Refuse to clear anything that does not look like a build tree.
    if !path.join("CMakeCache.txt").exists() && !path.join("Testing").exists() {
        ev.error(
            "ctest_empty_binary_directory",
            format!("{} does not look like a build directory", path.display()),
        );
        return Flow::Normal;
    }
    let outcome = ev
        .effects
        .run_fs(&FsRequest::DeletePathRecursive { path });
    if !outcome.status.is_ok() {
        ev.error("ctest_empty_binary_directory", outcome.log);
    }
    Flow::Normal
}

/// `ctest_sleep(<seconds>)` - recorded without blocking the transpiler.
pub(crate) fn cmd_ctest_sleep(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let seconds = inv.value(0).to_string();
    debug!(seconds = %seconds, "ctest_sleep recorded");
    ev.set_variable("CTEST_SLEEP_SECONDS", &seconds);
    Flow::Normal
}

/// `ctest_run_script(<script>... [RETURN_VALUE <var>])`.
pub(crate) fn cmd_ctest_run_script(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    const SPECS: [OptSpec; 2] = [
        OptSpec::new("RETURN_VALUE", OptKind::Single),
        OptSpec::new("NEW_PROCESS", OptKind::Flag),
    ];
    let values = inv.values();
    let parsed = match parse_opts(&values, 0, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("ctest_run_script", message);
            return Flow::Normal;
        }
    };

    let mut result = "0";
    for script in parsed.positionals() {
        let path = super::files::resolve_path(ev, script);
        if !path.is_file() {
            ev.error(
                "ctest_run_script",
                format!("script not found: {}", path.display()),
            );
            result = "-1";
            continue;
        }
        crate::eval::include::evaluate_included_file(ev, &path, false);
    }
    set_return_value(ev, parsed.one("RETURN_VALUE"), "CTEST_RUN_SCRIPT_RETURN_VALUE", result);
    Flow::Normal
}
