// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Toolchain probes: `try_compile`, `try_run` and the `check_*` family.
//!
//! ```text
//! real probes (config/NOBIFY_REAL_PROBES):
//!   write source -> toolchain effect -> cache result
//! fallback (default):
//!   deterministic result derived from the written source text,
//!   host toolchain never touched
//!
//! every check honors CMAKE_REQUIRED_INCLUDES / _DEFINITIONS /
//! _LIBRARIES and writes its cache variable once
//! ```

use std::path::PathBuf;

use tracing::debug;

use crate::effects::toolchain::PROBE_SCRATCH_DIR;
use crate::effects::{CompileRequest, FsRequest, ProbeRequest};
use crate::eval::opt::{OptKind, OptSpec, parse_opts};
use crate::eval::{Evaluator, Flow, Invocation};
use crate::events::EventKind;

fn probe_dir(ev: &Evaluator<'_>) -> PathBuf {
    let binary = ev
        .variable("CMAKE_CURRENT_BINARY_DIR")
        .unwrap_or_else(|| ".".to_string());
    PathBuf::from(binary).join(PROBE_SCRATCH_DIR)
}

/// Splits a `CMAKE_REQUIRED_*` list variable.
fn required_list(ev: &Evaluator<'_>, name: &str) -> Vec<String> {
    ev.variable(name)
        .unwrap_or_default()
        .split(';')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Builds a probe request for the given written source file.
fn probe_request(ev: &Evaluator<'_>, source: PathBuf, run_binary: bool) -> ProbeRequest {
    let output = source.with_extension(if ev.model.platform.is_windows {
        "exe"
    } else {
        "bin"
    });
    ProbeRequest {
        compile: CompileRequest {
            compiler: ev.options.c_compiler.clone(),
            source,
            output,
            definitions: required_list(ev, "CMAKE_REQUIRED_DEFINITIONS"),
            include_dirs: required_list(ev, "CMAKE_REQUIRED_INCLUDES"),
            link_options: Vec::new(),
            link_directories: Vec::new(),
            link_libraries: required_list(ev, "CMAKE_REQUIRED_LIBRARIES"),
        },
        run_binary,
        run_args: Vec::new(),
        timeout_ms: ev.options.probe_timeout_ms,
    }
}

/// Writes probe source text under the scratch directory.
fn write_probe_source(ev: &mut Evaluator<'_>, stem: &str, text: &str) -> Option<PathBuf> {
    let path = probe_dir(ev).join(format!("{stem}.c"));
    let outcome = ev
        .effects
        .run_fs(&FsRequest::EnsureParentDirs { path: path.clone() });
    if !outcome.status.is_ok() {
        ev.error("try_compile", outcome.log);
        return None;
    }
    let outcome = ev.effects.run_fs(&FsRequest::WriteFileBytes {
        path: path.clone(),
        bytes: text.as_bytes().to_vec(),
    });
    if !outcome.status.is_ok() {
        ev.error("try_compile", outcome.log);
        return None;
    }
    Some(path)
}

/// Deterministic compile verdict for fallback mode: the written source
/// decides, so results do not depend on the host toolchain.
fn fallback_compiles(source_text: &str) -> bool {
    !source_text.contains("#error")
}

/// Stores a check result in both a variable and the cache.
fn store_check_result(ev: &mut Evaluator<'_>, variable: &str, value: &str) {
    ev.set_variable(variable, value);
    let wrote = ev
        .model
        .set_cache_entry(variable, value, "INTERNAL", "Result of probe", false);
    if wrote {
        ev.emit(EventKind::SetCacheEntry {
            name: variable.to_string(),
            value: value.to_string(),
            entry_type: "INTERNAL".to_string(),
            forced: false,
        });
    }
}

/// Shared body of source-text checks: writes the source, compiles (really
/// or deterministically) and stores `1`/`""` in the cache variable.
fn run_source_check(
    ev: &mut Evaluator<'_>,
    command: &str,
    variable: &str,
    source_text: &str,
    run_binary: bool,
) {
    if ev.model.has_cache_entry(variable) {
        let cached = ev.model.cache_value(variable).unwrap_or("").to_string();
        ev.set_variable(variable, &cached);
        return;
    }

    let stem = format!("{command}_{}", variable.to_ascii_lowercase());
    let Some(path) = write_probe_source(ev, &stem, source_text) else {
        return;
    };

    let success = if ev.options.real_probes {
        let request = probe_request(ev, path, run_binary);
        let outcome = ev.effects.run_probe(&request);
        debug!(
            variable = %variable,
            compile_ok = outcome.compile_ok,
            run_exit_code = outcome.run_exit_code,
            "real probe finished"
        );
        if run_binary {
            outcome.compile_ok && outcome.run_exit_code == 0
        } else {
            outcome.compile_ok
        }
    } else {
        fallback_compiles(source_text)
    };

    store_check_result(ev, variable, if success { "1" } else { "" });
}

/// `try_compile(<var> <bindir> <src> | <var> SOURCES ... [options])`.
#[allow(clippy::too_many_lines)]
pub(crate) fn cmd_try_compile(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    const SPECS: [OptSpec; 11] = [
        OptSpec::new("SOURCES", OptKind::Multi),
        OptSpec::new("SOURCE_FROM_CONTENT", OptKind::Multi),
        OptSpec::new("PROJECT", OptKind::Single),
        OptSpec::new("SOURCE_DIR", OptKind::Single),
        OptSpec::new("BINARY_DIR", OptKind::Single),
        OptSpec::new("TARGET", OptKind::Single),
        OptSpec::new("COMPILE_DEFINITIONS", OptKind::Multi),
        OptSpec::new("LINK_OPTIONS", OptKind::Multi),
        OptSpec::new("LINK_LIBRARIES", OptKind::Multi),
        OptSpec::new("OUTPUT_VARIABLE", OptKind::Single),
        OptSpec::new("COPY_FILE", OptKind::Single),
    ];
    let values = inv.values();
    let Some(result_var) = values.first().cloned() else {
        ev.error("try_compile", "missing result variable");
        return Flow::Normal;
    };
    let parsed = match parse_opts(&values, 1, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("try_compile", message);
            return Flow::Normal;
        }
    };

    // PROJECT form: simulated configure+build of a whole source tree.
    if let Some(project) = parsed.one("PROJECT") {
        let Some(source_dir) = parsed.one("SOURCE_DIR") else {
            ev.error("try_compile", "PROJECT form requires SOURCE_DIR");
            return Flow::Normal;
        };
        let lists = super::files::resolve_path(ev, source_dir).join("CMakeLists.txt");
        let ok = lists.is_file();
        store_check_result(ev, &result_var, if ok { "TRUE" } else { "FALSE" });
        if let Some(output_var) = parsed.one("OUTPUT_VARIABLE").map(str::to_string) {
            let message = if ok {
                format!("try_compile(PROJECT {project}) simulated success")
            } else {
                format!("no CMakeLists.txt under {source_dir}")
            };
            ev.set_variable(&output_var, &message);
        }
        return Flow::Normal;
    }

    // Source-file form: collect sources from positionals and keywords.
    let mut sources: Vec<String> = Vec::new();
    // Legacy signature: the first positional is the binary dir.
    for positional in parsed.positionals().iter().skip(1) {
        sources.push(positional.clone());
    }
    sources.extend(parsed.many("SOURCES").iter().cloned());

    // SOURCE_FROM_CONTENT <name> <content> pairs.
    let from_content = parsed.many("SOURCE_FROM_CONTENT");
    for pair in from_content.chunks(2) {
        if let [name, content] = pair {
            if let Some(path) = write_probe_source(ev, name.trim_end_matches(".c"), content) {
                sources.push(path.to_string_lossy().replace('\\', "/"));
            }
        }
    }

    if sources.is_empty() {
        ev.error("try_compile", "try_compile() requires at least one source");
        return Flow::Normal;
    }

    let resolved: Vec<PathBuf> = sources
        .iter()
        .map(|s| super::files::resolve_path(ev, s))
        .collect();
    let missing: Option<&PathBuf> = resolved.iter().find(|p| !p.is_file());

    let success = if let Some(missing) = missing {
        if let Some(output_var) = parsed.one("OUTPUT_VARIABLE").map(str::to_string) {
            let message = format!(
                "try_compile source file not found: {}",
                missing.display()
            );
            ev.set_variable(&output_var, &message);
        }
        store_check_result(ev, &result_var, "FALSE");
        false
    } else if ev.options.real_probes {
        let mut request = probe_request(ev, resolved[0].clone(), false);
        request
            .compile
            .definitions
            .extend(parsed.many("COMPILE_DEFINITIONS").iter().cloned());
        request
            .compile
            .link_options
            .extend(parsed.many("LINK_OPTIONS").iter().cloned());
        request
            .compile
            .link_libraries
            .extend(parsed.many("LINK_LIBRARIES").iter().cloned());
        let outcome = ev.effects.run_probe(&request);
        store_check_result(ev, &result_var, if outcome.compile_ok { "TRUE" } else { "FALSE" });
        if let Some(output_var) = parsed.one("OUTPUT_VARIABLE").map(str::to_string) {
            ev.set_variable(&output_var, &outcome.compile_output);
        }
        outcome.compile_ok
    } else {
        let text = std::fs::read_to_string(&resolved[0]).unwrap_or_default();
        let ok = fallback_compiles(&text);
        store_check_result(ev, &result_var, if ok { "TRUE" } else { "FALSE" });
        if let Some(output_var) = parsed.one("OUTPUT_VARIABLE").map(str::to_string) {
            let message = if ok {
                "try_compile simulated success".to_string()
            } else {
                "try_compile simulated failure".to_string()
            };
            ev.set_variable(&output_var, &message);
        }
        ok
    };

    if success && let Some(copy_file) = parsed.one("COPY_FILE") {
        let dest = super::files::resolve_output_path(ev, copy_file);
        let outcome = ev.effects.run_fs(&FsRequest::CopyFile {
            source: resolved[0].clone(),
            dest,
        });
        if !outcome.status.is_ok() {
            ev.error("try_compile", outcome.log);
        }
    }
    Flow::Normal
}

/// `try_run(<run_var> <compile_var> <bindir> <src> [ARGS ...])`.
pub(crate) fn cmd_try_run(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    const SPECS: [OptSpec; 5] = [
        OptSpec::new("ARGS", OptKind::Multi),
        OptSpec::new("COMPILE_DEFINITIONS", OptKind::Multi),
        OptSpec::new("LINK_LIBRARIES", OptKind::Multi),
        OptSpec::new("COMPILE_OUTPUT_VARIABLE", OptKind::Single),
        OptSpec::new("RUN_OUTPUT_VARIABLE", OptKind::Single),
    ];
    let values = inv.values();
    let (Some(run_var), Some(compile_var)) = (values.first().cloned(), values.get(1).cloned())
    else {
        ev.error("try_run", "requires run and compile result variables");
        return Flow::Normal;
    };
    let parsed = match parse_opts(&values, 2, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("try_run", message);
            return Flow::Normal;
        }
    };
    let Some(source) = parsed.positionals().get(1).cloned() else {
        ev.error("try_run", "requires bindir and a source file");
        return Flow::Normal;
    };
    let source_path = super::files::resolve_path(ev, &source);

    // Cross-compile simulation: the binary can be built but never run.
    let cross = ev
        .variable("CMAKE_CROSSCOMPILING")
        .is_some_and(|v| !crate::expr::logic::is_false_constant(&v));
    if cross {
        store_check_result(ev, &compile_var, "1");
        store_check_result(ev, &run_var, "FAILED_TO_RUN");
        if let Some(output_var) = parsed.one("RUN_OUTPUT_VARIABLE").map(str::to_string) {
            ev.set_variable(&output_var, "cross-compiling: cannot run test binary");
        }
        return Flow::Normal;
    }

    if !source_path.is_file() {
        store_check_result(ev, &compile_var, "0");
        store_check_result(ev, &run_var, "FAILED_TO_RUN");
        return Flow::Normal;
    }

    if ev.options.real_probes {
        let mut request = probe_request(ev, source_path, true);
        request.run_args = parsed.many("ARGS").to_vec();
        request
            .compile
            .definitions
            .extend(parsed.many("COMPILE_DEFINITIONS").iter().cloned());
        request
            .compile
            .link_libraries
            .extend(parsed.many("LINK_LIBRARIES").iter().cloned());
        let outcome = ev.effects.run_probe(&request);
        store_check_result(ev, &compile_var, if outcome.compile_ok { "1" } else { "0" });
        let run_value = if outcome.compile_ok {
            outcome.run_exit_code.to_string()
        } else {
            "FAILED_TO_RUN".to_string()
        };
        store_check_result(ev, &run_var, &run_value);
        if let Some(output_var) = parsed.one("COMPILE_OUTPUT_VARIABLE").map(str::to_string) {
            ev.set_variable(&output_var, &outcome.compile_output);
        }
        if let Some(output_var) = parsed.one("RUN_OUTPUT_VARIABLE").map(str::to_string) {
            ev.set_variable(&output_var, &outcome.run_output);
        }
    } else {
        let text = std::fs::read_to_string(&source_path).unwrap_or_default();
        let ok = fallback_compiles(&text);
        store_check_result(ev, &compile_var, if ok { "1" } else { "0" });
        store_check_result(ev, &run_var, if ok { "0" } else { "FAILED_TO_RUN" });
    }
    Flow::Normal
}

/// `check_c_source_compiles(<source> <var>)`.
pub(crate) fn cmd_check_c_source_compiles(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let (Some(source), Some(variable)) = (values.first(), values.get(1)) else {
        ev.error("check_c_source_compiles", "requires source text and a variable");
        return Flow::Normal;
    };
    let (source, variable) = (source.clone(), variable.clone());
    run_source_check(ev, "check_c_source_compiles", &variable, &source, false);
    Flow::Normal
}

/// `check_c_source_runs(<source> <var>)`.
pub(crate) fn cmd_check_c_source_runs(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let (Some(source), Some(variable)) = (values.first(), values.get(1)) else {
        ev.error("check_c_source_runs", "requires source text and a variable");
        return Flow::Normal;
    };
    let (source, variable) = (source.clone(), variable.clone());
    run_source_check(ev, "check_c_source_runs", &variable, &source, true);
    Flow::Normal
}

/// `check_symbol_exists(<symbol> <headers> <var>)`.
pub(crate) fn cmd_check_symbol_exists(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let (Some(symbol), Some(headers), Some(variable)) =
        (values.first(), values.get(1), values.get(2))
    else {
        ev.error("check_symbol_exists", "requires symbol, headers and a variable");
        return Flow::Normal;
    };
    let includes: String = headers
        .split(';')
        .filter(|h| !h.is_empty())
        .map(|h| format!("#include <{h}>\n"))
        .collect();
    let source = format!(
        "{includes}int main(void) {{\n  (void)&{symbol};\n  return 0;\n}}\n"
    );
    let variable = variable.clone();
    run_source_check(ev, "check_symbol_exists", &variable, &source, false);
    Flow::Normal
}

/// `check_include_file(<header> <var> [flags])`.
pub(crate) fn cmd_check_include_file(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let (Some(header), Some(variable)) = (values.first(), values.get(1)) else {
        ev.error("check_include_file", "requires a header and a variable");
        return Flow::Normal;
    };
    let source = format!("#include <{header}>\nint main(void) {{ return 0; }}\n");
    let variable = variable.clone();
    run_source_check(ev, "check_include_file", &variable, &source, false);
    Flow::Normal
}

/// `check_include_files(<header;list> <var>)`.
pub(crate) fn cmd_check_include_files(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let (Some(headers), Some(variable)) = (values.first(), values.get(1)) else {
        ev.error("check_include_files", "requires headers and a variable");
        return Flow::Normal;
    };
    let includes: String = headers
        .split(';')
        .filter(|h| !h.is_empty())
        .map(|h| format!("#include <{h}>\n"))
        .collect();
    let source = format!("{includes}int main(void) {{ return 0; }}\n");
    let variable = variable.clone();
    run_source_check(ev, "check_include_files", &variable, &source, false);
    Flow::Normal
}

/// `check_function_exists(<function> <var>)`.
pub(crate) fn cmd_check_function_exists(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let (Some(function), Some(variable)) = (values.first(), values.get(1)) else {
        ev.error("check_function_exists", "requires a function and a variable");
        return Flow::Normal;
    };
    let source = format!(
        "char {function}(void);\nint main(void) {{ return (int)(&{function} != 0); }}\n"
    );
    let variable = variable.clone();
    run_source_check(ev, "check_function_exists", &variable, &source, false);
    Flow::Normal
}

/// `check_library_exists(<lib> <function> <location> <var>)`.
pub(crate) fn cmd_check_library_exists(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let (Some(library), Some(function), Some(variable)) =
        (values.first(), values.get(1), values.get(3))
    else {
        ev.error(
            "check_library_exists",
            "requires library, function, location and a variable",
        );
        return Flow::Normal;
    };
    // The library joins CMAKE_REQUIRED_LIBRARIES for the probe link step.
    let saved = ev.variable("CMAKE_REQUIRED_LIBRARIES");
    let mut libs = saved.clone().unwrap_or_default();
    if !libs.is_empty() {
        libs.push(';');
    }
    libs.push_str(library);
    ev.set_variable("CMAKE_REQUIRED_LIBRARIES", &libs);

    let source = format!(
        "char {function}(void);\nint main(void) {{ return (int)(&{function} != 0); }}\n"
    );
    let variable = variable.clone();
    run_source_check(ev, "check_library_exists", &variable, &source, false);

    match saved {
        Some(value) => ev.set_variable("CMAKE_REQUIRED_LIBRARIES", &value),
        None => ev.unset_variable("CMAKE_REQUIRED_LIBRARIES"),
    }
    Flow::Normal
}

/// Deterministic sizes for `check_type_size` fallback mode.
fn fallback_type_size(type_name: &str) -> u32 {
    match type_name {
        "char" | "signed char" | "unsigned char" | "_Bool" => 1,
        "short" | "short int" | "unsigned short" => 2,
        "int" | "unsigned int" | "float" => 4,
        _ => 8,
    }
}

/// `check_type_size(<type> <var>)` - also defines `HAVE_<var>`.
pub(crate) fn cmd_check_type_size(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let (Some(type_name), Some(variable)) = (values.first(), values.get(1)) else {
        ev.error("check_type_size", "requires a type and a variable");
        return Flow::Normal;
    };
    let (type_name, variable) = (type_name.clone(), variable.clone());

    if ev.model.has_cache_entry(&variable) {
        let cached = ev.model.cache_value(&variable).unwrap_or("").to_string();
        ev.set_variable(&variable, &cached);
        return Flow::Normal;
    }

    let size = if ev.options.real_probes {
        let source = format!(
            "#include <stdio.h>\nint main(void) {{ printf(\"%u\", (unsigned)sizeof({type_name})); return 0; }}\n"
        );
        let stem = format!("check_type_size_{}", variable.to_ascii_lowercase());
        let Some(path) = write_probe_source(ev, &stem, &source) else {
            return Flow::Normal;
        };
        let request = probe_request(ev, path, true);
        let outcome = ev.effects.run_probe(&request);
        if outcome.compile_ok && outcome.run_exit_code == 0 {
            outcome.run_output.trim().parse().ok()
        } else {
            None
        }
    } else {
        Some(fallback_type_size(&type_name))
    };

    match size {
        Some(size) => {
            store_check_result(ev, &variable, &size.to_string());
            store_check_result(ev, &format!("HAVE_{variable}"), "1");
        }
        None => {
            store_check_result(ev, &variable, "");
            store_check_result(ev, &format!("HAVE_{variable}"), "");
        }
    }
    Flow::Normal
}

/// `check_c_compiler_flag(<flag> <var>)`.
pub(crate) fn cmd_check_c_compiler_flag(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let (Some(flag), Some(variable)) = (values.first(), values.get(1)) else {
        ev.error("check_c_compiler_flag", "requires a flag and a variable");
        return Flow::Normal;
    };
    let (flag, variable) = (flag.clone(), variable.clone());

    if ev.model.has_cache_entry(&variable) {
        let cached = ev.model.cache_value(&variable).unwrap_or("").to_string();
        ev.set_variable(&variable, &cached);
        return Flow::Normal;
    }

    let source = "int main(void) { return 0; }\n";
    let success = if ev.options.real_probes {
        let stem = format!("check_c_compiler_flag_{}", variable.to_ascii_lowercase());
        let Some(path) = write_probe_source(ev, &stem, source) else {
            return Flow::Normal;
        };
        let mut request = probe_request(ev, path, false);
        request.compile.link_options.push(flag);
        let outcome = ev.effects.run_probe(&request);
        outcome.compile_ok
    } else {
        true
    };
    store_check_result(ev, &variable, if success { "1" } else { "" });
    Flow::Normal
}

/// `check_struct_has_member(<struct> <member> <header> <var>)`.
pub(crate) fn cmd_check_struct_has_member(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let (Some(struct_name), Some(member), Some(header), Some(variable)) = (
        values.first(),
        values.get(1),
        values.get(2),
        values.get(3),
    ) else {
        ev.error(
            "check_struct_has_member",
            "requires struct, member, header and a variable",
        );
        return Flow::Normal;
    };
    let source = format!(
        "#include <{header}>\nint main(void) {{\n  {struct_name} s;\n  (void)s.{member};\n  return 0;\n}}\n"
    );
    let variable = variable.clone();
    run_source_check(ev, "check_struct_has_member", &variable, &source, false);
    Flow::Normal
}
