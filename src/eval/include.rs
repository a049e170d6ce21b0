// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! `include()`, `add_subdirectory()` and `include_guard()` machinery.
//!
//! ```text
//! include(Name)
//!   pseudo-modules (CPack*, CTest) -> table-driven handlers
//!   module search: CMAKE_CURRENT_LIST_DIR
//!                  -> CMAKE_MODULE_PATH entries
//!                  -> CMAKE_ROOT/Modules   (CMP0017 may promote this)
//!   DirPush -> [policy push] -> evaluate -> [policy pop] -> DirPop
//!
//! add_subdirectory(src [bin] [EXCLUDE_FROM_ALL] [SYSTEM])
//!   dir variables saved/restored; SYSTEM and EXCLUDE_FROM_ALL set
//!   NOBIFY_SUBDIR_SYSTEM_DEFAULT=1 / NOBIFY_SUBDIR_EXCLUDE_DEFAULT=1
//!   for nested target declarations
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;

use super::opt::{OptKind, OptSpec, parse_opts};
use super::{Evaluator, Flow, Invocation, PolicySetting, Severity};
use crate::events::EventKind;
use crate::parser;

/// Variables saved around a directory/file transition.
const DIR_VARIABLES: [&str; 4] = [
    "CMAKE_CURRENT_SOURCE_DIR",
    "CMAKE_CURRENT_BINARY_DIR",
    "CMAKE_CURRENT_LIST_DIR",
    "CMAKE_CURRENT_LIST_FILE",
];

struct DirVarGuardState {
    saved: Vec<(String, Option<String>)>,
}

fn save_dir_variables(ev: &Evaluator<'_>) -> DirVarGuardState {
    DirVarGuardState {
        saved: DIR_VARIABLES
            .iter()
            .map(|name| ((*name).to_string(), ev.variable(name)))
            .collect(),
    }
}

fn restore_dir_variables(ev: &mut Evaluator<'_>, state: DirVarGuardState) {
    for (name, value) in state.saved {
        match value {
            Some(value) => ev.set_variable(&name, &value),
            None => ev.unset_variable(&name),
        }
    }
}

/// `include(<file-or-module> [OPTIONAL] [RESULT_VARIABLE v]
/// [NO_POLICY_SCOPE])`.
pub(crate) fn cmd_include(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    const SPECS: [OptSpec; 3] = [
        OptSpec::new("OPTIONAL", OptKind::Flag),
        OptSpec::new("RESULT_VARIABLE", OptKind::Single),
        OptSpec::new("NO_POLICY_SCOPE", OptKind::Flag),
    ];
    let values = inv.values();
    let parsed = match parse_opts(&values, 0, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("include", message);
            return Flow::Normal;
        }
    };
    let Some(name) = parsed.positionals().first().cloned() else {
        ev.error("include", "include() requires a file or module name");
        return Flow::Normal;
    };
    let optional = parsed.has("OPTIONAL");
    let no_policy_scope = parsed.has("NO_POLICY_SCOPE");
    let result_variable = parsed.one("RESULT_VARIABLE").map(str::to_string);

    // Pseudo-modules are emulated, not loaded from script text.
    if super::handlers::cpack::include_pseudo_module(ev, &name)
        || super::handlers::testing::include_pseudo_module(ev, &name)
    {
        if let Some(variable) = result_variable {
            ev.set_variable(&variable, &name);
        }
        return Flow::Normal;
    }

    let Some(path) = resolve_include(ev, &name) else {
        if let Some(variable) = result_variable {
            ev.set_variable(&variable, "NOTFOUND");
        }
        if !optional {
            let cause = crate::error::EvalError::IncludeNotFound(name).to_string();
            ev.error("include", cause);
        }
        return Flow::Normal;
    };
    if let Some(variable) = result_variable {
        ev.set_variable(&variable, &path.to_string_lossy().replace('\\', "/"));
    }

    evaluate_included_file(ev, &path, no_policy_scope);
    Flow::Normal
}

/// Module and file resolution for `include()`.
fn resolve_include(ev: &Evaluator<'_>, name: &str) -> Option<PathBuf> {
    let has_extension = name.ends_with(".cmake") || name.contains('/') || name.contains('\\');
    if has_extension {
        let direct = PathBuf::from(name);
        let resolved = if direct.is_absolute() {
            direct
        } else {
            let base = ev
                .variable("CMAKE_CURRENT_SOURCE_DIR")
                .unwrap_or_else(|| ".".to_string());
            Path::new(&base).join(name)
        };
        return resolved.is_file().then_some(resolved);
    }

    let file_name = format!("{name}.cmake");
    let mut candidates: Vec<PathBuf> = Vec::new();

    let list_dir = ev.variable("CMAKE_CURRENT_LIST_DIR").unwrap_or_default();
    if !list_dir.is_empty() {
        candidates.push(Path::new(&list_dir).join(&file_name));
    }
    for entry in ev
        .variable("CMAKE_MODULE_PATH")
        .unwrap_or_default()
        .split(';')
        .filter(|s| !s.is_empty())
    {
        candidates.push(Path::new(entry).join(&file_name));
    }
    let builtin = ev.options.cmake_root.join("Modules").join(&file_name);

    // CMP0017 NEW: a file included from the built-in module directory
    // prefers built-in modules over user paths.
    let inside_builtin_modules = !list_dir.is_empty()
        && !ev.options.cmake_root.as_os_str().is_empty()
        && Path::new(&list_dir).starts_with(ev.options.cmake_root.join("Modules"));
    let prefer_builtin = inside_builtin_modules
        && !matches!(ev.policy("CMP0017"), Some(PolicySetting::Old));
    if prefer_builtin {
        candidates.insert(0, builtin);
    } else {
        candidates.push(builtin);
    }

    candidates.into_iter().find(|candidate| candidate.is_file())
}

/// Parses and evaluates an included file between DirPush/DirPop events.
pub(crate) fn evaluate_included_file(
    ev: &mut Evaluator<'_>,
    path: &Path,
    no_policy_scope: bool,
) {
    if ev.file_depth >= ev.options.max_file_depth {
        ev.diag(
            Severity::Fatal,
            "eval_file",
            "include",
            "maximum file depth exceeded",
            path.to_string_lossy().into_owned(),
        );
        return;
    }

    let list = match parser::parse_file(path) {
        Ok(list) => list,
        Err(e) => {
            ev.diag(
                Severity::Error,
                "eval_file",
                "include",
                format!("failed to read {}: {e}", path.display()),
                "",
            );
            return;
        }
    };

    let display_path = path.to_string_lossy().replace('\\', "/");
    debug!(file = %display_path, "including file");
    ev.emit(EventKind::DirPush {
        dir: display_path.clone(),
    });
    if !no_policy_scope {
        ev.push_policy_scope();
    }
    let state = save_dir_variables(ev);
    ev.file_depth += 1;

    ev.evaluate_list_file(&list);

    ev.file_depth -= 1;
    release_file_locks(ev);
    restore_dir_variables(ev, state);
    if !no_policy_scope {
        ev.pop_policy_scope();
    }
    ev.emit(EventKind::DirPop { dir: display_path });
}

fn release_file_locks(ev: &mut Evaluator<'_>) {
    let file_depth = ev.file_depth;
    ev.locks.retain(|lock| match lock.guard {
        super::LockGuard::File => lock.owner_file_depth <= file_depth,
        _ => true,
    });
}

/// `add_subdirectory(src [bin] [EXCLUDE_FROM_ALL] [SYSTEM])`.
pub(crate) fn cmd_add_subdirectory(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    const SPECS: [OptSpec; 2] = [
        OptSpec::new("EXCLUDE_FROM_ALL", OptKind::Flag),
        OptSpec::new("SYSTEM", OptKind::Flag),
    ];
    let values = inv.values();
    let parsed = match parse_opts(&values, 0, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("add_subdirectory", message);
            return Flow::Normal;
        }
    };
    let Some(source) = parsed.positionals().first().cloned() else {
        ev.error("add_subdirectory", "missing source directory");
        return Flow::Normal;
    };
    let system = parsed.has("SYSTEM");
    let exclude_from_all = parsed.has("EXCLUDE_FROM_ALL");

    let current_source = ev
        .variable("CMAKE_CURRENT_SOURCE_DIR")
        .unwrap_or_else(|| ".".to_string());
    let current_binary = ev
        .variable("CMAKE_CURRENT_BINARY_DIR")
        .unwrap_or_else(|| ".".to_string());

    let source_dir = resolve_dir(&current_source, &source);
    let binary_dir = parsed.positionals().get(1).map_or_else(
        || resolve_dir(&current_binary, &source),
        |bin| resolve_dir(&current_binary, bin),
    );

    let list_path = Path::new(&source_dir).join("CMakeLists.txt");
    if !list_path.is_file() {
        ev.error(
            "add_subdirectory",
            format!("failed to read {}: no CMakeLists.txt", source_dir),
        );
        return Flow::Normal;
    }
    if ev.file_depth >= ev.options.max_file_depth {
        ev.diag(
            Severity::Fatal,
            "eval_file",
            "add_subdirectory",
            "maximum file depth exceeded",
            source_dir,
        );
        return Flow::Normal;
    }

    let list = match parser::parse_file(&list_path) {
        Ok(list) => list,
        Err(e) => {
            ev.diag(
                Severity::Error,
                "eval_file",
                "add_subdirectory",
                format!("failed to read {}: {e}", list_path.display()),
                "",
            );
            return Flow::Normal;
        }
    };

    debug!(source = %source_dir, binary = %binary_dir, "entering subdirectory");
    ev.emit(EventKind::DirPush {
        dir: source_dir.clone(),
    });
    let state = save_dir_variables(ev);
    let saved_dir_state = ev.dir_state.clone();
    let saved_system = ev.variable("NOBIFY_SUBDIR_SYSTEM_DEFAULT");
    let saved_exclude = ev.variable("NOBIFY_SUBDIR_EXCLUDE_DEFAULT");
    ev.set_variable("CMAKE_CURRENT_SOURCE_DIR", &source_dir);
    ev.set_variable("CMAKE_CURRENT_BINARY_DIR", &binary_dir);
    if system {
        ev.set_variable("NOBIFY_SUBDIR_SYSTEM_DEFAULT", "1");
    }
    // Targets declared in an EXCLUDE_FROM_ALL subdirectory are excluded
    // from the default build; codegen pulls them back in only as
    // dependencies of included targets.
    if exclude_from_all {
        ev.set_variable("NOBIFY_SUBDIR_EXCLUDE_DEFAULT", "1");
    }
    ev.push_policy_scope();
    ev.file_depth += 1;

    ev.evaluate_list_file(&list);

    ev.file_depth -= 1;
    release_file_locks(ev);
    ev.pop_policy_scope();
    match saved_system {
        Some(value) => ev.set_variable("NOBIFY_SUBDIR_SYSTEM_DEFAULT", &value),
        None => ev.unset_variable("NOBIFY_SUBDIR_SYSTEM_DEFAULT"),
    }
    match saved_exclude {
        Some(value) => ev.set_variable("NOBIFY_SUBDIR_EXCLUDE_DEFAULT", &value),
        None => ev.unset_variable("NOBIFY_SUBDIR_EXCLUDE_DEFAULT"),
    }
    ev.dir_state = saved_dir_state;
    restore_dir_variables(ev, state);
    ev.emit(EventKind::DirPop { dir: source_dir });
    Flow::Normal
}

fn resolve_dir(base: &str, dir: &str) -> String {
    let path = Path::new(dir);
    let resolved = if path.is_absolute() {
        path.to_path_buf()
    } else {
        Path::new(base).join(dir)
    };
    resolved.to_string_lossy().replace('\\', "/")
}

/// `include_guard([DIRECTORY|GLOBAL])`.
pub(crate) fn cmd_include_guard(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let file = ev.variable("CMAKE_CURRENT_LIST_FILE").unwrap_or_default();
    let key = match inv.value(0) {
        "DIRECTORY" => {
            let dir = ev
                .variable("CMAKE_CURRENT_SOURCE_DIR")
                .unwrap_or_default();
            format!("{dir}|{file}")
        }
        _ => file,
    };
    if ev.include_guards.contains(&key) {
        return Flow::Return;
    }
    ev.include_guards.insert(key);
    Flow::Normal
}
