// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Project & metadata commands: `project`, `cmake_minimum_required`,
//! `cmake_policy`, `get_cmake_property`, `message`, `option`,
//! `variable_watch`, `variable_requires`.

use tracing::{debug, info};

use crate::eval::opt::{OptKind, OptSpec, parse_opts};
use crate::eval::{Evaluator, Flow, Invocation, PolicySetting, Severity};

/// `project(<name> [VERSION v] [DESCRIPTION d] [LANGUAGES l...])`.
pub(crate) fn cmd_project(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    const SPECS: [OptSpec; 4] = [
        OptSpec::new("VERSION", OptKind::Single),
        OptSpec::new("DESCRIPTION", OptKind::Single),
        OptSpec::new("HOMEPAGE_URL", OptKind::Single),
        OptSpec::new("LANGUAGES", OptKind::Multi),
    ];
    let values = inv.values();
    let parsed = match parse_opts(&values, 0, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("project", message);
            return Flow::Normal;
        }
    };
    let Some(name) = parsed.positionals().first().cloned() else {
        ev.error("project", "project() requires a name");
        return Flow::Normal;
    };

    let version = parsed.one("VERSION").unwrap_or("").to_string();
    let description = parsed.one("DESCRIPTION").unwrap_or("").to_string();
    let mut languages: Vec<String> = parsed.many("LANGUAGES").to_vec();
    // Legacy signature: project(<name> <lang>...).
    languages.extend(parsed.positionals().iter().skip(1).cloned());
    if languages.is_empty() {
        languages.push("C".to_string());
    }

    ev.model.project.name.clone_from(&name);
    ev.model.project.version.clone_from(&version);
    ev.model.project.description.clone_from(&description);
    ev.model.project.languages = languages;

    ev.set_variable("PROJECT_NAME", &name);
    ev.set_variable("PROJECT_VERSION", &version);
    ev.set_variable("PROJECT_DESCRIPTION", &description);
    ev.set_variable(&format!("{name}_VERSION"), &version);
    if let Some(source) = ev.variable("CMAKE_CURRENT_SOURCE_DIR") {
        ev.set_variable("PROJECT_SOURCE_DIR", &source);
        ev.set_variable(&format!("{name}_SOURCE_DIR"), &source);
    }
    if let Some(binary) = ev.variable("CMAKE_CURRENT_BINARY_DIR") {
        ev.set_variable("PROJECT_BINARY_DIR", &binary);
        ev.set_variable(&format!("{name}_BINARY_DIR"), &binary);
    }

    // Version components.
    let mut parts = version.split('.');
    for suffix in ["MAJOR", "MINOR", "PATCH", "TWEAK"] {
        let component = parts.next().unwrap_or("");
        ev.set_variable(&format!("PROJECT_VERSION_{suffix}"), component);
    }

    debug!(name = %name, version = %version, "project declared");
    super::cpack::renormalize_modules(ev);
    Flow::Normal
}

/// `cmake_minimum_required(VERSION <min>[...<max>] [FATAL_ERROR])`.
pub(crate) fn cmd_cmake_minimum_required(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let version_pos = values
        .iter()
        .position(|v| v.eq_ignore_ascii_case("VERSION"));
    let Some(pos) = version_pos else {
        ev.error(
            "cmake_minimum_required",
            "cmake_minimum_required() requires VERSION",
        );
        return Flow::Normal;
    };
    let Some(spec) = values.get(pos + 1) else {
        ev.error("cmake_minimum_required", "missing value after VERSION");
        return Flow::Normal;
    };

    // `<min>...<max>` range form.
    let (min, max) = spec
        .split_once("...")
        .map_or((spec.as_str(), ""), |(min, max)| (min, max));

    ev.set_variable("CMAKE_MINIMUM_REQUIRED_VERSION", min);
    ev.set_variable("CMAKE_POLICY_VERSION", min);
    ev.set_variable("CMAKE_POLICY_VERSION_MINIMUM", min);
    if !max.is_empty() {
        // The running CMake version saturates at the range maximum.
        ev.set_variable("CMAKE_VERSION", max);
    }
    Flow::Normal
}

/// `cmake_policy(SET|GET|PUSH|POP|VERSION ...)`.
pub(crate) fn cmd_cmake_policy(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    match values.first().map(String::as_str) {
        Some("SET") => {
            let (Some(id), Some(setting)) = (values.get(1), values.get(2)) else {
                ev.error("cmake_policy", "SET requires a policy id and OLD|NEW");
                return Flow::Normal;
            };
            let setting = match setting.as_str() {
                "OLD" => PolicySetting::Old,
                "NEW" => PolicySetting::New,
                other => {
                    ev.error(
                        "cmake_policy",
                        format!("policy setting must be OLD or NEW, got '{other}'"),
                    );
                    return Flow::Normal;
                }
            };
            ev.set_policy(id, setting);
        }
        Some("GET") => {
            let (Some(id), Some(variable)) = (values.get(1), values.get(2)) else {
                ev.error("cmake_policy", "GET requires a policy id and a variable");
                return Flow::Normal;
            };
            let value = match ev.policy(id) {
                Some(PolicySetting::Old) => "OLD",
                Some(PolicySetting::New) => "NEW",
                None => "",
            };
            ev.set_variable(variable, value);
        }
        Some("PUSH") => ev.push_policy_scope(),
        Some("POP") => {
            if !ev.pop_policy_scope() {
                ev.error("cmake_policy", "policy stack POP without matching PUSH");
            }
        }
        Some("VERSION") => {
            let version = values.get(1).cloned().unwrap_or_default();
            let (min, _max) = version
                .split_once("...")
                .map_or((version.as_str(), ""), |(min, max)| (min, max));
            ev.set_variable("CMAKE_POLICY_VERSION", min);
        }
        _ => {
            ev.error(
                "cmake_policy",
                "expected SET, GET, PUSH, POP or VERSION",
            );
        }
    }
    Flow::Normal
}

/// `get_cmake_property(<var> <property>)`.
pub(crate) fn cmd_get_cmake_property(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let (Some(variable), Some(property)) = (values.first(), values.get(1)) else {
        ev.error(
            "get_cmake_property",
            "requires an output variable and a property",
        );
        return Flow::Normal;
    };
    let value = match property.as_str() {
        "TARGETS" => {
            let names: Vec<&str> = ev
                .model
                .targets
                .iter()
                .map(|t| t.name.as_str())
                .collect();
            names.join(";")
        }
        "CACHE_VARIABLES" => {
            let names: Vec<&str> = ev.model.cache.keys().map(String::as_str).collect();
            names.join(";")
        }
        "COMMANDS" => {
            let mut names: Vec<String> = ev.defs.keys().cloned().collect();
            names.sort();
            names.join(";")
        }
        _ => "NOTFOUND".to_string(),
    };
    let variable = variable.clone();
    ev.set_variable(&variable, &value);
    Flow::Normal
}

/// `message([<mode>] "text"...)`.
pub(crate) fn cmd_message(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let (mode, text_parts) = match values.first().map(String::as_str) {
        Some(
            mode @ ("FATAL_ERROR" | "SEND_ERROR" | "WARNING" | "AUTHOR_WARNING" | "DEPRECATION"
            | "NOTICE" | "STATUS" | "VERBOSE" | "DEBUG" | "TRACE"),
        ) => (mode, &values[1..]),
        _ => ("NOTICE", values.as_slice()),
    };
    let text = text_parts.join("");

    match mode {
        "FATAL_ERROR" => ev.diag(Severity::Fatal, "evaluator", "message", text, ""),
        "SEND_ERROR" => ev.diag(Severity::Error, "evaluator", "message", text, ""),
        "WARNING" | "AUTHOR_WARNING" | "DEPRECATION" => {
            ev.diag(Severity::Warning, "evaluator", "message", text, "");
        }
        "STATUS" => info!("-- {text}"),
        "VERBOSE" | "DEBUG" | "TRACE" => debug!("{text}"),
        _ => info!("{text}"),
    }
    Flow::Normal
}

/// `option(<var> "<doc>" [value])` - a BOOL cache entry.
pub(crate) fn cmd_option(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let Some(name) = values.first() else {
        ev.error("option", "option() requires a variable name");
        return Flow::Normal;
    };
    let doc = values.get(1).cloned().unwrap_or_default();
    let default = values.get(2).map_or("OFF", String::as_str);
    let value = if crate::expr::logic::is_false_constant(default) {
        "OFF"
    } else {
        "ON"
    };
    let wrote = ev.model.set_cache_entry(name, value, "BOOL", &doc, false);
    if wrote {
        ev.emit(crate::events::EventKind::SetCacheEntry {
            name: name.clone(),
            value: value.to_string(),
            entry_type: "BOOL".to_string(),
            forced: false,
        });
    }
    Flow::Normal
}

/// `variable_watch(<var> [command])` - accepted, telemetry only.
pub(crate) fn cmd_variable_watch(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    debug!(variable = inv.value(0), "variable_watch is ignored");
    ev.diag(
        Severity::Warning,
        "evaluator",
        "variable_watch",
        "variable_watch is ignored by this engine",
        inv.value(0).to_string(),
    );
    Flow::Normal
}

/// `variable_requires(<test> <result> <required>...)` - legacy command;
/// the modern equivalent is an `if()` chain, so this only validates.
pub(crate) fn cmd_variable_requires(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    ev.diag(
        Severity::Warning,
        "evaluator",
        "variable_requires",
        "legacy variable_requires() signature",
        "prefer if()",
    );
    let values = inv.values();
    let (Some(test), Some(result)) = (values.first(), values.get(1)) else {
        ev.error("variable_requires", "requires a test and a result variable");
        return Flow::Normal;
    };
    let test_value = ev.variable(test).unwrap_or_default();
    if crate::expr::logic::is_false_constant(&test_value) {
        return Flow::Normal;
    }
    let mut satisfied = true;
    for required in &values[2..] {
        let value = ev.variable(required).unwrap_or_default();
        if crate::expr::logic::is_false_constant(&value) {
            satisfied = false;
            ev.error(
                "variable_requires",
                format!("required variable '{required}' is not set"),
            );
        }
    }
    let result = result.clone();
    ev.set_variable(&result, if satisfied { "1" } else { "0" });
    Flow::Normal
}
