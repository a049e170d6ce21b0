// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Variable commands: `set`, `unset`, `math`, `separate_arguments`,
//! `mark_as_advanced`.

use tracing::debug;

use crate::eval::{Evaluator, Flow, Invocation};
use crate::events::EventKind;
use crate::expr::math::{self, OutputFormat};

/// Extracts `NAME` from `ENV{NAME}`.
fn env_name(raw: &str) -> Option<&str> {
    raw.strip_prefix("ENV{").and_then(|r| r.strip_suffix('}'))
}

/// `set(<var> <value>... [PARENT_SCOPE])`,
/// `set(<var> <value>... CACHE <type> <doc> [FORCE])`,
/// `set(ENV{<var>} [<value>])`.
pub(crate) fn cmd_set(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let Some(name) = values.first().cloned() else {
        ev.error("set", "set() requires a variable name");
        return Flow::Normal;
    };

    if let Some(env) = env_name(&name) {
        let env = env.to_string();
        match values.get(1) {
            Some(value) => ev.model.set_env(&env, value),
            None => ev.model.unset_env(&env),
        }
        return Flow::Normal;
    }

    let rest = &values[1..];

    // CACHE form: set(<var> <value>... CACHE <type> <docstring> [FORCE]).
    if let Some(cache_pos) = rest.iter().position(|v| v == "CACHE") {
        let value = rest[..cache_pos].join(";");
        let entry_type = rest.get(cache_pos + 1).cloned().unwrap_or_default();
        let docstring = rest.get(cache_pos + 2).cloned().unwrap_or_default();
        let force = rest
            .get(cache_pos + 3)
            .is_some_and(|v| v == "FORCE");
        let wrote = ev
            .model
            .set_cache_entry(&name, &value, &entry_type, &docstring, force);
        if wrote {
            ev.emit(EventKind::SetCacheEntry {
                name: name.clone(),
                value,
                entry_type,
                forced: force,
            });
            if name.starts_with("CPACK_") {
                super::cpack::renormalize_modules(ev);
            }
        }
        return Flow::Normal;
    }

    // PARENT_SCOPE form.
    if rest.last().is_some_and(|v| v == "PARENT_SCOPE") {
        let value = rest[..rest.len() - 1].join(";");
        ev.set_variable_parent(&name, &value);
        return Flow::Normal;
    }

    let value = rest.join(";");
    ev.set_variable(&name, &value);
    if name.starts_with("CPACK_") {
        super::cpack::renormalize_modules(ev);
    }
    Flow::Normal
}

/// `unset(<var> [CACHE|PARENT_SCOPE])`, `unset(ENV{<var>})`.
pub(crate) fn cmd_unset(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let Some(name) = values.first().cloned() else {
        ev.error("unset", "unset() requires a variable name");
        return Flow::Normal;
    };

    if let Some(env) = env_name(&name) {
        let env = env.to_string();
        ev.model.unset_env(&env);
        return Flow::Normal;
    }

    match values.get(1).map(String::as_str) {
        Some("CACHE") => {
            ev.unset_variable(&name);
            ev.model.unset_cache_entry(&name);
        }
        Some("PARENT_SCOPE") => ev.unset_variable_parent(&name),
        _ => ev.unset_variable(&name),
    }
    Flow::Normal
}

/// `math(EXPR <var> "<expression>" [OUTPUT_FORMAT DECIMAL|HEXADECIMAL])`.
pub(crate) fn cmd_math(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    if values.first().map(String::as_str) != Some("EXPR") {
        ev.error("math", "math() requires the EXPR keyword");
        return Flow::Normal;
    }
    let (Some(variable), Some(expression)) = (values.get(1), values.get(2)) else {
        ev.error("math", "math(EXPR) requires a variable and an expression");
        return Flow::Normal;
    };

    let format = match values.get(3).map(String::as_str) {
        Some("OUTPUT_FORMAT") => match values.get(4).map(String::as_str) {
            Some("HEXADECIMAL") => OutputFormat::Hexadecimal,
            Some("DECIMAL") | None => OutputFormat::Decimal,
            Some(other) => {
                ev.error("math", format!("unknown OUTPUT_FORMAT '{other}'"));
                return Flow::Normal;
            }
        },
        _ => OutputFormat::Decimal,
    };

    // Callers occasionally pass version-ish values with a leading v.
    let trimmed = expression
        .strip_prefix('v')
        .or_else(|| expression.strip_prefix('V'))
        .filter(|rest| rest.chars().next().is_some_and(|c| c.is_ascii_digit()))
        .unwrap_or(expression);

    match math::eval(trimmed) {
        Ok(value) => {
            let variable = variable.clone();
            ev.set_variable(&variable, &math::format_value(value, format));
        }
        Err(e) => ev.error("math", format!("math expression error: {e}")),
    }
    Flow::Normal
}

/// `separate_arguments(<var> [UNIX_COMMAND|WINDOWS_COMMAND|NATIVE_COMMAND]
/// [PROGRAM [SEPARATE_ARGS]] "<text>")`.
pub(crate) fn cmd_separate_arguments(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let Some(variable) = values.first().cloned() else {
        ev.error("separate_arguments", "requires a variable name");
        return Flow::Normal;
    };

    // Legacy single-argument signature splits the variable in place.
    if values.len() == 1 {
        let current = ev.variable(&variable).unwrap_or_default();
        let split = current
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(";");
        ev.set_variable(&variable, &split);
        return Flow::Normal;
    }

    let text = values.last().cloned().unwrap_or_default();
    let parts = split_command_line(&text);
    ev.set_variable(&variable, &parts.join(";"));
    Flow::Normal
}

/// Unix-style shell splitting: whitespace separates, quotes group,
/// backslash escapes.
fn split_command_line(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' if !in_single => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            c if c.is_whitespace() && !in_single && !in_double => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// `mark_as_advanced([CLEAR|FORCE] <var>...)` - cache UI hint, recorded
/// on the entry's docstring side; no build-model effect.
pub(crate) fn cmd_mark_as_advanced(_ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    debug!(variables = ?inv.values(), "mark_as_advanced recorded");
    Flow::Normal
}
