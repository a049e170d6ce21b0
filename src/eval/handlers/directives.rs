// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Global directives and the generic property commands.
//!
//! ```text
//! add_compile_options / add_definitions / include_directories / ...
//!   -> directory-scoped DirectiveState, applied to later targets
//! set_property / get_property
//!   -> GLOBAL | DIRECTORY | TARGET | SOURCE | TEST | CACHE scopes
//!      with SET / APPEND / APPEND_STRING semantics
//! ```

use crate::eval::{Evaluator, Flow, Invocation};
use crate::events::{EventKind, PropOp};

/// `add_compile_options(<option>...)`.
pub(crate) fn cmd_add_compile_options(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    ev.dir_state.compile_options.extend(inv.values());
    Flow::Normal
}

/// `add_compile_definitions(<def>...)`.
pub(crate) fn cmd_add_compile_definitions(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    for value in inv.values() {
        let value = value.strip_prefix("-D").unwrap_or(&value);
        if !value.is_empty() {
            ev.dir_state.compile_definitions.push(value.to_string());
        }
    }
    Flow::Normal
}

/// `add_definitions(-D<def>...)` - legacy spelling; non-definition flags
/// fall through to the compile options.
pub(crate) fn cmd_add_definitions(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    for value in inv.values() {
        if let Some(stripped) = value.strip_prefix("-D") {
            if !stripped.is_empty() {
                ev.dir_state.compile_definitions.push(stripped.to_string());
            }
        } else {
            ev.dir_state.compile_options.push(value);
        }
    }
    Flow::Normal
}

/// `add_link_options(<option>...)`.
pub(crate) fn cmd_add_link_options(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    ev.dir_state.link_options.extend(inv.values());
    Flow::Normal
}

/// `include_directories([AFTER|BEFORE] [SYSTEM] <dir>...)`.
pub(crate) fn cmd_include_directories(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let mut before = false;
    let mut dirs = Vec::new();
    for value in inv.values() {
        match value.as_str() {
            "BEFORE" => before = true,
            "AFTER" | "SYSTEM" => {}
            _ => dirs.push(value),
        }
    }
    if before {
        for dir in dirs.into_iter().rev() {
            ev.dir_state.include_directories.insert(0, dir);
        }
    } else {
        ev.dir_state.include_directories.extend(dirs);
    }
    Flow::Normal
}

/// `link_directories([AFTER|BEFORE] <dir>...)`.
pub(crate) fn cmd_link_directories(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    for value in inv.values() {
        match value.as_str() {
            "BEFORE" | "AFTER" => {}
            _ => ev.dir_state.link_directories.push(value),
        }
    }
    Flow::Normal
}

/// `link_libraries(<lib>...)`.
pub(crate) fn cmd_link_libraries(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    ev.dir_state.link_libraries.extend(inv.values());
    Flow::Normal
}

/// `set_directory_properties(PROPERTIES <k> <v>...)`.
pub(crate) fn cmd_set_directory_properties(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let Some(pos) = values.iter().position(|v| v == "PROPERTIES") else {
        ev.error("set_directory_properties", "missing PROPERTIES keyword");
        return Flow::Normal;
    };
    let pairs = &values[pos + 1..];
    if pairs.len() % 2 != 0 {
        ev.error(
            "set_directory_properties",
            "PROPERTIES requires key/value pairs",
        );
        return Flow::Normal;
    }
    for pair in pairs.chunks_exact(2) {
        ev.directory_properties
            .insert(pair[0].clone(), pair[1].clone());
    }
    Flow::Normal
}

/// `set_source_files_properties(<file>... PROPERTIES <k> <v>...)`.
pub(crate) fn cmd_set_source_files_properties(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let Some(pos) = values.iter().position(|v| v == "PROPERTIES") else {
        ev.error(
            "set_source_files_properties",
            "missing PROPERTIES keyword",
        );
        return Flow::Normal;
    };
    let files: Vec<String> = values[..pos].to_vec();
    let pairs = &values[pos + 1..];
    if pairs.len() % 2 != 0 {
        ev.error(
            "set_source_files_properties",
            "PROPERTIES requires key/value pairs",
        );
        return Flow::Normal;
    }
    for file in files {
        let bag = ev.source_properties.entry(file).or_default();
        for pair in pairs.chunks_exact(2) {
            bag.insert(pair[0].clone(), pair[1].clone());
        }
    }
    Flow::Normal
}

/// `set_property(<scope>... PROPERTY <name> <value>...
/// [APPEND|APPEND_STRING])`.
pub(crate) fn cmd_set_property(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let Some(property_pos) = values.iter().position(|v| v == "PROPERTY") else {
        ev.error("set_property", "missing PROPERTY keyword");
        return Flow::Normal;
    };

    let mut scope_args: Vec<String> = values[..property_pos].to_vec();
    let mut append = false;
    let mut append_string = false;
    scope_args.retain(|v| match v.as_str() {
        "APPEND" => {
            append = true;
            false
        }
        "APPEND_STRING" => {
            append_string = true;
            false
        }
        _ => true,
    });
    let Some(scope) = scope_args.first().cloned() else {
        ev.error("set_property", "missing scope");
        return Flow::Normal;
    };
    let scope_items = &scope_args[1..];

    let rest = &values[property_pos + 1..];
    let Some(key) = rest.first().cloned() else {
        ev.error("set_property", "missing property name");
        return Flow::Normal;
    };
    let value = rest[1..].join(";");
    let op = if append_string {
        PropOp::AppendString
    } else if append {
        PropOp::Append
    } else {
        PropOp::Set
    };

    match scope.as_str() {
        "GLOBAL" => {
            apply_bag_op(&mut ev.global_properties, &key, &value, op);
        }
        "DIRECTORY" => {
            apply_bag_op(&mut ev.directory_properties, &key, &value, op);
        }
        "TARGET" => {
            for name in scope_items {
                let Some(idx) = ev.model.find_target_index(name) else {
                    ev.error("set_property", format!("no target named '{name}'"));
                    continue;
                };
                let target = &mut ev.model.targets[idx];
                match op {
                    PropOp::Set => target.set_property_smart(&key, &value),
                    PropOp::Append => target.append_property(&key, &value),
                    PropOp::AppendString => target.append_property_string(&key, &value),
                }
                let name = name.clone();
                ev.emit(EventKind::TargetPropSet {
                    target: name,
                    key: key.clone(),
                    value: value.clone(),
                    op,
                });
            }
        }
        "SOURCE" => {
            for file in scope_items {
                let bag = ev.source_properties.entry(file.clone()).or_default();
                apply_bag_op(bag, &key, &value, op);
            }
        }
        "TEST" => {
            for test_name in scope_items {
                let Some(test) = ev.model.tests.iter_mut().find(|t| &t.name == test_name)
                else {
                    ev.error("set_property", format!("no test named '{test_name}'"));
                    continue;
                };
                apply_bag_op(&mut test.properties, &key, &value, op);
            }
        }
        "CACHE" => {
            for name in scope_items {
                ev.model.set_cache_entry(name, &value, "STRING", "", true);
            }
        }
        other => {
            ev.error("set_property", format!("unknown scope '{other}'"));
        }
    }
    Flow::Normal
}

fn apply_bag_op(
    bag: &mut std::collections::BTreeMap<String, String>,
    key: &str,
    value: &str,
    op: PropOp,
) {
    match op {
        PropOp::Set => {
            bag.insert(key.to_string(), value.to_string());
        }
        PropOp::Append => match bag.get_mut(key) {
            Some(existing) if !existing.is_empty() => {
                existing.push(';');
                existing.push_str(value);
            }
            _ => {
                bag.insert(key.to_string(), value.to_string());
            }
        },
        PropOp::AppendString => {
            bag.entry(key.to_string()).or_default().push_str(value);
        }
    }
}

/// `get_property(<var> <scope> [<item>] PROPERTY <name>)`.
pub(crate) fn cmd_get_property(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let Some(property_pos) = values.iter().position(|v| v == "PROPERTY") else {
        ev.error("get_property", "missing PROPERTY keyword");
        return Flow::Normal;
    };
    let Some(variable) = values.first().cloned() else {
        ev.error("get_property", "missing output variable");
        return Flow::Normal;
    };
    let Some(key) = values.get(property_pos + 1).cloned() else {
        ev.error("get_property", "missing property name");
        return Flow::Normal;
    };
    let scope = values.get(1).cloned().unwrap_or_default();
    let item = values.get(2).filter(|_| property_pos > 2).cloned();

    let value = match scope.as_str() {
        "GLOBAL" => ev.global_properties.get(&key).cloned(),
        "DIRECTORY" => ev.directory_properties.get(&key).cloned(),
        "TARGET" => item.as_ref().and_then(|name| {
            let config = ev.model.active_configuration().to_string();
            ev.model
                .resolve_alias(name)
                .and_then(|target| target.get_property_computed(&key, &config))
        }),
        "SOURCE" => item
            .as_ref()
            .and_then(|file| ev.source_properties.get(file))
            .and_then(|bag| bag.get(&key).cloned()),
        "TEST" => item
            .as_ref()
            .and_then(|name| ev.model.tests.iter().find(|t| &t.name == name))
            .and_then(|test| test.properties.get(&key).cloned()),
        "CACHE" => item
            .as_ref()
            .and_then(|name| ev.model.cache_value(name))
            .map(str::to_string),
        other => {
            ev.error("get_property", format!("unknown scope '{other}'"));
            return Flow::Normal;
        }
    };

    ev.set_variable(&variable, &value.unwrap_or_default());
    Flow::Normal
}
