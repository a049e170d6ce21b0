// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Target commands: declarations and per-target usage requirements.
//!
//! ```text
//! add_executable / add_library     normal | IMPORTED | ALIAS forms
//! add_custom_target                Utility target + staged command
//! target_*                         scope-grouped usage requirements
//!                                  PRIVATE | PUBLIC | INTERFACE
//! set/get_target_properties        smart property bag
//! ```

use tracing::debug;

use crate::eval::{Evaluator, Flow, Invocation};
use crate::events::{EventKind, PropOp};
use crate::model::{BuildTarget, TargetKind, Visibility};

/// Splits arguments into visibility-scoped groups. Tokens before the
/// first keyword fall into `default_visibility`.
fn parse_scoped(values: &[String], default_visibility: Visibility) -> Vec<(Visibility, Vec<String>)> {
    let mut groups: Vec<(Visibility, Vec<String>)> = Vec::new();
    let mut current = (default_visibility, Vec::new());

    for value in values {
        if let Some(visibility) = Visibility::parse(value) {
            if !current.1.is_empty() {
                groups.push(std::mem::replace(&mut current, (visibility, Vec::new())));
            } else {
                current.0 = visibility;
            }
            continue;
        }
        current.1.push(value.clone());
    }
    if !current.1.is_empty() {
        groups.push(current);
    }
    groups
}

/// Looks up a mutable, non-alias target for a `target_*` command,
/// emitting the appropriate error otherwise.
fn resolve_target<'m>(
    ev: &'m mut Evaluator<'_>,
    command: &str,
    name: &str,
) -> Option<&'m mut BuildTarget> {
    let Some(idx) = ev.model.find_target_index(name) else {
        ev.error(command, format!("no target named '{name}'"));
        return None;
    };
    if ev.model.targets[idx].alias_of.is_some() {
        ev.error(command, format!("'{name}' is an ALIAS target and may not be modified"));
        return None;
    }
    Some(&mut ev.model.targets[idx])
}

fn declare_target(
    ev: &mut Evaluator<'_>,
    command: &str,
    name: &str,
    kind: TargetKind,
) -> Option<usize> {
    match ev.model.add_target(name, kind) {
        Ok(idx) => {
            if ev
                .variable("NOBIFY_SUBDIR_SYSTEM_DEFAULT")
                .is_some_and(|v| v == "1")
            {
                ev.model.targets[idx].system = true;
            }
            if ev
                .variable("NOBIFY_SUBDIR_EXCLUDE_DEFAULT")
                .is_some_and(|v| v == "1")
            {
                ev.model.targets[idx].exclude_from_all = true;
            }
            // Directory-level directives apply to targets declared after
            // them in the same directory.
            let dir_state = ev.dir_state.clone();
            let target = &mut ev.model.targets[idx];
            for value in &dir_state.compile_definitions {
                target.add_definition(value, Visibility::Private, None);
            }
            for value in &dir_state.compile_options {
                target.add_compile_option(value, Visibility::Private, None);
            }
            for value in &dir_state.include_directories {
                target.add_include_directory(value, Visibility::Private, None);
            }
            for value in &dir_state.link_options {
                target.add_link_option(value, Visibility::Private, None);
            }
            for value in &dir_state.link_directories {
                target.add_link_directory(value, Visibility::Private, None);
            }
            for value in &dir_state.link_libraries {
                target.add_link_library(value, Visibility::Private, None);
            }
            ev.emit(EventKind::TargetDeclare {
                name: name.to_string(),
                kind,
            });
            Some(idx)
        }
        Err(e) => {
            ev.error(command, e.to_string());
            None
        }
    }
}

fn add_sources(ev: &mut Evaluator<'_>, idx: usize, sources: &[String]) {
    for source in sources {
        if source.is_empty() {
            continue;
        }
        let before = ev.model.targets[idx].sources.len();
        ev.model.targets[idx].add_source(source);
        if ev.model.targets[idx].sources.len() != before {
            let target = ev.model.targets[idx].name.clone();
            ev.emit(EventKind::TargetAddSource {
                target,
                source: source.clone(),
            });
        }
    }
}

/// `add_executable(<name> [WIN32] [MACOSX_BUNDLE] [EXCLUDE_FROM_ALL]
/// <sources>...)`, plus `IMPORTED` and `ALIAS` forms.
pub(crate) fn cmd_add_executable(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let Some(name) = values.first().cloned() else {
        ev.error("add_executable", "missing executable name");
        return Flow::Normal;
    };

    match values.get(1).map(String::as_str) {
        Some("ALIAS") => {
            let Some(referent) = values.get(2) else {
                ev.error("add_executable", "ALIAS requires a referent target");
                return Flow::Normal;
            };
            match ev.model.add_alias(&name, referent) {
                Ok(_) => ev.emit(EventKind::TargetDeclare {
                    name,
                    kind: TargetKind::Alias,
                }),
                Err(e) => ev.error("add_executable", e.to_string()),
            }
            return Flow::Normal;
        }
        Some("IMPORTED") => {
            if let Some(idx) = declare_target(ev, "add_executable", &name, TargetKind::Imported) {
                ev.model.targets[idx].imported = true;
            }
            return Flow::Normal;
        }
        _ => {}
    }

    let Some(idx) = declare_target(ev, "add_executable", &name, TargetKind::Executable) else {
        return Flow::Normal;
    };

    let mut sources = Vec::new();
    for value in &values[1..] {
        match value.as_str() {
            "WIN32" => ev.model.targets[idx].win32_executable = true,
            "MACOSX_BUNDLE" => ev.model.targets[idx].macosx_bundle = true,
            "EXCLUDE_FROM_ALL" => ev.model.targets[idx].exclude_from_all = true,
            _ => sources.push(value.clone()),
        }
    }
    add_sources(ev, idx, &sources);
    Flow::Normal
}

/// `add_library(<name> [STATIC|SHARED|MODULE|OBJECT|INTERFACE]
/// [EXCLUDE_FROM_ALL] <sources>...)`, plus `IMPORTED` and `ALIAS` forms.
pub(crate) fn cmd_add_library(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let Some(name) = values.first().cloned() else {
        ev.error("add_library", "missing library name");
        return Flow::Normal;
    };

    if values.get(1).map(String::as_str) == Some("ALIAS")
        || values.get(2).map(String::as_str) == Some("ALIAS")
    {
        let referent_pos = if values.get(1).map(String::as_str) == Some("ALIAS") {
            2
        } else {
            3
        };
        let Some(referent) = values.get(referent_pos) else {
            ev.error("add_library", "ALIAS requires a referent target");
            return Flow::Normal;
        };
        match ev.model.add_alias(&name, referent) {
            Ok(_) => ev.emit(EventKind::TargetDeclare {
                name,
                kind: TargetKind::Alias,
            }),
            Err(e) => ev.error("add_library", e.to_string()),
        }
        return Flow::Normal;
    }

    let mut kind = None;
    let mut imported = false;
    let mut exclude_from_all = false;
    let mut sources = Vec::new();
    for value in &values[1..] {
        match value.as_str() {
            "STATIC" => kind = Some(TargetKind::StaticLib),
            "SHARED" => kind = Some(TargetKind::SharedLib),
            "MODULE" => kind = Some(TargetKind::ModuleLib),
            "OBJECT" => kind = Some(TargetKind::ObjectLib),
            "INTERFACE" => kind = Some(TargetKind::InterfaceLib),
            "IMPORTED" => imported = true,
            "GLOBAL" => {}
            "EXCLUDE_FROM_ALL" => exclude_from_all = true,
            _ => sources.push(value.clone()),
        }
    }

    // Default library kind tracks BUILD_SHARED_LIBS.
    let kind = kind.unwrap_or_else(|| {
        let shared = ev
            .variable("BUILD_SHARED_LIBS")
            .is_some_and(|v| !crate::expr::logic::is_false_constant(&v));
        if shared {
            TargetKind::SharedLib
        } else {
            TargetKind::StaticLib
        }
    });
    let kind = if imported { TargetKind::Imported } else { kind };

    let Some(idx) = declare_target(ev, "add_library", &name, kind) else {
        return Flow::Normal;
    };
    ev.model.targets[idx].imported = imported;
    ev.model.targets[idx].exclude_from_all |= exclude_from_all;
    add_sources(ev, idx, &sources);
    debug!(name = %name, kind = kind.type_string(), "library declared");
    Flow::Normal
}

/// `add_custom_target(<name> [ALL] [COMMAND ...]... [DEPENDS ...] ...)`.
pub(crate) fn cmd_add_custom_target(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let Some(name) = values.first().cloned() else {
        ev.error("add_custom_target", "missing target name");
        return Flow::Normal;
    };

    let parsed = match super::custom::parse_custom_args(&values[1..]) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("add_custom_target", message);
            return Flow::Normal;
        }
    };

    let Some(idx) = declare_target(ev, "add_custom_target", &name, TargetKind::Utility) else {
        return Flow::Normal;
    };
    // Only ALL opts into the default build; an excluded directory wins.
    ev.model.targets[idx].exclude_from_all |= !parsed.all;
    for dep in &parsed.depends {
        ev.model.targets[idx].add_dependency(dep);
    }
    add_sources(ev, idx, &parsed.sources);

    if !parsed.commands.is_empty() {
        let command = parsed.into_custom_command();
        let stage = command.stage;
        ev.model.targets[idx].staged_commands.push(command);
        ev.emit(EventKind::CustomCommandTarget {
            target: name,
            stage,
        });
    }
    Flow::Normal
}

/// `add_dependencies(<target> <dep>...)`.
pub(crate) fn cmd_add_dependencies(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let Some(name) = values.first() else {
        ev.error("add_dependencies", "missing target name");
        return Flow::Normal;
    };
    let name = name.clone();
    let Some(target) = resolve_target(ev, "add_dependencies", &name) else {
        return Flow::Normal;
    };
    for dep in &values[1..] {
        target.add_dependency(dep);
    }
    Flow::Normal
}

/// `set_target_properties(<target>... PROPERTIES <k> <v>...)`.
pub(crate) fn cmd_set_target_properties(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let Some(properties_pos) = values.iter().position(|v| v == "PROPERTIES") else {
        ev.error("set_target_properties", "missing PROPERTIES keyword");
        return Flow::Normal;
    };
    let targets: Vec<String> = values[..properties_pos].to_vec();
    let pairs = &values[properties_pos + 1..];
    if pairs.len() % 2 != 0 {
        ev.error(
            "set_target_properties",
            "PROPERTIES requires key/value pairs",
        );
        return Flow::Normal;
    }

    for name in &targets {
        let Some(target) = resolve_target(ev, "set_target_properties", name) else {
            continue;
        };
        for pair in pairs.chunks_exact(2) {
            target.set_property_smart(&pair[0], &pair[1]);
        }
        for pair in pairs.chunks_exact(2) {
            ev.emit(EventKind::TargetPropSet {
                target: name.clone(),
                key: pair[0].clone(),
                value: pair[1].clone(),
                op: PropOp::Set,
            });
        }
    }
    Flow::Normal
}

/// `get_target_property(<var> <target> <property>)`.
pub(crate) fn cmd_get_target_property(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let (Some(variable), Some(target_name), Some(property)) =
        (values.first(), values.get(1), values.get(2))
    else {
        ev.error(
            "get_target_property",
            "requires a variable, a target and a property",
        );
        return Flow::Normal;
    };

    let config = ev.model.active_configuration().to_string();
    let value = ev
        .model
        .resolve_alias(target_name)
        .and_then(|target| target.get_property_computed(property, &config));
    let variable = variable.clone();
    match value {
        Some(value) => ev.set_variable(&variable, &value),
        None => {
            let not_found = format!("{variable}-NOTFOUND");
            ev.set_variable(&variable, &not_found);
        }
    }
    Flow::Normal
}

/// `target_sources(<target> <vis> <sources>...)`.
pub(crate) fn cmd_target_sources(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let Some(name) = values.first().cloned() else {
        ev.error("target_sources", "missing target name");
        return Flow::Normal;
    };
    if resolve_target(ev, "target_sources", &name).is_none() {
        return Flow::Normal;
    }
    let idx = ev.model.find_target_index(&name).unwrap_or_default();

    for (visibility, items) in parse_scoped(&values[1..], Visibility::Private) {
        if visibility.applies_to_self() {
            add_sources(ev, idx, &items);
        }
        if visibility.applies_to_consumers() {
            for item in &items {
                ev.model.targets[idx].append_property("INTERFACE_SOURCES", item);
            }
        }
    }
    Flow::Normal
}

/// `target_link_libraries(<target> [<vis>] <lib>...)`. The legacy
/// no-keyword signature behaves as PUBLIC.
pub(crate) fn cmd_target_link_libraries(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let Some(name) = values.first().cloned() else {
        ev.error("target_link_libraries", "missing target name");
        return Flow::Normal;
    };
    if resolve_target(ev, "target_link_libraries", &name).is_none() {
        return Flow::Normal;
    }
    let idx = ev.model.find_target_index(&name).unwrap_or_default();

    for (visibility, items) in parse_scoped(&values[1..], Visibility::Public) {
        for item in &items {
            ev.model.targets[idx].add_link_library(item, visibility, None);
        }
        ev.emit(EventKind::TargetLinkLibraries {
            target: name.clone(),
            visibility,
            libraries: items,
        });
    }
    Flow::Normal
}

/// Shared body of the list-flavored `target_*` commands.
fn scoped_list_command(
    ev: &mut Evaluator<'_>,
    inv: &Invocation,
    command: &str,
    property: &str,
    default_visibility: Visibility,
    apply: fn(&mut BuildTarget, &str, Visibility),
) -> Flow {
    let values = inv.values();
    let Some(name) = values.first().cloned() else {
        ev.error(command, "missing target name");
        return Flow::Normal;
    };
    if resolve_target(ev, command, &name).is_none() {
        return Flow::Normal;
    }
    let idx = ev.model.find_target_index(&name).unwrap_or_default();

    // SYSTEM/BEFORE ordering hints apply to include directories only and
    // are accepted without reordering.
    let filtered: Vec<String> = values[1..]
        .iter()
        .filter(|v| *v != "SYSTEM" && *v != "BEFORE" && *v != "AFTER")
        .cloned()
        .collect();

    for (visibility, items) in parse_scoped(&filtered, default_visibility) {
        for item in &items {
            apply(&mut ev.model.targets[idx], item, visibility);
            ev.emit(EventKind::TargetPropSet {
                target: name.clone(),
                key: property.to_string(),
                value: item.clone(),
                op: PropOp::Append,
            });
        }
    }
    Flow::Normal
}

/// `target_link_options(<target> <vis> <option>...)`.
pub(crate) fn cmd_target_link_options(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    scoped_list_command(
        ev,
        inv,
        "target_link_options",
        "LINK_OPTIONS",
        Visibility::Private,
        |target, value, visibility| target.add_link_option(value, visibility, None),
    )
}

/// `target_link_directories(<target> <vis> <dir>...)`.
pub(crate) fn cmd_target_link_directories(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    scoped_list_command(
        ev,
        inv,
        "target_link_directories",
        "LINK_DIRECTORIES",
        Visibility::Private,
        |target, value, visibility| target.add_link_directory(value, visibility, None),
    )
}

/// `target_include_directories(<target> [SYSTEM] [BEFORE] <vis> <dir>...)`.
pub(crate) fn cmd_target_include_directories(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    scoped_list_command(
        ev,
        inv,
        "target_include_directories",
        "INCLUDE_DIRECTORIES",
        Visibility::Private,
        |target, value, visibility| target.add_include_directory(value, visibility, None),
    )
}

/// `target_compile_definitions(<target> <vis> <def>...)`.
pub(crate) fn cmd_target_compile_definitions(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    scoped_list_command(
        ev,
        inv,
        "target_compile_definitions",
        "COMPILE_DEFINITIONS",
        Visibility::Private,
        |target, value, visibility| {
            // A leading -D is stripped, matching the documented behavior.
            let value = value.strip_prefix("-D").unwrap_or(value);
            if !value.is_empty() {
                target.add_definition(value, visibility, None);
            }
        },
    )
}

/// `target_compile_options(<target> <vis> <option>...)`.
pub(crate) fn cmd_target_compile_options(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    scoped_list_command(
        ev,
        inv,
        "target_compile_options",
        "COMPILE_OPTIONS",
        Visibility::Private,
        |target, value, visibility| target.add_compile_option(value, visibility, None),
    )
}

/// `target_compile_features(<target> <vis> <feature>...)`.
pub(crate) fn cmd_target_compile_features(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    scoped_list_command(
        ev,
        inv,
        "target_compile_features",
        "COMPILE_FEATURES",
        Visibility::Private,
        |target, value, visibility| {
            if visibility.applies_to_self() {
                target.append_property("COMPILE_FEATURES", value);
            }
            if visibility.applies_to_consumers() {
                target.append_property("INTERFACE_COMPILE_FEATURES", value);
            }
        },
    )
}

/// `target_precompile_headers(<target> <vis> <header>...)`.
pub(crate) fn cmd_target_precompile_headers(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    scoped_list_command(
        ev,
        inv,
        "target_precompile_headers",
        "PRECOMPILE_HEADERS",
        Visibility::Private,
        |target, value, visibility| {
            if visibility.applies_to_self() {
                target.append_property("PRECOMPILE_HEADERS", value);
            }
            if visibility.applies_to_consumers() {
                target.append_property("INTERFACE_PRECOMPILE_HEADERS", value);
            }
        },
    )
}
