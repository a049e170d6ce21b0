// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Test registry commands: `enable_testing`, `add_test`,
//! `set_tests_properties`, `get_test_property`, plus the `CTest`
//! pseudo-module.

use tracing::debug;

use crate::eval::opt::{OptKind, OptSpec, parse_opts};
use crate::eval::{Evaluator, Flow, Invocation, Severity};
use crate::events::EventKind;
use crate::model::TestCase;

/// `include(CTest)` enables testing without loading script text.
pub(crate) fn include_pseudo_module(ev: &mut Evaluator<'_>, name: &str) -> bool {
    if !(name.eq_ignore_ascii_case("CTest") || name.eq_ignore_ascii_case("CTest.cmake")) {
        return false;
    }
    ev.model.testing_enabled = true;
    ev.set_variable("BUILD_TESTING", "ON");
    ev.emit(EventKind::TestingEnable);
    debug!("CTest pseudo-module enabled testing");
    true
}

/// `enable_testing()`.
pub(crate) fn cmd_enable_testing(ev: &mut Evaluator<'_>, _inv: &Invocation) -> Flow {
    ev.model.testing_enabled = true;
    ev.emit(EventKind::TestingEnable);
    Flow::Normal
}

/// `add_test(NAME <name> COMMAND <cmd>...)` plus the legacy
/// `add_test(<name> <cmd> <arg>...)` signature.
pub(crate) fn cmd_add_test(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    const SPECS: [OptSpec; 5] = [
        OptSpec::new("NAME", OptKind::Single),
        OptSpec::new("COMMAND", OptKind::Multi),
        OptSpec::new("WORKING_DIRECTORY", OptKind::Single),
        OptSpec::new("CONFIGURATIONS", OptKind::Multi),
        OptSpec::new("COMMAND_EXPAND_LISTS", OptKind::Flag),
    ];
    let values = inv.values();

    let (name, command, working_directory) = if values.first().map(String::as_str) == Some("NAME")
    {
        let parsed = match parse_opts(&values, 0, &SPECS) {
            Ok(parsed) => parsed,
            Err(message) => {
                ev.error("add_test", message);
                return Flow::Normal;
            }
        };
        let Some(name) = parsed.one("NAME").map(str::to_string) else {
            ev.error("add_test", "NAME requires a value");
            return Flow::Normal;
        };
        let command = parsed.many("COMMAND").to_vec();
        if command.is_empty() {
            ev.error("add_test", "COMMAND requires at least one argument");
            return Flow::Normal;
        }
        (
            name,
            command,
            parsed.one("WORKING_DIRECTORY").map(str::to_string),
        )
    } else {
        // Legacy signature.
        ev.diag(
            Severity::Warning,
            "evaluator",
            "add_test",
            "legacy add_test signature",
            "prefer add_test(NAME ... COMMAND ...)",
        );
        let Some(name) = values.first().cloned() else {
            ev.error("add_test", "missing test name");
            return Flow::Normal;
        };
        let command = values[1..].to_vec();
        if command.is_empty() {
            ev.error("add_test", "missing test command");
            return Flow::Normal;
        }
        (name, command, None)
    };

    if ev.model.tests.iter().any(|t| t.name == name) {
        ev.error("add_test", format!("test '{name}' already exists"));
        return Flow::Normal;
    }

    ev.model.tests.push(TestCase {
        name: name.clone(),
        command,
        working_directory,
        properties: std::collections::BTreeMap::new(),
    });
    ev.emit(EventKind::TestAdd { name });
    Flow::Normal
}

/// `set_tests_properties(<test>... PROPERTIES <k> <v>...)`.
pub(crate) fn cmd_set_tests_properties(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let Some(properties_pos) = values.iter().position(|v| v == "PROPERTIES") else {
        ev.error("set_tests_properties", "missing PROPERTIES keyword");
        return Flow::Normal;
    };
    let names: Vec<String> = values[..properties_pos].to_vec();
    let pairs = &values[properties_pos + 1..];
    if pairs.len() % 2 != 0 {
        ev.error("set_tests_properties", "PROPERTIES requires key/value pairs");
        return Flow::Normal;
    }

    for name in names {
        let Some(test) = ev.model.tests.iter_mut().find(|t| t.name == name) else {
            ev.error("set_tests_properties", format!("no test named '{name}'"));
            continue;
        };
        for pair in pairs.chunks_exact(2) {
            test.properties.insert(pair[0].clone(), pair[1].clone());
        }
    }
    Flow::Normal
}

/// `get_test_property(<test> <property> <var>)`.
pub(crate) fn cmd_get_test_property(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let (Some(name), Some(property), Some(variable)) =
        (values.first(), values.get(1), values.get(2))
    else {
        ev.error(
            "get_test_property",
            "requires a test, a property and a variable",
        );
        return Flow::Normal;
    };
    let value = ev
        .model
        .tests
        .iter()
        .find(|t| &t.name == name)
        .and_then(|test| test.properties.get(property).cloned());
    let variable = variable.clone();
    match value {
        Some(value) => ev.set_variable(&variable, &value),
        None => ev.set_variable(&variable, "NOTFOUND"),
    }
    Flow::Normal
}
