// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! `install()` rules and `export()` target files.
//!
//! The exported-targets file keeps the cmk2nob on-disk contract so
//! drivers generated by the original C implementation keep reading it:
//!
//! ```text
//! # cmk2nob export support
//! # signature: targets | export-set
//! [# export-set: <name>]
//! [# namespace: <ns>]
//! set(_CMK2NOB_EXPORTED_TARGETS a;b;...)
//! [set(_CMK2NOB_EXPORTED_NAMESPACE "<ns>")]
//! ```
//!
//! Append mode concatenates after an existing file, inserting a newline
//! when the previous byte was not one.

use crate::effects::FsRequest;
use crate::eval::opt::{OptKind, OptSpec, parse_opts};
use crate::eval::{Evaluator, Flow, Invocation, Severity};
use crate::events::EventKind;
use crate::model::{InstallKind, InstallRule};

/// `install(TARGETS|FILES|PROGRAMS|DIRECTORY ... DESTINATION <dir> ...)`.
pub(crate) fn cmd_install(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    const SPECS: [OptSpec; 10] = [
        OptSpec::new("DESTINATION", OptKind::Single),
        OptSpec::new("COMPONENT", OptKind::Single),
        OptSpec::new("PERMISSIONS", OptKind::Multi),
        OptSpec::new("RENAME", OptKind::Single),
        OptSpec::new("OPTIONAL", OptKind::Flag),
        OptSpec::new("RUNTIME", OptKind::Flag),
        OptSpec::new("LIBRARY", OptKind::Flag),
        OptSpec::new("ARCHIVE", OptKind::Flag),
        OptSpec::new("USE_SOURCE_PERMISSIONS", OptKind::Flag),
        OptSpec::new("FILES_MATCHING", OptKind::Flag),
    ];
    let values = inv.values();
    let kind = match values.first().map(String::as_str) {
        Some("TARGETS") => InstallKind::Target,
        Some("FILES") => InstallKind::File,
        Some("PROGRAMS") => InstallKind::Program,
        Some("DIRECTORY") => InstallKind::Directory,
        Some("EXPORT") => {
            ev.diag(
                Severity::Warning,
                "evaluator",
                "install",
                "install(EXPORT) is unsupported",
                "use export(TARGETS ... FILE ...)",
            );
            return Flow::Normal;
        }
        Some(other) => {
            ev.error("install", format!("unknown install() mode '{other}'"));
            return Flow::Normal;
        }
        None => {
            ev.error("install", "install() requires a mode");
            return Flow::Normal;
        }
    };

    let parsed = match parse_opts(&values, 1, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("install", message);
            return Flow::Normal;
        }
    };
    let Some(destination) = parsed.one("DESTINATION").map(str::to_string) else {
        ev.error("install", "install() requires DESTINATION");
        return Flow::Normal;
    };
    let items: Vec<String> = parsed.positionals().to_vec();
    if items.is_empty() {
        ev.error("install", "install() requires at least one item");
        return Flow::Normal;
    }

    if kind == InstallKind::Target {
        for item in &items {
            if ev.model.find_target_index(item).is_none() {
                ev.error("install", format!("no target named '{item}'"));
                return Flow::Normal;
            }
        }
    }

    let rule = InstallRule {
        kind,
        items: items.clone(),
        destination: destination.clone(),
        component: parsed.one("COMPONENT").map(str::to_string),
        optional: parsed.has("OPTIONAL"),
        rename: parsed.one("RENAME").map(str::to_string),
        permissions: parsed.many("PERMISSIONS").to_vec(),
    };
    ev.model.install_rules.push(rule);
    ev.emit(EventKind::InstallRule {
        kind,
        items,
        destination,
    });
    Flow::Normal
}

/// `export(TARGETS <t>... FILE <f> [NAMESPACE <ns>] [APPEND])` and
/// `export(EXPORT <set> FILE <f> [NAMESPACE <ns>])`.
pub(crate) fn cmd_export(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    const SPECS: [OptSpec; 5] = [
        OptSpec::new("TARGETS", OptKind::Multi),
        OptSpec::new("EXPORT", OptKind::Single),
        OptSpec::new("FILE", OptKind::Single),
        OptSpec::new("NAMESPACE", OptKind::Single),
        OptSpec::new("APPEND", OptKind::Flag),
    ];
    let values = inv.values();

    // export(PACKAGE <name>): a build-dir package registry entry.
    if values.first().map(String::as_str) == Some("PACKAGE") {
        let Some(package) = values.get(1).cloned() else {
            ev.error("export", "export(PACKAGE) requires a name");
            return Flow::Normal;
        };
        let binary = ev
            .variable("CMAKE_CURRENT_BINARY_DIR")
            .unwrap_or_else(|| ".".to_string());
        let path = std::path::Path::new(&binary)
            .join(".cmake/packages")
            .join(format!("{package}.cmake"));
        let content = format!(
            "# cmk2nob package registry entry\nset({package}_DIR \"{binary}\")\n"
        );
        let outcome = ev
            .effects
            .run_fs(&FsRequest::EnsureParentDirs { path: path.clone() });
        if !outcome.status.is_ok() {
            ev.error("export", outcome.log);
            return Flow::Normal;
        }
        let outcome = ev.effects.run_fs(&FsRequest::WriteFileBytes {
            path,
            bytes: content.into_bytes(),
        });
        if !outcome.status.is_ok() {
            ev.error("export", outcome.log);
        }
        return Flow::Normal;
    }

    let parsed = match parse_opts(&values, 0, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("export", message);
            return Flow::Normal;
        }
    };
    let Some(file) = parsed.one("FILE").map(str::to_string) else {
        ev.error("export", "export() requires FILE");
        return Flow::Normal;
    };

    let export_set = parsed.one("EXPORT").map(str::to_string);
    let targets: Vec<String> = parsed.many("TARGETS").to_vec();
    if export_set.is_none() && targets.is_empty() {
        ev.error("export", "export() requires TARGETS or EXPORT");
        return Flow::Normal;
    }
    for target in &targets {
        if ev.model.find_target_index(target).is_none() {
            ev.error("export", format!("no target named '{target}'"));
            return Flow::Normal;
        }
    }

    let namespace = parsed.one("NAMESPACE").map(str::to_string);
    let signature = if export_set.is_some() {
        "export-set"
    } else {
        "targets"
    };

    let mut content = String::new();
    content.push_str("# cmk2nob export support\n");
    content.push_str(&format!("# signature: {signature}\n"));
    if let Some(set) = &export_set {
        content.push_str(&format!("# export-set: {set}\n"));
    }
    if let Some(ns) = &namespace {
        content.push_str(&format!("# namespace: {ns}\n"));
    }
    content.push_str(&format!(
        "set(_CMK2NOB_EXPORTED_TARGETS {})\n",
        targets.join(";")
    ));
    if let Some(ns) = &namespace {
        content.push_str(&format!("set(_CMK2NOB_EXPORTED_NAMESPACE \"{ns}\")\n"));
    }

    let path = super::files::resolve_output_path(ev, &file);
    let bytes = if parsed.has("APPEND") {
        let mut existing = std::fs::read(&path).unwrap_or_default();
        if existing.last().is_some_and(|last| *last != b'\n') {
            existing.push(b'\n');
        }
        existing.extend_from_slice(content.as_bytes());
        existing
    } else {
        content.into_bytes()
    };

    let outcome = ev
        .effects
        .run_fs(&FsRequest::EnsureParentDirs { path: path.clone() });
    if !outcome.status.is_ok() {
        ev.error("export", outcome.log);
        return Flow::Normal;
    }
    let outcome = ev.effects.run_fs(&FsRequest::WriteFileBytes { path, bytes });
    if !outcome.status.is_ok() {
        ev.error("export", outcome.log);
    }
    Flow::Normal
}
