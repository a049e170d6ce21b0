// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! C build-driver emitter: the consumer of the event stream and the
//! final build model.
//!
//! ```text
//! generate(model, events) -> C source
//!
//!   targets in topological order (aliases resolved away);
//!   EXCLUDE_FROM_ALL targets build only as dependencies of included ones
//!     compile:  cc -c <src> -o build/<t>/<src>.o  -D... -I... opts
//!     archive:  ar rcs build/lib<t>.a ...      (POSIX static)
//!     link:     cc ... -o build/<t> ... -L... -l...
//!   PRE_BUILD / POST_BUILD custom commands around each target
//!   OUTPUT custom commands before their consumers
//!   test runner table, install steps, CPack manifest emission
//!
//! generator expressions in stored values resolve here, against the
//! final model (consumer-time evaluation).
//! ```

#[cfg(test)]
mod tests;

use std::fmt::Write as _;

use tracing::debug;

use crate::events::Event;
use crate::genex::{self, GenexContext};
use crate::model::{BuildModel, BuildTarget, CommandStage, CustomCommand, TargetKind};

/// Escapes a string for embedding in a C string literal.
fn c_quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Resolves generator expressions in a stored value against the model.
fn resolve_value(model: &BuildModel, target: &str, value: &str) -> String {
    if !genex::contains_genex(value) {
        return value.to_string();
    }
    let config = model.active_configuration().to_string();
    let mut ctx = GenexContext::new(model, &config, model.platform.platform_id());
    ctx.current_target = target;
    genex::eval(&ctx, value).unwrap_or_else(|_| String::new())
}

/// Targets the default build covers: everything not excluded from all,
/// plus the dependency closure of those targets (an excluded target
/// still builds when an included one needs it).
fn default_build_set(model: &BuildModel) -> std::collections::BTreeSet<usize> {
    let mut pending: Vec<usize> = model
        .targets
        .iter()
        .enumerate()
        .filter(|(_, target)| !target.exclude_from_all && target.alias_of.is_none())
        .map(|(idx, _)| idx)
        .collect();
    let mut wanted: std::collections::BTreeSet<usize> = pending.iter().copied().collect();
    while let Some(idx) = pending.pop() {
        for dep in model.dependency_indices(idx) {
            if wanted.insert(dep) {
                pending.push(dep);
            }
        }
    }
    wanted
}

fn object_path(model: &BuildModel, target: &BuildTarget, source: &str) -> String {
    let stem = source
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(source)
        .rsplit_once('.')
        .map_or_else(|| source.to_string(), |(stem, _)| stem.to_string());
    format!("{}/{}.dir/{stem}.o", model.build_dir, target.name)
}

fn compile_flags(model: &BuildModel, target: &BuildTarget) -> String {
    let config = model.active_configuration();
    let mut flags = String::new();
    for entry in &target.conditional_definitions {
        if entry.matches_config(config) && entry.visibility.applies_to_self() {
            let value = resolve_value(model, &target.name, &entry.value);
            if !value.is_empty() {
                let _ = write!(flags, " -D{value}");
            }
        }
    }
    for entry in &target.conditional_include_directories {
        if entry.matches_config(config) && entry.visibility.applies_to_self() {
            let value = resolve_value(model, &target.name, &entry.value);
            if !value.is_empty() {
                let _ = write!(flags, " -I{value}");
            }
        }
    }
    for entry in &target.conditional_compile_options {
        if entry.matches_config(config) && entry.visibility.applies_to_self() {
            let value = resolve_value(model, &target.name, &entry.value);
            if !value.is_empty() {
                let _ = write!(flags, " {value}");
            }
        }
    }
    // Usage requirements of linked targets propagate transitively.
    for dep_name in target
        .link_libraries
        .iter()
        .chain(&target.dependencies)
        .chain(&target.object_dependencies)
    {
        if let Some(dep) = model.resolve_alias(dep_name) {
            for value in &dep.interface_definitions {
                let value = resolve_value(model, &dep.name, value);
                if !value.is_empty() {
                    let _ = write!(flags, " -D{value}");
                }
            }
            for value in &dep.interface_include_directories {
                let value = resolve_value(model, &dep.name, value);
                if !value.is_empty() {
                    let _ = write!(flags, " -I{value}");
                }
            }
        }
    }
    flags
}

fn emit_custom_command(out: &mut String, command: &CustomCommand) {
    if let Some(comment) = &command.comment {
        let _ = writeln!(out, "    log_step(\"{}\");", c_quote(comment));
    }
    for argv in &command.commands {
        let line = argv.join(" ");
        let _ = writeln!(out, "    CHECK(run_cmd(\"{}\"));", c_quote(&line));
    }
}

fn emit_target(out: &mut String, model: &BuildModel, target: &BuildTarget) {
    let Some(artifact) = model.artifact_path(target) else {
        // Utility targets only carry custom commands.
        if !target.staged_commands.is_empty() {
            let _ = writeln!(out, "    /* target {} */", target.name);
            for command in &target.staged_commands {
                emit_custom_command(out, command);
            }
        }
        return;
    };
    if target.imported {
        return;
    }

    let _ = writeln!(out, "    /* target {} ({}) */", target.name, target.kind.type_string());

    for command in &target.staged_commands {
        if command.stage == CommandStage::PreBuild {
            emit_custom_command(out, command);
        }
    }

    // OUTPUT rules whose files this target consumes run first.
    for &idx in &target.consumed_outputs {
        if let Some(rule) = model.output_commands.get(idx) {
            emit_custom_command(out, rule);
        }
    }

    let cc = if model.platform.is_windows { "cl" } else { "cc" };
    let flags = compile_flags(model, target);
    let mut objects: Vec<String> = Vec::new();
    for source in &target.sources {
        let object = object_path(model, target, source);
        objects.push(object.clone());
        if model.platform.is_windows {
            let _ = writeln!(
                out,
                "    CHECK(run_cmd(\"{cc} /nologo /c {} /Fo:{}{}\"));",
                c_quote(source),
                c_quote(&object),
                c_quote(&flags.replace(" -D", " /D").replace(" -I", " /I"))
            );
        } else {
            let _ = writeln!(
                out,
                "    CHECK(run_cmd(\"{cc} -c {} -o {}{}\"));",
                c_quote(source),
                c_quote(&object),
                c_quote(&flags)
            );
        }
    }

    for command in &target.staged_commands {
        if command.stage == CommandStage::PreLink {
            emit_custom_command(out, command);
        }
    }

    match target.kind {
        TargetKind::StaticLib => {
            if model.platform.is_windows {
                let _ = writeln!(
                    out,
                    "    CHECK(run_cmd(\"lib /nologo /OUT:{} {}\"));",
                    c_quote(&artifact),
                    c_quote(&objects.join(" "))
                );
            } else {
                let _ = writeln!(
                    out,
                    "    CHECK(run_cmd(\"ar rcs {} {}\"));",
                    c_quote(&artifact),
                    c_quote(&objects.join(" "))
                );
            }
        }
        TargetKind::SharedLib | TargetKind::ModuleLib => {
            let _ = writeln!(
                out,
                "    CHECK(run_cmd(\"{cc} -shared {} -o {}{}\"));",
                c_quote(&objects.join(" ")),
                c_quote(&artifact),
                c_quote(&link_flags(model, target))
            );
        }
        TargetKind::Executable => {
            let _ = writeln!(
                out,
                "    CHECK(run_cmd(\"{cc} {} -o {}{}\"));",
                c_quote(&objects.join(" ")),
                c_quote(&artifact),
                c_quote(&link_flags(model, target))
            );
        }
        _ => {}
    }

    for command in &target.staged_commands {
        if command.stage == CommandStage::PostBuild {
            emit_custom_command(out, command);
        }
    }
    out.push('\n');
}

fn link_flags(model: &BuildModel, target: &BuildTarget) -> String {
    let config = model.active_configuration();
    let mut flags = String::new();

    for entry in &target.conditional_link_options {
        if entry.matches_config(config) && entry.visibility.applies_to_self() {
            let value = resolve_value(model, &target.name, &entry.value);
            if !value.is_empty() {
                let _ = write!(flags, " {value}");
            }
        }
    }
    for entry in &target.conditional_link_directories {
        if entry.matches_config(config) && entry.visibility.applies_to_self() {
            let value = resolve_value(model, &target.name, &entry.value);
            if !value.is_empty() {
                let _ = write!(flags, " -L{value}");
            }
        }
    }

    // Target dependencies link by artifact path, in dependency order.
    let mut seen = std::collections::BTreeSet::new();
    for lib in &target.link_libraries {
        let resolved = resolve_value(model, &target.name, lib);
        if resolved.is_empty() {
            continue;
        }
        if let Some(dep) = model.resolve_alias(&resolved) {
            if let Some(path) = model.linker_artifact_path(dep)
                && seen.insert(path.clone())
            {
                let _ = write!(flags, " {path}");
            }
        } else if seen.insert(resolved.clone()) {
            if resolved.starts_with('-') || resolved.contains('/') {
                let _ = write!(flags, " {resolved}");
            } else {
                let _ = write!(flags, " -l{resolved}");
            }
        }
    }
    // External libraries picked up transitively.
    for lib in model.transitive_link_libraries(&target.name) {
        if !target.link_libraries.contains(&lib) && seen.insert(lib.clone()) {
            if lib.starts_with('-') || lib.contains('/') {
                let _ = write!(flags, " {lib}");
            } else {
                let _ = write!(flags, " -l{lib}");
            }
        }
    }
    flags
}

fn emit_tests(out: &mut String, model: &BuildModel) {
    if !model.testing_enabled || model.tests.is_empty() {
        return;
    }
    let _ = writeln!(out, "static int run_tests(void) {{");
    let _ = writeln!(out, "    int failures = 0;");
    for test in &model.tests {
        let command = test.command.join(" ");
        let _ = writeln!(
            out,
            "    failures += run_test(\"{}\", \"{}\");",
            c_quote(&test.name),
            c_quote(&command)
        );
    }
    let _ = writeln!(out, "    return failures;");
    let _ = writeln!(out, "}}\n");
}

fn emit_install(out: &mut String, model: &BuildModel) {
    if model.install_rules.is_empty() {
        return;
    }
    let _ = writeln!(out, "static int run_install(const char *prefix) {{");
    for rule in &model.install_rules {
        for item in &rule.items {
            let source = if rule.kind == crate::model::InstallKind::Target {
                model
                    .resolve_alias(item)
                    .and_then(|target| model.artifact_path(target))
                    .unwrap_or_else(|| item.clone())
            } else {
                item.clone()
            };
            let _ = writeln!(
                out,
                "    CHECK(install_entry(prefix, \"{}\", \"{}\"));",
                c_quote(&source),
                c_quote(&rule.destination)
            );
        }
    }
    let _ = writeln!(out, "    return 0;");
    let _ = writeln!(out, "}}\n");
}

fn emit_cpack(out: &mut String, model: &BuildModel) {
    if model.cpack_modules.is_empty() {
        return;
    }
    let _ = writeln!(out, "static int run_package(void) {{");
    for module in &model.cpack_modules {
        let manifest = format!("cpack_{module}_manifest.txt");
        let _ = writeln!(out, "    FILE *m_{module} = fopen(\"{manifest}\", \"w\");");
        let _ = writeln!(out, "    if (!m_{module}) return 1;");
        let prefix = module.to_ascii_uppercase();
        let keys = [
            ("name", "CPACK_PACKAGE_NAME"),
            ("version", "CPACK_PACKAGE_VERSION"),
            ("file", "CPACK_PACKAGE_FILE_NAME"),
        ];
        for (key, cache_key) in keys {
            let value = model.cache_value(cache_key).unwrap_or("");
            let _ = writeln!(
                out,
                "    fprintf(m_{module}, \"{key}=%s\\n\", \"{}\");",
                c_quote(value)
            );
        }
        let _ = writeln!(
            out,
            "    fprintf(m_{module}, \"generator=%s\\n\", \"{prefix}\");"
        );
        for component in &model.cpack.components {
            let _ = writeln!(
                out,
                "    fprintf(m_{module}, \"component=%s\\n\", \"{}\");",
                c_quote(&component.name)
            );
        }
        let _ = writeln!(out, "    fclose(m_{module});");
    }
    let _ = writeln!(out, "    return 0;");
    let _ = writeln!(out, "}}\n");
}

/// Generates the complete C driver source.
#[must_use]
pub fn generate(model: &BuildModel, events: &[Event]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "/* generated by nobify-rs - do not edit */");
    let _ = writeln!(
        out,
        "/* project: {} {} ({} events) */",
        model.project.name,
        model.project.version,
        events.len()
    );
    out.push('\n');
    out.push_str("#include <stdio.h>\n#include <stdlib.h>\n#include <string.h>\n\n");
    out.push_str(
        "#define CHECK(call) do { int rc__ = (call); if (rc__ != 0) return rc__; } while (0)\n\n",
    );
    out.push_str(
        "static void log_step(const char *message) {\n    printf(\"-- %s\\n\", message);\n}\n\n",
    );
    out.push_str(
        "static int run_cmd(const char *command) {\n\
         \x20   printf(\"[cmd] %s\\n\", command);\n\
         \x20   int rc = system(command);\n\
         \x20   if (rc != 0) fprintf(stderr, \"command failed (%d): %s\\n\", rc, command);\n\
         \x20   return rc;\n}\n\n",
    );
    out.push_str(
        "static int run_test(const char *name, const char *command) {\n\
         \x20   printf(\"[test] %s\\n\", name);\n\
         \x20   int rc = system(command);\n\
         \x20   if (rc != 0) fprintf(stderr, \"test failed: %s\\n\", name);\n\
         \x20   return rc != 0;\n}\n\n",
    );
    out.push_str(
        "static int install_entry(const char *prefix, const char *source, const char *dest) {\n\
         \x20   char command[4096];\n\
         \x20   snprintf(command, sizeof command, \"mkdir -p %s/%s && cp -r %s %s/%s/\",\n\
         \x20            prefix, dest, source, prefix, dest);\n\
         \x20   return run_cmd(command);\n}\n\n",
    );

    emit_tests(&mut out, model);
    emit_install(&mut out, model);
    emit_cpack(&mut out, model);

    let _ = writeln!(out, "static int run_build(void) {{");
    if model.platform.is_windows {
        let _ = writeln!(
            out,
            "    CHECK(run_cmd(\"if not exist {dir} mkdir {dir}\"));",
            dir = c_quote(&model.build_dir)
        );
    } else {
        let _ = writeln!(
            out,
            "    CHECK(run_cmd(\"mkdir -p {}\"));",
            c_quote(&model.build_dir)
        );
    }
    let wanted = default_build_set(model);
    for &idx in &model.topological_sort() {
        if wanted.contains(&idx) {
            emit_target(&mut out, model, &model.targets[idx]);
        }
    }
    let _ = writeln!(out, "    return 0;");
    let _ = writeln!(out, "}}\n");

    out.push_str("int main(int argc, char **argv) {\n");
    out.push_str("    const char *mode = argc > 1 ? argv[1] : \"build\";\n");
    out.push_str("    if (strcmp(mode, \"build\") == 0) return run_build();\n");
    if model.testing_enabled && !model.tests.is_empty() {
        out.push_str(
            "    if (strcmp(mode, \"test\") == 0) { CHECK(run_build()); return run_tests(); }\n",
        );
    }
    if !model.install_rules.is_empty() {
        out.push_str(
            "    if (strcmp(mode, \"install\") == 0) { CHECK(run_build()); return run_install(argc > 2 ? argv[2] : \"install\"); }\n",
        );
    }
    if !model.cpack_modules.is_empty() {
        out.push_str(
            "    if (strcmp(mode, \"package\") == 0) { CHECK(run_build()); return run_package(); }\n",
        );
    }
    out.push_str("    fprintf(stderr, \"unknown mode: %s\\n\", mode);\n");
    out.push_str("    return 2;\n}\n");

    debug!(bytes = out.len(), "driver generated");
    out
}
