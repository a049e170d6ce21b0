// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use super::generate;
use crate::model::{BuildModel, TargetKind, Visibility};

fn posix_model() -> BuildModel {
    let mut model = BuildModel::new();
    model.platform.is_windows = false;
    model.platform.is_apple = false;
    model.platform.is_linux = true;
    model.platform.is_unix = true;
    model
}

#[test]
fn test_library_link_reference_posix() {
    let mut model = posix_model();
    let core = model.add_target("core", TargetKind::StaticLib).unwrap();
    model.targets[core].add_source("core.c");
    let app = model.add_target("app", TargetKind::Executable).unwrap();
    model.targets[app].add_source("main.c");
    model.targets[app].add_link_library("core", Visibility::Private, None);

    let driver = generate(&model, &[]);
    assert!(driver.contains("ar rcs build/libcore.a"));
    assert!(driver.contains("build/libcore.a"));
    assert!(driver.contains("-o build/app"));
    // Library builds before the executable links against it.
    let lib_pos = driver.find("ar rcs build/libcore.a").unwrap();
    let app_pos = driver.find("-o build/app").unwrap();
    assert!(lib_pos < app_pos);
}

#[test]
fn test_library_link_reference_windows() {
    let mut model = posix_model();
    model.platform.is_windows = true;
    let core = model.add_target("core", TargetKind::StaticLib).unwrap();
    model.targets[core].add_source("core.c");

    let driver = generate(&model, &[]);
    assert!(driver.contains("build/core.lib"));
    assert!(driver.contains("lib /nologo /OUT:build/core.lib"));
}

#[test]
fn test_definitions_and_interface_propagation() {
    let mut model = posix_model();
    let core = model.add_target("core", TargetKind::StaticLib).unwrap();
    model.targets[core].add_source("core.c");
    model.targets[core].add_definition("CORE_API", Visibility::Public, None);
    model.targets[core].add_include_directory("include", Visibility::Interface, None);
    let app = model.add_target("app", TargetKind::Executable).unwrap();
    model.targets[app].add_source("main.c");
    model.targets[app].add_link_library("core", Visibility::Private, None);

    let driver = generate(&model, &[]);
    // The consumer inherits the interface definition and include dir.
    let link_line_start = driver.find("/* target app").unwrap();
    let consumer = &driver[link_line_start..];
    assert!(consumer.contains("-DCORE_API"));
    assert!(consumer.contains("-Iinclude"));
}

#[test]
fn test_genex_resolved_at_codegen_time() {
    let mut model = posix_model();
    model.set_cache_entry("CMAKE_BUILD_TYPE", "Debug", "STRING", "", true);
    let core = model.add_target("core", TargetKind::StaticLib).unwrap();
    model.targets[core].add_source("core.c");
    model.targets[core].add_definition(
        "$<IF:$<BOOL:$<CONFIG:Debug>>,CFG_DEBUG,CFG_OTHER>",
        Visibility::Private,
        None,
    );

    let driver = generate(&model, &[]);
    assert!(driver.contains("-DCFG_DEBUG"));
    assert!(!driver.contains("CFG_OTHER"));
}

#[test]
fn test_external_libraries_transitive() {
    let mut model = posix_model();
    let core = model.add_target("core", TargetKind::StaticLib).unwrap();
    model.targets[core].add_source("core.c");
    model.targets[core].add_link_library("m", Visibility::Public, None);
    let app = model.add_target("app", TargetKind::Executable).unwrap();
    model.targets[app].add_source("main.c");
    model.targets[app].add_link_library("core", Visibility::Private, None);

    let driver = generate(&model, &[]);
    let app_section = &driver[driver.find("/* target app").unwrap()..];
    assert!(app_section.contains("-lm"));
}

#[test]
fn test_tests_install_and_package_sections() {
    let mut model = posix_model();
    let app = model.add_target("app", TargetKind::Executable).unwrap();
    model.targets[app].add_source("main.c");
    model.testing_enabled = true;
    model.tests.push(crate::model::TestCase {
        name: "unit".to_string(),
        command: vec!["build/app".to_string(), "--self-test".to_string()],
        working_directory: None,
        properties: std::collections::BTreeMap::new(),
    });
    model.install_rules.push(crate::model::InstallRule {
        kind: crate::model::InstallKind::Target,
        items: vec!["app".to_string()],
        destination: "bin".to_string(),
        component: None,
        optional: false,
        rename: None,
        permissions: Vec::new(),
    });
    model.cpack_modules.push("deb".to_string());
    model.set_cache_entry("CPACK_PACKAGE_NAME", "App", "INTERNAL", "", true);

    let driver = generate(&model, &[]);
    assert!(driver.contains("run_test(\"unit\", \"build/app --self-test\")"));
    assert!(driver.contains("install_entry(prefix, \"build/app\", \"bin\")"));
    assert!(driver.contains("cpack_deb_manifest.txt"));
    assert!(driver.contains("if (strcmp(mode, \"test\") == 0)"));
    assert!(driver.contains("if (strcmp(mode, \"install\") == 0)"));
    assert!(driver.contains("if (strcmp(mode, \"package\") == 0)"));
}

#[test]
fn test_exclude_from_all_skipped_in_default_build() {
    let mut model = posix_model();
    let app = model.add_target("app", TargetKind::Executable).unwrap();
    model.targets[app].add_source("main.c");
    let extra = model.add_target("extra", TargetKind::StaticLib).unwrap();
    model.targets[extra].add_source("extra.c");
    model.targets[extra].exclude_from_all = true;

    let driver = generate(&model, &[]);
    assert!(driver.contains("/* target app"));
    assert!(!driver.contains("/* target extra"));
    assert!(!driver.contains("libextra.a"));
}

#[test]
fn test_excluded_dependency_still_builds_for_consumers() {
    let mut model = posix_model();
    let app = model.add_target("app", TargetKind::Executable).unwrap();
    model.targets[app].add_source("main.c");
    model.targets[app].add_link_library("vendored", Visibility::Private, None);
    let vendored = model.add_target("vendored", TargetKind::StaticLib).unwrap();
    model.targets[vendored].add_source("vendored.c");
    model.targets[vendored].exclude_from_all = true;

    let driver = generate(&model, &[]);
    // The excluded library is pulled in as a dependency of app, and
    // still builds before app links against it.
    let lib_pos = driver.find("ar rcs build/libvendored.a").unwrap();
    let app_pos = driver.find("-o build/app").unwrap();
    assert!(lib_pos < app_pos);
}

#[test]
fn test_custom_commands_ordering() {
    let mut model = posix_model();
    let app = model.add_target("app", TargetKind::Executable).unwrap();
    model.targets[app].add_source("main.c");
    model.targets[app].add_source("gen.c");
    model.targets[app].staged_commands.push(crate::model::CustomCommand {
        commands: vec![vec!["strip".to_string(), "build/app".to_string()]],
        stage: crate::model::CommandStage::PostBuild,
        ..crate::model::CustomCommand::default()
    });
    model.output_commands.push(crate::model::CustomCommand {
        outputs: vec!["gen.c".to_string()],
        commands: vec![vec!["gen".to_string(), "--out".to_string(), "gen.c".to_string()]],
        ..crate::model::CustomCommand::default()
    });
    model.link_output_commands();

    let driver = generate(&model, &[]);
    let gen_pos = driver.find("gen --out gen.c").unwrap();
    let compile_pos = driver.find("cc -c main.c").unwrap();
    let strip_pos = driver.find("strip build/app").unwrap();
    assert!(gen_pos < compile_pos);
    assert!(compile_pos < strip_pos);
}
