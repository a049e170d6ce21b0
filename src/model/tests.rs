// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{BuildModel, TargetKind, Visibility};
use crate::error::ModelError;
use crate::genex::TargetSource;

fn model() -> BuildModel {
    BuildModel::new()
}

#[test]
fn test_add_target_and_lookup() {
    let mut m = model();
    let idx = m.add_target("core", TargetKind::StaticLib).unwrap();
    assert_eq!(m.find_target_index("core"), Some(idx));
    assert!(m.target("app").is_none());
}

#[test]
fn test_redeclare_same_kind_is_idempotent() {
    let mut m = model();
    let first = m.add_target("core", TargetKind::StaticLib).unwrap();
    let second = m.add_target("core", TargetKind::StaticLib).unwrap();
    assert_eq!(first, second);
    assert_eq!(m.targets.len(), 1);
}

#[test]
fn test_redeclare_conflicting_kind_fails() {
    let mut m = model();
    m.add_target("core", TargetKind::StaticLib).unwrap();
    let err = m.add_target("core", TargetKind::Executable).unwrap_err();
    assert!(matches!(err, ModelError::TargetConflict { .. }));
}

#[test]
fn test_alias_resolution() {
    let mut m = model();
    m.add_target("core", TargetKind::StaticLib).unwrap();
    m.add_alias("ns::core", "core").unwrap();
    assert_eq!(m.resolve_alias("ns::core").unwrap().name, "core");

    // Alias name collision and dangling referent both fail.
    assert!(m.add_alias("ns::core", "core").is_err());
    assert!(m.add_alias("other", "missing").is_err());
}

#[test]
fn test_source_dedup() {
    let mut m = model();
    let idx = m.add_target("core", TargetKind::StaticLib).unwrap();
    let target = &mut m.targets[idx];
    target.add_source("a.c");
    target.add_source("b.c");
    target.add_source("a.c");
    assert_eq!(target.sources, vec!["a.c", "b.c"]);
}

#[test]
fn test_dependency_dedup() {
    let mut m = model();
    let idx = m.add_target("app", TargetKind::Executable).unwrap();
    m.add_target("core", TargetKind::StaticLib).unwrap();
    let target = &mut m.targets[idx];
    target.add_dependency("core");
    target.add_dependency("core");
    assert_eq!(target.dependencies.len(), 1);
}

#[test]
fn test_conditional_dual_write() {
    let mut m = model();
    let idx = m.add_target("core", TargetKind::StaticLib).unwrap();
    let target = &mut m.targets[idx];
    target.add_definition("NDEBUG", Visibility::Private, Some("Release"));
    target.add_definition("CORE_API", Visibility::Public, None);
    target.add_definition("CONSUMER_ONLY", Visibility::Interface, None);

    assert_eq!(target.definitions, vec!["NDEBUG", "CORE_API"]);
    assert_eq!(
        target.interface_definitions,
        vec!["CORE_API", "CONSUMER_ONLY"]
    );
    assert_eq!(target.conditional_definitions.len(), 3);
    assert_eq!(
        target.conditional_definitions[0].condition,
        "CMAKE_BUILD_TYPE STREQUAL Release"
    );
    assert!(target.conditional_definitions[0].matches_config("Release"));
    assert!(!target.conditional_definitions[0].matches_config("Debug"));
    assert!(target.conditional_definitions[1].matches_config("Debug"));
}

#[test]
fn test_get_property_computed() {
    let mut m = model();
    let idx = m.add_target("core", TargetKind::StaticLib).unwrap();
    {
        let target = &mut m.targets[idx];
        target.add_source("core.c");
        target.add_definition("A", Visibility::Private, None);
        target.add_definition("DBG", Visibility::Private, Some("Debug"));
        target.set_property("MY_KEY", "my value");
    }
    let target = &m.targets[idx];
    assert_eq!(target.get_property_computed("NAME", "Debug").unwrap(), "core");
    assert_eq!(
        target.get_property_computed("TYPE", "Debug").unwrap(),
        "STATIC_LIBRARY"
    );
    assert_eq!(
        target.get_property_computed("SOURCES", "Debug").unwrap(),
        "core.c"
    );
    assert_eq!(
        target
            .get_property_computed("COMPILE_DEFINITIONS", "Debug")
            .unwrap(),
        "A;DBG"
    );
    assert_eq!(
        target
            .get_property_computed("COMPILE_DEFINITIONS", "Release")
            .unwrap(),
        "A"
    );
    assert_eq!(
        target.get_property_computed("MY_KEY", "Debug").unwrap(),
        "my value"
    );
    assert_eq!(
        target.get_property_computed("OUTPUT_NAME", "Debug").unwrap(),
        "core"
    );
    assert!(target.get_property_computed("NOPE", "Debug").is_none());
}

#[test]
fn test_set_property_smart_feeds_conditional_lists() {
    let mut m = model();
    let idx = m.add_target("core", TargetKind::StaticLib).unwrap();
    let target = &mut m.targets[idx];
    target.set_property_smart("COMPILE_DEFINITIONS_DEBUG", "DBG1;DBG2");
    target.set_property_smart("LINK_OPTIONS", "-s");
    target.set_property_smart("OUTPUT_NAME", "core2");

    assert_eq!(target.conditional_definitions.len(), 2);
    assert!(target.conditional_definitions[0].matches_config("Debug"));
    assert!(!target.conditional_definitions[0].matches_config("Release"));
    assert_eq!(target.link_options, vec!["-s"]);
    assert_eq!(
        target.properties.get("OUTPUT_NAME").unwrap(),
        "core2"
    );
}

#[test]
fn test_validate_dependencies_missing_target() {
    let mut m = model();
    let idx = m.add_target("app", TargetKind::Executable).unwrap();
    m.targets[idx].add_dependency("missing");
    assert!(!m.validate_dependencies());
}

#[test]
fn test_cycle_detection_and_empty_sort() {
    let mut m = model();
    let a = m.add_target("a", TargetKind::StaticLib).unwrap();
    let b = m.add_target("b", TargetKind::StaticLib).unwrap();
    m.targets[a].add_dependency("b");
    m.targets[b].add_dependency("a");

    assert!(!m.validate_dependencies());
    assert!(m.topological_sort().is_empty());
}

#[test]
fn test_topological_sort_dependency_order() {
    let mut m = model();
    let app = m.add_target("app", TargetKind::Executable).unwrap();
    let core = m.add_target("core", TargetKind::StaticLib).unwrap();
    let util = m.add_target("util", TargetKind::StaticLib).unwrap();
    m.targets[app].add_link_library("core", Visibility::Private, None);
    m.targets[core].add_dependency("util");

    assert!(m.validate_dependencies());
    let order = m.topological_sort();
    assert_eq!(order.len(), 3);
    let pos =
        |idx: usize| order.iter().position(|&i| i == idx).unwrap();
    assert!(pos(util) < pos(core), "util must precede core");
    assert!(pos(core) < pos(app), "core must precede app");
}

#[test]
fn test_alias_contributes_no_build_actions() {
    let mut m = model();
    let app = m.add_target("app", TargetKind::Executable).unwrap();
    m.add_target("core", TargetKind::StaticLib).unwrap();
    m.add_alias("ns::core", "core").unwrap();
    m.targets[app].add_link_library("ns::core", Visibility::Private, None);

    let order = m.topological_sort();
    // Alias dropped from the order, edge resolved to the referent.
    assert_eq!(order.len(), 2);
    let names: Vec<_> = order.iter().map(|&i| m.targets[i].name.as_str()).collect();
    assert_eq!(names, vec!["core", "app"]);
}

#[test]
fn test_cache_force_semantics() {
    let mut m = model();
    assert!(m.set_cache_entry("VAR", "1", "STRING", "doc", false));
    // Unforced rewrite keeps the original value.
    assert!(!m.set_cache_entry("VAR", "2", "STRING", "doc", false));
    assert_eq!(m.cache_value("VAR"), Some("1"));
    // FORCE overwrites.
    assert!(m.set_cache_entry("VAR", "3", "STRING", "doc", true));
    assert_eq!(m.cache_value("VAR"), Some("3"));

    m.unset_cache_entry("VAR");
    assert!(!m.has_cache_entry("VAR"));
}

#[test]
fn test_environment_shadowing() {
    let mut m = model();
    m.set_env("NOBIFY_TEST_SHADOW", "from-shadow");
    assert_eq!(
        m.env_value("NOBIFY_TEST_SHADOW").unwrap(),
        "from-shadow"
    );

    // Tombstone hides any real value.
    m.unset_env("PATH");
    assert!(m.env_value("PATH").is_none());

    // The real environment was not touched.
    assert!(std::env::var_os("PATH").is_some());
}

#[test]
fn test_artifact_paths_per_platform_flags() {
    let mut m = model();
    m.platform.is_windows = false;
    m.platform.is_apple = false;
    m.platform.is_linux = true;
    m.platform.is_unix = true;

    let lib = m.add_target("core", TargetKind::StaticLib).unwrap();
    let exe = m.add_target("app", TargetKind::Executable).unwrap();
    let shared = m.add_target("plug", TargetKind::SharedLib).unwrap();
    assert_eq!(
        m.artifact_path(&m.targets[lib]).unwrap(),
        "build/libcore.a"
    );
    assert_eq!(m.artifact_path(&m.targets[exe]).unwrap(), "build/app");
    assert_eq!(
        m.artifact_path(&m.targets[shared]).unwrap(),
        "build/libplug.so"
    );

    m.platform.is_windows = true;
    assert_eq!(
        m.artifact_path(&m.targets[lib]).unwrap(),
        "build/core.lib"
    );
    assert_eq!(m.artifact_path(&m.targets[exe]).unwrap(), "build/app.exe");
    assert_eq!(
        m.linker_artifact_path(&m.targets[shared]).unwrap(),
        "build/plug.lib"
    );
}

#[test]
fn test_transitive_link_libraries() {
    let mut m = model();
    let app = m.add_target("app", TargetKind::Executable).unwrap();
    let core = m.add_target("core", TargetKind::StaticLib).unwrap();
    let util = m.add_target("util", TargetKind::StaticLib).unwrap();
    m.targets[app].add_link_library("core", Visibility::Private, None);
    m.targets[core].add_link_library("m", Visibility::Public, None);
    m.targets[core].add_link_library("util", Visibility::Public, None);
    m.targets[util].add_link_library("pthread", Visibility::Private, None);
    m.targets[util].add_link_library("m", Visibility::Private, None);

    let libs = m.transitive_link_libraries("app");
    assert_eq!(libs, vec!["m", "pthread"]);
}

#[test]
fn test_genex_target_source_callbacks() {
    let mut m = model();
    m.platform.is_windows = false;
    m.platform.is_apple = false;
    m.platform.is_linux = true;
    let idx = m.add_target("core", TargetKind::StaticLib).unwrap();
    m.targets[idx].set_property("MY_PROP", "xyz");
    m.add_alias("ns::core", "core").unwrap();

    assert_eq!(
        m.read_target_property("ns::core", "MY_PROP").unwrap(),
        "xyz"
    );
    assert_eq!(m.read_target_file("core").unwrap(), "build/libcore.a");
    assert!(m.read_target_file("missing").is_none());
}

#[test]
fn test_cpack_dedup_by_name() {
    let mut m = model();
    let a = m.cpack.ensure_component("runtime");
    let b = m.cpack.ensure_component("runtime");
    assert_eq!(a, b);
    assert_eq!(m.cpack.components.len(), 1);

    let g1 = m.cpack.ensure_component_group("apps");
    let g2 = m.cpack.ensure_component_group("docs");
    assert_ne!(g1, g2);
    assert_eq!(m.cpack.ensure_install_type("Full"), 0);
    assert_eq!(m.cpack.ensure_install_type("Full"), 0);
}
