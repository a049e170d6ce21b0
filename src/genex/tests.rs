// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::BTreeMap;

use super::{GenexContext, TargetSource, contains_genex, eval};
use crate::error::GenexError;

/// Canned target store for tests.
#[derive(Default)]
struct FakeTargets {
    properties: BTreeMap<(String, String), String>,
    files: BTreeMap<String, String>,
}

impl FakeTargets {
    fn with_property(mut self, target: &str, property: &str, value: &str) -> Self {
        self.properties
            .insert((target.to_string(), property.to_string()), value.to_string());
        self
    }

    fn with_file(mut self, target: &str, path: &str) -> Self {
        self.files.insert(target.to_string(), path.to_string());
        self
    }
}

impl TargetSource for FakeTargets {
    fn read_target_property(&self, target: &str, property: &str) -> Option<String> {
        self.properties
            .get(&(target.to_string(), property.to_string()))
            .cloned()
    }

    fn read_target_file(&self, target: &str) -> Option<String> {
        self.files.get(target).cloned()
    }

    fn read_target_linker_file(&self, target: &str) -> Option<String> {
        self.files.get(target).cloned()
    }
}

fn ctx<'a>(source: &'a FakeTargets, config: &'a str) -> GenexContext<'a> {
    GenexContext::new(source, config, "Linux")
}

#[test]
fn test_literal_passthrough() {
    let targets = FakeTargets::default();
    let ctx = ctx(&targets, "Debug");
    assert_eq!(eval(&ctx, "plain text").unwrap(), "plain text");
    assert_eq!(eval(&ctx, "").unwrap(), "");
    assert!(!contains_genex("no genex here"));
}

#[test]
fn test_config_query_and_match() {
    let targets = FakeTargets::default();
    let ctx = ctx(&targets, "Debug");
    assert_eq!(eval(&ctx, "$<CONFIG>").unwrap(), "Debug");
    assert_eq!(eval(&ctx, "$<CONFIG:Debug>").unwrap(), "1");
    assert_eq!(eval(&ctx, "$<CONFIG:debug>").unwrap(), "1");
    assert_eq!(eval(&ctx, "$<CONFIG:Release,MinSizeRel>").unwrap(), "0");
    assert_eq!(eval(&ctx, "$<CONFIG:Release,Debug>").unwrap(), "1");
}

#[test]
fn test_platform_id() {
    let targets = FakeTargets::default();
    let ctx = ctx(&targets, "Debug");
    assert_eq!(eval(&ctx, "$<PLATFORM_ID>").unwrap(), "Linux");
    assert_eq!(eval(&ctx, "$<PLATFORM_ID:Windows>").unwrap(), "0");
}

#[test]
fn test_bool_normalization() {
    let targets = FakeTargets::default();
    let ctx = ctx(&targets, "Debug");
    assert_eq!(eval(&ctx, "$<BOOL:ON>").unwrap(), "1");
    assert_eq!(eval(&ctx, "$<BOOL:OFF>").unwrap(), "0");
    assert_eq!(eval(&ctx, "$<BOOL:>").unwrap(), "0");
    assert_eq!(eval(&ctx, "$<BOOL:lib-NOTFOUND>").unwrap(), "0");
    assert_eq!(eval(&ctx, "$<BOOL:anything>").unwrap(), "1");
}

#[test]
fn test_nested_if_with_config() {
    let targets = FakeTargets::default();
    let ctx = ctx(&targets, "Debug");
    assert_eq!(
        eval(&ctx, "$<IF:$<BOOL:$<CONFIG:Debug>>,CFG_DEBUG,CFG_OTHER>").unwrap(),
        "CFG_DEBUG"
    );
    let ctx_rel = GenexContext::new(&targets, "Release", "Linux");
    assert_eq!(
        eval(&ctx_rel, "$<IF:$<BOOL:$<CONFIG:Debug>>,CFG_DEBUG,CFG_OTHER>").unwrap(),
        "CFG_OTHER"
    );
}

#[test]
fn test_condition_shorthand() {
    let targets = FakeTargets::default();
    let ctx = ctx(&targets, "Debug");
    assert_eq!(eval(&ctx, "$<$<CONFIG:Debug>:-g>").unwrap(), "-g");
    assert_eq!(eval(&ctx, "$<$<CONFIG:Release>:-O3>").unwrap(), "");
    assert_eq!(eval(&ctx, "$<1:yes>").unwrap(), "yes");
    assert_eq!(eval(&ctx, "$<0:no>").unwrap(), "");
}

#[test]
fn test_interface_scopes() {
    let targets = FakeTargets::default();
    let mut ctx = ctx(&targets, "Debug");
    assert_eq!(eval(&ctx, "$<BUILD_INTERFACE:inc>").unwrap(), "inc");
    assert_eq!(eval(&ctx, "$<INSTALL_INTERFACE:inc>").unwrap(), "");
    ctx.build_interface_active = false;
    ctx.install_interface_active = true;
    assert_eq!(eval(&ctx, "$<BUILD_INTERFACE:inc>").unwrap(), "");
    assert_eq!(eval(&ctx, "$<INSTALL_INTERFACE:inc>").unwrap(), "inc");
    assert_eq!(eval(&ctx, "$<LINK_ONLY:m>").unwrap(), "");
    ctx.link_only_active = true;
    assert_eq!(eval(&ctx, "$<LINK_ONLY:m>").unwrap(), "m");
}

#[test]
fn test_target_file_family() {
    let targets = FakeTargets::default().with_file("app", "build/bin/app");
    let ctx = ctx(&targets, "Debug");
    assert_eq!(eval(&ctx, "$<TARGET_FILE:app>").unwrap(), "build/bin/app");
    assert_eq!(eval(&ctx, "$<TARGET_FILE_DIR:app>").unwrap(), "build/bin");
    assert_eq!(eval(&ctx, "$<TARGET_FILE_NAME:app>").unwrap(), "app");
}

#[test]
fn test_target_property_recurses() {
    let targets = FakeTargets::default()
        .with_property("core", "MY_FLAGS", "$<$<CONFIG:Debug>:-g> -Wall");
    let ctx = ctx(&targets, "Debug");
    assert_eq!(
        eval(&ctx, "$<TARGET_PROPERTY:core,MY_FLAGS>").unwrap(),
        "-g -Wall"
    );
}

#[test]
fn test_target_property_cycle_guard() {
    let targets = FakeTargets::default()
        .with_property("a", "P", "$<TARGET_PROPERTY:b,Q>")
        .with_property("b", "Q", "$<TARGET_PROPERTY:a,P>");
    let ctx = ctx(&targets, "Debug");
    let err = eval(&ctx, "$<TARGET_PROPERTY:a,P>").unwrap_err();
    assert!(matches!(err, GenexError::Cycle { .. }));
}

#[test]
fn test_literal_ops() {
    let targets = FakeTargets::default();
    let ctx = ctx(&targets, "Debug");
    assert_eq!(eval(&ctx, "$<ANGLE-R>").unwrap(), ">");
    assert_eq!(eval(&ctx, "$<COMMA>").unwrap(), ",");
    assert_eq!(eval(&ctx, "$<SEMICOLON>").unwrap(), ";");
}

#[test]
fn test_escaped_separators_are_literal() {
    let targets = FakeTargets::default();
    let ctx = ctx(&targets, "Debug");
    // The escaped comma must not split the IF argument list.
    assert_eq!(
        eval(&ctx, r"$<IF:1,a\,b,c>").unwrap(),
        r"a\,b"
    );
}

#[test]
fn test_unbalanced_expression_errors() {
    let targets = FakeTargets::default();
    let ctx = ctx(&targets, "Debug");
    assert!(matches!(
        eval(&ctx, "$<CONFIG"),
        Err(GenexError::Unbalanced(_))
    ));
}

#[test]
fn test_unsupported_operator_errors() {
    let targets = FakeTargets::default();
    let ctx = ctx(&targets, "Debug");
    assert!(matches!(
        eval(&ctx, "$<NO_SUCH_OP:x>"),
        Err(GenexError::Unsupported(_))
    ));
}

#[test]
fn test_depth_bound() {
    let targets = FakeTargets::default().with_property("t", "SELF", "$<TARGET_PROPERTY:t,SELF>");
    let mut ctx = ctx(&targets, "Debug");
    ctx.max_depth = 4;
    // Builds $<BOOL:$<BOOL:...>> deeper than the bound.
    let mut expr = "1".to_string();
    for _ in 0..6 {
        expr = format!("$<BOOL:{expr}>");
    }
    assert!(matches!(
        eval(&ctx, &expr),
        Err(GenexError::DepthExceeded { .. })
    ));
}

#[test]
fn test_mixed_literal_and_expressions() {
    let targets = FakeTargets::default();
    let ctx = ctx(&targets, "Debug");
    assert_eq!(
        eval(&ctx, "pre-$<CONFIG>-post $<BOOL:1>").unwrap(),
        "pre-Debug-post 1"
    );
}
