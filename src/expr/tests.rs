// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::BTreeMap;

use super::logic::{CondToken, LogicHost, eval_condition, version_cmp};
use super::math::{self, OutputFormat};
use crate::error::MathError;

// =============================================================================
// math(EXPR)
// =============================================================================

#[test]
fn test_math_basic_arithmetic() {
    assert_eq!(math::eval("1 + 2 * 3"), Ok(7));
    assert_eq!(math::eval("(1 + 2) * 3"), Ok(9));
    assert_eq!(math::eval("10 / 3"), Ok(3));
    assert_eq!(math::eval("10 % 3"), Ok(1));
    assert_eq!(math::eval("-7 / 2"), Ok(-3));
}

#[test]
fn test_math_precedence_chain() {
    // | < ^ < & < shift < add < mul
    assert_eq!(math::eval("1 | 2 ^ 3 & 1"), Ok(3));
    assert_eq!(math::eval("1 << 2 + 1"), Ok(8));
    assert_eq!(math::eval("2 + 3 * 4 - 1"), Ok(13));
}

#[test]
fn test_math_unary_operators() {
    assert_eq!(math::eval("-5"), Ok(-5));
    assert_eq!(math::eval("+5"), Ok(5));
    assert_eq!(math::eval("~0"), Ok(-1));
    assert_eq!(math::eval("- -5"), Ok(5));
}

#[test]
fn test_math_radix_literals() {
    assert_eq!(math::eval("0x10"), Ok(16));
    assert_eq!(math::eval("0XFF"), Ok(255));
    assert_eq!(math::eval("010"), Ok(8));
    assert_eq!(math::eval("0"), Ok(0));
}

#[test]
fn test_math_wrap_around() {
    // Add/sub/mul wrap in two's complement instead of erroring.
    assert_eq!(math::eval("9223372036854775807 + 1"), Ok(i64::MIN));
    assert_eq!(math::eval("0 - 9223372036854775807 - 2"), Ok(i64::MAX));
    let a = 123_456_789_i64;
    let b = 987_654_321_987_i64;
    assert_eq!(math::eval(&format!("({a} + {b}) - {b}")), Ok(a));
}

#[test]
fn test_math_shift_masked_mod_64() {
    assert_eq!(math::eval("1 << 65"), Ok(2));
    assert_eq!(math::eval("1 << 64"), Ok(1));
    assert_eq!(math::eval("-8 >> 1"), Ok(-4));
    assert_eq!(math::eval("256 >> 66"), Ok(64));
}

#[test]
fn test_math_errors() {
    assert_eq!(math::eval("1 / 0"), Err(MathError::DivZero));
    assert_eq!(math::eval("1 % 0"), Err(MathError::DivZero));
    assert_eq!(
        math::eval("-9223372036854775808 / -1"),
        Err(MathError::Range)
    );
    assert_eq!(
        math::eval("-9223372036854775808 % -1"),
        Err(MathError::Range)
    );
    assert_eq!(math::eval("99999999999999999999"), Err(MathError::Range));
    assert_eq!(math::eval("1 +"), Err(MathError::InvalidExpr));
    assert_eq!(math::eval("(1"), Err(MathError::InvalidExpr));
    assert_eq!(math::eval("1 2"), Err(MathError::InvalidExpr));
    assert_eq!(math::eval("abc"), Err(MathError::InvalidExpr));
}

#[test]
fn test_math_division_special_case_via_shift() {
    // i64::MIN produced by shifting, then the range-checked division.
    assert_eq!(math::eval("(1 << 63) / -1"), Err(MathError::Range));
}

#[test]
fn test_math_output_format() {
    assert_eq!(math::format_value(10, OutputFormat::Decimal), "10");
    assert_eq!(math::format_value(-1, OutputFormat::Decimal), "-1");
    assert_eq!(math::format_value(255, OutputFormat::Hexadecimal), "0xff");
    assert_eq!(
        math::format_value(-1, OutputFormat::Hexadecimal),
        "0xffffffffffffffff"
    );
}

// =============================================================================
// if() condition language
// =============================================================================

/// Scope-backed host for condition tests.
#[derive(Default)]
struct FakeHost {
    variables: BTreeMap<String, String>,
    env: BTreeMap<String, String>,
    cache: BTreeMap<String, String>,
    targets: Vec<String>,
    matches: BTreeMap<String, String>,
}

impl FakeHost {
    fn with_var(mut self, name: &str, value: &str) -> Self {
        self.variables.insert(name.to_string(), value.to_string());
        self
    }

    fn with_env(mut self, name: &str, value: &str) -> Self {
        self.env.insert(name.to_string(), value.to_string());
        self
    }

    fn with_target(mut self, name: &str) -> Self {
        self.targets.push(name.to_string());
        self
    }
}

impl LogicHost for FakeHost {
    fn variable(&self, name: &str) -> Option<String> {
        self.variables.get(name).cloned()
    }

    fn env_var(&self, name: &str) -> Option<String> {
        self.env.get(name).cloned()
    }

    fn cache_var(&self, name: &str) -> Option<String> {
        self.cache.get(name).cloned()
    }

    fn is_command(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case("add_library")
    }

    fn is_target(&self, name: &str) -> bool {
        self.targets.iter().any(|t| t == name)
    }

    fn set_match_var(&mut self, name: &str, value: String) {
        self.matches.insert(name.to_string(), value);
    }
}

fn bare(tokens: &[&str]) -> Vec<CondToken> {
    tokens.iter().map(|t| CondToken::bare(*t)).collect()
}

fn check(host: &mut FakeHost, tokens: &[&str]) -> bool {
    eval_condition(&bare(tokens), host).unwrap()
}

#[test]
fn test_logic_constants() {
    let mut host = FakeHost::default();
    assert!(check(&mut host, &["TRUE"]));
    assert!(check(&mut host, &["ON"]));
    assert!(check(&mut host, &["1"]));
    assert!(check(&mut host, &["42"]));
    assert!(!check(&mut host, &["FALSE"]));
    assert!(!check(&mut host, &["OFF"]));
    assert!(!check(&mut host, &["0"]));
    assert!(!check(&mut host, &["NOTFOUND"]));
    assert!(!check(&mut host, &["ZLIB-NOTFOUND"]));
    assert!(!check(&mut host, &["ignore"]));
}

#[test]
fn test_logic_variable_resolution() {
    let mut host = FakeHost::default()
        .with_var("ENABLED", "ON")
        .with_var("DISABLED", "OFF")
        .with_var("NAME", "hello");
    assert!(check(&mut host, &["ENABLED"]));
    assert!(!check(&mut host, &["DISABLED"]));
    assert!(check(&mut host, &["NAME"]));
    assert!(!check(&mut host, &["UNSET_VARIABLE"]));
}

#[test]
fn test_logic_quoted_tokens_stay_literal() {
    let mut host = FakeHost::default().with_var("NAME", "value");
    // Quoted operand compares literally, not through the variable.
    let tokens = vec![
        CondToken::quoted("NAME"),
        CondToken::bare("STREQUAL"),
        CondToken::quoted("NAME"),
    ];
    assert!(eval_condition(&tokens, &mut host).unwrap());

    let tokens = vec![
        CondToken::bare("NAME"),
        CondToken::bare("STREQUAL"),
        CondToken::quoted("value"),
    ];
    assert!(eval_condition(&tokens, &mut host).unwrap());

    // A quoted non-constant string is falsey on its own.
    assert!(!eval_condition(&[CondToken::quoted("hello")], &mut host).unwrap());
    assert!(eval_condition(&[CondToken::quoted("TRUE")], &mut host).unwrap());
}

#[test]
fn test_logic_boolean_operators() {
    let mut host = FakeHost::default();
    assert!(check(&mut host, &["TRUE", "AND", "TRUE"]));
    assert!(!check(&mut host, &["TRUE", "AND", "FALSE"]));
    assert!(check(&mut host, &["FALSE", "OR", "TRUE"]));
    assert!(check(&mut host, &["NOT", "FALSE"]));
    // NOT binds tighter than AND, AND tighter than OR.
    assert!(check(&mut host, &["NOT", "FALSE", "AND", "TRUE"]));
    assert!(check(
        &mut host,
        &["FALSE", "AND", "FALSE", "OR", "TRUE"]
    ));
}

#[test]
fn test_logic_parentheses() {
    let mut host = FakeHost::default();
    assert!(!check(
        &mut host,
        &["FALSE", "AND", "(", "FALSE", "OR", "TRUE", ")"]
    ));
    assert!(check(
        &mut host,
        &["(", "TRUE", "OR", "FALSE", ")", "AND", "TRUE"]
    ));
}

#[test]
fn test_logic_string_comparison() {
    let mut host = FakeHost::default();
    assert!(check(&mut host, &["abc", "STRLESS", "abd"]));
    assert!(check(&mut host, &["abd", "STRGREATER", "abc"]));
    assert!(check(&mut host, &["abc", "STRLESS_EQUAL", "abc"]));
}

#[test]
fn test_logic_numeric_comparison() {
    let mut host = FakeHost::default().with_var("COUNT", "10");
    assert!(check(&mut host, &["COUNT", "EQUAL", "10"]));
    assert!(check(&mut host, &["9", "LESS", "COUNT"]));
    assert!(check(&mut host, &["COUNT", "GREATER_EQUAL", "10"]));
    // Non-numeric operands are never numerically equal.
    assert!(!check(&mut host, &["abc", "EQUAL", "abc"]));
}

#[test]
fn test_logic_version_comparison() {
    let mut host = FakeHost::default();
    assert!(check(&mut host, &["3.27", "VERSION_LESS", "3.28.0"]));
    assert!(check(&mut host, &["3.28", "VERSION_EQUAL", "3.28.0"]));
    assert!(check(
        &mut host,
        &["1.2.10", "VERSION_GREATER", "1.2.9"]
    ));
    assert_eq!(version_cmp("10.0", "9.9"), std::cmp::Ordering::Greater);
}

#[test]
fn test_logic_matches_sets_match_vars() {
    let mut host = FakeHost::default().with_var("VER", "release-1.24");
    assert!(check(&mut host, &["VER", "MATCHES", "release-([0-9]+)\\.([0-9]+)"]));
    assert_eq!(host.matches.get("CMAKE_MATCH_0").unwrap(), "release-1.24");
    assert_eq!(host.matches.get("CMAKE_MATCH_1").unwrap(), "1");
    assert_eq!(host.matches.get("CMAKE_MATCH_2").unwrap(), "24");
}

#[test]
fn test_logic_defined() {
    let mut host = FakeHost::default()
        .with_var("SET_VAR", "")
        .with_env("HOME_DIR", "/home/u");
    assert!(check(&mut host, &["DEFINED", "SET_VAR"]));
    assert!(!check(&mut host, &["DEFINED", "UNSET_VAR"]));
    assert!(check(&mut host, &["DEFINED", "ENV{HOME_DIR}"]));
    assert!(!check(&mut host, &["DEFINED", "ENV{NOPE}"]));
    assert!(!check(&mut host, &["DEFINED", "CACHE{NOPE}"]));
}

#[test]
fn test_logic_command_and_target() {
    let mut host = FakeHost::default().with_target("core");
    assert!(check(&mut host, &["COMMAND", "add_library"]));
    assert!(!check(&mut host, &["COMMAND", "no_such_cmd"]));
    assert!(check(&mut host, &["TARGET", "core"]));
    assert!(!check(&mut host, &["TARGET", "app"]));
}

#[test]
fn test_logic_in_list() {
    let mut host = FakeHost::default().with_var("LANGS", "C;CXX;ASM");
    assert!(check(&mut host, &["CXX", "IN_LIST", "LANGS"]));
    assert!(!check(&mut host, &["RUST", "IN_LIST", "LANGS"]));
}

#[test]
fn test_logic_path_predicates() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("x.txt");
    std::fs::write(&file, "x").unwrap();

    let mut host = FakeHost::default()
        .with_var("DIR", &dir.path().to_string_lossy())
        .with_var("FILE", &file.to_string_lossy());
    assert!(check(&mut host, &["EXISTS", "FILE"]));
    assert!(check(&mut host, &["IS_DIRECTORY", "DIR"]));
    assert!(!check(&mut host, &["IS_DIRECTORY", "FILE"]));
    assert!(check(&mut host, &["IS_ABSOLUTE", "DIR"]));
    assert!(!eval_condition(
        &[CondToken::bare("IS_ABSOLUTE"), CondToken::quoted("rel/path")],
        &mut host
    )
    .unwrap());
    assert!(eval_condition(
        &[CondToken::bare("IS_ABSOLUTE"), CondToken::quoted("C:/x")],
        &mut host
    )
    .unwrap());
}

#[test]
fn test_logic_malformed_expressions() {
    let mut host = FakeHost::default();
    assert!(eval_condition(&bare(&["TRUE", "AND"]), &mut host).is_err());
    assert!(eval_condition(&bare(&["(", "TRUE"]), &mut host).is_err());
    assert!(eval_condition(&bare(&["a", "STREQUAL", "b", "c"]), &mut host).is_err());
}
