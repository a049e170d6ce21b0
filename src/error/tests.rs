// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{EvalError, MathError, NobifyError, NobifyResult, ParseError};

#[test]
fn test_parse_error_display() {
    let err = ParseError::UnbalancedBlock {
        file: "CMakeLists.txt".to_string(),
        line: 12,
        expected: "endif".to_string(),
        found: "endwhile".to_string(),
    };
    insta::assert_snapshot!(
        err.to_string(),
        @"CMakeLists.txt:12: 'endwhile' without matching 'endif'"
    );
}

#[test]
fn test_eval_error_display() {
    let err = EvalError::BadArguments {
        command: "add_library".to_string(),
        message: "missing library name".to_string(),
    };
    insta::assert_snapshot!(err.to_string(), @"add_library: missing library name");
}

#[test]
fn test_math_error_display() {
    assert_eq!(MathError::DivZero.to_string(), "division by zero");
    assert_eq!(MathError::Range.to_string(), "value out of range");
    assert_eq!(MathError::InvalidExpr.to_string(), "invalid expression");
}

#[test]
fn test_nobify_error_size() {
    // NobifyError should be reasonably small
    // Box<str> variants (Bailed, Other) are 16 bytes (fat pointer: ptr + len)
    // With discriminant + alignment = 24 bytes
    let size = std::mem::size_of::<NobifyError>();
    assert!(size <= 24, "NobifyError is {size} bytes, expected <= 24");
}

#[test]
fn test_nobify_result_size() {
    // Result<(), NobifyError> should be reasonably small
    let size = std::mem::size_of::<NobifyResult<()>>();
    assert!(size <= 24, "NobifyResult<()> is {size} bytes, expected <= 24");
}

#[test]
fn test_boxed_conversion() {
    fn takes_nobify(err: impl Into<NobifyError>) -> NobifyError {
        err.into()
    }

    let err = takes_nobify(MathError::Range);
    assert!(matches!(err, NobifyError::Math(_)));
}
