// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Diagnostics and their mechanical classification.
//!
//! ```text
//! Diagnostic { severity, component, command, origin, cause, detail }
//!        |
//!    classify(component, cause, severity)
//!        |
//!   code:  Parse | Semantic | Unsupported | WarnLegacy
//!   class: InputError | EngineLimitation | IoEnvError | PolicyConflict
//! ```

use std::fmt;

use crate::parser::ast::Origin;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Recoverable oddity.
    Warning,
    /// Handler-level failure; evaluation continues.
    Error,
    /// Stops evaluation unless `continue_on_fatal_error`.
    Fatal,
}

impl Severity {
    /// Display spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }
}

/// Diagnostic code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagCode {
    /// Malformed input reported by the parser, surfaced verbatim.
    Parse,
    /// Handler-level contract violation.
    Semantic,
    /// Recognized command with unimplemented behavior.
    Unsupported,
    /// Deprecated/ignored input, emitted as warning.
    WarnLegacy,
}

impl DiagCode {
    /// Stable code string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Parse => "EVAL_ERR_PARSE",
            Self::Semantic => "EVAL_ERR_SEMANTIC",
            Self::Unsupported => "EVAL_ERR_UNSUPPORTED",
            Self::WarnLegacy => "EVAL_WARN_LEGACY",
        }
    }
}

/// Derived error class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Parser/lexer origin or user-input semantic violation.
    InputError,
    /// Unsupported/unknown command.
    EngineLimitation,
    /// File/environment trouble.
    IoEnvError,
    /// Policy-related conflict.
    PolicyConflict,
}

impl ErrorClass {
    /// Stable class string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputError => "INPUT_ERROR",
            Self::EngineLimitation => "ENGINE_LIMITATION",
            Self::IoEnvError => "IO_ENV_ERROR",
            Self::PolicyConflict => "POLICY_CONFLICT",
        }
    }
}

/// One diagnostic record pushed to the sink.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// Emitting component (`evaluator`, `parser`, `eval_file`, ...).
    pub component: String,
    /// Command being handled, when applicable.
    pub command: String,
    /// Source location.
    pub origin: Origin,
    /// Short cause.
    pub cause: String,
    /// One-line help string.
    pub detail: String,
    /// Mechanical code.
    pub code: DiagCode,
    /// Mechanical class.
    pub class: ErrorClass,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {} ({}) [{}/{}]",
            self.origin,
            self.severity.as_str(),
            self.cause,
            self.command,
            self.code.as_str(),
            self.class.as_str()
        )
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_ascii_lowercase().contains(&needle.to_ascii_lowercase())
}

/// Mechanical classification from `{component, cause, severity}`.
#[must_use]
pub fn classify(component: &str, cause: &str, severity: Severity) -> (DiagCode, ErrorClass) {
    let mut code = DiagCode::Semantic;
    let mut class = ErrorClass::InputError;

    if component.eq_ignore_ascii_case("parser") || component.eq_ignore_ascii_case("lexer") {
        code = DiagCode::Parse;
        class = ErrorClass::InputError;
    }
    if contains_ci(cause, "unsupported") || contains_ci(cause, "unknown command") {
        code = DiagCode::Unsupported;
        class = ErrorClass::EngineLimitation;
    }
    if contains_ci(cause, "policy") {
        class = ErrorClass::PolicyConflict;
    }
    if component.eq_ignore_ascii_case("eval_file")
        || contains_ci(cause, "failed to read")
        || contains_ci(cause, "security violation")
        || contains_ci(cause, "remote url")
    {
        class = ErrorClass::IoEnvError;
    }
    if severity == Severity::Warning
        && (contains_ci(cause, "legacy")
            || contains_ci(cause, "ignored")
            || contains_ci(cause, "deprecated"))
    {
        code = DiagCode::WarnLegacy;
    }

    (code, class)
}

impl Diagnostic {
    /// Builds a classified diagnostic.
    #[must_use]
    pub fn new(
        severity: Severity,
        component: &str,
        command: &str,
        origin: Origin,
        cause: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        let cause = cause.into();
        let (code, class) = classify(component, &cause, severity);
        Self {
            severity,
            component: component.to_string(),
            command: command.to_string(),
            origin,
            cause,
            detail: detail.into(),
            code,
            class,
        }
    }
}
