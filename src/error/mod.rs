// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!             NobifyError (~24 bytes)
//!                     |
//!   +------+------+---+---+------+------+
//!   |      |      |      |       |      |
//!   v      v      v      v       v      v
//! Bail  Parse  Eval  Model  Effect  Config  Io/Other
//!        Box    Box    Box    Box     Box   Box<str>
//!
//! Sub-errors (unboxed internally):
//!   Parse   UnexpectedToken, UnterminatedString, UnbalancedBlock
//!   Eval    UnknownCommand, BadArguments, FatalDiagnostic
//!   Model   TargetConflict, UnknownTarget, DependencyCycle
//!   Effect  SpawnFailed, NonZeroExit, Timeout, Download
//!   Math    DivZero, Range, InvalidExpr
//!   Genex   Unbalanced, Cycle, CallbackContract
//!
//! All variants boxed => NobifyError fits in 24 bytes.
//! ```

use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type using [`NobifyError`].
pub type NobifyResult<T> = std::result::Result<T, NobifyError>;

/// Top-level application error type.
///
/// All sub-errors are boxed to keep this enum at ~24 bytes on the stack.
#[derive(Debug, Error)]
pub enum NobifyError {
    /// Fatal error that should terminate the application.
    #[error("fatal error: {0}")]
    Bailed(Box<str>),

    /// CMake script could not be lexed or parsed.
    #[error("parse error: {0}")]
    Parse(#[from] Box<ParseError>),

    /// Script evaluation failed.
    #[error("eval error: {0}")]
    Eval(#[from] Box<EvalError>),

    /// Build model constraint violated.
    #[error("model error: {0}")]
    Model(#[from] Box<ModelError>),

    /// Effect (process / fs / toolchain) failed.
    #[error("effect error: {0}")]
    Effect(#[from] Box<EffectError>),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] Box<ConfigError>),

    /// Math expression error.
    #[error("math error: {0}")]
    Math(#[from] Box<MathError>),

    /// Generator expression error.
    #[error("generator expression error: {0}")]
    Genex(#[from] Box<GenexError>),

    /// I/O error.
    #[error("io error: {0}")]
    Io(Box<std::io::Error>),

    /// Generic error with message.
    #[error("{0}")]
    Other(Box<str>),
}

/// Create a fatal [`NobifyError::Bailed`] that terminates the application.
pub fn bail_out(message: impl Into<String>) -> NobifyError {
    NobifyError::Bailed(message.into().into_boxed_str())
}

// --- From implementations for boxing ---

/// Macro to generate `From` implementations that box the source error.
macro_rules! impl_from_boxed {
    ($($error:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$error> for NobifyError {
                fn from(err: $error) -> Self {
                    NobifyError::$variant(Box::new(err))
                }
            }
        )+
    };
}

impl_from_boxed! {
    ParseError => Parse,
    EvalError => Eval,
    ModelError => Model,
    EffectError => Effect,
    ConfigError => Config,
    MathError => Math,
    GenexError => Genex,
    std::io::Error => Io,
}

// --- Parse Errors ---

/// Lexing and parsing errors for CMake scripts.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Unexpected character in the input stream.
    #[error("{file}:{line}: unexpected character '{found}'")]
    UnexpectedToken { file: String, line: u32, found: char },

    /// A quoted argument has no closing quote.
    #[error("{file}:{line}: unterminated quoted argument")]
    UnterminatedString { file: String, line: u32 },

    /// A bracket argument or bracket comment has no closing bracket.
    #[error("{file}:{line}: unterminated bracket of length {level}")]
    UnterminatedBracket { file: String, line: u32, level: usize },

    /// A command invocation has no closing parenthesis.
    #[error("{file}:{line}: missing ')' for command '{command}'")]
    UnbalancedParen {
        file: String,
        line: u32,
        command: String,
    },

    /// A block terminator does not match its opener.
    #[error("{file}:{line}: '{found}' without matching '{expected}'")]
    UnbalancedBlock {
        file: String,
        line: u32,
        expected: String,
        found: String,
    },

    /// End of file reached inside an open block.
    #[error("{file}: end of file while looking for '{expected}'")]
    UnexpectedEof { file: String, expected: String },
}

// --- Eval Errors ---

/// Script evaluation errors.
#[derive(Debug, Error)]
pub enum EvalError {
    /// Command was not recognized and no user function/macro matched.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// Handler-level contract violation (missing argument, bad combination).
    #[error("{command}: {message}")]
    BadArguments { command: String, message: String },

    /// Evaluation stopped on the first FATAL diagnostic.
    #[error("fatal diagnostic: {cause} ({file}:{line})")]
    FatalDiagnostic {
        cause: String,
        file: String,
        line: u32,
    },

    /// A mandatory `include()` could not be resolved.
    #[error("include file not found: {0}")]
    IncludeNotFound(String),
}

// --- Model Errors ---

/// Build model errors.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A target was redeclared with an incompatible kind.
    #[error("target '{name}' already exists with a different kind")]
    TargetConflict { name: String },

    /// A dependency or link library names a target that does not exist.
    #[error("target '{referrer}' references unknown target '{name}'")]
    UnknownTarget { referrer: String, name: String },

    /// The dependency graph is cyclic.
    #[error("dependency cycle involving target '{name}'")]
    DependencyCycle { name: String },
}

// --- Effect Errors ---

/// Effect layer errors (process execution, filesystem, toolchain, download).
#[derive(Debug, Error)]
pub enum EffectError {
    /// Request was structurally invalid.
    #[error("invalid effect request: {0}")]
    InvalidInput(String),

    /// Failed to spawn process.
    #[error("failed to spawn process '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Process exited with non-zero status.
    #[error("process '{command}' exited with code {code}")]
    NonZeroExit { command: String, code: i32 },

    /// Process timed out.
    #[error("process '{command}' timed out after {timeout_ms} ms")]
    Timeout { command: String, timeout_ms: u64 },

    /// Download failed.
    #[error("download failed: {url} - {message}")]
    Download { url: String, message: String },

    /// HTTP error response.
    #[error("http error {status}: {url}")]
    HttpError { status: u16, url: String },

    /// URL scheme that no fetcher handles.
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    /// I/O error inside an effect.
    #[error("I/O error on '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },

    /// Missing required configuration key.
    #[error("missing required config key '{key}' in section '[{section}]'")]
    MissingKey { section: String, key: String },

    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },

    /// Configuration file not found.
    #[error("config file not found: {0}")]
    NotFound(String),
}

// --- Math Errors ---

/// Typed errors from the `math()` expression evaluator.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    /// Division or remainder with zero divisor.
    #[error("division by zero")]
    DivZero,

    /// Result not representable (`i64::MIN / -1`, literal overflow).
    #[error("value out of range")]
    Range,

    /// Malformed expression or trailing garbage.
    #[error("invalid expression")]
    InvalidExpr,
}

// --- Genex Errors ---

/// Generator expression evaluation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenexError {
    /// `$<` without a matching `>`.
    #[error("unbalanced generator expression in '{0}'")]
    Unbalanced(String),

    /// Re-entered a (target, property) pair while recursing.
    #[error("cycle while evaluating TARGET_PROPERTY {target}.{property}")]
    Cycle { target: String, property: String },

    /// Recursion or stack depth bound exceeded.
    #[error("generator expression depth limit {limit} exceeded")]
    DepthExceeded { limit: usize },

    /// A host callback violated the value-size or non-null contract.
    #[error("callback contract violation: {0}")]
    CallbackContract(String),

    /// Recognized expression with arguments that do not fit its arity.
    #[error("bad generator expression '{op}': {message}")]
    BadExpression { op: String, message: String },

    /// Operator is not part of the supported set.
    #[error("unsupported generator expression operator '{0}'")]
    Unsupported(String),
}

#[cfg(test)]
mod tests;
