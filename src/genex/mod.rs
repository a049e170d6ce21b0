// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Generator expression (`$<...>`) evaluator.
//!
//! ```text
//! eval(ctx, "a$<IF:$<CONFIG:Debug>,x,y>b")
//!        |
//!   scan literal text, find unescaped $<...>, recurse on bodies
//!        |
//!   ops: CONFIG PLATFORM_ID COMPILE_LANGUAGE
//!        BUILD_INTERFACE INSTALL_INTERFACE LINK_ONLY
//!        TARGET_FILE[_DIR|_NAME] TARGET_LINKER_FILE[_DIR|_NAME]
//!        BOOL IF TARGET_PROPERTY ANGLE-R COMMA SEMICOLON
//!        $<cond:value> shorthand (cond is a nested genex or 0/1)
//!
//! cycle guard: explicit (target, property) stack, bounded depth
//! ```

#[cfg(test)]
mod tests;

use crate::error::GenexError;
use crate::expr::logic::is_false_constant;

/// Default bound for callback-returned values (1 MiB).
const DEFAULT_MAX_VALUE_LEN: usize = 1024 * 1024;
/// Default recursion and property-stack bounds.
const DEFAULT_MAX_DEPTH: usize = 64;

/// Host-side lookups the evaluator needs for `TARGET_*` expressions.
///
/// Returned values longer than the per-context maximum are rejected as a
/// contract violation.
pub trait TargetSource {
    /// Property value of a target, `None` when unset or unknown target.
    fn read_target_property(&self, target: &str, property: &str) -> Option<String>;
    /// Path of the target's primary artifact.
    fn read_target_file(&self, target: &str) -> Option<String>;
    /// Path of the artifact the linker consumes (import lib on Windows).
    fn read_target_linker_file(&self, target: &str) -> Option<String>;
}

/// Evaluation context. `'a` borrows the build model behind
/// [`TargetSource`].
pub struct GenexContext<'a> {
    /// Active configuration (`CMAKE_BUILD_TYPE`).
    pub config: &'a str,
    /// Platform identifier (`Linux`, `Windows`, `Darwin`, ...).
    pub platform_id: &'a str,
    /// Language of the current compile unit; empty outside compile steps.
    pub compile_language: &'a str,
    /// Target the expression is attached to; empty outside target context.
    pub current_target: &'a str,
    /// `$<LINK_ONLY:...>` passes its content through when set.
    pub link_only_active: bool,
    /// `$<BUILD_INTERFACE:...>` passes its content through when set.
    pub build_interface_active: bool,
    /// `$<INSTALL_INTERFACE:...>` passes its content through when set.
    pub install_interface_active: bool,
    /// Callbacks into the build model.
    pub source: &'a dyn TargetSource,
    /// Bound for callback-returned values; 0 means the 1 MiB default.
    pub max_value_len: usize,
    /// Recursion bound; 0 means the default of 64.
    pub max_depth: usize,
    /// `TARGET_PROPERTY` stack bound; 0 means the default of 64.
    pub max_property_depth: usize,
}

impl<'a> GenexContext<'a> {
    /// Context with default bounds and no active interface scopes.
    #[must_use]
    pub fn new(source: &'a dyn TargetSource, config: &'a str, platform_id: &'a str) -> Self {
        Self {
            config,
            platform_id,
            compile_language: "",
            current_target: "",
            link_only_active: false,
            build_interface_active: true,
            install_interface_active: false,
            source,
            max_value_len: DEFAULT_MAX_VALUE_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
            max_property_depth: DEFAULT_MAX_DEPTH,
        }
    }

    fn value_len_bound(&self) -> usize {
        if self.max_value_len == 0 {
            DEFAULT_MAX_VALUE_LEN
        } else {
            self.max_value_len
        }
    }

    fn depth_bound(&self) -> usize {
        if self.max_depth == 0 {
            DEFAULT_MAX_DEPTH
        } else {
            self.max_depth
        }
    }

    fn property_depth_bound(&self) -> usize {
        if self.max_property_depth == 0 {
            DEFAULT_MAX_DEPTH
        } else {
            self.max_property_depth
        }
    }
}

/// Evaluates every generator expression in `input`, leaving literal text
/// untouched.
///
/// # Errors
///
/// [`GenexError::Unbalanced`] for an unclosed `$<`,
/// [`GenexError::Cycle`] when `TARGET_PROPERTY` re-enters a pair on the
/// guard stack, [`GenexError::DepthExceeded`] past the recursion bound,
/// [`GenexError::CallbackContract`] for oversized callback values, and
/// [`GenexError::Unsupported`] for unknown operators.
pub fn eval(ctx: &GenexContext<'_>, input: &str) -> Result<String, GenexError> {
    let mut stack = Vec::new();
    eval_inner(ctx, input, 0, &mut stack)
}

/// True when the string holds an unescaped `$<`.
#[must_use]
pub fn contains_genex(input: &str) -> bool {
    find_open(input.as_bytes(), 0).is_some()
}

fn eval_inner(
    ctx: &GenexContext<'_>,
    input: &str,
    depth: usize,
    stack: &mut Vec<(String, String)>,
) -> Result<String, GenexError> {
    if depth > ctx.depth_bound() {
        return Err(GenexError::DepthExceeded {
            limit: ctx.depth_bound(),
        });
    }

    let bytes = input.as_bytes();
    let Some(mut open) = find_open(bytes, 0) else {
        return Ok(input.to_string());
    };

    let mut out = String::with_capacity(input.len());
    let mut cursor = 0;
    loop {
        out.push_str(&input[cursor..open]);

        let close = find_matching_end(bytes, open)
            .ok_or_else(|| GenexError::Unbalanced(input.to_string()))?;
        let body = &input[open + 2..close];
        out.push_str(&eval_body(ctx, body, depth, stack)?);

        cursor = close + 1;
        match find_open(bytes, cursor) {
            Some(next) => open = next,
            None => {
                out.push_str(&input[cursor..]);
                return Ok(out);
            }
        }
    }
}

fn eval_body(
    ctx: &GenexContext<'_>,
    body: &str,
    depth: usize,
    stack: &mut Vec<(String, String)>,
) -> Result<String, GenexError> {
    let (op, args) = split_op(body);

    if op.eq_ignore_ascii_case("CONFIG") {
        return match args {
            None => Ok(ctx.config.to_string()),
            Some(list) => Ok(match_any(ctx, list, ctx.config, depth, stack)?),
        };
    }

    if op.eq_ignore_ascii_case("PLATFORM_ID") {
        return match args {
            None => Ok(ctx.platform_id.to_string()),
            Some(list) => Ok(match_any(ctx, list, ctx.platform_id, depth, stack)?),
        };
    }

    if op.eq_ignore_ascii_case("COMPILE_LANGUAGE") {
        return match args {
            None => Ok(ctx.compile_language.to_string()),
            Some(_) if ctx.compile_language.is_empty() => Ok("0".to_string()),
            Some(list) => Ok(match_any(ctx, list, ctx.compile_language, depth, stack)?),
        };
    }

    if op.eq_ignore_ascii_case("BUILD_INTERFACE") {
        let content = args.unwrap_or("");
        if !ctx.build_interface_active {
            return Ok(String::new());
        }
        return eval_inner(ctx, content, depth + 1, stack);
    }

    if op.eq_ignore_ascii_case("INSTALL_INTERFACE") {
        let content = args.unwrap_or("");
        if !ctx.install_interface_active {
            return Ok(String::new());
        }
        return eval_inner(ctx, content, depth + 1, stack);
    }

    if op.eq_ignore_ascii_case("LINK_ONLY") {
        let content = args.unwrap_or("");
        if !ctx.link_only_active {
            return Ok(String::new());
        }
        return eval_inner(ctx, content, depth + 1, stack);
    }

    if op.eq_ignore_ascii_case("TARGET_FILE")
        || op.eq_ignore_ascii_case("TARGET_FILE_DIR")
        || op.eq_ignore_ascii_case("TARGET_FILE_NAME")
    {
        let target = target_arg(ctx, args, depth, stack)?;
        if target.is_empty() {
            return Ok(String::new());
        }
        let path = ctx.source.read_target_file(&target).unwrap_or_default();
        validate_value(ctx, op, &path)?;
        return Ok(select_path_part(op, &path));
    }

    if op.eq_ignore_ascii_case("TARGET_LINKER_FILE")
        || op.eq_ignore_ascii_case("TARGET_LINKER_FILE_DIR")
        || op.eq_ignore_ascii_case("TARGET_LINKER_FILE_NAME")
    {
        let target = target_arg(ctx, args, depth, stack)?;
        if target.is_empty() {
            return Ok(String::new());
        }
        let path = ctx
            .source
            .read_target_linker_file(&target)
            .unwrap_or_default();
        validate_value(ctx, op, &path)?;
        return Ok(select_path_part(op, &path));
    }

    if op.eq_ignore_ascii_case("BOOL") {
        let value = eval_inner(ctx, args.unwrap_or(""), depth + 1, stack)?;
        return Ok(if is_false_constant(&value) { "0" } else { "1" }.to_string());
    }

    if op.eq_ignore_ascii_case("IF") {
        let parts = split_top_level(args.unwrap_or(""), b',');
        if parts.len() != 3 {
            return Err(GenexError::BadExpression {
                op: op.to_string(),
                message: "IF expects 3 arguments".to_string(),
            });
        }
        let cond = eval_inner(ctx, parts[0], depth + 1, stack)?;
        let branch = if is_false_constant(&cond) {
            parts[2]
        } else {
            parts[1]
        };
        return eval_inner(ctx, branch, depth + 1, stack);
    }

    if op.eq_ignore_ascii_case("TARGET_PROPERTY") {
        return eval_target_property(ctx, op, args, depth, stack);
    }

    // Literal ops.
    if op.eq_ignore_ascii_case("ANGLE-R") && args.is_none() {
        return Ok(">".to_string());
    }
    if op.eq_ignore_ascii_case("COMMA") && args.is_none() {
        return Ok(",".to_string());
    }
    if op.eq_ignore_ascii_case("SEMICOLON") && args.is_none() {
        return Ok(";".to_string());
    }

    // `$<$<...>>`: nested expression used as the whole body.
    if args.is_none() && op.starts_with("$<") && op.ends_with('>') {
        return eval_inner(ctx, op, depth + 1, stack);
    }

    // Condition shorthand `$<cond:value>`: cond is a nested genex or the
    // literal 0/1 left behind by one.
    if let Some(value) = args
        && (contains_genex(op) || op == "0" || op == "1")
    {
        let cond = eval_inner(ctx, op, depth + 1, stack)?;
        if is_false_constant(&cond) {
            return Ok(String::new());
        }
        return eval_inner(ctx, value, depth + 1, stack);
    }

    Err(GenexError::Unsupported(op.to_string()))
}

fn eval_target_property(
    ctx: &GenexContext<'_>,
    op: &str,
    args: Option<&str>,
    depth: usize,
    stack: &mut Vec<(String, String)>,
) -> Result<String, GenexError> {
    let args_expr = args.unwrap_or("");
    let parts = split_top_level(args_expr, b',');
    if args_expr.is_empty() || parts.len() > 2 {
        return Err(GenexError::BadExpression {
            op: op.to_string(),
            message: "TARGET_PROPERTY expects property or target,property".to_string(),
        });
    }

    let (target, property) = if parts.len() == 1 {
        let property = eval_inner(ctx, parts[0], depth + 1, stack)?;
        if ctx.current_target.is_empty() {
            return Err(GenexError::BadExpression {
                op: op.to_string(),
                message: "implicit form requires current target context".to_string(),
            });
        }
        (ctx.current_target.to_string(), property.trim().to_string())
    } else {
        let target = eval_inner(ctx, parts[0], depth + 1, stack)?;
        let property = eval_inner(ctx, parts[1], depth + 1, stack)?;
        (target.trim().to_string(), property.trim().to_string())
    };

    if target.is_empty() || property.is_empty() {
        return Ok(String::new());
    }
    if stack.len() >= ctx.property_depth_bound() {
        return Err(GenexError::DepthExceeded {
            limit: ctx.property_depth_bound(),
        });
    }
    if stack
        .iter()
        .any(|(t, p)| t.eq_ignore_ascii_case(&target) && p.eq_ignore_ascii_case(&property))
    {
        return Err(GenexError::Cycle {
            target,
            property,
        });
    }

    let raw = ctx
        .source
        .read_target_property(&target, &property)
        .unwrap_or_default();
    validate_value(ctx, op, &raw)?;

    stack.push((target, property));
    let nested = eval_inner(ctx, &raw, depth + 1, stack);
    stack.pop();
    nested
}

/// `$<CONFIG:A,B>`-style membership test against comma-separated entries.
fn match_any(
    ctx: &GenexContext<'_>,
    list: &str,
    value: &str,
    depth: usize,
    stack: &mut Vec<(String, String)>,
) -> Result<String, GenexError> {
    for part in split_top_level(list, b',') {
        let candidate = eval_inner(ctx, part, depth + 1, stack)?;
        if candidate.eq_ignore_ascii_case(value) && !value.is_empty() {
            return Ok("1".to_string());
        }
    }
    Ok("0".to_string())
}

/// Target argument of `TARGET_FILE`-family ops: explicit, or the current
/// target when omitted.
fn target_arg(
    ctx: &GenexContext<'_>,
    args: Option<&str>,
    depth: usize,
    stack: &mut Vec<(String, String)>,
) -> Result<String, GenexError> {
    match args {
        Some(expr) if !expr.is_empty() => {
            Ok(eval_inner(ctx, expr, depth + 1, stack)?.trim().to_string())
        }
        _ => Ok(ctx.current_target.trim().to_string()),
    }
}

fn validate_value(ctx: &GenexContext<'_>, op: &str, value: &str) -> Result<(), GenexError> {
    if value.len() > ctx.value_len_bound() {
        return Err(GenexError::CallbackContract(format!(
            "{op} callback returned an invalid or too large value"
        )));
    }
    Ok(())
}

fn select_path_part(op: &str, path: &str) -> String {
    if op.len() > "TARGET_FILE".len() || op.len() > "TARGET_LINKER_FILE".len() {
        if op.to_ascii_uppercase().ends_with("_DIR") {
            return path_dirname(path).to_string();
        }
        if op.to_ascii_uppercase().ends_with("_NAME") {
            return path_basename(path).to_string();
        }
    }
    path.to_string()
}

fn path_dirname(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(0) => &path[..1],
        Some(idx) => &path[..idx],
        None => "",
    }
}

fn path_basename(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Finds the next unescaped `$<` at or after `from`.
fn find_open(bytes: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    while i + 1 < bytes.len() {
        if bytes[i] == b'$' && bytes[i + 1] == b'<' && !is_escaped(bytes, i) {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// True when an odd number of backslashes directly precedes `pos`.
fn is_escaped(bytes: &[u8], pos: usize) -> bool {
    let mut backslashes = 0;
    let mut i = pos;
    while i > 0 && bytes[i - 1] == b'\\' {
        backslashes += 1;
        i -= 1;
    }
    backslashes % 2 == 1
}

/// Index of the `>` matching the `$<` at `open`, honoring nesting.
fn find_matching_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 1;
    let mut i = open + 2;
    while i < bytes.len() {
        if bytes[i] == b'$' && i + 1 < bytes.len() && bytes[i + 1] == b'<' && !is_escaped(bytes, i)
        {
            depth += 1;
            i += 2;
            continue;
        }
        if bytes[i] == b'>' && !is_escaped(bytes, i) {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// Splits the body into operator and argument expression at the first
/// top-level `:`.
fn split_op(body: &str) -> (&str, Option<&str>) {
    split_top_level_once(body, b':')
        .map_or((body, None), |(op, args)| (op, Some(args)))
}

fn split_top_level_once(input: &str, sep: u8) -> Option<(&str, &str)> {
    let bytes = input.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' && i + 1 < bytes.len() && bytes[i + 1] == b'<' && !is_escaped(bytes, i)
        {
            depth += 1;
            i += 2;
            continue;
        }
        match bytes[i] {
            b'>' if depth > 0 && !is_escaped(bytes, i) => depth -= 1,
            c if c == sep && depth == 0 && !is_escaped(bytes, i) => {
                return Some((&input[..i], &input[i + 1..]));
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Splits on every top-level separator, honoring nesting and escapes.
fn split_top_level(input: &str, sep: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = input;
    while let Some((head, tail)) = split_top_level_once(rest, sep) {
        parts.push(head);
        rest = tail;
    }
    parts.push(rest);
    parts
}
