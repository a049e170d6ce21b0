// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! `if()`-language condition evaluator.
//!
//! ```text
//! precedence (low -> high):
//!   OR   AND   NOT   comparators   ( )
//!
//! comparators: STREQUAL STRLESS[_EQUAL] STRGREATER[_EQUAL]
//!              EQUAL LESS GREATER LESS_EQUAL GREATER_EQUAL
//!              VERSION_EQUAL VERSION_LESS[_EQUAL] VERSION_GREATER[_EQUAL]
//!              MATCHES IN_LIST
//! unary:       NOT DEFINED COMMAND TARGET
//!              EXISTS IS_DIRECTORY IS_ABSOLUTE IS_SYMLINK
//!
//! quoted arguments are never operators and never re-resolved
//! ```

use std::path::Path;

/// One expanded condition token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CondToken {
    /// Expanded text.
    pub text: String,
    /// Written quoted in the source; quoted tokens stay literal.
    pub quoted: bool,
}

impl CondToken {
    /// Build an unquoted token.
    pub fn bare(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: false,
        }
    }

    /// Build a quoted token.
    pub fn quoted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: true,
        }
    }
}

/// State the condition language reads (and, for `MATCHES`, writes).
pub trait LogicHost {
    /// Current-scope variable lookup.
    fn variable(&self, name: &str) -> Option<String>;
    /// Shadow-environment lookup.
    fn env_var(&self, name: &str) -> Option<String>;
    /// Cache entry lookup.
    fn cache_var(&self, name: &str) -> Option<String>;
    /// True if a built-in or user command with this name exists.
    fn is_command(&self, name: &str) -> bool;
    /// True if a build target with this name exists.
    fn is_target(&self, name: &str) -> bool;
    /// Store a `CMAKE_MATCH_<n>` result after `MATCHES`.
    fn set_match_var(&mut self, name: &str, value: String);
}

/// Evaluates an `if()`/`while()` condition.
///
/// # Errors
///
/// Returns a message describing the malformed expression (dangling
/// operator, missing operand, bad regex, unbalanced parenthesis).
pub fn eval_condition(
    tokens: &[CondToken],
    host: &mut dyn LogicHost,
) -> Result<bool, String> {
    let mut parser = CondParser {
        tokens,
        pos: 0,
        host,
    };
    let value = parser.parse_or()?;
    if parser.pos < parser.tokens.len() {
        return Err(format!(
            "unexpected token '{}' after condition",
            parser.tokens[parser.pos].text
        ));
    }
    Ok(value)
}

/// True and false constants of the language, shared with `genex` `$<BOOL:>`.
#[must_use]
pub fn is_false_constant(value: &str) -> bool {
    if value.is_empty() {
        return false_word(value);
    }
    if let Ok(num) = value.parse::<f64>() {
        return num == 0.0;
    }
    false_word(value)
}

fn false_word(value: &str) -> bool {
    value.is_empty()
        || value.eq_ignore_ascii_case("FALSE")
        || value.eq_ignore_ascii_case("OFF")
        || value.eq_ignore_ascii_case("NO")
        || value.eq_ignore_ascii_case("N")
        || value.eq_ignore_ascii_case("IGNORE")
        || value.eq_ignore_ascii_case("NOTFOUND")
        || value.len() >= 9 && value[value.len() - 9..].eq_ignore_ascii_case("-NOTFOUND")
}

fn is_true_constant(value: &str) -> bool {
    if value.eq_ignore_ascii_case("ON")
        || value.eq_ignore_ascii_case("YES")
        || value.eq_ignore_ascii_case("TRUE")
        || value.eq_ignore_ascii_case("Y")
    {
        return true;
    }
    value.parse::<f64>().is_ok_and(|num| num != 0.0)
}

struct CondParser<'a> {
    tokens: &'a [CondToken],
    pos: usize,
    host: &'a mut dyn LogicHost,
}

impl CondParser<'_> {
    fn peek(&self) -> Option<&CondToken> {
        self.tokens.get(self.pos)
    }

    /// True when the next token is the given bare keyword. Quoted tokens
    /// are never keywords.
    fn at_keyword(&self, keyword: &str) -> bool {
        self.peek()
            .is_some_and(|t| !t.quoted && t.text == keyword)
    }

    fn take(&mut self) -> Result<&CondToken, String> {
        let token = self
            .tokens
            .get(self.pos)
            .ok_or_else(|| "missing operand".to_string())?;
        self.pos += 1;
        Ok(token)
    }

    fn parse_or(&mut self) -> Result<bool, String> {
        let mut lhs = self.parse_and()?;
        while self.at_keyword("OR") {
            self.pos += 1;
            let rhs = self.parse_and()?;
            lhs = lhs || rhs;
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<bool, String> {
        let mut lhs = self.parse_not()?;
        while self.at_keyword("AND") {
            self.pos += 1;
            let rhs = self.parse_not()?;
            lhs = lhs && rhs;
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<bool, String> {
        if self.at_keyword("NOT") {
            self.pos += 1;
            return Ok(!self.parse_not()?);
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<bool, String> {
        if self.at_keyword("(") {
            self.pos += 1;
            let value = self.parse_or()?;
            if !self.at_keyword(")") {
                return Err("missing ')' in condition".to_string());
            }
            self.pos += 1;
            return Ok(value);
        }

        if let Some(result) = self.try_unary_predicate()? {
            return Ok(result);
        }

        let lhs_token = self.take()?.clone();

        let Some(op) = self.peek().filter(|t| !t.quoted).map(|t| t.text.clone()) else {
            return Ok(self.token_truth(&lhs_token));
        };
        if !is_comparator(&op) {
            return Ok(self.token_truth(&lhs_token));
        }
        self.pos += 1;
        let rhs_token = self.take()?.clone();

        let lhs = self.resolve(&lhs_token);
        let rhs = self.resolve(&rhs_token);

        match op.as_str() {
            "STREQUAL" => Ok(lhs == rhs),
            "STRLESS" => Ok(lhs < rhs),
            "STRLESS_EQUAL" => Ok(lhs <= rhs),
            "STRGREATER" => Ok(lhs > rhs),
            "STRGREATER_EQUAL" => Ok(lhs >= rhs),
            "EQUAL" => Ok(numeric_cmp(&lhs, &rhs).is_some_and(std::cmp::Ordering::is_eq)),
            "LESS" => Ok(numeric_cmp(&lhs, &rhs).is_some_and(std::cmp::Ordering::is_lt)),
            "GREATER" => Ok(numeric_cmp(&lhs, &rhs).is_some_and(std::cmp::Ordering::is_gt)),
            "LESS_EQUAL" => Ok(numeric_cmp(&lhs, &rhs).is_some_and(std::cmp::Ordering::is_le)),
            "GREATER_EQUAL" => Ok(numeric_cmp(&lhs, &rhs).is_some_and(std::cmp::Ordering::is_ge)),
            "VERSION_EQUAL" => Ok(version_cmp(&lhs, &rhs).is_eq()),
            "VERSION_LESS" => Ok(version_cmp(&lhs, &rhs).is_lt()),
            "VERSION_LESS_EQUAL" => Ok(version_cmp(&lhs, &rhs).is_le()),
            "VERSION_GREATER" => Ok(version_cmp(&lhs, &rhs).is_gt()),
            "VERSION_GREATER_EQUAL" => Ok(version_cmp(&lhs, &rhs).is_ge()),
            "MATCHES" => self.regex_match(&lhs, &rhs),
            "IN_LIST" => {
                let list = self.host.variable(&rhs_token.text).unwrap_or_default();
                Ok(list.split(';').any(|item| item == lhs))
            }
            _ => Err(format!("unknown comparator '{op}'")),
        }
    }

    /// `DEFINED x` / `EXISTS p` / ... Returns `Ok(None)` when the cursor
    /// is not on a unary predicate.
    fn try_unary_predicate(&mut self) -> Result<Option<bool>, String> {
        let Some(op) = self.peek().filter(|t| !t.quoted).map(|t| t.text.clone()) else {
            return Ok(None);
        };
        let result = match op.as_str() {
            "DEFINED" => {
                self.pos += 1;
                let arg = self.take()?.text.clone();
                self.defined(&arg)
            }
            "COMMAND" => {
                self.pos += 1;
                let arg = self.take()?.text.clone();
                self.host.is_command(&arg)
            }
            "TARGET" => {
                self.pos += 1;
                let arg = self.take()?.text.clone();
                self.host.is_target(&arg)
            }
            "EXISTS" => {
                self.pos += 1;
                let arg = self.resolve_owned()?;
                !arg.is_empty() && Path::new(&arg).exists()
            }
            "IS_DIRECTORY" => {
                self.pos += 1;
                let arg = self.resolve_owned()?;
                Path::new(&arg).is_dir()
            }
            "IS_ABSOLUTE" => {
                self.pos += 1;
                let arg = self.resolve_owned()?;
                is_absolute_path(&arg)
            }
            "IS_SYMLINK" => {
                self.pos += 1;
                let arg = self.resolve_owned()?;
                Path::new(&arg).is_symlink()
            }
            _ => return Ok(None),
        };
        Ok(Some(result))
    }

    fn defined(&self, raw: &str) -> bool {
        if let Some(name) = raw.strip_prefix("ENV{").and_then(|r| r.strip_suffix('}')) {
            return self.host.env_var(name).is_some();
        }
        if let Some(name) = raw.strip_prefix("CACHE{").and_then(|r| r.strip_suffix('}')) {
            return self.host.cache_var(name).is_some();
        }
        self.host.variable(raw).is_some()
    }

    fn regex_match(&mut self, value: &str, pattern: &str) -> Result<bool, String> {
        let re = regex::Regex::new(pattern)
            .map_err(|e| format!("invalid MATCHES regex '{pattern}': {e}"))?;
        let Some(caps) = re.captures(value) else {
            self.host.set_match_var("CMAKE_MATCH_0", String::new());
            return Ok(false);
        };
        for i in 0..caps.len().min(10) {
            let text = caps.get(i).map_or("", |m| m.as_str());
            self.host
                .set_match_var(&format!("CMAKE_MATCH_{i}"), text.to_string());
        }
        Ok(true)
    }

    /// Comparison operand: quoted stays literal, unquoted resolves through
    /// the variable scopes and falls back to the literal text.
    fn resolve(&self, token: &CondToken) -> String {
        if token.quoted {
            return token.text.clone();
        }
        self.host
            .variable(&token.text)
            .unwrap_or_else(|| token.text.clone())
    }

    fn resolve_owned(&mut self) -> Result<String, String> {
        let token = self.take()?.clone();
        Ok(self.resolve(&token))
    }

    /// Truthiness of a lone token: constants first, then variable lookup.
    fn token_truth(&self, token: &CondToken) -> bool {
        if token.quoted {
            return is_true_constant(&token.text);
        }
        if is_true_constant(&token.text) {
            return true;
        }
        if false_word(&token.text) {
            return false;
        }
        self.host
            .variable(&token.text)
            .is_some_and(|value| !is_false_constant(&value))
    }
}

fn is_comparator(op: &str) -> bool {
    matches!(
        op,
        "STREQUAL"
            | "STRLESS"
            | "STRLESS_EQUAL"
            | "STRGREATER"
            | "STRGREATER_EQUAL"
            | "EQUAL"
            | "LESS"
            | "GREATER"
            | "LESS_EQUAL"
            | "GREATER_EQUAL"
            | "VERSION_EQUAL"
            | "VERSION_LESS"
            | "VERSION_LESS_EQUAL"
            | "VERSION_GREATER"
            | "VERSION_GREATER_EQUAL"
            | "MATCHES"
            | "IN_LIST"
    )
}

fn numeric_cmp(lhs: &str, rhs: &str) -> Option<std::cmp::Ordering> {
    let a: f64 = lhs.trim().parse().ok()?;
    let b: f64 = rhs.trim().parse().ok()?;
    a.partial_cmp(&b)
}

/// Compares dot-separated integer versions; shorter versions are
/// zero-padded, so `3.27 < 3.28.0`.
#[must_use]
pub fn version_cmp(lhs: &str, rhs: &str) -> std::cmp::Ordering {
    let parse = |s: &str| -> Vec<u64> {
        s.split('.')
            .map(|part| {
                let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
                digits.parse().unwrap_or(0)
            })
            .collect()
    };
    let a = parse(lhs);
    let b = parse(rhs);
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            std::cmp::Ordering::Equal => {}
            other => return other,
        }
    }
    std::cmp::Ordering::Equal
}

/// Absolute-path predicate that also recognizes Windows drive letters and
/// UNC paths regardless of host.
fn is_absolute_path(path: &str) -> bool {
    if path.starts_with('/') || path.starts_with("\\\\") {
        return true;
    }
    let bytes = path.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'/' || bytes[2] == b'\\')
}
