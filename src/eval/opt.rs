// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Declarative argument option parser shared by command handlers.
//!
//! ```text
//! specs: [("OPTIONAL", Flag), ("RESULT_VARIABLE", Single),
//!         ("COMMAND", Multi), ...]
//!        |
//! parse_opts(args, start, specs)
//!        |
//! ParsedOpts { flags, values, positionals }
//!   .has("OPTIONAL")  .one("RESULT_VARIABLE")  .many("COMMAND")
//! ```
//!
//! Keywords match case-insensitively; a `Multi` keyword swallows tokens
//! until the next keyword; repeated keywords accumulate.

use std::collections::{BTreeMap, BTreeSet};

/// Option arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptKind {
    /// Presence only.
    Flag,
    /// Exactly one following value.
    Single,
    /// Zero or one following value.
    OptionalSingle,
    /// Every token up to the next keyword.
    Multi,
}

/// One option specification.
#[derive(Debug, Clone, Copy)]
pub struct OptSpec {
    /// Keyword as written in scripts.
    pub name: &'static str,
    /// Arity.
    pub kind: OptKind,
}

impl OptSpec {
    /// Shorthand constructor.
    #[must_use]
    pub const fn new(name: &'static str, kind: OptKind) -> Self {
        Self { name, kind }
    }
}

/// Parse result with keyword-indexed access.
#[derive(Debug, Clone, Default)]
pub struct ParsedOpts {
    flags: BTreeSet<String>,
    values: BTreeMap<String, Vec<String>>,
    positionals: Vec<String>,
}

impl ParsedOpts {
    /// Keyword was present (any arity).
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        let key = name.to_ascii_uppercase();
        self.flags.contains(&key) || self.values.contains_key(&key)
    }

    /// First value of a `Single`/`OptionalSingle` keyword.
    #[must_use]
    pub fn one(&self, name: &str) -> Option<&str> {
        self.values
            .get(&name.to_ascii_uppercase())
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// All values accumulated for a keyword.
    #[must_use]
    pub fn many(&self, name: &str) -> &[String] {
        self.values
            .get(&name.to_ascii_uppercase())
            .map_or(&[], Vec::as_slice)
    }

    /// Tokens not owned by any keyword, in order.
    #[must_use]
    pub fn positionals(&self) -> &[String] {
        &self.positionals
    }
}

fn find_spec<'s>(specs: &'s [OptSpec], token: &str) -> Option<&'s OptSpec> {
    specs.iter().find(|spec| spec.name.eq_ignore_ascii_case(token))
}

/// True when `token` is one of the declared keywords.
#[must_use]
pub fn is_keyword(specs: &[OptSpec], token: &str) -> bool {
    find_spec(specs, token).is_some()
}

/// Walks `args[start..]` against the specs.
///
/// # Errors
///
/// Returns a message naming the keyword when a `Single` option has no
/// following value.
pub fn parse_opts(
    args: &[String],
    start: usize,
    specs: &[OptSpec],
) -> Result<ParsedOpts, String> {
    let mut parsed = ParsedOpts::default();
    let mut i = start;

    while i < args.len() {
        let token = &args[i];
        let Some(spec) = find_spec(specs, token) else {
            parsed.positionals.push(token.clone());
            i += 1;
            continue;
        };
        let key = spec.name.to_ascii_uppercase();
        i += 1;

        match spec.kind {
            OptKind::Flag => {
                parsed.flags.insert(key);
            }
            OptKind::Single => {
                if i >= args.len() {
                    return Err(format!("missing value after {}", spec.name));
                }
                parsed.values.entry(key).or_default().push(args[i].clone());
                i += 1;
            }
            OptKind::OptionalSingle => {
                parsed.flags.insert(key.clone());
                if i < args.len() && !is_keyword(specs, &args[i]) {
                    parsed.values.entry(key).or_default().push(args[i].clone());
                    i += 1;
                }
            }
            OptKind::Multi => {
                let values = parsed.values.entry(key).or_default();
                while i < args.len() && !is_keyword(specs, &args[i]) {
                    values.push(args[i].clone());
                    i += 1;
                }
            }
        }
    }

    Ok(parsed)
}
