// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! The `string()` command family.
//!
//! ```text
//! string(TOLOWER|TOUPPER|STRIP|LENGTH|HEX <input> <out>)
//! string(APPEND|PREPEND <var> <input>...)
//! string(CONCAT <out> <input>...)       string(JOIN <glue> <out> ...)
//! string(SPLIT <sep> <out> <input>)     string(ASCII <code>... <out>)
//! string(SUBSTRING <in> <begin> <len> <out>)
//! string(FIND <in> <needle> <out> [REVERSE])
//! string(REPLACE <match> <replace> <out> <input>...)
//! string(COMPARE <op> <a> <b> <out>)
//! string(REGEX MATCH|MATCHALL|REPLACE ...)
//! string(<HASH> <out> <input>)
//! ```

use crate::eval::{Evaluator, Flow, Invocation};

/// Dispatches one `string()` subcommand.
#[allow(clippy::too_many_lines)]
pub(crate) fn cmd_string(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let Some(subcommand) = values.first().map(String::as_str) else {
        ev.error("string", "string() requires a subcommand");
        return Flow::Normal;
    };

    match subcommand {
        "TOLOWER" | "TOUPPER" => {
            let (Some(input), Some(out)) = (values.get(1), values.get(2)) else {
                ev.error("string", format!("{subcommand} requires input and output"));
                return Flow::Normal;
            };
            let result = if subcommand == "TOLOWER" {
                input.to_lowercase()
            } else {
                input.to_uppercase()
            };
            let out = out.clone();
            ev.set_variable(&out, &result);
        }
        "STRIP" => {
            let (Some(input), Some(out)) = (values.get(1), values.get(2)) else {
                ev.error("string", "STRIP requires input and output");
                return Flow::Normal;
            };
            let result = input.trim().to_string();
            let out = out.clone();
            ev.set_variable(&out, &result);
        }
        "LENGTH" => {
            let (Some(input), Some(out)) = (values.get(1), values.get(2)) else {
                ev.error("string", "LENGTH requires input and output");
                return Flow::Normal;
            };
            let result = input.len().to_string();
            let out = out.clone();
            ev.set_variable(&out, &result);
        }
        "HEX" => {
            let (Some(input), Some(out)) = (values.get(1), values.get(2)) else {
                ev.error("string", "HEX requires input and output");
                return Flow::Normal;
            };
            let result = hex::encode(input.as_bytes());
            let out = out.clone();
            ev.set_variable(&out, &result);
        }
        "APPEND" => {
            let Some(variable) = values.get(1).cloned() else {
                ev.error("string", "APPEND requires a variable");
                return Flow::Normal;
            };
            let mut current = ev.variable(&variable).unwrap_or_default();
            for part in &values[2..] {
                current.push_str(part);
            }
            ev.set_variable(&variable, &current);
        }
        "PREPEND" => {
            let Some(variable) = values.get(1).cloned() else {
                ev.error("string", "PREPEND requires a variable");
                return Flow::Normal;
            };
            let current = ev.variable(&variable).unwrap_or_default();
            let mut result = values[2..].join("");
            result.push_str(&current);
            ev.set_variable(&variable, &result);
        }
        "CONCAT" => {
            let Some(out) = values.get(1).cloned() else {
                ev.error("string", "CONCAT requires an output variable");
                return Flow::Normal;
            };
            let result = values[2..].join("");
            ev.set_variable(&out, &result);
        }
        "JOIN" => {
            let (Some(glue), Some(out)) = (values.get(1), values.get(2)) else {
                ev.error("string", "JOIN requires a glue and an output");
                return Flow::Normal;
            };
            let result = values[3..].join(glue);
            let out = out.clone();
            ev.set_variable(&out, &result);
        }
        "SPLIT" => {
            let (Some(separator), Some(out), Some(input)) =
                (values.get(1), values.get(2), values.get(3))
            else {
                ev.error("string", "SPLIT requires a separator, output and input");
                return Flow::Normal;
            };
            let result = if separator.is_empty() {
                input.clone()
            } else {
                input.split(separator.as_str()).collect::<Vec<_>>().join(";")
            };
            let out = out.clone();
            ev.set_variable(&out, &result);
        }
        "ASCII" => {
            if values.len() < 3 {
                ev.error("string", "ASCII requires codes and an output variable");
                return Flow::Normal;
            }
            let Some(out) = values.last().cloned() else {
                ev.error("string", "ASCII requires an output variable");
                return Flow::Normal;
            };
            let mut result = String::new();
            for code in &values[1..values.len() - 1] {
                match code.parse::<u32>().ok().and_then(char::from_u32) {
                    Some(c) => result.push(c),
                    None => {
                        ev.error("string", format!("invalid ASCII code '{code}'"));
                        return Flow::Normal;
                    }
                }
            }
            ev.set_variable(&out, &result);
        }
        "SUBSTRING" => {
            let (Some(input), Some(begin), Some(length), Some(out)) =
                (values.get(1), values.get(2), values.get(3), values.get(4))
            else {
                ev.error("string", "SUBSTRING requires input, begin, length, output");
                return Flow::Normal;
            };
            let Ok(begin) = begin.parse::<usize>() else {
                ev.error("string", "SUBSTRING begin must be a non-negative integer");
                return Flow::Normal;
            };
            if begin > input.len() {
                ev.error("string", "SUBSTRING begin is past the end of the input");
                return Flow::Normal;
            }
            let result = match length.parse::<i64>() {
                Ok(-1) => input[begin..].to_string(),
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                Ok(len) if len >= 0 => {
                    let end = (begin + len as usize).min(input.len());
                    input[begin..end].to_string()
                }
                _ => {
                    ev.error("string", "SUBSTRING length must be -1 or non-negative");
                    return Flow::Normal;
                }
            };
            let out = out.clone();
            ev.set_variable(&out, &result);
        }
        "FIND" => {
            let (Some(input), Some(needle), Some(out)) =
                (values.get(1), values.get(2), values.get(3))
            else {
                ev.error("string", "FIND requires input, needle and output");
                return Flow::Normal;
            };
            let reverse = values.get(4).is_some_and(|v| v == "REVERSE");
            let position = if reverse {
                input.rfind(needle.as_str())
            } else {
                input.find(needle.as_str())
            };
            let result = position.map_or(-1, |p| i64::try_from(p).unwrap_or(-1));
            let out = out.clone();
            ev.set_variable(&out, &result.to_string());
        }
        "REPLACE" => {
            let (Some(needle), Some(replacement), Some(out)) =
                (values.get(1), values.get(2), values.get(3))
            else {
                ev.error("string", "REPLACE requires match, replace and output");
                return Flow::Normal;
            };
            let input = values[4..].join("");
            let result = if needle.is_empty() {
                input
            } else {
                input.replace(needle.as_str(), replacement)
            };
            let out = out.clone();
            ev.set_variable(&out, &result);
        }
        "COMPARE" => {
            let (Some(op), Some(a), Some(b), Some(out)) =
                (values.get(1), values.get(2), values.get(3), values.get(4))
            else {
                ev.error("string", "COMPARE requires op, two strings and output");
                return Flow::Normal;
            };
            let result = match op.as_str() {
                "EQUAL" => a == b,
                "NOTEQUAL" => a != b,
                "LESS" => a < b,
                "LESS_EQUAL" => a <= b,
                "GREATER" => a > b,
                "GREATER_EQUAL" => a >= b,
                other => {
                    ev.error("string", format!("unknown COMPARE op '{other}'"));
                    return Flow::Normal;
                }
            };
            let out = out.clone();
            ev.set_variable(&out, if result { "1" } else { "0" });
        }
        "REGEX" => return cmd_string_regex(ev, &values),
        algorithm if super::hash::is_algorithm(algorithm) => {
            let (Some(out), Some(input)) = (values.get(1), values.get(2)) else {
                ev.error("string", format!("{algorithm} requires output and input"));
                return Flow::Normal;
            };
            if let Some(digest) = super::hash::digest(algorithm, input.as_bytes()) {
                let out = out.clone();
                ev.set_variable(&out, &digest);
            }
        }
        other => {
            ev.error("string", format!("unsupported string() subcommand '{other}'"));
        }
    }
    Flow::Normal
}

fn cmd_string_regex(ev: &mut Evaluator<'_>, values: &[String]) -> Flow {
    let (Some(mode), Some(pattern)) = (values.get(1), values.get(2)) else {
        ev.error("string", "REGEX requires a mode and a pattern");
        return Flow::Normal;
    };

    match mode.as_str() {
        "MATCH" | "MATCHALL" => {
            let Some(out) = values.get(3).cloned() else {
                ev.error("string", "REGEX MATCH requires an output variable");
                return Flow::Normal;
            };
            let input = values[4..].join("");
            let re = match regex::Regex::new(pattern) {
                Ok(re) => re,
                Err(e) => {
                    ev.error("string", format!("invalid regex '{pattern}': {e}"));
                    return Flow::Normal;
                }
            };
            if mode == "MATCH" {
                let result = match re.captures(&input) {
                    Some(caps) => {
                        for i in 0..caps.len().min(10) {
                            let text = caps.get(i).map_or("", |m| m.as_str()).to_string();
                            ev.set_variable(&format!("CMAKE_MATCH_{i}"), &text);
                        }
                        caps.get(0).map_or("", |m| m.as_str()).to_string()
                    }
                    None => String::new(),
                };
                ev.set_variable(&out, &result);
            } else {
                let matches: Vec<&str> =
                    re.find_iter(&input).map(|m| m.as_str()).collect();
                ev.set_variable(&out, &matches.join(";"));
            }
        }
        "REPLACE" => {
            let (Some(replacement), Some(out)) = (values.get(3), values.get(4)) else {
                ev.error("string", "REGEX REPLACE requires replace and output");
                return Flow::Normal;
            };
            let input = values[5..].join("");
            let re = match regex::Regex::new(pattern) {
                Ok(re) => re,
                Err(e) => {
                    ev.error("string", format!("invalid regex '{pattern}': {e}"));
                    return Flow::Normal;
                }
            };
            let replacement = convert_backrefs(replacement);
            let result = re.replace_all(&input, replacement.as_str()).into_owned();
            let out = out.clone();
            ev.set_variable(&out, &result);
        }
        other => {
            ev.error("string", format!("unknown REGEX mode '{other}'"));
        }
    }
    Flow::Normal
}

/// CMake spells backreferences `\1`; the regex crate wants `${1}`.
fn convert_backrefs(replacement: &str) -> String {
    let mut result = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some(digit) if digit.is_ascii_digit() => {
                    result.push_str("${");
                    result.push(*digit);
                    result.push('}');
                    chars.next();
                }
                Some('\\') => {
                    result.push('\\');
                    chars.next();
                }
                _ => result.push(c),
            }
        } else if c == '$' {
            // Literal dollar must not look like a capture group.
            result.push_str("$$");
        } else {
            result.push(c);
        }
    }
    result
}
