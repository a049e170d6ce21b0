// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! The `list()` command family.
//!
//! ```text
//! list(APPEND|PREPEND <var> <item>...)    list(INSERT <var> <idx> ...)
//! list(REMOVE_ITEM|REMOVE_AT|REMOVE_DUPLICATES <var> ...)
//! list(LENGTH|JOIN|REVERSE|SORT <var> ...)
//! list(GET <var> <idx>... <out>)          list(FIND <var> <item> <out>)
//! list(SUBLIST <var> <begin> <len> <out>)
//! list(POP_FRONT|POP_BACK <var> [<out>...])
//! list(FILTER <var> INCLUDE|EXCLUDE REGEX <pattern>)
//! ```
//!
//! Lists are `;`-joined strings; an unset variable is the empty list.

use crate::eval::{Evaluator, Flow, Invocation};

fn read_list(ev: &Evaluator<'_>, name: &str) -> Vec<String> {
    ev.variable(name)
        .unwrap_or_default()
        .split(';')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn write_list(ev: &mut Evaluator<'_>, name: &str, items: &[String]) {
    ev.set_variable(name, &items.join(";"));
}

/// Resolves a possibly negative index against `len`.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let resolved = if index < 0 { len + index } else { index };
    (0..len).contains(&resolved).then_some(
        usize::try_from(resolved).ok()?,
    )
}

/// Dispatches one `list()` subcommand.
#[allow(clippy::too_many_lines)]
pub(crate) fn cmd_list(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let (Some(subcommand), Some(variable)) =
        (values.first().map(String::as_str), values.get(1).cloned())
    else {
        ev.error("list", "list() requires a subcommand and a list variable");
        return Flow::Normal;
    };

    match subcommand {
        "APPEND" => {
            let mut items = read_list(ev, &variable);
            items.extend(values[2..].iter().cloned());
            write_list(ev, &variable, &items);
        }
        "PREPEND" => {
            let mut items: Vec<String> = values[2..].to_vec();
            items.extend(read_list(ev, &variable));
            write_list(ev, &variable, &items);
        }
        "INSERT" => {
            let Some(Ok(index)) = values.get(2).map(|v| v.parse::<i64>()) else {
                ev.error("list", "INSERT requires an integer index");
                return Flow::Normal;
            };
            let mut items = read_list(ev, &variable);
            let position = if items.is_empty() && index == 0 {
                0
            } else {
                match resolve_index(index, items.len() + 1) {
                    Some(position) => position,
                    None => {
                        ev.error("list", format!("INSERT index {index} out of range"));
                        return Flow::Normal;
                    }
                }
            };
            for (offset, item) in values[3..].iter().enumerate() {
                items.insert(position + offset, item.clone());
            }
            write_list(ev, &variable, &items);
        }
        "REMOVE_ITEM" => {
            let mut items = read_list(ev, &variable);
            items.retain(|item| !values[2..].contains(item));
            write_list(ev, &variable, &items);
        }
        "REMOVE_AT" => {
            let items = read_list(ev, &variable);
            let mut to_remove = Vec::new();
            for raw in &values[2..] {
                let Some(index) = raw
                    .parse::<i64>()
                    .ok()
                    .and_then(|index| resolve_index(index, items.len()))
                else {
                    ev.error("list", format!("REMOVE_AT index '{raw}' out of range"));
                    return Flow::Normal;
                };
                to_remove.push(index);
            }
            let filtered: Vec<String> = items
                .into_iter()
                .enumerate()
                .filter(|(i, _)| !to_remove.contains(i))
                .map(|(_, item)| item)
                .collect();
            write_list(ev, &variable, &filtered);
        }
        "REMOVE_DUPLICATES" => {
            let items = read_list(ev, &variable);
            let mut seen = std::collections::BTreeSet::new();
            let unique: Vec<String> = items
                .into_iter()
                .filter(|item| seen.insert(item.clone()))
                .collect();
            write_list(ev, &variable, &unique);
        }
        "LENGTH" => {
            let Some(out) = values.get(2).cloned() else {
                ev.error("list", "LENGTH requires an output variable");
                return Flow::Normal;
            };
            let length = read_list(ev, &variable).len().to_string();
            ev.set_variable(&out, &length);
        }
        "GET" => {
            if values.len() < 4 {
                ev.error("list", "GET requires at least one index and an output variable");
                return Flow::Normal;
            }
            let Some(out) = values.last().cloned() else {
                ev.error("list", "GET requires an output variable");
                return Flow::Normal;
            };
            let items = read_list(ev, &variable);
            let mut selected = Vec::new();
            for raw in &values[2..values.len() - 1] {
                let Some(index) = raw
                    .parse::<i64>()
                    .ok()
                    .and_then(|index| resolve_index(index, items.len()))
                else {
                    ev.error("list", format!("GET index '{raw}' out of range"));
                    return Flow::Normal;
                };
                selected.push(items[index].clone());
            }
            write_list(ev, &out, &selected);
        }
        "FIND" => {
            let (Some(needle), Some(out)) = (values.get(2), values.get(3)) else {
                ev.error("list", "FIND requires an item and an output variable");
                return Flow::Normal;
            };
            let items = read_list(ev, &variable);
            let index = items
                .iter()
                .position(|item| item == needle)
                .map_or(-1, |p| i64::try_from(p).unwrap_or(-1));
            let out = out.clone();
            ev.set_variable(&out, &index.to_string());
        }
        "SUBLIST" => {
            let (Some(begin_raw), Some(length_raw), Some(out)) =
                (values.get(2), values.get(3), values.get(4))
            else {
                ev.error("list", "SUBLIST requires begin, length and output");
                return Flow::Normal;
            };
            let items = read_list(ev, &variable);
            let (Ok(begin), Ok(length)) =
                (begin_raw.parse::<usize>(), length_raw.parse::<i64>())
            else {
                ev.error("list", "SUBLIST begin/length must be integers");
                return Flow::Normal;
            };
            let begin = begin.min(items.len());
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let end = if length < 0 {
                items.len()
            } else {
                (begin + length as usize).min(items.len())
            };
            let out = out.clone();
            write_list(ev, &out, &items[begin..end]);
        }
        "JOIN" => {
            let (Some(glue), Some(out)) = (values.get(2), values.get(3)) else {
                ev.error("list", "JOIN requires a glue and an output variable");
                return Flow::Normal;
            };
            let joined = read_list(ev, &variable).join(glue);
            let out = out.clone();
            ev.set_variable(&out, &joined);
        }
        "SORT" => {
            let mut items = read_list(ev, &variable);
            let case_insensitive = values[2..]
                .windows(2)
                .any(|w| w[0] == "CASE" && w[1] == "INSENSITIVE");
            let descending = values[2..]
                .windows(2)
                .any(|w| w[0] == "ORDER" && w[1] == "DESCENDING");
            if case_insensitive {
                items.sort_by_key(|item| item.to_lowercase());
            } else {
                items.sort();
            }
            if descending {
                items.reverse();
            }
            write_list(ev, &variable, &items);
        }
        "REVERSE" => {
            let mut items = read_list(ev, &variable);
            items.reverse();
            write_list(ev, &variable, &items);
        }
        "POP_FRONT" | "POP_BACK" => {
            let mut items = read_list(ev, &variable);
            let outputs = &values[2..];
            if outputs.is_empty() {
                if subcommand == "POP_FRONT" {
                    if !items.is_empty() {
                        items.remove(0);
                    }
                } else {
                    items.pop();
                }
            } else {
                for out in outputs {
                    let popped = if subcommand == "POP_FRONT" {
                        if items.is_empty() {
                            None
                        } else {
                            Some(items.remove(0))
                        }
                    } else {
                        items.pop()
                    };
                    match popped {
                        Some(value) => ev.set_variable(out, &value),
                        None => ev.unset_variable(out),
                    }
                }
            }
            write_list(ev, &variable, &items);
        }
        "FILTER" => {
            let mode = values.get(2).map(String::as_str);
            if values.get(3).map(String::as_str) != Some("REGEX") {
                ev.error("list", "FILTER requires INCLUDE|EXCLUDE REGEX <pattern>");
                return Flow::Normal;
            }
            let Some(pattern) = values.get(4) else {
                ev.error("list", "FILTER requires a regex pattern");
                return Flow::Normal;
            };
            let include = match mode {
                Some("INCLUDE") => true,
                Some("EXCLUDE") => false,
                _ => {
                    ev.error("list", "FILTER mode must be INCLUDE or EXCLUDE");
                    return Flow::Normal;
                }
            };
            let re = match regex::Regex::new(pattern) {
                Ok(re) => re,
                Err(e) => {
                    ev.error("list", format!("invalid regex '{pattern}': {e}"));
                    return Flow::Normal;
                }
            };
            let mut items = read_list(ev, &variable);
            items.retain(|item| re.is_match(item) == include);
            write_list(ev, &variable, &items);
        }
        other => {
            ev.error("list", format!("unsupported list() subcommand '{other}'"));
        }
    }
    Flow::Normal
}
