// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! File API and instrumentation queries.
//!
//! ```text
//! cmake_file_api(QUERY [CLIENT <name>] <kind> [<version>]...)
//!   -> .cmake/api/v1/query[/client-<name>]/<kind>-v<N>.json
//!      zero-byte files; their presence is the request
//!
//! cmake_instrumentation(API_VERSION 1 DATA_VERSION 1 [HOOKS ...]
//!                       [QUERIES ...] [CALLBACK <cb>]...)
//!   -> .cmake/instrumentation/query_<N>.json  { "version": 1, ... }
//! ```

use std::path::PathBuf;

use crate::effects::FsRequest;
use crate::eval::{Evaluator, Flow, Invocation};

fn binary_dir(ev: &Evaluator<'_>) -> PathBuf {
    PathBuf::from(
        ev.variable("CMAKE_CURRENT_BINARY_DIR")
            .unwrap_or_else(|| ".".to_string()),
    )
}

/// Accepts `2`, `v2` or `V2`; anything else falls back to 1.
fn parse_version_major(token: Option<&str>) -> u32 {
    let Some(token) = token else {
        return 1;
    };
    let digits = token
        .strip_prefix('v')
        .or_else(|| token.strip_prefix('V'))
        .unwrap_or(token);
    digits.parse().ok().filter(|v| *v > 0).unwrap_or(1)
}

fn write_empty(ev: &mut Evaluator<'_>, path: PathBuf) {
    let outcome = ev
        .effects
        .run_fs(&FsRequest::EnsureParentDirs { path: path.clone() });
    if !outcome.status.is_ok() {
        ev.error("cmake_file_api", outcome.log);
        return;
    }
    let outcome = ev.effects.run_fs(&FsRequest::WriteFileBytes {
        path,
        bytes: Vec::new(),
    });
    if !outcome.status.is_ok() {
        ev.error("cmake_file_api", outcome.log);
    }
}

/// `cmake_file_api(QUERY ...)`.
pub(crate) fn cmd_cmake_file_api(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    if values.first().map(String::as_str) != Some("QUERY") {
        ev.error("cmake_file_api", "cmake_file_api() requires QUERY");
        return Flow::Normal;
    }

    let mut query_root = binary_dir(ev).join(".cmake/api/v1/query");
    let mut rest: Vec<String> = Vec::new();
    let mut iter = values[1..].iter();
    while let Some(value) = iter.next() {
        match value.as_str() {
            "CLIENT" => {
                let Some(client) = iter.next() else {
                    ev.error("cmake_file_api", "missing value after CLIENT");
                    return Flow::Normal;
                };
                query_root = query_root.join(format!("client-{client}"));
            }
            "API_VERSION" => {
                // Consumed together with its value token.
                iter.next();
            }
            _ => rest.push(value.clone()),
        }
    }

    if rest.is_empty() {
        write_empty(ev, query_root.join("query.json"));
        return Flow::Normal;
    }

    let mut i = 0;
    while i < rest.len() {
        let kind = rest[i].to_ascii_lowercase();
        let version_token = rest
            .get(i + 1)
            .filter(|t| {
                t.chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_digit() || c == 'v' || c == 'V')
            })
            .map(String::as_str);
        let major = parse_version_major(version_token);
        i += if version_token.is_some() { 2 } else { 1 };

        write_empty(ev, query_root.join(format!("{kind}-v{major}.json")));
    }
    Flow::Normal
}

fn json_escape(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push('?'),
            c => out.push(c),
        }
    }
}

fn append_array(json: &mut String, key: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    json.push_str(",\n  \"");
    json.push_str(key);
    json.push_str("\": [");
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            json.push_str(", ");
        }
        json.push('"');
        json_escape(json, item);
        json.push('"');
    }
    json.push(']');
}

/// `cmake_instrumentation(API_VERSION <v> DATA_VERSION <v>
/// [HOOKS <h>...] [QUERIES <q>...] [CALLBACK <cb>]...)`.
pub(crate) fn cmd_cmake_instrumentation(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();

    let mut api_version = "1".to_string();
    let mut data_version = "1".to_string();
    let mut hooks: Vec<String> = Vec::new();
    let mut queries: Vec<String> = Vec::new();
    let mut callbacks: Vec<String> = Vec::new();

    let mut mode = "";
    let mut iter = values.iter();
    while let Some(value) = iter.next() {
        match value.as_str() {
            "API_VERSION" => {
                if let Some(v) = iter.next() {
                    api_version.clone_from(v);
                }
                mode = "";
            }
            "DATA_VERSION" => {
                if let Some(v) = iter.next() {
                    data_version.clone_from(v);
                }
                mode = "";
            }
            "HOOKS" => mode = "hooks",
            "QUERIES" => mode = "queries",
            "CALLBACK" => {
                if let Some(cb) = iter.next() {
                    callbacks.push(cb.clone());
                }
                mode = "";
            }
            other => match mode {
                "hooks" => hooks.push(other.to_string()),
                "queries" => queries.push(other.to_string()),
                _ => {
                    ev.error(
                        "cmake_instrumentation",
                        format!("unexpected argument '{other}'"),
                    );
                    return Flow::Normal;
                }
            },
        }
    }

    let mut json = String::new();
    json.push_str("{\n  \"version\": 1");
    append_array(&mut json, "hooks", &hooks);
    append_array(&mut json, "queries", &queries);
    append_array(&mut json, "callbacks", &callbacks);
    json.push_str("\n}\n");

    ev.instrumentation_queries += 1;
    let counter = ev.instrumentation_queries;
    let path = binary_dir(ev)
        .join(".cmake/instrumentation")
        .join(format!("query_{counter}.json"));

    let outcome = ev
        .effects
        .run_fs(&FsRequest::EnsureParentDirs { path: path.clone() });
    if !outcome.status.is_ok() {
        ev.error("cmake_instrumentation", outcome.log);
        return Flow::Normal;
    }
    let outcome = ev.effects.run_fs(&FsRequest::WriteFileBytes {
        path,
        bytes: json.into_bytes(),
    });
    if !outcome.status.is_ok() {
        ev.error("cmake_instrumentation", outcome.log);
        return Flow::Normal;
    }

    ev.set_variable("CMAKE_INSTRUMENTATION", "1");
    ev.set_variable("CMAKE_INSTRUMENTATION_API_VERSION", &api_version);
    ev.set_variable("CMAKE_INSTRUMENTATION_DATA_VERSION", &data_version);
    ev.set_variable("CMAKE_INSTRUMENTATION_HOOKS", &hooks.join(";"));
    ev.set_variable("CMAKE_INSTRUMENTATION_QUERIES", &queries.join(";"));
    ev.set_variable("CMAKE_INSTRUMENTATION_CALLBACKS", &callbacks.join(";"));
    Flow::Normal
}
