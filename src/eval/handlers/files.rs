// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! `file()` core subcommands and `configure_file()`.
//!
//! ```text
//! READ WRITE APPEND TOUCH[_NOCREATE] SIZE RENAME REMOVE[_RECURSE]
//! COPY COPY_FILE MAKE_DIRECTORY <HASH> TIMESTAMP CONFIGURE
//! DOWNLOAD UPLOAD
//!
//! configure_file: @VAR@ / ${VAR} / #cmakedefine / #cmakedefine01
//! ```
//!
//! Path-shaped and exotic subcommands live in `files_extra`.

use std::path::{Path, PathBuf};

use crate::effects::{FsRequest, ProcessRequest};
use crate::eval::expand::VarSource;
use crate::eval::opt::{OptKind, OptSpec, parse_opts};
use crate::eval::{Evaluator, Flow, Invocation};

/// Resolves a path argument against `CMAKE_CURRENT_SOURCE_DIR`.
pub(super) fn resolve_path(ev: &Evaluator<'_>, raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let base = ev
        .variable("CMAKE_CURRENT_SOURCE_DIR")
        .unwrap_or_else(|| ".".to_string());
    Path::new(&base).join(raw)
}

/// Resolves an output path against `CMAKE_CURRENT_BINARY_DIR`.
pub(super) fn resolve_output_path(ev: &Evaluator<'_>, raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let base = ev
        .variable("CMAKE_CURRENT_BINARY_DIR")
        .unwrap_or_else(|| ".".to_string());
    Path::new(&base).join(raw)
}

/// Dispatches one `file()` subcommand.
#[allow(clippy::too_many_lines)]
pub(crate) fn cmd_file(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let Some(subcommand) = values.first().map(String::as_str) else {
        ev.error("file", "file() requires a subcommand");
        return Flow::Normal;
    };

    match subcommand {
        "READ" => cmd_read(ev, &values),
        "WRITE" | "APPEND" => cmd_write(ev, &values, subcommand == "APPEND"),
        "TOUCH" | "TOUCH_NOCREATE" => {
            for raw in &values[1..] {
                let path = resolve_output_path(ev, raw);
                if path.exists() {
                    // Refresh the mtime by rewriting the existing bytes.
                    if let Ok(bytes) = std::fs::read(&path) {
                        let _ = std::fs::write(&path, bytes);
                    }
                } else if subcommand == "TOUCH" {
                    let outcome = ev.effects.run_fs(&FsRequest::EnsureParentDirs {
                        path: path.clone(),
                    });
                    if outcome.status.is_ok() {
                        let outcome = ev.effects.run_fs(&FsRequest::WriteFileBytes {
                            path,
                            bytes: Vec::new(),
                        });
                        if !outcome.status.is_ok() {
                            ev.error("file", outcome.log);
                        }
                    }
                }
            }
            Flow::Normal
        }
        "SIZE" => {
            let (Some(raw), Some(out)) = (values.get(1), values.get(2)) else {
                ev.error("file", "SIZE requires a file and an output variable");
                return Flow::Normal;
            };
            let path = resolve_path(ev, raw);
            match std::fs::metadata(&path) {
                Ok(meta) => {
                    let out = out.clone();
                    ev.set_variable(&out, &meta.len().to_string());
                }
                Err(e) => ev.error("file", format!("failed to read {}: {e}", path.display())),
            }
            Flow::Normal
        }
        "RENAME" => {
            let (Some(old), Some(new)) = (values.get(1), values.get(2)) else {
                ev.error("file", "RENAME requires old and new paths");
                return Flow::Normal;
            };
            let old = resolve_output_path(ev, old);
            let new = resolve_output_path(ev, new);
            if let Err(e) = std::fs::rename(&old, &new) {
                ev.error(
                    "file",
                    format!("failed to rename {} to {}: {e}", old.display(), new.display()),
                );
            }
            Flow::Normal
        }
        "REMOVE" => {
            for raw in &values[1..] {
                let outcome = ev.effects.run_fs(&FsRequest::DeleteFile {
                    path: resolve_output_path(ev, raw),
                });
                if !outcome.status.is_ok() {
                    ev.error("file", outcome.log);
                }
            }
            Flow::Normal
        }
        "REMOVE_RECURSE" => {
            for raw in &values[1..] {
                let outcome = ev.effects.run_fs(&FsRequest::DeletePathRecursive {
                    path: resolve_output_path(ev, raw),
                });
                if !outcome.status.is_ok() {
                    ev.error("file", outcome.log);
                }
            }
            Flow::Normal
        }
        "COPY" | "INSTALL" => cmd_copy(ev, &values),
        "COPY_FILE" => {
            let (Some(source), Some(dest)) = (values.get(1), values.get(2)) else {
                ev.error("file", "COPY_FILE requires a source and a destination");
                return Flow::Normal;
            };
            let result_var = values
                .iter()
                .position(|v| v == "RESULT")
                .and_then(|pos| values.get(pos + 1))
                .cloned();
            let outcome = ev.effects.run_fs(&FsRequest::CopyFile {
                source: resolve_path(ev, source),
                dest: resolve_output_path(ev, dest),
            });
            if let Some(variable) = result_var {
                let value = if outcome.status.is_ok() {
                    "0".to_string()
                } else {
                    outcome.log.clone()
                };
                ev.set_variable(&variable, &value);
            } else if !outcome.status.is_ok() {
                ev.error("file", outcome.log);
            }
            Flow::Normal
        }
        "MAKE_DIRECTORY" => {
            for raw in &values[1..] {
                let outcome = ev.effects.run_fs(&FsRequest::Mkdir {
                    path: resolve_output_path(ev, raw),
                });
                if !outcome.status.is_ok() {
                    ev.error("file", outcome.log);
                }
            }
            Flow::Normal
        }
        "TIMESTAMP" => cmd_timestamp(ev, &values),
        "CONFIGURE" => cmd_file_configure(ev, &values),
        "DOWNLOAD" => cmd_download(ev, &values),
        "UPLOAD" => cmd_upload(ev, &values),
        algorithm if super::hash::is_algorithm(algorithm) => {
            let (Some(raw), Some(out)) = (values.get(1), values.get(2)) else {
                ev.error("file", format!("{algorithm} requires a file and an output"));
                return Flow::Normal;
            };
            let path = resolve_path(ev, raw);
            match std::fs::read(&path) {
                Ok(bytes) => {
                    if let Some(digest) = super::hash::digest(algorithm, &bytes) {
                        let out = out.clone();
                        ev.set_variable(&out, &digest);
                    }
                }
                Err(e) => ev.error("file", format!("failed to read {}: {e}", path.display())),
            }
            Flow::Normal
        }
        "READ_SYMLINK" | "CREATE_LINK" | "CHMOD" | "CHMOD_RECURSE" | "REAL_PATH"
        | "RELATIVE_PATH" | "TO_CMAKE_PATH" | "TO_NATIVE_PATH" | "GLOB" | "GLOB_RECURSE"
        | "GENERATE" | "LOCK" | "ARCHIVE_CREATE" | "ARCHIVE_EXTRACT"
        | "GET_RUNTIME_DEPENDENCIES" => super::files_extra::dispatch(ev, subcommand, &values),
        other => {
            ev.error("file", format!("unsupported file() subcommand '{other}'"));
            Flow::Normal
        }
    }
}

fn cmd_read(ev: &mut Evaluator<'_>, values: &[String]) -> Flow {
    const SPECS: [OptSpec; 3] = [
        OptSpec::new("OFFSET", OptKind::Single),
        OptSpec::new("LIMIT", OptKind::Single),
        OptSpec::new("HEX", OptKind::Flag),
    ];
    let parsed = match parse_opts(values, 1, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("file", message);
            return Flow::Normal;
        }
    };
    let (Some(raw), Some(out)) = (parsed.positionals().first(), parsed.positionals().get(1))
    else {
        ev.error("file", "READ requires a file and an output variable");
        return Flow::Normal;
    };
    let path = resolve_path(ev, raw);
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            ev.error("file", format!("failed to read {}: {e}", path.display()));
            return Flow::Normal;
        }
    };

    let offset = parsed
        .one("OFFSET")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0)
        .min(bytes.len());
    let end = parsed
        .one("LIMIT")
        .and_then(|v| v.parse::<usize>().ok())
        .map_or(bytes.len(), |limit| (offset + limit).min(bytes.len()));
    let window = &bytes[offset..end];

    let content = if parsed.has("HEX") {
        hex::encode(window)
    } else {
        String::from_utf8_lossy(window).into_owned()
    };
    let out = out.clone();
    ev.set_variable(&out, &content);
    Flow::Normal
}

fn cmd_write(ev: &mut Evaluator<'_>, values: &[String], append: bool) -> Flow {
    let Some(raw) = values.get(1) else {
        ev.error("file", "WRITE requires a file path");
        return Flow::Normal;
    };
    let path = resolve_output_path(ev, raw);
    let content = values[2..].join("");

    let outcome = ev
        .effects
        .run_fs(&FsRequest::EnsureParentDirs { path: path.clone() });
    if !outcome.status.is_ok() {
        ev.error("file", outcome.log);
        return Flow::Normal;
    }

    let bytes = if append {
        let mut existing = std::fs::read(&path).unwrap_or_default();
        existing.extend_from_slice(content.as_bytes());
        existing
    } else {
        content.into_bytes()
    };
    let outcome = ev
        .effects
        .run_fs(&FsRequest::WriteFileBytes { path, bytes });
    if !outcome.status.is_ok() {
        ev.error("file", outcome.log);
    }
    Flow::Normal
}

fn cmd_copy(ev: &mut Evaluator<'_>, values: &[String]) -> Flow {
    const SPECS: [OptSpec; 4] = [
        OptSpec::new("DESTINATION", OptKind::Single),
        OptSpec::new("FILE_PERMISSIONS", OptKind::Multi),
        OptSpec::new("DIRECTORY_PERMISSIONS", OptKind::Multi),
        OptSpec::new("USE_SOURCE_PERMISSIONS", OptKind::Flag),
    ];
    let parsed = match parse_opts(values, 1, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("file", message);
            return Flow::Normal;
        }
    };
    let Some(destination) = parsed.one("DESTINATION").map(str::to_string) else {
        ev.error("file", "COPY requires DESTINATION");
        return Flow::Normal;
    };
    let dest_dir = resolve_output_path(ev, &destination);

    for item in parsed.positionals() {
        let outcome = ev.effects.run_fs(&FsRequest::CopyEntryToDestination {
            source: resolve_path(ev, item),
            dest_dir: dest_dir.clone(),
        });
        if !outcome.status.is_ok() {
            ev.error("file", outcome.log);
        }
    }
    Flow::Normal
}

fn cmd_timestamp(ev: &mut Evaluator<'_>, values: &[String]) -> Flow {
    let (Some(raw), Some(out)) = (values.get(1), values.get(2)) else {
        ev.error("file", "TIMESTAMP requires a file and an output variable");
        return Flow::Normal;
    };
    let format = values
        .get(3)
        .filter(|v| v.as_str() != "UTC")
        .cloned()
        .unwrap_or_else(|| "%Y-%m-%dT%H:%M:%S".to_string());

    let path = resolve_path(ev, raw);
    let Ok(meta) = std::fs::metadata(&path) else {
        let out = out.clone();
        ev.set_variable(&out, "");
        return Flow::Normal;
    };
    let Ok(modified) = meta.modified() else {
        let out = out.clone();
        ev.set_variable(&out, "");
        return Flow::Normal;
    };
    let seconds = modified
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let formatted = format_timestamp(seconds, &format);
    let out = out.clone();
    ev.set_variable(&out, &formatted);
    Flow::Normal
}

/// Formats a UTC unix timestamp with the CMake `%`-specifiers. Timestamps
/// are always rendered in UTC so transpiled output is host-independent.
pub(super) fn format_timestamp(unix_seconds: u64, format: &str) -> String {
    let days = unix_seconds / 86_400;
    let secs_of_day = unix_seconds % 86_400;
    let (year, month, day) = civil_from_days(days);
    let hour = secs_of_day / 3600;
    let minute = (secs_of_day % 3600) / 60;
    let second = secs_of_day % 60;
    let day_of_year = day_of_year(year, month, day);

    let mut result = String::new();
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('Y') => result.push_str(&year.to_string()),
            Some('y') => result.push_str(&format!("{:02}", year % 100)),
            Some('m') => result.push_str(&format!("{month:02}")),
            Some('d') => result.push_str(&format!("{day:02}")),
            Some('H') => result.push_str(&format!("{hour:02}")),
            Some('M') => result.push_str(&format!("{minute:02}")),
            Some('S') => result.push_str(&format!("{second:02}")),
            Some('j') => result.push_str(&format!("{day_of_year:03}")),
            Some('s') => result.push_str(&unix_seconds.to_string()),
            Some('%') => result.push('%'),
            Some(other) => {
                result.push('%');
                result.push(other);
            }
            None => result.push('%'),
        }
    }
    result
}

/// Howard Hinnant's civil-from-days algorithm (days since 1970-01-01).
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn civil_from_days(days: u64) -> (i64, u64, u64) {
    let z = days as i64 + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if month <= 2 { year + 1 } else { year };
    (year, month, day)
}

fn day_of_year(year: i64, month: u64, day: u64) -> u64 {
    const DAYS_BEFORE: [u64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    let mut doy = DAYS_BEFORE[(month as usize).saturating_sub(1).min(11)] + day;
    if leap && month > 2 {
        doy += 1;
    }
    doy
}

fn cmd_file_configure(ev: &mut Evaluator<'_>, values: &[String]) -> Flow {
    const SPECS: [OptSpec; 5] = [
        OptSpec::new("OUTPUT", OptKind::Single),
        OptSpec::new("CONTENT", OptKind::Single),
        OptSpec::new("@ONLY", OptKind::Flag),
        OptSpec::new("ESCAPE_QUOTES", OptKind::Flag),
        OptSpec::new("NEWLINE_STYLE", OptKind::Single),
    ];
    let parsed = match parse_opts(values, 1, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("file", message);
            return Flow::Normal;
        }
    };
    let (Some(output), Some(content)) = (parsed.one("OUTPUT"), parsed.one("CONTENT")) else {
        ev.error("file", "CONFIGURE requires OUTPUT and CONTENT");
        return Flow::Normal;
    };

    let substituted = substitute_config(
        ev,
        content,
        parsed.has("@ONLY"),
        parsed.has("ESCAPE_QUOTES"),
    );
    let substituted = apply_newline_style(&substituted, parsed.one("NEWLINE_STYLE"));

    let path = resolve_output_path(ev, output);
    write_configured(ev, &path, &substituted);
    Flow::Normal
}

fn write_configured(ev: &mut Evaluator<'_>, path: &Path, content: &str) {
    let outcome = ev.effects.run_fs(&FsRequest::EnsureParentDirs {
        path: path.to_path_buf(),
    });
    if !outcome.status.is_ok() {
        ev.error("file", outcome.log);
        return;
    }
    let outcome = ev.effects.run_fs(&FsRequest::WriteFileBytes {
        path: path.to_path_buf(),
        bytes: content.as_bytes().to_vec(),
    });
    if !outcome.status.is_ok() {
        ev.error("file", outcome.log);
    }
}

/// `configure_file(<input> <output> [COPYONLY] [@ONLY] [ESCAPE_QUOTES]
/// [NEWLINE_STYLE <style>])`.
pub(crate) fn cmd_configure_file(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    const SPECS: [OptSpec; 4] = [
        OptSpec::new("COPYONLY", OptKind::Flag),
        OptSpec::new("@ONLY", OptKind::Flag),
        OptSpec::new("ESCAPE_QUOTES", OptKind::Flag),
        OptSpec::new("NEWLINE_STYLE", OptKind::Single),
    ];
    let values = inv.values();
    let parsed = match parse_opts(&values, 0, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("configure_file", message);
            return Flow::Normal;
        }
    };
    let (Some(input), Some(output)) =
        (parsed.positionals().first(), parsed.positionals().get(1))
    else {
        ev.error("configure_file", "requires an input and an output file");
        return Flow::Normal;
    };

    let input_path = resolve_path(ev, input);
    let content = match std::fs::read_to_string(&input_path) {
        Ok(content) => content,
        Err(e) => {
            ev.error(
                "configure_file",
                format!("failed to read {}: {e}", input_path.display()),
            );
            return Flow::Normal;
        }
    };

    let configured = if parsed.has("COPYONLY") {
        content
    } else {
        substitute_config(
            ev,
            &content,
            parsed.has("@ONLY"),
            parsed.has("ESCAPE_QUOTES"),
        )
    };
    let configured = apply_newline_style(&configured, parsed.one("NEWLINE_STYLE"));

    let output_path = resolve_output_path(ev, output);
    write_configured(ev, &output_path, &configured);
    Flow::Normal
}

fn apply_newline_style(content: &str, style: Option<&str>) -> String {
    match style {
        Some("DOS" | "WIN32" | "CRLF") => content.replace("\r\n", "\n").replace('\n', "\r\n"),
        Some("UNIX" | "LF") => content.replace("\r\n", "\n"),
        _ => content.to_string(),
    }
}

/// Config-file substitution: `@VAR@` always, `${VAR}` unless `@ONLY`,
/// plus `#cmakedefine` / `#cmakedefine01` lines.
pub(super) fn substitute_config(
    ev: &Evaluator<'_>,
    content: &str,
    at_only: bool,
    escape_quotes: bool,
) -> String {
    let mut lines = Vec::new();
    for line in content.split_inclusive('\n') {
        let (body, newline) = line
            .strip_suffix("\r\n")
            .map_or_else(
                || {
                    line.strip_suffix('\n')
                        .map_or((line, ""), |body| (body, "\n"))
                },
                |body| (body, "\r\n"),
            );
        lines.push(format!(
            "{}{newline}",
            substitute_config_line(ev, body, at_only, escape_quotes)
        ));
    }
    lines.join("")
}

fn substitute_config_line(
    ev: &Evaluator<'_>,
    line: &str,
    at_only: bool,
    escape_quotes: bool,
) -> String {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];

    if let Some(rest) = trimmed.strip_prefix("#cmakedefine01 ") {
        let name = rest.split_whitespace().next().unwrap_or("");
        let truthy = ev
            .lookup_var(name)
            .is_some_and(|v| !crate::expr::logic::is_false_constant(&v));
        return format!("{indent}#define {name} {}", i32::from(truthy));
    }
    if let Some(rest) = trimmed.strip_prefix("#cmakedefine ") {
        let mut parts = rest.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or("");
        let value = parts.next().unwrap_or("");
        let truthy = ev
            .lookup_var(name)
            .is_some_and(|v| !crate::expr::logic::is_false_constant(&v));
        if truthy {
            let value = substitute_values(ev, value, at_only, escape_quotes);
            if value.is_empty() {
                return format!("{indent}#define {name}");
            }
            return format!("{indent}#define {name} {value}");
        }
        return format!("{indent}/* #undef {name} */");
    }

    format!(
        "{indent}{}",
        substitute_values(ev, trimmed, at_only, escape_quotes)
    )
}

fn substitute_values(
    ev: &Evaluator<'_>,
    text: &str,
    at_only: bool,
    escape_quotes: bool,
) -> String {
    let mut result = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'@' {
            if let Some(close) = text[i + 1..].find('@') {
                let name = &text[i + 1..i + 1 + close];
                if !name.is_empty()
                    && name
                        .bytes()
                        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
                {
                    let value = ev.lookup_var(name).unwrap_or_default();
                    push_value(&mut result, &value, escape_quotes);
                    i += close + 2;
                    continue;
                }
            }
        }
        if !at_only && bytes[i] == b'$' && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            if let Some(close) = text[i + 2..].find('}') {
                let name = &text[i + 2..i + 2 + close];
                let value = ev.lookup_var(name).unwrap_or_default();
                push_value(&mut result, &value, escape_quotes);
                i += close + 3;
                continue;
            }
        }
        let ch_len = text[i..].chars().next().map_or(1, char::len_utf8);
        result.push_str(&text[i..i + ch_len]);
        i += ch_len;
    }
    result
}

fn push_value(result: &mut String, value: &str, escape_quotes: bool) {
    if escape_quotes {
        result.push_str(&value.replace('"', "\\\""));
    } else {
        result.push_str(value);
    }
}

fn cmd_download(ev: &mut Evaluator<'_>, values: &[String]) -> Flow {
    const SPECS: [OptSpec; 5] = [
        OptSpec::new("TIMEOUT", OptKind::Single),
        OptSpec::new("STATUS", OptKind::Single),
        OptSpec::new("LOG", OptKind::Single),
        OptSpec::new("EXPECTED_HASH", OptKind::Single),
        OptSpec::new("SHOW_PROGRESS", OptKind::Flag),
    ];
    let parsed = match parse_opts(values, 1, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("file", message);
            return Flow::Normal;
        }
    };
    let Some(url) = parsed.positionals().first().cloned() else {
        ev.error("file", "DOWNLOAD requires a url");
        return Flow::Normal;
    };
    let Some(dest) = parsed.positionals().get(1).cloned() else {
        ev.error("file", "DOWNLOAD requires a destination file");
        return Flow::Normal;
    };
    let timeout_ms = parsed
        .one("TIMEOUT")
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(0, |seconds| seconds * 1000);

    let path = resolve_output_path(ev, &dest);
    let outcome = ev.effects.run_fs(&FsRequest::DownloadToPath {
        url: url.clone(),
        path: path.clone(),
        timeout_ms,
    });

    let mut status_code = i32::from(!outcome.status.is_ok());
    let mut status_message = if outcome.status.is_ok() {
        "\"No error\"".to_string()
    } else {
        format!("\"{}\"", outcome.log)
    };

    // EXPECTED_HASH ALGO=hexdigest
    if status_code == 0
        && let Some(expected) = parsed.one("EXPECTED_HASH")
        && let Some((algorithm, expected_digest)) = expected.split_once('=')
    {
        match std::fs::read(&path)
            .ok()
            .and_then(|bytes| super::hash::digest(algorithm, &bytes))
        {
            Some(actual) if actual.eq_ignore_ascii_case(expected_digest) => {}
            Some(actual) => {
                status_code = 1;
                status_message = format!("\"hash mismatch: expected {expected_digest}, got {actual}\"");
            }
            None => {
                status_code = 1;
                status_message = format!("\"unknown hash algorithm {algorithm}\"");
            }
        }
    }

    if let Some(variable) = parsed.one("STATUS").map(str::to_string) {
        ev.set_variable(&variable, &format!("{status_code};{status_message}"));
    } else if status_code != 0 {
        ev.error("file", format!("DOWNLOAD failed: {}", outcome.log));
    }
    if let Some(variable) = parsed.one("LOG").map(str::to_string) {
        ev.set_variable(&variable, &outcome.log);
    }
    Flow::Normal
}

fn cmd_upload(ev: &mut Evaluator<'_>, values: &[String]) -> Flow {
    const SPECS: [OptSpec; 3] = [
        OptSpec::new("TIMEOUT", OptKind::Single),
        OptSpec::new("STATUS", OptKind::Single),
        OptSpec::new("LOG", OptKind::Single),
    ];
    let parsed = match parse_opts(values, 1, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("file", message);
            return Flow::Normal;
        }
    };
    let (Some(file), Some(url)) =
        (parsed.positionals().first(), parsed.positionals().get(1))
    else {
        ev.error("file", "UPLOAD requires a file and a url");
        return Flow::Normal;
    };
    let path = resolve_path(ev, file);

    // Uploads ride the platform fetcher.
    let argv = if cfg!(windows) {
        vec![
            "powershell".to_string(),
            "-NoProfile".to_string(),
            "-Command".to_string(),
            format!(
                "(New-Object Net.WebClient).UploadFile('{url}', '{}')",
                path.display()
            ),
        ]
    } else {
        vec![
            "curl".to_string(),
            "-sS".to_string(),
            "-T".to_string(),
            path.display().to_string(),
            url.clone(),
        ]
    };
    let mut request = ProcessRequest::new(argv);
    request.timeout_ms = parsed
        .one("TIMEOUT")
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(0, |seconds| seconds * 1000);
    let outcome = ev.effects.run_process(&request);

    if let Some(variable) = parsed.one("STATUS").map(str::to_string) {
        let message = if outcome.exit_code == 0 {
            "\"No error\"".to_string()
        } else {
            format!("\"{}\"", outcome.stderr.trim())
        };
        ev.set_variable(&variable, &format!("{};{message}", outcome.exit_code));
    } else if outcome.exit_code != 0 {
        ev.error("file", format!("UPLOAD failed: {}", outcome.stderr.trim()));
    }
    if let Some(variable) = parsed.one("LOG").map(str::to_string) {
        let log = format!("{}{}", outcome.stdout, outcome.stderr);
        ev.set_variable(&variable, &log);
    }
    Flow::Normal
}
