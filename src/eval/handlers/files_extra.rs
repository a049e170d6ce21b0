// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! `file()` path, glob, generate, lock, archive and runtime-dependency
//! subcommands.
//!
//! ```text
//! GLOB[_RECURSE]   wax glob, sorted, RELATIVE/LIST_DIRECTORIES/
//!                  FOLLOW_SYMLINKS
//! GENERATE         genex-evaluated content, CONDITION-gated
//! LOCK/UNLOCK      std file locks, GUARD PROCESS|FILE|FUNCTION,
//!                  auto-release on scope exit (no-op on Windows)
//! ARCHIVE_*        host tar/zip/unzip via the process effect
//! GET_RUNTIME_DEPENDENCIES
//!                  ldd parse + PRE/POST INCLUDE/EXCLUDE filters
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::effects::{FsRequest, ProcessRequest};
use crate::eval::opt::{OptKind, OptSpec, parse_opts};
use crate::eval::{Evaluator, FileLock, Flow, LockGuard, Severity};
use crate::utility::fs as fsutil;

use super::files::{resolve_output_path, resolve_path};

/// Dispatches the subcommands owned by this module.
pub(super) fn dispatch(ev: &mut Evaluator<'_>, subcommand: &str, values: &[String]) -> Flow {
    match subcommand {
        "READ_SYMLINK" => cmd_read_symlink(ev, values),
        "CREATE_LINK" => cmd_create_link(ev, values),
        "CHMOD" | "CHMOD_RECURSE" => cmd_chmod(ev, values, subcommand == "CHMOD_RECURSE"),
        "REAL_PATH" => cmd_real_path(ev, values),
        "RELATIVE_PATH" => cmd_relative_path(ev, values),
        "TO_CMAKE_PATH" => cmd_convert_path(ev, values, true),
        "TO_NATIVE_PATH" => cmd_convert_path(ev, values, false),
        "GLOB" | "GLOB_RECURSE" => cmd_glob(ev, values, subcommand == "GLOB_RECURSE"),
        "GENERATE" => cmd_generate(ev, values),
        "LOCK" => cmd_lock(ev, values),
        "ARCHIVE_CREATE" => cmd_archive_create(ev, values),
        "ARCHIVE_EXTRACT" => cmd_archive_extract(ev, values),
        "GET_RUNTIME_DEPENDENCIES" => cmd_get_runtime_dependencies(ev, values),
        _ => unreachable!("files dispatch covers this set"),
    }
}

fn cmd_read_symlink(ev: &mut Evaluator<'_>, values: &[String]) -> Flow {
    let (Some(raw), Some(out)) = (values.get(1), values.get(2)) else {
        ev.error("file", "READ_SYMLINK requires a link and an output variable");
        return Flow::Normal;
    };
    let path = resolve_path(ev, raw);
    match std::fs::read_link(&path) {
        Ok(target) => {
            let out = out.clone();
            ev.set_variable(&out, &target.to_string_lossy().replace('\\', "/"));
        }
        Err(e) => ev.error(
            "file",
            format!("failed to read symlink {}: {e}", path.display()),
        ),
    }
    Flow::Normal
}

fn cmd_create_link(ev: &mut Evaluator<'_>, values: &[String]) -> Flow {
    let (Some(original), Some(link)) = (values.get(1), values.get(2)) else {
        ev.error("file", "CREATE_LINK requires an original and a link path");
        return Flow::Normal;
    };
    let symbolic = values.iter().any(|v| v == "SYMBOLIC");
    let result_var = values
        .iter()
        .position(|v| v == "RESULT")
        .and_then(|pos| values.get(pos + 1))
        .cloned();

    let original_path = resolve_path(ev, original);
    let link_path = resolve_output_path(ev, link);

    let result = if symbolic {
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(&original_path, &link_path)
        }
        #[cfg(not(unix))]
        {
            std::fs::hard_link(&original_path, &link_path)
        }
    } else {
        std::fs::hard_link(&original_path, &link_path)
    };

    match (result, result_var) {
        (Ok(()), Some(variable)) => ev.set_variable(&variable, "0"),
        (Ok(()), None) => {}
        (Err(e), Some(variable)) => {
            let message = e.to_string();
            ev.set_variable(&variable, &message);
        }
        (Err(e), None) => ev.error(
            "file",
            format!("failed to link {}: {e}", link_path.display()),
        ),
    }
    Flow::Normal
}

/// Permission keyword to POSIX mode bit.
fn permission_bit(keyword: &str) -> Option<u32> {
    match keyword {
        "OWNER_READ" => Some(0o400),
        "OWNER_WRITE" => Some(0o200),
        "OWNER_EXECUTE" => Some(0o100),
        "GROUP_READ" => Some(0o040),
        "GROUP_WRITE" => Some(0o020),
        "GROUP_EXECUTE" => Some(0o010),
        "WORLD_READ" => Some(0o004),
        "WORLD_WRITE" => Some(0o002),
        "WORLD_EXECUTE" => Some(0o001),
        "SETUID" => Some(0o4000),
        "SETGID" => Some(0o2000),
        _ => None,
    }
}

fn cmd_chmod(ev: &mut Evaluator<'_>, values: &[String], recurse: bool) -> Flow {
    const SPECS: [OptSpec; 3] = [
        OptSpec::new("PERMISSIONS", OptKind::Multi),
        OptSpec::new("FILE_PERMISSIONS", OptKind::Multi),
        OptSpec::new("DIRECTORY_PERMISSIONS", OptKind::Multi),
    ];
    let parsed = match parse_opts(values, 1, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("file", message);
            return Flow::Normal;
        }
    };

    let mode_of = |keywords: &[String]| -> Option<u32> {
        if keywords.is_empty() {
            return None;
        }
        let mut mode = 0;
        for keyword in keywords {
            mode |= permission_bit(keyword)?;
        }
        Some(mode)
    };
    let common = mode_of(parsed.many("PERMISSIONS"));
    let file_mode = mode_of(parsed.many("FILE_PERMISSIONS")).or(common);
    let dir_mode = mode_of(parsed.many("DIRECTORY_PERMISSIONS")).or(common);

    if !cfg!(unix) {
        debug!("file(CHMOD) is a no-op on this host");
        return Flow::Normal;
    }

    let mut paths: Vec<PathBuf> = parsed
        .positionals()
        .iter()
        .map(|raw| resolve_path(ev, raw))
        .collect();
    if recurse {
        let mut expanded = Vec::new();
        for path in &paths {
            if path.is_dir() {
                let options = fsutil::WalkOptions::builder()
                    .with_list_directories(true)
                    .build();
                if let Ok(entries) = fsutil::walk_entries(path, &options) {
                    expanded.extend(entries);
                }
            }
        }
        paths.extend(expanded);
    }

    #[cfg(unix)]
    for path in paths {
        use std::os::unix::fs::PermissionsExt;
        let mode = if path.is_dir() { dir_mode } else { file_mode };
        let Some(mode) = mode else { continue };
        if let Err(e) = std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)) {
            ev.error("file", format!("failed to chmod {}: {e}", path.display()));
        }
    }
    #[cfg(not(unix))]
    let _ = (paths, file_mode, dir_mode);
    Flow::Normal
}

fn cmd_real_path(ev: &mut Evaluator<'_>, values: &[String]) -> Flow {
    let (Some(raw), Some(out)) = (values.get(1), values.get(2)) else {
        ev.error("file", "REAL_PATH requires a path and an output variable");
        return Flow::Normal;
    };
    let base = values
        .iter()
        .position(|v| v == "BASE_DIRECTORY")
        .and_then(|pos| values.get(pos + 1))
        .cloned();

    let path = Path::new(raw);
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else if let Some(base) = base {
        resolve_path(ev, &base).join(raw)
    } else {
        resolve_path(ev, raw)
    };
    let real = joined.canonicalize().unwrap_or(joined);
    let out = out.clone();
    ev.set_variable(&out, &real.to_string_lossy().replace('\\', "/"));
    Flow::Normal
}

fn cmd_relative_path(ev: &mut Evaluator<'_>, values: &[String]) -> Flow {
    let (Some(out), Some(base), Some(target)) = (values.get(1), values.get(2), values.get(3))
    else {
        ev.error("file", "RELATIVE_PATH requires output, base and path");
        return Flow::Normal;
    };
    let relative = relative_path(base, target);
    let out = out.clone();
    ev.set_variable(&out, &relative);
    Flow::Normal
}

/// Component-wise relative path; both inputs should be absolute.
fn relative_path(base: &str, target: &str) -> String {
    let base_parts: Vec<&str> = base.split(['/', '\\']).filter(|p| !p.is_empty()).collect();
    let target_parts: Vec<&str> = target
        .split(['/', '\\'])
        .filter(|p| !p.is_empty())
        .collect();

    let common = base_parts
        .iter()
        .zip(&target_parts)
        .take_while(|(a, b)| *a == *b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..base_parts.len() {
        parts.push("..".to_string());
    }
    for part in &target_parts[common..] {
        parts.push((*part).to_string());
    }
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

fn cmd_convert_path(ev: &mut Evaluator<'_>, values: &[String], to_cmake: bool) -> Flow {
    let (Some(input), Some(out)) = (values.get(1), values.get(2)) else {
        ev.error("file", "path conversion requires an input and an output");
        return Flow::Normal;
    };
    let result = if to_cmake {
        let slashes = input.replace('\\', "/");
        if cfg!(windows) {
            slashes
        } else {
            slashes.replace(':', ";")
        }
    } else if cfg!(windows) {
        input.replace('/', "\\")
    } else {
        input.replace(';', ":")
    };
    let out = out.clone();
    ev.set_variable(&out, &result);
    Flow::Normal
}

fn cmd_glob(ev: &mut Evaluator<'_>, values: &[String], recurse: bool) -> Flow {
    const SPECS: [OptSpec; 4] = [
        OptSpec::new("RELATIVE", OptKind::Single),
        OptSpec::new("LIST_DIRECTORIES", OptKind::Single),
        OptSpec::new("FOLLOW_SYMLINKS", OptKind::Flag),
        OptSpec::new("CONFIGURE_DEPENDS", OptKind::Flag),
    ];
    let parsed = match parse_opts(values, 1, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("file", message);
            return Flow::Normal;
        }
    };
    let Some(out) = parsed.positionals().first().cloned() else {
        ev.error("file", "GLOB requires an output variable");
        return Flow::Normal;
    };

    // GLOB lists directories by default; GLOB_RECURSE does not.
    let list_directories = parsed.one("LIST_DIRECTORIES").map_or(!recurse, |v| {
        !crate::expr::logic::is_false_constant(v)
    });
    let follow_symlinks = parsed.has("FOLLOW_SYMLINKS");
    let relative_base = parsed.one("RELATIVE").map(str::to_string);

    let mut matches: Vec<String> = Vec::new();
    for pattern in &parsed.positionals()[1..] {
        let normalized = pattern.replace('\\', "/");
        // Split into the literal directory prefix and the glob tail.
        let split_at = normalized
            .find(['*', '?', '['])
            .map_or(normalized.len(), |wild| {
                normalized[..wild].rfind('/').map_or(0, |slash| slash + 1)
            });
        let (root_part, glob_part) = normalized.split_at(split_at);
        let root = if root_part.is_empty() {
            resolve_path(ev, ".")
        } else {
            resolve_path(ev, root_part.trim_end_matches('/'))
        };
        if !root.exists() {
            continue;
        }

        let effective_pattern = if recurse && !glob_part.contains("**") {
            format!("**/{glob_part}")
        } else {
            glob_part.to_string()
        };
        let options = fsutil::WalkOptions::builder()
            .with_follow_links(follow_symlinks)
            .with_list_directories(list_directories)
            .maybe_with_max_depth(if recurse { None } else { Some(1) })
            .build();
        match fsutil::find_matches(&root, &effective_pattern, &options) {
            Ok(found) => {
                for path in found {
                    let text = path.to_string_lossy().replace('\\', "/");
                    let text = match &relative_base {
                        Some(base) => relative_path(base, &text),
                        None => text,
                    };
                    if !matches.contains(&text) {
                        matches.push(text);
                    }
                }
            }
            Err(e) => {
                ev.error("file", format!("GLOB failed: {e}"));
                return Flow::Normal;
            }
        }
    }
    matches.sort();
    ev.set_variable(&out, &matches.join(";"));
    Flow::Normal
}

fn cmd_generate(ev: &mut Evaluator<'_>, values: &[String]) -> Flow {
    const SPECS: [OptSpec; 6] = [
        OptSpec::new("OUTPUT", OptKind::Single),
        OptSpec::new("INPUT", OptKind::Single),
        OptSpec::new("CONTENT", OptKind::Single),
        OptSpec::new("CONDITION", OptKind::Single),
        OptSpec::new("USE_SOURCE_PERMISSIONS", OptKind::Flag),
        OptSpec::new("FILE_PERMISSIONS", OptKind::Multi),
    ];
    let parsed = match parse_opts(values, 1, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("file", message);
            return Flow::Normal;
        }
    };
    let Some(output) = parsed.one("OUTPUT").map(str::to_string) else {
        ev.error("file", "GENERATE requires OUTPUT");
        return Flow::Normal;
    };

    if let Some(condition) = parsed.one("CONDITION") {
        let evaluated = ev.eval_genex(condition, "");
        if crate::expr::logic::is_false_constant(&evaluated) {
            return Flow::Normal;
        }
    }

    let content = if let Some(content) = parsed.one("CONTENT") {
        content.to_string()
    } else if let Some(input) = parsed.one("INPUT") {
        let path = resolve_path(ev, input);
        match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                ev.error("file", format!("failed to read {}: {e}", path.display()));
                return Flow::Normal;
            }
        }
    } else {
        ev.error("file", "GENERATE requires INPUT or CONTENT");
        return Flow::Normal;
    };

    // Generator expressions resolve now, against the final-enough model.
    let evaluated = ev.eval_genex(&content, "");
    let output_name = ev.eval_genex(&output, "");
    let path = resolve_output_path(ev, &output_name);

    let outcome = ev
        .effects
        .run_fs(&FsRequest::EnsureParentDirs { path: path.clone() });
    if !outcome.status.is_ok() {
        ev.error("file", outcome.log);
        return Flow::Normal;
    }
    let outcome = ev.effects.run_fs(&FsRequest::WriteFileBytes {
        path: path.clone(),
        bytes: evaluated.into_bytes(),
    });
    if !outcome.status.is_ok() {
        ev.error("file", outcome.log);
        return Flow::Normal;
    }

    #[cfg(unix)]
    if let Some(mode) = parsed
        .many("FILE_PERMISSIONS")
        .iter()
        .try_fold(0u32, |mode, keyword| {
            permission_bit(keyword).map(|bit| mode | bit)
        })
        .filter(|_| !parsed.many("FILE_PERMISSIONS").is_empty())
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode));
    }
    Flow::Normal
}

fn cmd_lock(ev: &mut Evaluator<'_>, values: &[String]) -> Flow {
    const SPECS: [OptSpec; 5] = [
        OptSpec::new("DIRECTORY", OptKind::Flag),
        OptSpec::new("RELEASE", OptKind::Flag),
        OptSpec::new("GUARD", OptKind::Single),
        OptSpec::new("RESULT_VARIABLE", OptKind::Single),
        OptSpec::new("TIMEOUT", OptKind::Single),
    ];
    let parsed = match parse_opts(values, 1, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("file", message);
            return Flow::Normal;
        }
    };
    let Some(raw) = parsed.positionals().first() else {
        ev.error("file", "LOCK requires a path");
        return Flow::Normal;
    };
    let mut path = resolve_output_path(ev, raw);
    if parsed.has("DIRECTORY") {
        path = path.join("cmake.lock");
    }
    let display = path.to_string_lossy().replace('\\', "/");
    let result_variable = parsed.one("RESULT_VARIABLE").map(str::to_string);

    if parsed.has("RELEASE") {
        let released = ev.release_lock(&display);
        if let Some(variable) = result_variable {
            ev.set_variable(&variable, if released { "0" } else { "File not locked" });
        }
        return Flow::Normal;
    }

    let guard = match parsed.one("GUARD") {
        Some("FILE") => LockGuard::File,
        Some("FUNCTION") => LockGuard::Function,
        Some("PROCESS") | None => LockGuard::Process,
        Some(other) => {
            ev.error("file", format!("unknown GUARD '{other}'"));
            return Flow::Normal;
        }
    };

    if cfg!(windows) {
        // Deterministic no-op on the Windows backend.
        ev.diag(
            Severity::Warning,
            "evaluator",
            "file",
            "file(LOCK) unsupported on Windows backend",
            display.clone(),
        );
        let (file_depth, function_depth) = (ev.file_depth, ev.function_depth);
        ev.track_lock(FileLock {
            path: display,
            handle: None,
            guard,
            owner_file_depth: file_depth,
            owner_function_depth: function_depth,
        });
        if let Some(variable) = result_variable {
            ev.set_variable(&variable, "0");
        }
        return Flow::Normal;
    }

    let outcome = ev
        .effects
        .run_fs(&FsRequest::EnsureParentDirs { path: path.clone() });
    if !outcome.status.is_ok() {
        ev.error("file", outcome.log);
        return Flow::Normal;
    }
    let file = match std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)
    {
        Ok(file) => file,
        Err(e) => {
            let message = format!("failed to open lock file {display}: {e}");
            match result_variable {
                Some(variable) => ev.set_variable(&variable, &message),
                None => ev.error("file", message),
            }
            return Flow::Normal;
        }
    };

    if let Err(e) = file.lock() {
        let message = format!("failed to lock {display}: {e}");
        match result_variable {
            Some(variable) => ev.set_variable(&variable, &message),
            None => ev.error("file", message),
        }
        return Flow::Normal;
    }

    let (file_depth, function_depth) = (ev.file_depth, ev.function_depth);
    ev.track_lock(FileLock {
        path: display,
        handle: Some(file),
        guard,
        owner_file_depth: file_depth,
        owner_function_depth: function_depth,
    });
    if let Some(variable) = result_variable {
        ev.set_variable(&variable, "0");
    }
    Flow::Normal
}

fn cmd_archive_create(ev: &mut Evaluator<'_>, values: &[String]) -> Flow {
    const SPECS: [OptSpec; 4] = [
        OptSpec::new("OUTPUT", OptKind::Single),
        OptSpec::new("PATHS", OptKind::Multi),
        OptSpec::new("FORMAT", OptKind::Single),
        OptSpec::new("COMPRESSION", OptKind::Single),
    ];
    let parsed = match parse_opts(values, 1, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("file", message);
            return Flow::Normal;
        }
    };
    let Some(output) = parsed.one("OUTPUT").map(str::to_string) else {
        ev.error("file", "ARCHIVE_CREATE requires OUTPUT");
        return Flow::Normal;
    };
    let paths = parsed.many("PATHS");
    if paths.is_empty() {
        ev.error("file", "ARCHIVE_CREATE requires PATHS");
        return Flow::Normal;
    }
    let output_path = resolve_output_path(ev, &output);

    let format = parsed.one("FORMAT").unwrap_or("paxr");
    let mut argv: Vec<String> = if format.eq_ignore_ascii_case("zip") {
        let mut argv = vec![
            "zip".to_string(),
            "-r".to_string(),
            output_path.display().to_string(),
        ];
        argv.extend(paths.iter().cloned());
        argv
    } else {
        let compression_flag = match parsed.one("COMPRESSION").map(str::to_ascii_lowercase) {
            Some(c) if c == "gzip" => "z",
            Some(c) if c == "bzip2" => "j",
            Some(c) if c == "xz" => "J",
            _ => "",
        };
        let mut argv = vec![
            "tar".to_string(),
            format!("-c{compression_flag}f"),
            output_path.display().to_string(),
        ];
        argv.extend(paths.iter().cloned());
        argv
    };
    argv.retain(|arg| !arg.is_empty());

    let mut request = ProcessRequest::new(argv);
    request.working_dir = ev
        .variable("CMAKE_CURRENT_SOURCE_DIR")
        .map(PathBuf::from);
    let outcome = ev.effects.run_process(&request);
    if outcome.exit_code != 0 {
        ev.error(
            "file",
            format!("ARCHIVE_CREATE failed: {}", outcome.stderr.trim()),
        );
    }
    Flow::Normal
}

fn cmd_archive_extract(ev: &mut Evaluator<'_>, values: &[String]) -> Flow {
    const SPECS: [OptSpec; 3] = [
        OptSpec::new("INPUT", OptKind::Single),
        OptSpec::new("DESTINATION", OptKind::Single),
        OptSpec::new("PATTERNS", OptKind::Multi),
    ];
    let parsed = match parse_opts(values, 1, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("file", message);
            return Flow::Normal;
        }
    };
    let Some(input) = parsed.one("INPUT").map(str::to_string) else {
        ev.error("file", "ARCHIVE_EXTRACT requires INPUT");
        return Flow::Normal;
    };
    let input_path = resolve_path(ev, &input);
    let destination = parsed
        .one("DESTINATION")
        .map_or_else(|| resolve_output_path(ev, "."), |d| resolve_output_path(ev, d));

    let outcome = ev.effects.run_fs(&FsRequest::Mkdir {
        path: destination.clone(),
    });
    if !outcome.status.is_ok() {
        ev.error("file", outcome.log);
        return Flow::Normal;
    }

    let is_zip = input_path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
    let mut argv: Vec<String> = if is_zip {
        vec![
            "unzip".to_string(),
            "-o".to_string(),
            input_path.display().to_string(),
            "-d".to_string(),
            destination.display().to_string(),
        ]
    } else {
        vec![
            "tar".to_string(),
            "-xf".to_string(),
            input_path.display().to_string(),
            "-C".to_string(),
            destination.display().to_string(),
        ]
    };
    argv.extend(parsed.many("PATTERNS").iter().cloned());

    let outcome = ev.effects.run_process(&ProcessRequest::new(argv));
    if outcome.exit_code != 0 {
        ev.error(
            "file",
            format!("ARCHIVE_EXTRACT failed: {}", outcome.stderr.trim()),
        );
    }
    Flow::Normal
}

#[allow(clippy::too_many_lines)]
fn cmd_get_runtime_dependencies(ev: &mut Evaluator<'_>, values: &[String]) -> Flow {
    const SPECS: [OptSpec; 12] = [
        OptSpec::new("EXECUTABLES", OptKind::Multi),
        OptSpec::new("LIBRARIES", OptKind::Multi),
        OptSpec::new("MODULES", OptKind::Multi),
        OptSpec::new("RESOLVED_DEPENDENCIES_VAR", OptKind::Single),
        OptSpec::new("UNRESOLVED_DEPENDENCIES_VAR", OptKind::Single),
        OptSpec::new("CONFLICTING_DEPENDENCIES_PREFIX", OptKind::Single),
        OptSpec::new("DIRECTORIES", OptKind::Multi),
        OptSpec::new("PRE_INCLUDE_REGEXES", OptKind::Multi),
        OptSpec::new("PRE_EXCLUDE_REGEXES", OptKind::Multi),
        OptSpec::new("POST_INCLUDE_REGEXES", OptKind::Multi),
        OptSpec::new("POST_EXCLUDE_REGEXES", OptKind::Multi),
        OptSpec::new("POST_INCLUDE_FILES", OptKind::Multi),
    ];
    if cfg!(windows) {
        // The Windows backend of this command is a documented no-op.
        ev.diag(
            Severity::Warning,
            "evaluator",
            "file",
            "GET_RUNTIME_DEPENDENCIES unsupported on Windows backend",
            "",
        );
        return Flow::Normal;
    }
    let parsed = match parse_opts(values, 1, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("file", message);
            return Flow::Normal;
        }
    };

    let compile = |patterns: &[String]| -> Result<Vec<regex::Regex>, String> {
        patterns
            .iter()
            .map(|p| regex::Regex::new(p).map_err(|e| format!("invalid regex '{p}': {e}")))
            .collect()
    };
    let (pre_include, pre_exclude, post_include, post_exclude) = match (
        compile(parsed.many("PRE_INCLUDE_REGEXES")),
        compile(parsed.many("PRE_EXCLUDE_REGEXES")),
        compile(parsed.many("POST_INCLUDE_REGEXES")),
        compile(parsed.many("POST_EXCLUDE_REGEXES")),
    ) {
        (Ok(a), Ok(b), Ok(c), Ok(d)) => (a, b, c, d),
        (Err(e), ..) | (_, Err(e), ..) | (_, _, Err(e), _) | (_, _, _, Err(e)) => {
            ev.error("file", e);
            return Flow::Normal;
        }
    };

    let mut resolved: Vec<String> = Vec::new();
    let mut unresolved: Vec<String> = Vec::new();
    let mut by_name: std::collections::BTreeMap<String, Vec<String>> =
        std::collections::BTreeMap::new();

    let binaries: Vec<String> = parsed
        .many("EXECUTABLES")
        .iter()
        .chain(parsed.many("LIBRARIES"))
        .chain(parsed.many("MODULES"))
        .cloned()
        .collect();

    for binary in &binaries {
        let path = resolve_path(ev, binary);
        let outcome = ev.effects.run_process(&ProcessRequest::new(vec![
            "ldd".to_string(),
            path.display().to_string(),
        ]));
        if outcome.exit_code != 0 {
            ev.error(
                "file",
                format!("ldd failed for {}: {}", path.display(), outcome.stderr.trim()),
            );
            continue;
        }

        for line in outcome.stdout.lines() {
            let line = line.trim();
            // "name => path (0x...)" or "name (0x...)" or "path (0x...)".
            let (name, target) = match line.split_once("=>") {
                Some((name, rest)) => {
                    let target = rest.trim().split(" (").next().unwrap_or("").trim();
                    (name.trim().to_string(), target.to_string())
                }
                None => {
                    let name = line.split(" (").next().unwrap_or("").trim();
                    (name.to_string(), name.to_string())
                }
            };
            if name.is_empty() {
                continue;
            }

            // Pre filters act on the soname.
            if !pre_include.is_empty() && !pre_include.iter().any(|re| re.is_match(&name)) {
                continue;
            }
            if pre_exclude.iter().any(|re| re.is_match(&name)) {
                continue;
            }

            // Resolution: reported path, then DIRECTORIES.
            let mut resolved_path = if target != "not found" && Path::new(&target).exists() {
                Some(target.clone())
            } else {
                None
            };
            if resolved_path.is_none() {
                for dir in parsed.many("DIRECTORIES") {
                    let candidate = Path::new(dir).join(&name);
                    if candidate.exists() {
                        resolved_path =
                            Some(candidate.to_string_lossy().replace('\\', "/"));
                        break;
                    }
                }
            }

            match resolved_path {
                Some(path_text) => {
                    // Post filters act on the resolved path.
                    let post_included = parsed
                        .many("POST_INCLUDE_FILES")
                        .iter()
                        .any(|f| f == &path_text)
                        || post_include.iter().any(|re| re.is_match(&path_text));
                    if !post_included && post_exclude.iter().any(|re| re.is_match(&path_text)) {
                        continue;
                    }
                    let entries = by_name.entry(name).or_default();
                    if !entries.contains(&path_text) {
                        entries.push(path_text.clone());
                    }
                    if !resolved.contains(&path_text) {
                        resolved.push(path_text);
                    }
                }
                None => {
                    if !unresolved.contains(&name) {
                        unresolved.push(name);
                    }
                }
            }
        }
    }

    // Conflicts: one soname resolved to multiple paths.
    if let Some(prefix) = parsed.one("CONFLICTING_DEPENDENCIES_PREFIX").map(str::to_string) {
        let conflicting: Vec<String> = by_name
            .iter()
            .filter(|(_, paths)| paths.len() > 1)
            .map(|(name, _)| name.clone())
            .collect();
        for name in &conflicting {
            let paths = by_name[name].join(";");
            ev.set_variable(&format!("{prefix}_{name}"), &paths);
            // Conflicting entries leave the resolved list.
            resolved.retain(|path| !by_name[name].contains(path));
        }
        ev.set_variable(&format!("{prefix}_FILENAMES"), &conflicting.join(";"));
    }

    if let Some(variable) = parsed.one("RESOLVED_DEPENDENCIES_VAR").map(str::to_string) {
        ev.set_variable(&variable, &resolved.join(";"));
    }
    if let Some(variable) = parsed.one("UNRESOLVED_DEPENDENCIES_VAR").map(str::to_string) {
        ev.set_variable(&variable, &unresolved.join(";"));
    }
    Flow::Normal
}
