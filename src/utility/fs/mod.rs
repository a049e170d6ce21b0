// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Filesystem utilities: deterministic directory walks and glob matching.
//!
//! ```text
//! walk:  walk_entries()   ignore::WalkBuilder (sequential, sorted)
//!        find_matches()   wax glob against root-relative paths
//!        WalkOptions      max_depth, follow_links, list_directories
//! copy:  copy_dir_recursive()  recursive file/dir copy
//!        copy_entry()          file-or-directory dispatch
//! ```
//!
//! `file(GLOB)` results must be stable across hosts, so traversal is
//! sequential and output is sorted.

use anyhow::Context;
use bon::Builder;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use wax::{Glob, Program};

use crate::error::Result;

/// Options for directory traversal.
#[derive(Debug, Clone, Builder)]
pub struct WalkOptions {
    /// Maximum depth to traverse (None = unlimited)
    #[builder(setters(name = with_max_depth))]
    max_depth: Option<usize>,
    /// Follow symbolic links
    #[builder(setters(name = with_follow_links), default = false)]
    follow_links: bool,
    /// Include directories in the result set
    #[builder(setters(name = with_list_directories), default = false)]
    list_directories: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl WalkOptions {
    /// Returns the maximum depth to traverse.
    #[must_use]
    pub const fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Returns whether to follow symbolic links.
    #[must_use]
    pub const fn follow_links(&self) -> bool {
        self.follow_links
    }

    /// Returns whether directories appear in the result set.
    #[must_use]
    pub const fn list_directories(&self) -> bool {
        self.list_directories
    }
}

/// Builds a sequential walker over everything under `root`.
///
/// Standard ignore-file filters are disabled: a glob over a source tree
/// must see every entry, not just the ones git would track.
fn build_walker(root: &Path, options: &WalkOptions) -> WalkBuilder {
    let mut builder = WalkBuilder::new(root);
    builder
        .max_depth(options.max_depth())
        .follow_links(options.follow_links())
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .ignore(false)
        .parents(false)
        .sort_by_file_path(std::path::Path::cmp);
    builder
}

/// Collects every file (and optionally directory) under `root`.
///
/// The root itself is not part of the result. Entries come back sorted by
/// path.
///
/// # Errors
///
/// Returns an error if the root directory does not exist.
pub fn walk_entries<P: AsRef<Path>>(root: P, options: &WalkOptions) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();

    if !root.exists() {
        anyhow::bail!("root directory does not exist: {}", root.display());
    }

    let mut entries = Vec::new();
    for entry in build_walker(root, options).build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "walk error");
                continue;
            }
        };
        if entry.path() == root {
            continue;
        }
        let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
        if is_dir && !options.list_directories() {
            continue;
        }
        entries.push(entry.path().to_path_buf());
    }
    Ok(entries)
}

/// Finds entries under `root` whose root-relative path matches a glob
/// pattern.
///
/// Uses the `wax` crate. Matching is done against forward-slash relative
/// paths, so patterns behave identically on every host.
///
/// # Errors
///
/// Returns an error if the root does not exist or the pattern is invalid.
pub fn find_matches<P: AsRef<Path>>(
    root: P,
    pattern: &str,
    options: &WalkOptions,
) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    let glob =
        Glob::new(pattern).map_err(|e| anyhow::anyhow!("invalid glob pattern '{pattern}': {e}"))?;

    let mut matches = Vec::new();
    for path in walk_entries(root, options)? {
        if let Ok(rel) = path.strip_prefix(root)
            && glob.is_match(rel)
        {
            matches.push(path);
        }
    }
    Ok(matches)
}

/// Recursively copies a directory tree, creating destination directories
/// as needed. Returns the number of files copied.
///
/// # Errors
///
/// Returns an error if the source does not exist or any copy fails.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<u64> {
    if !src.is_dir() {
        anyhow::bail!("source is not a directory: {}", src.display());
    }
    std::fs::create_dir_all(dst)
        .with_context(|| format!("failed to create directory {}", dst.display()))?;

    let mut copied = 0;
    let entries = std::fs::read_dir(src)
        .with_context(|| format!("failed to read directory {}", src.display()))?;
    for entry in entries {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copied += copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path).with_context(|| {
                format!(
                    "failed to copy {} to {}",
                    src_path.display(),
                    dst_path.display()
                )
            })?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Copies a single filesystem entry into a destination directory.
///
/// Files land as `dst_dir/<file name>`; directories are copied
/// recursively as `dst_dir/<dir name>`.
///
/// # Errors
///
/// Returns an error if the source does not exist or the copy fails.
pub fn copy_entry(src: &Path, dst_dir: &Path) -> Result<()> {
    let name = src
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("source has no file name: {}", src.display()))?;
    let dst = dst_dir.join(name);

    if src.is_dir() {
        copy_dir_recursive(src, &dst)?;
    } else {
        std::fs::create_dir_all(dst_dir)
            .with_context(|| format!("failed to create directory {}", dst_dir.display()))?;
        std::fs::copy(src, &dst)
            .with_context(|| format!("failed to copy {} to {}", src.display(), dst.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests;
