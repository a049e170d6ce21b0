// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Filesystem effect operations.
//!
//! ```text
//! FsRequest
//!   EnsureParentDirs | WriteFileBytes | Mkdir | DeletePathRecursive
//!   CopyEntryToDestination | DownloadToPath | DeleteFile
//!   CopyDirectoryRecursive | GetFileType | CopyFile | ReadDir
//!        |
//! FsOutcome { status, log, entries, file_kind }
//! ```
//!
//! Downloads are dispatched by the executor (they need the runtime);
//! everything else is plain sync std::fs + the fs utilities.

use std::path::PathBuf;

use super::EffectStatus;
use crate::utility::fs as fsutil;

/// What a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
    /// Nothing there.
    Missing,
}

impl FileKind {
    /// Keyword spelling used by handlers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "FILE",
            Self::Directory => "DIRECTORY",
            Self::Symlink => "SYMLINK",
            Self::Missing => "MISSING",
        }
    }
}

/// One filesystem operation.
#[derive(Debug, Clone)]
pub enum FsRequest {
    /// Create every missing parent directory of `path`.
    EnsureParentDirs {
        /// File whose parents must exist.
        path: PathBuf,
    },
    /// Write bytes, replacing any existing file.
    WriteFileBytes {
        /// Destination file.
        path: PathBuf,
        /// Content.
        bytes: Vec<u8>,
    },
    /// Create a directory (and parents).
    Mkdir {
        /// Directory to create.
        path: PathBuf,
    },
    /// Delete a file or directory tree; missing paths are fine.
    DeletePathRecursive {
        /// Path to remove.
        path: PathBuf,
    },
    /// Copy a file or directory into a destination directory.
    CopyEntryToDestination {
        /// Source entry.
        source: PathBuf,
        /// Destination directory.
        dest_dir: PathBuf,
    },
    /// Fetch a URL to a local path (`file://` native, http(s) streamed).
    DownloadToPath {
        /// Source URL.
        url: String,
        /// Destination file.
        path: PathBuf,
        /// Timeout in milliseconds; 0 disables.
        timeout_ms: u64,
    },
    /// Delete a single file; missing is fine.
    DeleteFile {
        /// File to remove.
        path: PathBuf,
    },
    /// Copy a directory tree onto a destination directory.
    CopyDirectoryRecursive {
        /// Source directory.
        source: PathBuf,
        /// Destination directory.
        dest: PathBuf,
    },
    /// Classify a path.
    GetFileType {
        /// Path to classify.
        path: PathBuf,
    },
    /// Copy one file to an explicit destination path.
    CopyFile {
        /// Source file.
        source: PathBuf,
        /// Destination file.
        dest: PathBuf,
    },
    /// List directory entry names, sorted.
    ReadDir {
        /// Directory to list.
        path: PathBuf,
    },
}

/// Outcome envelope of a filesystem operation.
#[derive(Debug, Clone, Default)]
pub struct FsOutcome {
    /// Envelope status.
    pub status: EffectStatus,
    /// Human-readable log (errors, download transcript).
    pub log: String,
    /// `ReadDir` entry names.
    pub entries: Vec<String>,
    /// `GetFileType` classification.
    pub file_kind: Option<FileKind>,
}

impl FsOutcome {
    fn ok() -> Self {
        Self::default()
    }

    fn error(log: String) -> Self {
        Self {
            status: EffectStatus::ExecError,
            log,
            entries: Vec::new(),
            file_kind: None,
        }
    }
}

/// Runs one filesystem operation synchronously.
#[allow(clippy::too_many_lines)]
pub(super) fn run(request: &FsRequest) -> FsOutcome {
    match request {
        FsRequest::EnsureParentDirs { path } => match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                match std::fs::create_dir_all(parent) {
                    Ok(()) => FsOutcome::ok(),
                    Err(e) => {
                        FsOutcome::error(format!("failed to create {}: {e}", parent.display()))
                    }
                }
            }
            _ => FsOutcome::ok(),
        },
        FsRequest::WriteFileBytes { path, bytes } => match std::fs::write(path, bytes) {
            Ok(()) => FsOutcome::ok(),
            Err(e) => FsOutcome::error(format!("failed to write {}: {e}", path.display())),
        },
        FsRequest::Mkdir { path } => match std::fs::create_dir_all(path) {
            Ok(()) => FsOutcome::ok(),
            Err(e) => FsOutcome::error(format!("failed to create {}: {e}", path.display())),
        },
        FsRequest::DeletePathRecursive { path } => {
            if !path.exists() {
                return FsOutcome::ok();
            }
            let result = if path.is_dir() {
                std::fs::remove_dir_all(path)
            } else {
                std::fs::remove_file(path)
            };
            match result {
                Ok(()) => FsOutcome::ok(),
                Err(e) => FsOutcome::error(format!("failed to remove {}: {e}", path.display())),
            }
        }
        FsRequest::CopyEntryToDestination { source, dest_dir } => {
            match fsutil::copy_entry(source, dest_dir) {
                Ok(()) => FsOutcome::ok(),
                Err(e) => FsOutcome::error(e.to_string()),
            }
        }
        FsRequest::DownloadToPath { url, .. } => {
            // The executor routes downloads to the network module; a bare
            // fsops call cannot satisfy them.
            FsOutcome::error(format!("download of {url} requires the real executor"))
        }
        FsRequest::DeleteFile { path } => {
            if !path.exists() {
                return FsOutcome::ok();
            }
            match std::fs::remove_file(path) {
                Ok(()) => FsOutcome::ok(),
                Err(e) => FsOutcome::error(format!("failed to remove {}: {e}", path.display())),
            }
        }
        FsRequest::CopyDirectoryRecursive { source, dest } => {
            match fsutil::copy_dir_recursive(source, dest) {
                Ok(copied) => FsOutcome {
                    log: format!("copied {copied} files"),
                    ..FsOutcome::ok()
                },
                Err(e) => FsOutcome::error(e.to_string()),
            }
        }
        FsRequest::GetFileType { path } => {
            let kind = match std::fs::symlink_metadata(path) {
                Err(_) => FileKind::Missing,
                Ok(meta) if meta.file_type().is_symlink() => FileKind::Symlink,
                Ok(meta) if meta.is_dir() => FileKind::Directory,
                Ok(_) => FileKind::File,
            };
            FsOutcome {
                file_kind: Some(kind),
                ..FsOutcome::ok()
            }
        }
        FsRequest::CopyFile { source, dest } => {
            if let Some(parent) = dest.parent()
                && !parent.as_os_str().is_empty()
                && let Err(e) = std::fs::create_dir_all(parent)
            {
                return FsOutcome::error(format!("failed to create {}: {e}", parent.display()));
            }
            match std::fs::copy(source, dest) {
                Ok(_) => FsOutcome::ok(),
                Err(e) => FsOutcome::error(format!(
                    "failed to copy {} to {}: {e}",
                    source.display(),
                    dest.display()
                )),
            }
        }
        FsRequest::ReadDir { path } => match std::fs::read_dir(path) {
            Ok(iter) => {
                let mut entries: Vec<String> = iter
                    .filter_map(std::result::Result::ok)
                    .map(|entry| entry.file_name().to_string_lossy().into_owned())
                    .collect();
                entries.sort();
                FsOutcome {
                    entries,
                    ..FsOutcome::ok()
                }
            }
            Err(e) => FsOutcome::error(format!("failed to read {}: {e}", path.display())),
        },
    }
}
