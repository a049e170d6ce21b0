// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! `file(DOWNLOAD)` network effect.
//!
//! ```text
//! file://...   -> native copy
//! http(s)://   -> reqwest streaming + indicatif spinner
//! other        -> UnsupportedScheme
//!
//! Global client: OnceLock, connection pool, keep-alive
//! Partial files: guard removes them on error paths
//! ```

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::fsops::FsOutcome;
use super::EffectStatus;
use crate::error::EffectError;

static CLIENT: OnceLock<Client> = OnceLock::new();

fn client() -> &'static Client {
    CLIENT.get_or_init(|| {
        Client::builder()
            .user_agent(concat!("nobify-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default()
    })
}

/// RAII guard that removes a partial download file on Drop unless
/// explicitly kept, so error paths never leave half-written files.
struct PartialFileGuard {
    path: PathBuf,
    keep: bool,
}

impl PartialFileGuard {
    const fn new(path: PathBuf) -> Self {
        Self { path, keep: false }
    }

    /// Mark the download as complete - file will NOT be deleted on drop.
    const fn keep(&mut self) {
        self.keep = true;
    }
}

impl Drop for PartialFileGuard {
    fn drop(&mut self) {
        if !self.keep && self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "failed to remove partial download");
            }
        }
    }
}

/// Fetches `url` into `path`, returning a human-readable transcript in
/// the outcome log.
pub(super) async fn download_to_path(url: &str, path: &Path, timeout_ms: u64) -> FsOutcome {
    if let Some(local) = url.strip_prefix("file://") {
        return copy_local(local, path);
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return download_http(url, path, timeout_ms).await;
    }

    FsOutcome {
        status: EffectStatus::InvalidInput,
        log: EffectError::UnsupportedScheme(url.to_string()).to_string(),
        entries: Vec::new(),
        file_kind: None,
    }
}

fn copy_local(source: &str, path: &Path) -> FsOutcome {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        return fail(format!("failed to create {}: {e}", parent.display()));
    }
    match std::fs::copy(source, path) {
        Ok(bytes) => FsOutcome {
            status: EffectStatus::Ok,
            log: format!("copied {bytes} bytes from file://{source}"),
            entries: Vec::new(),
            file_kind: None,
        },
        Err(e) => fail(format!("failed to copy file://{source}: {e}")),
    }
}

async fn download_http(url: &str, path: &Path, timeout_ms: u64) -> FsOutcome {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        return fail(format!("failed to create {}: {e}", parent.display()));
    }

    debug!(url = %url, dest = %path.display(), "downloading");

    let mut request = client().get(url);
    if timeout_ms > 0 {
        request = request.timeout(Duration::from_millis(timeout_ms));
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            let error = EffectError::Download {
                url: url.to_string(),
                message: e.to_string(),
            };
            return fail(error.to_string());
        }
    };
    let status = response.status();
    if !status.is_success() {
        let error = EffectError::HttpError {
            status: status.as_u16(),
            url: url.to_string(),
        };
        return fail(error.to_string());
    }

    let total = response.content_length();
    let progress = total.map_or_else(
        || ProgressBar::new_spinner().with_message(url.to_string()),
        ProgressBar::new,
    );
    if total.is_some() {
        progress.set_style(
            ProgressStyle::with_template("{bar:30} {bytes}/{total_bytes} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
    }

    let mut guard = PartialFileGuard::new(path.to_path_buf());
    let mut file = match tokio::fs::File::create(path).await {
        Ok(file) => file,
        Err(e) => return fail(format!("failed to create {}: {e}", path.display())),
    };

    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                progress.finish_and_clear();
                return fail(format!("download of {url} interrupted: {e}"));
            }
        };
        if let Err(e) = file.write_all(&chunk).await {
            progress.finish_and_clear();
            return fail(format!("failed to write {}: {e}", path.display()));
        }
        downloaded += chunk.len() as u64;
        progress.set_position(downloaded);
    }

    if let Err(e) = file.flush().await {
        progress.finish_and_clear();
        return fail(format!("failed to flush {}: {e}", path.display()));
    }
    progress.finish_and_clear();
    guard.keep();

    FsOutcome {
        status: EffectStatus::Ok,
        log: format!("downloaded {downloaded} bytes from {url} (status {})", status.as_u16()),
        entries: Vec::new(),
        file_kind: None,
    }
}

fn fail(log: String) -> FsOutcome {
    FsOutcome {
        status: EffectStatus::ExecError,
        log,
        entries: Vec::new(),
        file_kind: None,
    }
}
