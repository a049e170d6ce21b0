// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Effect layer: every interaction with the host OS goes through here.
//!
//! ```text
//! Evaluator ──► EffectExecutor (trait)
//!                  |
//!       +---------+----------+
//!       v         v          v
//!   process    toolchain    fs ops
//!   (tokio)    probes       (+ reqwest downloads)
//!
//! RealExecutor: current-thread tokio runtime behind a sync facade
//! FakeExecutor: canned outcomes, keeps the pipeline hermetic in tests
//! ```
//!
//! The evaluator itself is synchronous; effect calls are its only
//! blocking points, each carrying its own timeout.

pub mod download;
pub mod fsops;
pub mod process;
pub mod toolchain;

#[cfg(test)]
mod tests;

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::Result;

pub use fsops::{FileKind, FsOutcome, FsRequest};
pub use process::{ProcessOutcome, ProcessRequest};
pub use toolchain::{CompileRequest, ProbeOutcome, ProbeRequest};

/// Uniform status for every effect envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectStatus {
    /// Effect ran and reported success.
    #[default]
    Ok,
    /// Request was structurally invalid.
    InvalidInput,
    /// The effect could not be executed (spawn/IO failure).
    ExecError,
    /// The per-effect timeout elapsed.
    Timeout,
    /// The effect ran but the underlying process failed.
    ExitNonzero,
}

impl EffectStatus {
    /// True for `Ok`.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Narrow surface the evaluator uses for side effects.
pub trait EffectExecutor {
    /// Runs a process to completion, capturing output.
    fn run_process(&self, request: &ProcessRequest) -> ProcessOutcome;
    /// Compiles (and optionally runs) a probe source file.
    fn run_probe(&self, request: &ProbeRequest) -> ProbeOutcome;
    /// Performs one filesystem operation.
    fn run_fs(&self, request: &FsRequest) -> FsOutcome;
}

/// Production executor: a current-thread tokio runtime drives process
/// execution and downloads behind the synchronous trait surface.
pub struct RealExecutor {
    runtime: tokio::runtime::Runtime,
}

impl RealExecutor {
    /// Builds the executor and its runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the tokio runtime cannot be created.
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { runtime })
    }
}

impl EffectExecutor for RealExecutor {
    fn run_process(&self, request: &ProcessRequest) -> ProcessOutcome {
        self.runtime.block_on(process::run(request))
    }

    fn run_probe(&self, request: &ProbeRequest) -> ProbeOutcome {
        toolchain::run(self, request)
    }

    fn run_fs(&self, request: &FsRequest) -> FsOutcome {
        match request {
            FsRequest::DownloadToPath {
                url,
                path,
                timeout_ms,
            } => self
                .runtime
                .block_on(download::download_to_path(url, path, *timeout_ms)),
            other => fsops::run(other),
        }
    }
}

/// Test double returning canned outcomes.
///
/// Process and probe outcomes are popped FIFO from queues seeded by the
/// test; filesystem ops run for real (tests use tempdirs) unless a
/// download is requested, which always fails deterministically.
#[derive(Default)]
pub struct FakeExecutor {
    process_queue: RefCell<VecDeque<ProcessOutcome>>,
    probe_queue: RefCell<VecDeque<ProbeOutcome>>,
}

impl FakeExecutor {
    /// Empty fake: processes report `ExecError`, probes report failure.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the outcome of the next `run_process` call.
    pub fn push_process_outcome(&self, outcome: ProcessOutcome) {
        self.process_queue.borrow_mut().push_back(outcome);
    }

    /// Queues the outcome of the next `run_probe` call.
    pub fn push_probe_outcome(&self, outcome: ProbeOutcome) {
        self.probe_queue.borrow_mut().push_back(outcome);
    }
}

impl EffectExecutor for FakeExecutor {
    fn run_process(&self, request: &ProcessRequest) -> ProcessOutcome {
        self.process_queue.borrow_mut().pop_front().unwrap_or_else(|| {
            ProcessOutcome {
                status: EffectStatus::ExecError,
                exit_code: -1,
                timed_out: false,
                stdout: String::new(),
                stderr: format!("fake executor: no canned outcome for {:?}", request.argv),
            }
        })
    }

    fn run_probe(&self, _request: &ProbeRequest) -> ProbeOutcome {
        self.probe_queue.borrow_mut().pop_front().unwrap_or_else(|| {
            ProbeOutcome {
                status: EffectStatus::ExitNonzero,
                compile_ok: false,
                compile_output: "fake executor: no canned probe outcome".to_string(),
                run_exit_code: -1,
                run_output: String::new(),
            }
        })
    }

    fn run_fs(&self, request: &FsRequest) -> FsOutcome {
        if let FsRequest::DownloadToPath { url, .. } = request {
            return FsOutcome {
                status: EffectStatus::ExecError,
                log: format!("fake executor: download of {url} suppressed"),
                entries: Vec::new(),
                file_kind: None,
            };
        }
        fsops::run(request)
    }
}
