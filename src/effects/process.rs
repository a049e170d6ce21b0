// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Process execution effect.
//!
//! ```text
//! ProcessRequest { argv, working_dir, timeout_ms, capture_* }
//!        |
//!   tokio::process::Command, kill_on_drop
//!   tokio::time::timeout -> kill + exit code 124
//!        |
//! ProcessOutcome { status, exit_code, timed_out, stdout, stderr }
//! ```

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, trace};

use super::EffectStatus;
use crate::utility::encoding::{Encoding, bytes_to_utf8};

/// Exit code reported for killed-on-timeout children, matching the
/// conventional `timeout(1)` value.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// A process execution request.
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    /// Program and arguments; `argv[0]` is the program.
    pub argv: Vec<String>,
    /// Working directory, if any.
    pub working_dir: Option<PathBuf>,
    /// Extra environment entries layered over the inherited environment.
    pub env: Vec<(String, String)>,
    /// Kill the child after this many milliseconds; 0 disables.
    pub timeout_ms: u64,
    /// Capture stdout into the outcome.
    pub capture_stdout: bool,
    /// Capture stderr into the outcome.
    pub capture_stderr: bool,
    /// Encoding of the child's console output.
    pub output_encoding: Encoding,
}

impl ProcessRequest {
    /// Request running `argv` with output captured and no timeout.
    #[must_use]
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            argv,
            working_dir: None,
            env: Vec::new(),
            timeout_ms: 0,
            capture_stdout: true,
            capture_stderr: true,
            output_encoding: Encoding::Unknown,
        }
    }
}

/// Outcome envelope of a process execution.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutcome {
    /// Envelope status.
    pub status: EffectStatus,
    /// Child exit code; `TIMEOUT_EXIT_CODE` when killed on timeout.
    pub exit_code: i32,
    /// Timeout elapsed and the child was killed.
    pub timed_out: bool,
    /// Captured stdout (empty when not captured).
    pub stdout: String,
    /// Captured stderr (empty when not captured).
    pub stderr: String,
}

impl ProcessOutcome {
    /// Success outcome with the given stdout, for canned test results.
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: EffectStatus::Ok,
            exit_code: 0,
            timed_out: false,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failure outcome with the given exit code.
    #[must_use]
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: EffectStatus::ExitNonzero,
            exit_code,
            timed_out: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Runs the request to completion.
pub(super) async fn run(request: &ProcessRequest) -> ProcessOutcome {
    let Some((program, args)) = request.argv.split_first() else {
        return ProcessOutcome {
            status: EffectStatus::InvalidInput,
            exit_code: -1,
            ..ProcessOutcome::default()
        };
    };

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(if request.capture_stdout {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stderr(if request.capture_stderr {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .kill_on_drop(true);
    if let Some(dir) = &request.working_dir {
        command.current_dir(dir);
    }
    for (key, value) in &request.env {
        command.env(key, value);
    }

    debug!(program = %program, args = ?args, "spawning process");

    let child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            let error = crate::error::EffectError::SpawnFailed {
                command: program.clone(),
                source: e,
            };
            return ProcessOutcome {
                status: EffectStatus::ExecError,
                exit_code: -1,
                timed_out: false,
                stdout: String::new(),
                stderr: error.to_string(),
            };
        }
    };

    let wait = child.wait_with_output();
    let output = if request.timeout_ms > 0 {
        match tokio::time::timeout(Duration::from_millis(request.timeout_ms), wait).await {
            Ok(result) => result,
            Err(_elapsed) => {
                // The dropped future kills the child (kill_on_drop).
                trace!(program = %program, timeout_ms = request.timeout_ms, "process timed out");
                return ProcessOutcome {
                    status: EffectStatus::Timeout,
                    exit_code: TIMEOUT_EXIT_CODE,
                    timed_out: true,
                    stdout: String::new(),
                    stderr: String::new(),
                };
            }
        }
    } else {
        wait.await
    };

    let output = match output {
        Ok(output) => output,
        Err(e) => {
            return ProcessOutcome {
                status: EffectStatus::ExecError,
                exit_code: -1,
                timed_out: false,
                stdout: String::new(),
                stderr: format!("failed to wait for '{program}': {e}"),
            };
        }
    };

    let exit_code = output.status.code().unwrap_or(-1);
    ProcessOutcome {
        status: if exit_code == 0 {
            EffectStatus::Ok
        } else {
            EffectStatus::ExitNonzero
        },
        exit_code,
        timed_out: false,
        stdout: bytes_to_utf8(request.output_encoding, &output.stdout).into_owned(),
        stderr: bytes_to_utf8(request.output_encoding, &output.stderr).into_owned(),
    }
}
