// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Toolchain probe effect: real compiler invocations for
//! `try_compile`/`try_run`/`check_*`.
//!
//! ```text
//! ProbeRequest { compile, run_binary?, run_args }
//!        |
//!   cl/cl.exe basename  -> /nologo /D... /Fe:out src /link opts libs
//!   everything else     -> src -o out -D... -I... opts -L... -l...
//!        |
//! ProbeOutcome { compile_ok, compile_output, run_exit_code, run_output }
//!
//! intermediates:  <build_dir>/.nobify_probes/  (removed afterwards)
//! compiler pick:  $CC  ->  config  ->  which(cc)
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;

use super::process::ProcessRequest;
use super::{EffectExecutor, EffectStatus};
use crate::utility::encoding::Encoding;

/// Directory under the build dir holding probe intermediates.
pub const PROBE_SCRATCH_DIR: &str = ".nobify_probes";

/// One compile request of a probe.
#[derive(Debug, Clone, Default)]
pub struct CompileRequest {
    /// Compiler driver; empty selects the default driver.
    pub compiler: String,
    /// Source file to compile.
    pub source: PathBuf,
    /// Output binary path.
    pub output: PathBuf,
    /// Compile definitions (`NAME` or `NAME=VALUE`, `-D`/`/D` tolerated).
    pub definitions: Vec<String>,
    /// Include directories (`CMAKE_REQUIRED_INCLUDES`).
    pub include_dirs: Vec<String>,
    /// Raw link options.
    pub link_options: Vec<String>,
    /// Link search directories.
    pub link_directories: Vec<String>,
    /// Libraries (`CMAKE_REQUIRED_LIBRARIES`).
    pub link_libraries: Vec<String>,
}

/// A full probe: compile, then optionally run the produced binary.
#[derive(Debug, Clone, Default)]
pub struct ProbeRequest {
    /// Compile step.
    pub compile: CompileRequest,
    /// Execute the binary after a successful compile.
    pub run_binary: bool,
    /// Arguments passed to the executed binary.
    pub run_args: Vec<String>,
    /// Per-step timeout in milliseconds; 0 disables.
    pub timeout_ms: u64,
}

/// Probe outcome envelope.
#[derive(Debug, Clone, Default)]
pub struct ProbeOutcome {
    /// Envelope status (the compile step's).
    pub status: EffectStatus,
    /// Compile step exited 0.
    pub compile_ok: bool,
    /// Merged compiler stdout/stderr.
    pub compile_output: String,
    /// Exit code of the executed binary; -1 when not run.
    pub run_exit_code: i32,
    /// Merged output of the executed binary.
    pub run_output: String,
}

impl ProbeOutcome {
    /// Canned success outcome for tests and deterministic fallbacks.
    #[must_use]
    pub fn compiled(run_exit_code: i32) -> Self {
        Self {
            status: EffectStatus::Ok,
            compile_ok: true,
            compile_output: String::new(),
            run_exit_code,
            run_output: String::new(),
        }
    }
}

/// True when the driver basename selects the MSVC argument schema.
#[must_use]
pub fn is_msvc_driver(compiler: &str) -> bool {
    let basename = Path::new(compiler)
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    basename == "cl" || basename == "cl.exe"
}

/// Default C compiler driver: `$CC`, then `cc` from PATH.
#[must_use]
pub fn default_compiler() -> String {
    if let Ok(cc) = std::env::var("CC")
        && !cc.is_empty()
    {
        return cc;
    }
    which::which("cc").map_or_else(|_| "cc".to_string(), |p| p.to_string_lossy().into_owned())
}

/// Normalizes a path argument for GNU-style drivers, which accept
/// forward slashes on every host.
fn gnu_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Builds the compile argv for the request's driver schema.
#[must_use]
pub fn compile_argv(request: &CompileRequest) -> Vec<String> {
    let compiler = if request.compiler.is_empty() {
        default_compiler()
    } else {
        request.compiler.clone()
    };

    let mut argv = vec![compiler.clone()];
    if is_msvc_driver(&compiler) {
        argv.push("/nologo".to_string());
        for def in &request.definitions {
            let stripped = def
                .strip_prefix("-D")
                .or_else(|| def.strip_prefix("/D"))
                .unwrap_or(def);
            argv.push(format!("/D{stripped}"));
        }
        for dir in &request.include_dirs {
            argv.push(format!("/I{dir}"));
        }
        argv.push(format!("/Fe:{}", request.output.display()));
        argv.push(request.source.display().to_string());
        if !request.link_options.is_empty() || !request.link_libraries.is_empty() {
            argv.push("/link".to_string());
            argv.extend(request.link_options.iter().cloned());
            for dir in &request.link_directories {
                argv.push(format!("/LIBPATH:{dir}"));
            }
            for lib in &request.link_libraries {
                if lib.ends_with(".lib") {
                    argv.push(lib.clone());
                } else {
                    argv.push(format!("{lib}.lib"));
                }
            }
        }
    } else {
        argv.push(gnu_path(&request.source));
        argv.push("-o".to_string());
        argv.push(gnu_path(&request.output));
        for def in &request.definitions {
            let stripped = def
                .strip_prefix("-D")
                .or_else(|| def.strip_prefix("/D"))
                .unwrap_or(def);
            argv.push(format!("-D{stripped}"));
        }
        for dir in &request.include_dirs {
            argv.push(format!("-I{}", dir.replace('\\', "/")));
        }
        argv.extend(request.link_options.iter().cloned());
        for dir in &request.link_directories {
            argv.push(format!("-L{}", dir.replace('\\', "/")));
        }
        for lib in &request.link_libraries {
            if lib.starts_with("-l") || lib.starts_with("-L") || lib.contains('/') {
                argv.push(lib.clone());
            } else {
                argv.push(format!("-l{lib}"));
            }
        }
    }
    argv
}

/// Runs a probe via the given executor's process effect.
pub(super) fn run(executor: &dyn EffectExecutor, request: &ProbeRequest) -> ProbeOutcome {
    let argv = compile_argv(&request.compile);
    let msvc = is_msvc_driver(&argv[0]);

    if let Some(parent) = request.compile.output.parent()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        return ProbeOutcome {
            status: EffectStatus::ExecError,
            compile_ok: false,
            compile_output: format!("failed to create probe directory: {e}"),
            run_exit_code: -1,
            run_output: String::new(),
        };
    }

    debug!(argv = ?argv, "running compile probe");

    let mut compile_request = ProcessRequest::new(argv);
    compile_request.timeout_ms = request.timeout_ms;
    compile_request.output_encoding = Encoding::for_compiler_output(msvc);
    let compile = executor.run_process(&compile_request);

    let compile_ok = compile.status.is_ok();
    let mut outcome = ProbeOutcome {
        status: compile.status,
        compile_ok,
        compile_output: merge_output(&compile.stdout, &compile.stderr),
        run_exit_code: -1,
        run_output: String::new(),
    };

    if compile_ok && request.run_binary {
        let mut run_argv = vec![request.compile.output.display().to_string()];
        run_argv.extend(request.run_args.iter().cloned());
        let mut run_request = ProcessRequest::new(run_argv);
        run_request.timeout_ms = request.timeout_ms;
        let run = executor.run_process(&run_request);
        outcome.run_exit_code = run.exit_code;
        outcome.run_output = merge_output(&run.stdout, &run.stderr);
    }

    outcome
}

/// Removes the probe scratch directory below `build_dir`.
pub fn cleanup_probe_dir(build_dir: &Path) {
    let dir = build_dir.join(PROBE_SCRATCH_DIR);
    if dir.exists() {
        let _ = std::fs::remove_dir_all(&dir);
    }
}

fn merge_output(stdout: &str, stderr: &str) -> String {
    match (stdout.is_empty(), stderr.is_empty()) {
        (true, true) => String::new(),
        (false, true) => stdout.to_string(),
        (true, false) => stderr.to_string(),
        (false, false) => format!("{stdout}\n{stderr}"),
    }
}
