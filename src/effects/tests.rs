// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;

use super::toolchain::{compile_argv, is_msvc_driver};
use super::{
    CompileRequest, EffectExecutor, EffectStatus, FakeExecutor, FileKind, FsRequest,
    ProcessOutcome, ProcessRequest, RealExecutor,
};

// =============================================================================
// Process execution
// =============================================================================

#[cfg(unix)]
#[test]
fn test_process_capture_and_exit_codes() {
    let executor = RealExecutor::new().unwrap();

    let ok = executor.run_process(&ProcessRequest::new(vec![
        "/bin/sh".to_string(),
        "-c".to_string(),
        "echo out; echo err >&2".to_string(),
    ]));
    assert_eq!(ok.status, EffectStatus::Ok);
    assert_eq!(ok.exit_code, 0);
    assert_eq!(ok.stdout.trim(), "out");
    assert_eq!(ok.stderr.trim(), "err");

    let failed = executor.run_process(&ProcessRequest::new(vec![
        "/bin/sh".to_string(),
        "-c".to_string(),
        "exit 3".to_string(),
    ]));
    assert_eq!(failed.status, EffectStatus::ExitNonzero);
    assert_eq!(failed.exit_code, 3);
}

#[cfg(unix)]
#[test]
fn test_process_timeout_kills_child() {
    let executor = RealExecutor::new().unwrap();
    let mut request = ProcessRequest::new(vec![
        "/bin/sh".to_string(),
        "-c".to_string(),
        "sleep 30".to_string(),
    ]);
    request.timeout_ms = 100;

    let outcome = executor.run_process(&request);
    assert_eq!(outcome.status, EffectStatus::Timeout);
    assert!(outcome.timed_out);
    assert_eq!(outcome.exit_code, super::process::TIMEOUT_EXIT_CODE);
}

#[test]
fn test_process_spawn_failure() {
    let executor = RealExecutor::new().unwrap();
    let outcome = executor.run_process(&ProcessRequest::new(vec![
        "/no/such/binary/anywhere".to_string(),
    ]));
    assert_eq!(outcome.status, EffectStatus::ExecError);
}

#[test]
fn test_process_empty_argv_is_invalid() {
    let executor = RealExecutor::new().unwrap();
    let outcome = executor.run_process(&ProcessRequest::new(Vec::new()));
    assert_eq!(outcome.status, EffectStatus::InvalidInput);
}

// =============================================================================
// Toolchain argv schemas
// =============================================================================

#[test]
fn test_msvc_driver_detection() {
    assert!(is_msvc_driver("cl"));
    assert!(is_msvc_driver("cl.exe"));
    assert!(is_msvc_driver("C:/VS/bin/cl.exe"));
    assert!(!is_msvc_driver("gcc"));
    assert!(!is_msvc_driver("/usr/bin/clang"));
}

#[test]
fn test_gnu_compile_argv() {
    let request = CompileRequest {
        compiler: "gcc".to_string(),
        source: PathBuf::from("probe.c"),
        output: PathBuf::from("out/probe"),
        definitions: vec!["FOO=1".to_string(), "-DBAR".to_string()],
        include_dirs: vec!["inc".to_string()],
        link_options: vec!["-static".to_string()],
        link_directories: vec!["libs".to_string()],
        link_libraries: vec!["m".to_string(), "-lpthread".to_string()],
    };
    assert_eq!(
        compile_argv(&request),
        vec![
            "gcc", "probe.c", "-o", "out/probe", "-DFOO=1", "-DBAR", "-Iinc", "-static",
            "-Llibs", "-lm", "-lpthread",
        ]
    );
}

#[test]
fn test_msvc_compile_argv() {
    let request = CompileRequest {
        compiler: "cl.exe".to_string(),
        source: PathBuf::from("probe.c"),
        output: PathBuf::from("out/probe.exe"),
        definitions: vec!["FOO=1".to_string()],
        include_dirs: Vec::new(),
        link_options: vec!["/DEBUG".to_string()],
        link_directories: Vec::new(),
        link_libraries: vec!["user32".to_string(), "kernel32.lib".to_string()],
    };
    assert_eq!(
        compile_argv(&request),
        vec![
            "cl.exe",
            "/nologo",
            "/DFOO=1",
            "/Fe:out/probe.exe",
            "probe.c",
            "/link",
            "/DEBUG",
            "user32.lib",
            "kernel32.lib",
        ]
    );
}

// =============================================================================
// Filesystem ops
// =============================================================================

#[test]
fn test_fs_write_mkdir_copy_delete() {
    let executor = RealExecutor::new().unwrap();
    let dir = tempfile::tempdir().unwrap();

    let file = dir.path().join("deep/nested/file.txt");
    let outcome = executor.run_fs(&FsRequest::EnsureParentDirs { path: file.clone() });
    assert!(outcome.status.is_ok());

    let outcome = executor.run_fs(&FsRequest::WriteFileBytes {
        path: file.clone(),
        bytes: b"payload".to_vec(),
    });
    assert!(outcome.status.is_ok());
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "payload");

    let copy = dir.path().join("copy.txt");
    let outcome = executor.run_fs(&FsRequest::CopyFile {
        source: file.clone(),
        dest: copy.clone(),
    });
    assert!(outcome.status.is_ok());

    let outcome = executor.run_fs(&FsRequest::GetFileType { path: copy.clone() });
    assert_eq!(outcome.file_kind, Some(FileKind::File));
    let outcome = executor.run_fs(&FsRequest::GetFileType {
        path: dir.path().join("deep"),
    });
    assert_eq!(outcome.file_kind, Some(FileKind::Directory));

    let outcome = executor.run_fs(&FsRequest::ReadDir {
        path: dir.path().to_path_buf(),
    });
    assert_eq!(outcome.entries, vec!["copy.txt", "deep"]);

    let outcome = executor.run_fs(&FsRequest::DeletePathRecursive {
        path: dir.path().join("deep"),
    });
    assert!(outcome.status.is_ok());
    let outcome = executor.run_fs(&FsRequest::GetFileType {
        path: dir.path().join("deep"),
    });
    assert_eq!(outcome.file_kind, Some(FileKind::Missing));

    // Deleting something that is already gone succeeds.
    let outcome = executor.run_fs(&FsRequest::DeleteFile {
        path: dir.path().join("deep/nested/file.txt"),
    });
    assert!(outcome.status.is_ok());
}

#[test]
fn test_fs_copy_directory_recursive() {
    let executor = RealExecutor::new().unwrap();
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("src/sub")).unwrap();
    std::fs::write(dir.path().join("src/a.txt"), "a").unwrap();
    std::fs::write(dir.path().join("src/sub/b.txt"), "b").unwrap();

    let outcome = executor.run_fs(&FsRequest::CopyDirectoryRecursive {
        source: dir.path().join("src"),
        dest: dir.path().join("dst"),
    });
    assert!(outcome.status.is_ok());
    assert!(dir.path().join("dst/sub/b.txt").exists());
}

#[test]
fn test_fs_download_file_url() {
    let executor = RealExecutor::new().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.txt");
    std::fs::write(&source, "local content").unwrap();

    let dest = dir.path().join("out/fetched.txt");
    let outcome = executor.run_fs(&FsRequest::DownloadToPath {
        url: format!("file://{}", source.display()),
        path: dest.clone(),
        timeout_ms: 0,
    });
    assert!(outcome.status.is_ok(), "log: {}", outcome.log);
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "local content");
}

#[test]
fn test_fs_download_unknown_scheme() {
    let executor = RealExecutor::new().unwrap();
    let outcome = executor.run_fs(&FsRequest::DownloadToPath {
        url: "ftp://example.com/f".to_string(),
        path: PathBuf::from("/tmp/never-written"),
        timeout_ms: 0,
    });
    assert_eq!(outcome.status, EffectStatus::InvalidInput);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_fs_download_http_via_wiremock() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/artifact.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("served body"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("artifact.txt");
    let url = format!("{}/artifact.txt", server.uri());
    let dest_clone = dest.clone();

    // RealExecutor owns its own runtime; drive it from a blocking thread.
    let outcome = tokio::task::spawn_blocking(move || {
        let executor = RealExecutor::new().unwrap();
        executor.run_fs(&FsRequest::DownloadToPath {
            url,
            path: dest_clone,
            timeout_ms: 10_000,
        })
    })
    .await
    .unwrap();
    assert!(outcome.status.is_ok(), "log: {}", outcome.log);
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "served body");

    let url = format!("{}/missing.txt", server.uri());
    let missing = dir.path().join("missing.txt");
    let outcome = tokio::task::spawn_blocking(move || {
        let executor = RealExecutor::new().unwrap();
        executor.run_fs(&FsRequest::DownloadToPath {
            url,
            path: missing,
            timeout_ms: 10_000,
        })
    })
    .await
    .unwrap();
    assert_eq!(outcome.status, EffectStatus::ExecError);
    assert!(outcome.log.contains("http error 404"));
}

// =============================================================================
// Fake executor
// =============================================================================

#[test]
fn test_fake_executor_canned_outcomes() {
    let fake = FakeExecutor::new();
    fake.push_process_outcome(ProcessOutcome::ok("canned"));

    let first = fake.run_process(&ProcessRequest::new(vec!["x".to_string()]));
    assert_eq!(first.stdout, "canned");

    let second = fake.run_process(&ProcessRequest::new(vec!["x".to_string()]));
    assert_eq!(second.status, EffectStatus::ExecError);

    let probe = fake.run_probe(&super::ProbeRequest::default());
    assert!(!probe.compile_ok);
}
