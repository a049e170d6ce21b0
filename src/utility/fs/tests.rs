// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fs;

use super::{WalkOptions, copy_dir_recursive, copy_entry, find_matches, walk_entries};

fn make_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src/sub")).unwrap();
    fs::write(dir.path().join("src/main.c"), "int main(void){}\n").unwrap();
    fs::write(dir.path().join("src/util.c"), "").unwrap();
    fs::write(dir.path().join("src/util.h"), "").unwrap();
    fs::write(dir.path().join("src/sub/deep.c"), "").unwrap();
    fs::write(dir.path().join("README.md"), "readme").unwrap();
    dir
}

#[test]
fn test_walk_entries_files_only_sorted() {
    let dir = make_tree();
    let entries = walk_entries(dir.path(), &WalkOptions::default()).unwrap();

    let names: Vec<_> = entries
        .iter()
        .map(|p| {
            p.strip_prefix(dir.path())
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    assert_eq!(
        names,
        vec![
            "README.md",
            "src/main.c",
            "src/sub/deep.c",
            "src/util.c",
            "src/util.h",
        ]
    );
}

#[test]
fn test_walk_entries_with_directories() {
    let dir = make_tree();
    let options = WalkOptions::builder().with_list_directories(true).build();
    let entries = walk_entries(dir.path(), &options).unwrap();
    assert!(entries.iter().any(|p| p.ends_with("src")));
    assert!(entries.iter().any(|p| p.ends_with("src/sub")));
}

#[test]
fn test_walk_entries_missing_root() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    assert!(walk_entries(&missing, &WalkOptions::default()).is_err());
}

#[test]
fn test_find_matches_glob() {
    let dir = make_tree();
    let matches = find_matches(dir.path(), "**/*.c", &WalkOptions::default()).unwrap();
    assert_eq!(matches.len(), 3);
    assert!(matches.iter().all(|p| p.extension().unwrap() == "c"));

    let shallow = find_matches(dir.path(), "src/*.c", &WalkOptions::default()).unwrap();
    assert_eq!(shallow.len(), 2);
}

#[test]
fn test_copy_dir_recursive() {
    let dir = make_tree();
    let dst = tempfile::tempdir().unwrap();
    let copied = copy_dir_recursive(&dir.path().join("src"), &dst.path().join("out")).unwrap();
    assert_eq!(copied, 4);
    assert!(dst.path().join("out/sub/deep.c").exists());
}

#[test]
fn test_copy_entry_file_and_dir() {
    let dir = make_tree();
    let dst = tempfile::tempdir().unwrap();

    copy_entry(&dir.path().join("README.md"), dst.path()).unwrap();
    assert!(dst.path().join("README.md").exists());

    copy_entry(&dir.path().join("src"), dst.path()).unwrap();
    assert!(dst.path().join("src/main.c").exists());
}
