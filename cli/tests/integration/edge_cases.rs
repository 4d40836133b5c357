//! Edge case integration tests for the checkcopy CLI.
//!
//! These tests cover resuming, timestamps and boundary conditions:
//! - Re-running over a finished copy
//! - Same-size, smaller and empty files
//! - Modification time preservation
//! - Temp file cleanup

#[path = "../common/mod.rs"]
mod common;

use common::{SAMPLE_FILES, TestFixture, fixture_mtime};
use filetime::FileTime;
use std::fs;
use std::path::Path;

fn mtime(path: &Path) -> FileTime {
    FileTime::from_last_modification_time(&fs::metadata(path).expect("Failed to get metadata"))
}

fn temp_files(dir: &Path) -> Vec<String> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            found.extend(temp_files(&path));
        } else if path.to_string_lossy().ends_with(".temp") {
            found.push(path.display().to_string());
        }
    }
    found
}

#[test]
fn test_modification_times_are_preserved() {
    let fixture = TestFixture::with_sample_tree();

    fixture.cmd().assert().success();

    for name in SAMPLE_FILES {
        assert_eq!(
            mtime(&fixture.dst.path().join(name)),
            fixture_mtime(),
            "{name} mtime not preserved"
        );
    }
}

#[test]
fn test_no_times_leaves_fresh_mtime() {
    let fixture = TestFixture::with_sample_tree();

    fixture.cmd().arg("--no-times").assert().success();

    assert_ne!(mtime(&fixture.dst.path().join("file1.txt")), fixture_mtime());
}

#[test]
fn test_second_run_only_skips() {
    let fixture = TestFixture::with_sample_tree();

    fixture.cmd().assert().success();
    fixture.cmd().assert().success();

    // A skip is a single terminal line per file, no chunk lines
    let ok = fixture.ok_log();
    assert_eq!(ok.lines().count(), 5);
    assert!(ok.lines().all(|l| l.ends_with(" sec 0")));
    assert!(fixture.error_log().is_empty());
    fixture.assert_sample_copied();
}

#[test]
fn test_same_size_destination_is_trusted() {
    let fixture = TestFixture::with_sample_tree();
    fs::write(fixture.dst.path().join("file1.txt"), "2").unwrap();

    fixture.cmd().assert().success();

    assert_eq!(
        fs::read_to_string(fixture.dst.path().join("file1.txt")).unwrap(),
        "2"
    );
}

#[test]
fn test_verify_existing_replaces_same_size_mismatch() {
    let fixture = TestFixture::with_sample_tree();
    fs::write(fixture.dst.path().join("file1.txt"), "2").unwrap();

    fixture.cmd().arg("--verify-existing").assert().success();

    assert_eq!(
        fs::read_to_string(fixture.dst.path().join("file1.txt")).unwrap(),
        "1"
    );
    assert!(fixture.error_log().is_empty());
}

#[test]
fn test_smaller_destination_is_completed() {
    let fixture = TestFixture::with_sample_tree();
    let partial = fixture.dst.path().join("P1010022.JPG");
    let source = fs::read(fixture.src.path().join("P1010022.JPG")).unwrap();
    fs::write(&partial, &source[..1000]).unwrap();

    fixture.cmd().assert().success();

    assert_eq!(fs::read(&partial).unwrap(), source);
    assert_eq!(mtime(&partial), fixture_mtime());
}

#[test]
fn test_empty_source_directory() {
    let fixture = TestFixture::new();

    fixture.cmd().assert().success();

    assert!(fixture.ok_log().is_empty());
    assert!(fixture.error_log().is_empty());
}

#[test]
fn test_zero_byte_file() {
    let fixture = TestFixture::new();
    fs::write(fixture.src.path().join("empty"), "").unwrap();

    fixture.cmd().assert().success();

    let ok = fixture.ok_log();
    assert_eq!(ok.lines().count(), 1);
    assert!(ok.trim_end().ends_with("empty sec 0"));
    assert_eq!(fs::metadata(fixture.dst.path().join("empty")).unwrap().len(), 0);
}

#[test]
fn test_empty_subdirectories_are_not_created() {
    let fixture = TestFixture::new();
    fs::create_dir_all(fixture.src.path().join("a/b/c")).unwrap();
    fs::create_dir_all(fixture.src.path().join("d/e")).unwrap();
    fs::write(fixture.src.path().join("d/e/kept.txt"), "kept").unwrap();

    fixture.cmd().assert().success();

    assert!(!fixture.dst.path().join("a").exists());
    assert_eq!(
        fs::read_to_string(fixture.dst.path().join("d/e/kept.txt")).unwrap(),
        "kept"
    );
}

#[test]
fn test_no_temp_files_left_behind() {
    let fixture = TestFixture::with_sample_tree();
    fs::write(fixture.dst.path().join("file1.txt"), "larger, so this one fails").unwrap();

    fixture.cmd().arg("--buffer-size").arg("4096").assert().success();

    assert!(temp_files(fixture.dst.path()).is_empty());
}

#[test]
fn test_stale_temp_file_is_replaced() {
    let fixture = TestFixture::with_sample_tree();
    fs::create_dir_all(fixture.dst.path().join("subfolder")).unwrap();
    fs::write(
        fixture.dst.path().join("subfolder/file2.txt.temp"),
        "left behind by an interrupted run",
    )
    .unwrap();

    fixture.cmd().assert().success();

    fixture.assert_sample_copied();
    assert!(temp_files(fixture.dst.path()).is_empty());
}

#[test]
fn test_many_files_with_small_batch() {
    let fixture = TestFixture::new();
    for i in 0..40 {
        let dir = fixture.src.path().join(format!("dir{}", i % 4));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("file{i}.txt")), format!("content {i}")).unwrap();
    }

    fixture.cmd().arg("--batch").arg("3").assert().success();

    assert_eq!(fixture.count_files_recursive(fixture.dst.path()), 40);
    assert!(fixture.error_log().is_empty());
}

#[test]
fn test_unicode_filenames() {
    let fixture = TestFixture::new();
    fs::create_dir_all(fixture.src.path().join("写真")).unwrap();
    fs::write(fixture.src.path().join("写真/café.txt"), "contenu").unwrap();

    fixture.cmd().assert().success();

    assert_eq!(
        fs::read_to_string(fixture.dst.path().join("写真/café.txt")).unwrap(),
        "contenu"
    );
}
