//! Error handling integration tests for the checkcopy CLI.
//!
//! Per-file failures are logged and the run still exits 0; only problems
//! with the log files themselves or with usage change the exit code.

#[path = "../common/mod.rs"]
mod common;

use common::TestFixture;
use predicates::prelude::*;
use std::fs;

#[test]
fn test_missing_source_is_logged_not_fatal() {
    let fixture = TestFixture::new();
    let missing = fixture.src.path().join("missing");

    let mut cmd = fixture.cmd();
    cmd.arg("--src")
        .arg(&missing)
        .assert()
        .success()
        .stdout(predicate::str::contains("Error \"Failed to read directory"));

    let errors = fixture.error_log();
    assert_eq!(errors.lines().count(), 1);
    assert!(errors.starts_with("Error \""));
    assert!(errors.contains("missing"));
    assert!(fixture.ok_log().is_empty());
}

/// A destination that is larger than its source is never overwritten.
#[test]
fn test_larger_destination_is_refused() {
    let fixture = TestFixture::with_sample_tree();
    fs::write(fixture.dst.path().join("file1.txt"), "this is not the original").unwrap();

    fixture
        .cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("is larger"))
        .stderr(predicate::str::contains("1 failed (destination_larger: 1)"));

    let errors = fixture.error_log();
    assert_eq!(errors.lines().count(), 1);
    assert!(errors.contains("file1.txt"));
    assert_eq!(
        fs::read_to_string(fixture.dst.path().join("file1.txt")).unwrap(),
        "this is not the original"
    );

    // The other files are still copied
    assert!(fixture.dst.path().join("P1010022.JPG").is_file());
    assert!(fixture.dst.path().join("subfolder/subfolder/file4.txt").is_file());
}

#[test]
fn test_destination_directory_in_place_of_file() {
    let fixture = TestFixture::with_sample_tree();
    fs::create_dir(fixture.dst.path().join("file1.txt")).unwrap();

    fixture
        .cmd()
        .assert()
        .success()
        .stderr(predicate::str::contains("(destination_open: 1)"));

    let errors = fixture.error_log();
    assert_eq!(errors.lines().count(), 1);
    assert!(errors.contains("not a regular file"));
    assert!(fixture.dst.path().join("file1.txt").is_dir());
}

#[test]
fn test_unwritable_result_dir_fails() {
    let fixture = TestFixture::with_sample_tree();
    let blocker = fixture.result.path().join("blocker");
    fs::write(&blocker, "a file, not a directory").unwrap();

    let mut cmd = fixture.cmd();
    cmd.arg("--result-dir")
        .arg(&blocker)
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("Error \""));

    // Nothing was copied
    assert_eq!(fixture.count_files_recursive(fixture.dst.path()), 0);
}

#[test]
fn test_invalid_usage_exit_code() {
    let fixture = TestFixture::with_sample_tree();

    fixture
        .cmd()
        .arg("--batch")
        .arg("lots")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid value"));
}

#[cfg(unix)]
#[test]
fn test_symlink_is_reported_not_followed() {
    use std::os::unix::fs::symlink;

    let fixture = TestFixture::with_sample_tree();
    symlink("file1.txt", fixture.src.path().join("link")).unwrap();

    fixture.cmd().assert().success();

    let errors = fixture.error_log();
    assert_eq!(errors.lines().count(), 1);
    assert!(errors.contains("is not a regular file"));
    assert!(fs::symlink_metadata(fixture.dst.path().join("link")).is_err());
    fixture.assert_sample_copied();
}

#[cfg(unix)]
#[test]
fn test_fifo_is_reported_not_read() {
    use std::process::Command;

    let fixture = TestFixture::with_sample_tree();
    let fifo = fixture.src.path().join("pipe");
    let made = Command::new("mkfifo").arg(&fifo).status();
    if !made.is_ok_and(|status| status.success()) {
        return;
    }

    fixture.cmd().assert().success();

    assert!(fixture.error_log().contains("is not a regular file"));
    fixture.assert_sample_copied();
}
