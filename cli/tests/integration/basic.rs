//! Basic functionality integration tests for the checkcopy CLI.

#[path = "../common/mod.rs"]
mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::{JPEG_SIZE, SAMPLE_FILES, TestFixture};
use predicates::prelude::*;
use std::fs;

#[test]
fn test_copies_sample_tree() {
    let fixture = TestFixture::with_sample_tree();

    fixture.cmd().assert().success();

    fixture.assert_sample_copied();
    assert_eq!(fixture.count_files_recursive(fixture.dst.path()), 5);
    assert!(fixture.error_log().is_empty());
}

#[test]
fn test_ok_log_has_one_line_per_observation() {
    let fixture = TestFixture::with_sample_tree();

    fixture
        .cmd()
        .arg("--buffer-size")
        .arg("65536")
        .assert()
        .success();

    let ok = fixture.ok_log();
    let lines: Vec<&str> = ok.lines().collect();

    // The photo takes ceil(300 / 64) = 5 chunks plus its terminal line; each
    // small file takes one chunk plus its terminal line.
    let photo_chunks = JPEG_SIZE.div_ceil(65536);
    assert_eq!(lines.len(), (photo_chunks + 1) + 4 * 2);

    for line in &lines {
        let (path, seconds) = line.split_once(" sec ").unwrap();
        assert!(path.starts_with('/') || path.chars().nth(1) == Some(':'), "{line}");
        assert!(seconds.parse::<f64>().is_ok(), "{line}");
    }

    let photo_lines = lines.iter().filter(|l| l.contains("P1010022.JPG")).count();
    assert_eq!(photo_lines, photo_chunks + 1);
}

#[test]
fn test_terminal_lines_report_zero_seconds() {
    let fixture = TestFixture::with_sample_tree();

    fixture.cmd().assert().success();

    let ok = fixture.ok_log();
    for name in SAMPLE_FILES {
        let last = ok
            .lines()
            .rfind(|l| l.contains(name.rsplit('/').next().unwrap()))
            .unwrap();
        assert!(last.ends_with(" sec 0"), "{last}");
    }
}

#[test]
fn test_log_lines_are_echoed_to_stdout() {
    let fixture = TestFixture::with_sample_tree();

    fixture
        .cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("file1.txt sec 0"))
        .stdout(predicate::str::contains("P1010022.JPG sec"));
}

#[test]
fn test_quiet_suppresses_stdout() {
    let fixture = TestFixture::with_sample_tree();

    fixture
        .cmd()
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    // Logs are still written
    assert!(fixture.ok_log().contains("file1.txt sec 0"));
}

#[test]
fn test_go_style_single_dash_flags() {
    let fixture = TestFixture::with_sample_tree();

    let mut cmd = cargo_bin_cmd!("checkcopy");
    cmd.arg("-src")
        .arg(fixture.src.path())
        .arg(format!("-dst={}", fixture.dst.path().display()))
        .arg("--result-dir")
        .arg(fixture.result.path())
        .assert()
        .success();

    fixture.assert_sample_copied();
}

#[test]
fn test_result_directory_is_created() {
    let fixture = TestFixture::with_sample_tree();
    let result_dir = fixture.result.path().join("nested/result");

    let mut cmd = cargo_bin_cmd!("checkcopy");
    cmd.arg("--src")
        .arg(fixture.src.path())
        .arg("--dst")
        .arg(fixture.dst.path())
        .arg("--result-dir")
        .arg(&result_dir)
        .assert()
        .success();

    assert!(result_dir.join("ok.txt").is_file());
    assert!(result_dir.join("error.txt").is_file());
}

#[test]
fn test_logs_are_truncated_each_run() {
    let fixture = TestFixture::with_sample_tree();
    fs::write(fixture.result.path().join("ok.txt"), "stale line\n").unwrap();
    fs::write(fixture.result.path().join("error.txt"), "stale error\n").unwrap();

    fixture.cmd().assert().success();

    assert!(!fixture.ok_log().contains("stale"));
    assert!(fixture.error_log().is_empty());
}

#[test]
fn test_progress_bar_does_not_break_logs() {
    let fixture = TestFixture::with_sample_tree();

    fixture.cmd().arg("--progress").assert().success();

    fixture.assert_sample_copied();
    // Every file fits one buffer: one chunk line and one terminal line each
    let ok = fixture.ok_log();
    assert_eq!(ok.lines().count(), 10);
    assert!(ok.lines().all(|l| l.ends_with(" sec 0")));
}

#[test]
fn test_help_lists_flags() {
    let mut cmd = cargo_bin_cmd!("checkcopy");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--src"))
        .stdout(predicate::str::contains("--dst"))
        .stdout(predicate::str::contains("--verify-existing"));
}
