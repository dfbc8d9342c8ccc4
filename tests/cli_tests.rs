//! Binary-level smoke tests
//!
//! These exercise argument parsing and input validation only, so they
//! run without an encoder binary or fixture media on the machine.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("stickclip")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("inspect"))
        .stdout(predicate::str::contains("preview"))
        .stdout(predicate::str::contains("clip"));
}

#[test]
fn test_clip_requires_input_and_output() {
    Command::cargo_bin("stickclip")
        .unwrap()
        .arg("clip")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--input"));
}

#[test]
fn test_missing_input_file_is_reported() {
    Command::cargo_bin("stickclip")
        .unwrap()
        .args([
            "inspect",
            "--input",
            "/definitely/not/a/real/file.mp4",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_clip_rejects_lonely_crop_coordinates() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.mp4");
    std::fs::write(&input, b"not really a video").unwrap();

    // Argument validation must fire before any probe or encode runs,
    // so a fake input file is enough.
    Command::cargo_bin("stickclip")
        .unwrap()
        .args([
            "clip",
            "--input",
            input.to_str().unwrap(),
            "--crop-width",
            "512",
            "--output",
            dir.path().join("out.webm").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--crop-height"));
}
