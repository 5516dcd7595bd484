use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn setup_test_directory() -> tempfile::TempDir {
    let dir = tempdir().unwrap();
    let input = dir.path().join("testdir");
    fs::create_dir_all(input.join("exclude_me")).unwrap();
    fs::write(input.join("test.txt"), "Test content").unwrap();
    fs::write(input.join("test.bin"), [0u8, 1]).unwrap();
    fs::write(input.join("exclude_me/test.txt"), "Should be excluded").unwrap();
    dir
}

#[test]
fn test_default_output_name() {
    let dir = setup_test_directory();

    Command::cargo_bin("filecombinator")
        .unwrap()
        .current_dir(dir.path())
        .args(["-d", "testdir"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Text files processed: 2"))
        .stdout(predicate::str::contains("test.bin"));

    let output = dir.path().join("testdir_file_combinator_output.txt");
    let content = fs::read_to_string(output).unwrap();
    assert!(content.contains("FILEPATH: test.txt"));
    assert!(content.contains("Test content"));
}

#[test]
fn test_custom_output_and_excludes() {
    let dir = setup_test_directory();
    let output = dir.path().join("out/custom.txt");

    Command::cargo_bin("filecombinator")
        .unwrap()
        .arg("--directory")
        .arg(dir.path().join("testdir"))
        .arg("--output")
        .arg(&output)
        .args(["--exclude", "exclude_me", "--force"])
        .assert()
        .success();

    let content = fs::read_to_string(&output).unwrap();
    assert!(!content.contains("exclude_me"));
    assert!(!content.contains("Should be excluded"));
}

#[test]
fn test_output_without_extension_gets_suffix() {
    let dir = setup_test_directory();

    Command::cargo_bin("filecombinator")
        .unwrap()
        .current_dir(dir.path())
        .args(["-d", "testdir", "-o", "combined"])
        .assert()
        .success();

    assert!(dir.path().join("combined_file_combinator_output.txt").is_file());
}

#[test]
fn test_json_report() {
    let dir = setup_test_directory();
    let output = dir.path().join("out.txt");

    Command::cargo_bin("filecombinator")
        .unwrap()
        .arg("-d")
        .arg(dir.path().join("testdir"))
        .arg("-o")
        .arg(&output)
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"processed\": 2"))
        .stdout(predicate::str::contains("\"binary\": 1"));
}

#[test]
fn test_missing_directory_fails() {
    let dir = tempdir().unwrap();

    Command::cargo_bin("filecombinator")
        .unwrap()
        .arg("-d")
        .arg(dir.path().join("nope"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Directory not found"));
}
