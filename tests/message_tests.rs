//! Integration tests for `message`

use predicates::prelude::*;
use std::fs;

const BROKEN_BUILD: &str = r#"{
    "builder": "gcc-x86_64-linux",
    "worker": "fedora-x86-64",
    "build_url": "https://build.example.org/builders/gcc-x86_64-linux/builds/7",
    "build_number": 7,
    "revision": "abc123",
    "changes": [
        {"revision": "abc123", "author": "Jane Doe <jane@example.org>", "comments": "Rework foo\n\nDetails."}
    ],
    "results_commit": "fff000",
    "steps": [
        {"step": "compile", "result": "failure", "log_name": "stdio", "text": "make: *** [all] Error 2"}
    ]
}"#;

fn message_cmd(store: &std::path::Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("dejadiff");
    cmd.current_dir(store).arg("--store-dir").arg(store);
    cmd
}

#[test]
fn test_breakage_messages_sent_once() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("build.json"), BROKEN_BUILD).unwrap();

    message_cmd(dir.path())
        .args(["message", "--build", "build.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Subject: [gcc/master] Rework foo"))
        .stdout(predicate::str::contains("Message-Id: <abc123@gcc-build>"))
        .stdout(predicate::str::contains("Subject: Your commit 'Rework foo' broke GCC"))
        .stdout(predicate::str::contains(
            "Subject: *** COMPILATION FAILED *** Failures on gcc-x86_64-linux, branch master *** BREAKAGE ***",
        ));

    assert!(dir.path().join("notified.json").is_file());

    message_cmd(dir.path())
        .args(["message", "--build", "build.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Message-Id").not())
        .stdout(predicate::str::contains("broke GCC").not())
        .stdout(predicate::str::contains("Failures on gcc-x86_64-linux"));
}

#[test]
fn test_message_json_from_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let output = message_cmd(dir.path())
        .args(["--format", "json", "message", "--build", "-"])
        .write_stdin(BROKEN_BUILD)
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let messages = parsed["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0]["message_id"], "<abc123@gcc-build>");
}

#[test]
fn test_racy_scheduler_sends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    message_cmd(dir.path())
        .args(["message", "--build", "-", "--scheduler", "racy-tests"])
        .write_stdin(BROKEN_BUILD)
        .assert()
        .success()
        .stdout("");
    assert!(!dir.path().join("notified.json").exists());
}

#[test]
fn test_xfail_commit_taken_from_store() {
    let dir = tempfile::tempdir().unwrap();
    message_cmd(dir.path())
        .args(["process", "--builder", "gcc-x86_64-linux", "--commit", "base1", "-"])
        .write_stdin("PASS: a\n")
        .assert()
        .success();

    let build = BROKEN_BUILD.replace(
        r#""step": "compile", "result": "failure", "log_name": "stdio", "text": "make: *** [all] Error 2""#,
        r#""step": "regressions", "result": "failure", "log_name": "regressions", "text": "FAIL: a (was PASS)""#,
    );
    message_cmd(dir.path())
        .args(["message", "--build", "-"])
        .write_stdin(build)
        .assert()
        .success()
        .stdout(predicate::str::contains("*** Diff to previous build ***"))
        .stdout(predicate::str::contains("xfails/gcc-x86_64-linux/xfails/master/xfail;hb=base1"));
}

#[test]
fn test_invalid_build_description() {
    let dir = tempfile::tempdir().unwrap();
    message_cmd(dir.path())
        .args(["message", "--build", "-"])
        .write_stdin("{ not json")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Invalid build description"));
}

#[test]
fn test_expired_marks_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let notified = dir.path().join("notified.json");
    fs::write(
        &notified,
        format!(r#"{{"oldrev": 1, "recentrev": {}}}"#, now - 60),
    )
    .unwrap();
    fs::write(dir.path().join("build.json"), BROKEN_BUILD).unwrap();

    message_cmd(dir.path())
        .args(["message", "--build", "build.json"])
        .assert()
        .success();

    let marks: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(&notified).unwrap()).unwrap();
    assert!(!marks.contains_key("oldrev"));
    assert!(marks.contains_key("recentrev"));
    assert!(marks.contains_key("abc123"));
    assert!(marks.contains_key("breakage-gcc-x86_64-linux"));
}

#[test]
fn test_max_age_read_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let notified = dir.path().join("notified.json");
    fs::write(&notified, format!(r#"{{"recentrev": {}}}"#, now - 600)).unwrap();
    fs::write(dir.path().join("dejadiff.toml"), "notify_max_age = 300\n").unwrap();
    fs::write(dir.path().join("build.json"), BROKEN_BUILD).unwrap();

    message_cmd(dir.path())
        .args(["message", "--build", "build.json"])
        .assert()
        .success();

    assert!(!fs::read_to_string(&notified).unwrap().contains("recentrev"));
}
