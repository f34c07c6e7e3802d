//! Integration tests for `parse`, `counts` and `grouped-counts`

use predicates::prelude::*;
use std::fs;

const GCC_SUM: &str = "\
Test Run By buildbot on Mon Oct  2 10:00:00 2026
Native configuration is x86_64-pc-linux-gnu

\t\t=== gcc tests ===

Schedule of variations:
    unix

Running target unix
Running /src/gcc/testsuite/gcc.dg/dg.exp ...
PASS: gcc.dg/pr12345.c (test for excess errors)
FAIL: gcc.dg/pr12346.c execution test
XFAIL: gcc.dg/pr99999.c (test for warnings, line 7)
UNSUPPORTED: gcc.dg/vect/vect-avx512.c

\t\t=== gcc Summary ===

# of expected passes\t\t1
# of unexpected failures\t1
# of expected failures\t\t1
# of unsupported tests\t\t1
";

#[test]
fn test_parse_prints_results_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let sum = dir.path().join("gcc.sum");
    fs::write(&sum, GCC_SUM).unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("dejadiff");
    cmd.current_dir(dir.path()).arg("parse").arg(&sum);

    cmd.assert().success().stdout(
        "PASS: gcc.dg/pr12345.c (test for excess errors)\n\
         FAIL: gcc.dg/pr12346.c execution test\n\
         XFAIL: gcc.dg/pr99999.c (test for warnings, line 7)\n\
         UNSUPPORTED: gcc.dg/vect/vect-avx512.c\n",
    );
}

#[test]
fn test_parse_reads_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("dejadiff");
    cmd.current_dir(dir.path())
        .arg("parse")
        .arg("-")
        .write_stdin("PASS: a\nnoise\nFAIL: b\n");

    cmd.assert().success().stdout("PASS: a\nFAIL: b\n");
}

#[test]
fn test_parse_json() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("dejadiff");
    cmd.current_dir(dir.path())
        .args(["--format", "json", "parse", "-"])
        .write_stdin(GCC_SUM);

    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["format"], "dejadiff-json-v1");
    assert_eq!(parsed["summary"]["total_tests"], 4);
    assert_eq!(parsed["summary"]["by_status"]["FAIL"], 1);
    assert!(parsed["results"].is_array());
}

#[test]
fn test_parse_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("dejadiff");
    cmd.current_dir(dir.path()).arg("parse").arg("nope.sum");

    cmd.assert()
        .code(4)
        .stderr(predicate::str::contains("No sum file at nope.sum"));
}

#[test]
fn test_counts_over_testsuite_dir() {
    let dir = tempfile::tempdir().unwrap();
    let gcc = dir.path().join("testsuite").join("gcc");
    fs::create_dir_all(&gcc).unwrap();
    fs::write(gcc.join("gcc.sum"), GCC_SUM).unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("dejadiff");
    cmd.current_dir(dir.path()).arg("counts").arg("testsuite");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("gcc expected passes=1\n"))
        .stdout(predicate::str::contains("gcc unexpected failures=1\n"))
        .stdout(predicate::str::contains("g++").not());
}

#[test]
fn test_counts_selected_suite_json() {
    let dir = tempfile::tempdir().unwrap();
    let gcc = dir.path().join("gcc");
    fs::create_dir_all(&gcc).unwrap();
    fs::write(gcc.join("gcc.sum"), GCC_SUM).unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("dejadiff");
    cmd.current_dir(dir.path())
        .args(["--format", "json", "counts", ".", "--suite", "gcc"]);

    let output = cmd.output().unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["counts"]["gcc expected failures"], 1);
    assert!(parsed["counts"].get("gcc unsupported tests").is_none());
}

#[test]
fn test_grouped_counts() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("dejadiff");
    cmd.current_dir(dir.path())
        .args(["grouped-counts", "-"])
        .write_stdin("/build/gcc/testsuite/gcc/gcc.sum\n FAIL: 3\n PASS: 120\n");

    cmd.assert()
        .success()
        .stdout("gcc-FAIL=3\ngcc-PASS=120\n");
}
