// Scenario tests for regression detection
//
// Each scenario mirrors a situation seen on GCC builders: a patch breaking
// a test, a fix landing, a testcase being renamed, a flaky test on the
// XFAIL list.

use super::*;
use crate::status::TestStatus;
use crate::sumfile::{parse_sum_text, ResultSet};

fn set(pairs: &[(&str, TestStatus)]) -> ResultSet {
    pairs.iter().copied().collect()
}

/// A run compared with itself never regresses
#[test]
fn test_compare_identical_runs_is_clean() {
    let run = parse_sum_text(
        "PASS: gcc.dg/a.c\nFAIL: gcc.dg/b.c\nXPASS: gcc.dg/c.c\nUNRESOLVED: gcc.dg/d.c\n",
    );
    let report = compare(&run, &run);

    assert!(report.is_clean());
    assert_eq!(report.to_report_string(), "");
    assert!(report.fixed.is_empty());
    assert!(report.changed.is_empty());
    assert!(report.new_failures.is_empty());
    assert!(report.disappeared.is_empty());
}

/// Baseline {a: PASS, b: FAIL}, current {a: FAIL, b: PASS}
///
/// Expected: exactly one regression (a), one fix (b)
#[test]
fn test_swap_reports_single_regression() {
    let baseline = set(&[("a", TestStatus::Pass), ("b", TestStatus::Fail)]);
    let current = set(&[("a", TestStatus::Fail), ("b", TestStatus::Pass)]);

    let report = compare(&baseline, &current);

    assert_eq!(
        report.regressions,
        vec![StatusChange {
            name: "a".to_string(),
            old: TestStatus::Pass,
            new: TestStatus::Fail,
        }]
    );
    assert_eq!(report.fixed.len(), 1);
    assert_eq!(report.fixed[0].name, "b");
}

/// A fix-only commit: every FAIL turns into PASS
#[test]
fn test_improvements_only() {
    let baseline = set(&[
        ("gcc.dg/a.c", TestStatus::Fail),
        ("gcc.dg/b.c", TestStatus::Fail),
        ("gcc.dg/c.c", TestStatus::Unresolved),
    ]);
    let current = set(&[
        ("gcc.dg/a.c", TestStatus::Pass),
        ("gcc.dg/b.c", TestStatus::Pass),
        ("gcc.dg/c.c", TestStatus::Pass),
    ]);

    let report = compare(&baseline, &current);

    assert!(report.is_clean());
    assert_eq!(report.to_report_string(), "");
    assert_eq!(report.fixed.len(), 3);
}

/// An expected failure that starts passing is an unexpected pass
#[test]
fn test_xfail_to_xpass_regresses() {
    let baseline = set(&[("gcc.dg/vect/pr1.c", TestStatus::Xfail)]);
    let current = set(&[("gcc.dg/vect/pr1.c", TestStatus::Xpass)]);

    let report = compare(&baseline, &current);
    assert_eq!(report.regressions.len(), 1);
}

/// Moving between failing statuses only regresses when severity grows
#[test]
fn test_failing_to_failing_transitions() {
    let baseline = set(&[("x", TestStatus::Xpass), ("y", TestStatus::Fail)]);
    let current = set(&[("x", TestStatus::Fail), ("y", TestStatus::Unresolved)]);

    let report = compare(&baseline, &current);

    assert_eq!(report.regressions.len(), 1);
    assert_eq!(report.regressions[0].name, "x");
    assert_eq!(report.changed.len(), 1);
    assert_eq!(report.changed[0].name, "y");
}

/// Acceptable-to-acceptable changes are informational
#[test]
fn test_pass_to_unsupported_is_changed() {
    let baseline = set(&[("t", TestStatus::Pass)]);
    let current = set(&[("t", TestStatus::Unsupported)]);

    let report = compare(&baseline, &current);

    assert!(report.is_clean());
    assert_eq!(report.changed.len(), 1);
}

/// A renamed testcase: old name disappears, new name fails
///
/// Neither is a regression by itself.
#[test]
fn test_new_and_disappeared_tests_are_informational() {
    let baseline = set(&[("old.c", TestStatus::Pass), ("keep.c", TestStatus::Pass)]);
    let current = set(&[
        ("keep.c", TestStatus::Pass),
        ("new-fail.c", TestStatus::Fail),
        ("new-pass.c", TestStatus::Pass),
    ]);

    let report = compare(&baseline, &current);

    assert!(report.is_clean());
    assert_eq!(report.new_failures.len(), 1);
    assert_eq!(report.new_failures[0].name, "new-fail.c");
    assert_eq!(report.disappeared.len(), 1);
    assert_eq!(report.disappeared[0].name, "old.c");
}

/// Report entries are sorted by name whatever the input order
#[test]
fn test_report_is_name_ordered() {
    let baseline = parse_sum_text("PASS: zz\nPASS: aa\nPASS: mm\n");
    let current = parse_sum_text("FAIL: mm\nFAIL: zz\nFAIL: aa\n");

    let report = compare(&baseline, &current);
    let names: Vec<_> = report.regressions.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["aa", "mm", "zz"]);
}

/// Flaky test on the XFAIL list fails again: suppressed, but counted
#[test]
fn test_xfail_list_suppresses_regressions() {
    let baseline = set(&[("flaky.c", TestStatus::Pass), ("solid.c", TestStatus::Pass)]);
    let current = set(&[("flaky.c", TestStatus::Fail), ("solid.c", TestStatus::Pass)]);
    let xfails = XfailList::parse("FAIL: flaky.c\n");

    let report = compare_with_ignores(&baseline, &current, &xfails);

    assert!(report.is_clean());
    assert_eq!(report.ignored, 1);
}

#[test]
fn test_report_string_lists_sections() {
    let baseline = set(&[
        ("a.c", TestStatus::Pass),
        ("b.c", TestStatus::Fail),
        ("gone.c", TestStatus::Pass),
    ]);
    let current = set(&[
        ("a.c", TestStatus::Fail),
        ("b.c", TestStatus::Pass),
        ("fresh.c", TestStatus::Fail),
    ]);

    let text = compare(&baseline, &current).to_report_string();

    assert!(text.contains("Regressions (1):\n  FAIL: a.c (was PASS)\n"));
    assert!(text.contains("Fixed (1):\n  PASS: b.c (was FAIL)\n"));
    assert!(text.contains("New failures (1):\n  FAIL: fresh.c\n"));
    assert!(text.contains("Disappeared (1):\n  PASS: gone.c\n"));
    assert!(text.ends_with("1 regressions, 1 fixed, 1 new failures, 1 disappeared, 0 other changes, 0 ignored\n"));
}

#[test]
fn test_framed_adds_missing_newline() {
    assert_eq!(
        framed("t", "line\n"),
        framed("t", "line"),
    );
    assert!(framed("t", "").starts_with("*** t ***\n"));
    assert!(framed("t", "").ends_with(&format!("{}\n{}\n", DIVIDER, DIVIDER)));
}

#[test]
fn test_report_serializes_to_json() {
    let baseline = set(&[("a", TestStatus::Pass)]);
    let current = set(&[("a", TestStatus::Fail)]);

    let json = serde_json::to_value(compare(&baseline, &current)).unwrap();
    assert_eq!(json["regressions"][0]["name"], "a");
    assert_eq!(json["regressions"][0]["old"], "PASS");
    assert_eq!(json["regressions"][0]["new"], "FAIL");
}
