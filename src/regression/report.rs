// Regression report and its plain-text rendering
//
// The rendered report is empty exactly when there are no regressions.
// Build-master glue uses that emptiness as the signal to escalate the
// step result, so informational sections are only rendered alongside at
// least one regression.

use crate::status::TestStatus;
use crate::sumfile::TestOutcome;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Divider line used around framed logs and report bodies
pub const DIVIDER: &str = "============================";

/// A test whose status differs between two runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub name: String,
    pub old: TestStatus,
    pub new: TestStatus,
}

/// Classified diff between a previous and a current run
///
/// Every list is ordered by test name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegressionReport {
    /// Tests that moved into a failing status, or to a worse failing status
    pub regressions: Vec<StatusChange>,

    /// Tests that moved from a failing status to an acceptable one
    pub fixed: Vec<StatusChange>,

    /// Other status changes (e.g. PASS to UNSUPPORTED)
    pub changed: Vec<StatusChange>,

    /// Tests absent from the previous run that fail in the current one
    pub new_failures: Vec<TestOutcome>,

    /// Tests present in the previous run but not in the current one
    pub disappeared: Vec<TestOutcome>,

    /// Regressions suppressed by the XFAIL ignore list
    pub ignored: usize,
}

impl RegressionReport {
    /// True when no test regressed
    pub fn is_clean(&self) -> bool {
        self.regressions.is_empty()
    }

    /// One-line count summary
    pub fn summary_line(&self) -> String {
        format!(
            "{} regressions, {} fixed, {} new failures, {} disappeared, {} other changes, {} ignored",
            self.regressions.len(),
            self.fixed.len(),
            self.new_failures.len(),
            self.disappeared.len(),
            self.changed.len(),
            self.ignored
        )
    }

    /// Render the report for build logs and mail bodies
    ///
    /// Returns an empty string when there are no regressions.
    pub fn to_report_string(&self) -> String {
        if self.is_clean() {
            return String::new();
        }

        let mut report = String::new();
        write_changes(&mut report, "Regressions", &self.regressions);
        write_changes(&mut report, "Fixed", &self.fixed);
        write_outcomes(&mut report, "New failures", &self.new_failures);
        write_outcomes(&mut report, "Disappeared", &self.disappeared);
        write_changes(&mut report, "Other status changes", &self.changed);

        if self.ignored > 0 {
            let _ = writeln!(report, "Ignored (XFAIL list): {}", self.ignored);
            report.push('\n');
        }

        let _ = writeln!(report, "{}", self.summary_line());
        report
    }
}

fn write_changes(out: &mut String, title: &str, changes: &[StatusChange]) {
    if changes.is_empty() {
        return;
    }
    let _ = writeln!(out, "{} ({}):", title, changes.len());
    for change in changes {
        let _ = writeln!(out, "  {}: {} (was {})", change.new, change.name, change.old);
    }
    out.push('\n');
}

fn write_outcomes(out: &mut String, title: &str, outcomes: &[TestOutcome]) {
    if outcomes.is_empty() {
        return;
    }
    let _ = writeln!(out, "{} ({}):", title, outcomes.len());
    for outcome in outcomes {
        let _ = writeln!(out, "  {}: {}", outcome.status, outcome.name);
    }
    out.push('\n');
}

/// Wrap a log body in the banner/divider frame
///
/// ```
/// use dejadiff::regression::framed;
///
/// let text = framed("Diff to previous build", "FAIL: a");
/// assert_eq!(
///     text,
///     "*** Diff to previous build ***\n============================\nFAIL: a\n============================\n"
/// );
/// ```
pub fn framed(title: &str, body: &str) -> String {
    let mut text = format!("*** {} ***\n{}\n", title, DIVIDER);
    text.push_str(body);
    if !body.is_empty() && !body.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(DIVIDER);
    text.push('\n');
    text
}
