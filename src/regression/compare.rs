// Comparison of two result sets
//
// Walks the current run in name order and classifies each test against
// the previous run. Both inputs are BTreeMap-backed, so every list in the
// resulting report comes out sorted by test name.

use crate::regression::report::{RegressionReport, StatusChange};
use crate::regression::xfail::XfailList;
use crate::status::TestStatus;
use crate::sumfile::{ResultSet, TestOutcome};

/// How a test's status moved between two runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Acceptable to failing, or failing to a more severe failing status
    Regressed,
    /// Failing to acceptable
    Fixed,
    /// Any other change
    Changed,
}

/// Classify a status change; `None` when the status did not change
///
/// # Example
/// ```
/// use dejadiff::regression::{classify_transition, Transition};
/// use dejadiff::status::TestStatus;
///
/// assert_eq!(classify_transition(TestStatus::Pass, TestStatus::Fail), Some(Transition::Regressed));
/// assert_eq!(classify_transition(TestStatus::Xfail, TestStatus::Xpass), Some(Transition::Regressed));
/// assert_eq!(classify_transition(TestStatus::Fail, TestStatus::Pass), Some(Transition::Fixed));
/// assert_eq!(classify_transition(TestStatus::Pass, TestStatus::Pass), None);
/// ```
pub fn classify_transition(old: TestStatus, new: TestStatus) -> Option<Transition> {
    if old == new {
        return None;
    }
    let transition = match (old.is_failing(), new.is_failing()) {
        (false, true) => Transition::Regressed,
        (true, false) => Transition::Fixed,
        (true, true) if new.severity() > old.severity() => Transition::Regressed,
        _ => Transition::Changed,
    };
    Some(transition)
}

/// Compare a current run against a previous one
///
/// # Example
/// ```
/// use dejadiff::regression::compare;
/// use dejadiff::sumfile::parse_sum_text;
///
/// let baseline = parse_sum_text("PASS: a\nFAIL: b\n");
/// let current = parse_sum_text("FAIL: a\nPASS: b\n");
///
/// let report = compare(&baseline, &current);
/// assert_eq!(report.regressions.len(), 1);
/// assert_eq!(report.regressions[0].name, "a");
/// assert_eq!(report.fixed.len(), 1);
/// ```
pub fn compare(previous: &ResultSet, current: &ResultSet) -> RegressionReport {
    compare_with_ignores(previous, current, &XfailList::new())
}

/// Compare a current run against a previous one, skipping XFAIL-listed tests
///
/// A listed test never appears as a regression; each suppressed regression
/// is counted in `ignored`. Fixes and informational entries for listed
/// tests are still reported.
pub fn compare_with_ignores(
    previous: &ResultSet,
    current: &ResultSet,
    xfails: &XfailList,
) -> RegressionReport {
    let mut report = RegressionReport::default();

    for (name, new) in current.iter() {
        let Some(old) = previous.get(name) else {
            if new.is_failing() {
                report.new_failures.push(TestOutcome {
                    name: name.to_string(),
                    status: new,
                });
            }
            continue;
        };

        let Some(transition) = classify_transition(old, new) else {
            continue;
        };
        let change = StatusChange {
            name: name.to_string(),
            old,
            new,
        };
        match transition {
            Transition::Regressed if xfails.contains(name) => report.ignored += 1,
            Transition::Regressed => report.regressions.push(change),
            Transition::Fixed => report.fixed.push(change),
            Transition::Changed => report.changed.push(change),
        }
    }

    report.disappeared = previous
        .outcomes()
        .filter(|outcome| !current.contains(&outcome.name))
        .collect();

    tracing::debug!(
        previous = previous.len(),
        current = current.len(),
        regressions = report.regressions.len(),
        fixed = report.fixed.len(),
        ignored = report.ignored,
        "compared result sets"
    );

    report
}
