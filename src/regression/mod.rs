// Regression detection between DejaGnu test runs
//
// Compares a current ResultSet against a previous one (the stored baseline
// or the immediately preceding run) and classifies every status change:
// - regression: acceptable -> failing, or failing -> worse failing
// - fixed: failing -> acceptable
// - changed: any other status change (informational)
// - new failure: test absent before, failing now (informational)
// - disappeared: test present before, absent now (informational)
//
// Only regressions make a report non-empty. Tests on the builder's XFAIL
// ignore list are never reported as regressions.

mod compare;
mod report;
mod xfail;

pub use compare::{classify_transition, compare, compare_with_ignores, Transition};
pub use report::{framed, RegressionReport, StatusChange, DIVIDER};
pub use xfail::XfailList;

#[cfg(test)]
mod tests;
