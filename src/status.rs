//! DejaGnu test status vocabulary
//!
//! Every per-test line in a `.sum` file starts with one of nine status
//! words. Statuses split into *acceptable* and *failing* categories and
//! carry a severity rank used to decide whether a transition worsened.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of a single DejaGnu test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestStatus {
    Pass,
    Fail,
    Xfail,
    Kfail,
    Xpass,
    Kpass,
    Untested,
    Unresolved,
    Unsupported,
}

impl TestStatus {
    /// All statuses, in the order DejaGnu prints its summary
    pub const ALL: [TestStatus; 9] = [
        TestStatus::Pass,
        TestStatus::Fail,
        TestStatus::Xfail,
        TestStatus::Kfail,
        TestStatus::Xpass,
        TestStatus::Kpass,
        TestStatus::Untested,
        TestStatus::Unresolved,
        TestStatus::Unsupported,
    ];

    /// Status word as it appears in a `.sum` file
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Pass => "PASS",
            TestStatus::Fail => "FAIL",
            TestStatus::Xfail => "XFAIL",
            TestStatus::Kfail => "KFAIL",
            TestStatus::Xpass => "XPASS",
            TestStatus::Kpass => "KPASS",
            TestStatus::Untested => "UNTESTED",
            TestStatus::Unresolved => "UNRESOLVED",
            TestStatus::Unsupported => "UNSUPPORTED",
        }
    }

    /// True for outcomes that DejaGnu counts as unexpected or unresolved
    ///
    /// FAIL, XPASS and UNRESOLVED are failing. Expected and known failures
    /// (XFAIL, KFAIL), known passes and skipped tests are acceptable.
    pub fn is_failing(&self) -> bool {
        matches!(
            self,
            TestStatus::Fail | TestStatus::Xpass | TestStatus::Unresolved
        )
    }

    /// Severity rank; higher is worse
    pub fn severity(&self) -> u8 {
        match self {
            TestStatus::Pass | TestStatus::Kpass => 0,
            TestStatus::Xfail | TestStatus::Kfail => 1,
            TestStatus::Unsupported | TestStatus::Untested => 2,
            TestStatus::Xpass => 3,
            TestStatus::Unresolved => 4,
            TestStatus::Fail => 5,
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a word is not a DejaGnu status
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown test status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for TestStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TestStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
