//! JSON output format for `--format json`
//!
//! Every command wraps its payload in one versioned envelope so scripts can
//! check `format` before reading the rest.

use crate::baseline::{RunVerdict, StoredRun};
use crate::notify::Message;
use crate::regression::RegressionReport;
use crate::status::TestStatus;
use crate::sumfile::{CountMap, ResultSet, TestOutcome};
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-status totals of a result set
#[derive(Debug, Clone, Default, Serialize)]
pub struct JsonSummary {
    pub total_tests: usize,
    pub by_status: BTreeMap<TestStatus, usize>,
}

impl JsonSummary {
    pub fn from_results(results: &ResultSet) -> Self {
        Self {
            total_tests: results.len(),
            by_status: results.status_counts(),
        }
    }
}

/// Stored baseline as shown by `baseline show`
#[derive(Debug, Clone, Serialize)]
pub struct JsonBaseline {
    pub builder: String,
    pub branch: String,
    pub commit: String,
    pub recorded_at: u64,
    pub fingerprint: String,
    /// Commit in the `.last-commit` marker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_commit: Option<String>,
}

/// Root JSON output structure
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<TestOutcome>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<JsonSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<CountMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<RegressionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<RunVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<JsonBaseline>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
}

impl JsonOutput {
    /// Create an empty envelope
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "dejadiff-json-v1".to_string(),
            results: None,
            summary: None,
            counts: None,
            report: None,
            verdict: None,
            baseline: None,
            messages: None,
        }
    }

    /// Attach per-test results and their summary
    pub fn set_results(&mut self, results: &ResultSet) {
        self.results = Some(results.outcomes().collect());
        self.summary = Some(JsonSummary::from_results(results));
    }

    pub fn set_counts(&mut self, counts: CountMap) {
        self.counts = Some(counts);
    }

    pub fn set_report(&mut self, report: RegressionReport) {
        self.report = Some(report);
    }

    pub fn set_verdict(&mut self, verdict: RunVerdict) {
        self.verdict = Some(verdict);
    }

    /// Attach a stored baseline with its results
    pub fn set_baseline(&mut self, run: &StoredRun, last_commit: Option<String>) {
        self.set_results(&run.results);
        self.baseline = Some(JsonBaseline {
            builder: run.builder.clone(),
            branch: run.branch.clone(),
            commit: run.commit.clone(),
            recorded_at: run.recorded_at,
            fingerprint: run.fingerprint.clone(),
            last_commit,
        });
    }

    pub fn set_messages(&mut self, messages: Vec<Message>) {
        self.messages = Some(messages);
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}
