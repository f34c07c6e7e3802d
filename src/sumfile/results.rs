// Per-test result sets parsed from DejaGnu `.sum` text
//
// A `.sum` file interleaves per-test lines (`PASS: gcc.dg/foo.c (test for
// excess errors)`) with banners, `Running ...` lines and the trailing
// summary block. Only the per-test lines contribute to a ResultSet.

use crate::status::TestStatus;
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::LazyLock;

static TEST_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(PASS|FAIL|XFAIL|KFAIL|XPASS|KPASS|UNTESTED|UNRESOLVED|UNSUPPORTED): (.*\S)\s*$",
    )
    .expect("test line pattern is valid")
});

/// One test case and its outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub name: String,
    pub status: TestStatus,
}

/// Outcomes of one full test run, ordered by test name
///
/// Test names are unique. A ResultSet is built once, by the parser or by
/// collecting `(name, status)` pairs, and is read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    tests: BTreeMap<String, TestStatus>,
}

impl ResultSet {
    /// Create an empty result set
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Status of a test, if it ran
    pub fn get(&self, name: &str) -> Option<TestStatus> {
        self.tests.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tests.contains_key(name)
    }

    /// Iterate over `(name, status)` in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, TestStatus)> + '_ {
        self.tests.iter().map(|(name, status)| (name.as_str(), *status))
    }

    /// Iterate over outcomes in name order
    pub fn outcomes(&self) -> impl Iterator<Item = TestOutcome> + '_ {
        self.iter().map(|(name, status)| TestOutcome {
            name: name.to_string(),
            status,
        })
    }

    /// Number of tests with the given status
    pub fn count(&self, status: TestStatus) -> usize {
        self.tests.values().filter(|s| **s == status).count()
    }

    /// Per-status totals, omitting statuses that never occur
    pub fn status_counts(&self) -> BTreeMap<TestStatus, usize> {
        let mut counts = BTreeMap::new();
        for status in self.tests.values() {
            *counts.entry(*status).or_insert(0) += 1;
        }
        counts
    }

    /// SHA-256 of the canonical sum rendering, hex encoded
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(render_sum_text(self).as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl FromIterator<(String, TestStatus)> for ResultSet {
    fn from_iter<I: IntoIterator<Item = (String, TestStatus)>>(iter: I) -> Self {
        Self {
            tests: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<(&'a str, TestStatus)> for ResultSet {
    fn from_iter<I: IntoIterator<Item = (&'a str, TestStatus)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(name, status)| (name.to_string(), status))
            .collect()
    }
}

/// Parse `.sum` text into a ResultSet
///
/// Unrecognized lines are skipped. A name seen again later in the same run
/// is stored as `<name> <<N>>`, N counting from 2 and skipping keys that
/// are already taken, so every occurrence survives and names stay unique.
///
/// # Example
/// ```
/// use dejadiff::sumfile::parse_sum_text;
/// use dejadiff::status::TestStatus;
///
/// let results = parse_sum_text("PASS: gcc.dg/a.c\nFAIL: gcc.dg/b.c\n=== gcc Summary ===\n");
/// assert_eq!(results.len(), 2);
/// assert_eq!(results.get("gcc.dg/b.c"), Some(TestStatus::Fail));
/// ```
pub fn parse_sum_text(text: &str) -> ResultSet {
    let mut tests = BTreeMap::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut skipped = 0usize;

    for line in text.lines() {
        let Some(caps) = TEST_LINE_RE.captures(line) else {
            skipped += 1;
            continue;
        };
        let Ok(status) = caps[1].parse::<TestStatus>() else {
            skipped += 1;
            continue;
        };
        let name = &caps[2];

        // A real test may already be called `<name> <<N>>`; skip to a free N
        let occurrence = seen.entry(name.to_string()).or_insert(0);
        let key = loop {
            *occurrence += 1;
            let key = if *occurrence == 1 {
                name.to_string()
            } else {
                format!("{} <<{}>>", name, occurrence)
            };
            if !tests.contains_key(&key) {
                break key;
            }
        };
        tests.insert(key, status);
    }

    tracing::debug!(
        tests = tests.len(),
        skipped_lines = skipped,
        "parsed sum text"
    );

    ResultSet { tests }
}

/// Read and parse a `.sum` file
///
/// Returns `Ok(None)` when the file does not exist, which callers must keep
/// distinct from an existing file with no results. Bytes that are not valid
/// UTF-8 are replaced rather than rejected.
pub fn read_sum_file<P: AsRef<Path>>(path: P) -> Result<Option<ResultSet>> {
    let path = path.as_ref();
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(parse_sum_text(&String::from_utf8_lossy(&bytes)))),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("no sum file at {}", path.display());
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// Render a ResultSet as `.sum` lines, one `<STATUS>: <name>` per test
pub fn render_sum_text(results: &ResultSet) -> String {
    let mut text = String::new();
    for (name, status) in results.iter() {
        text.push_str(status.as_str());
        text.push_str(": ");
        text.push_str(name);
        text.push('\n');
    }
    text
}
