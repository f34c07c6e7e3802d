// Aggregate and grouped test counts
//
// Two count shapes are consumed by the build master as build properties:
// - the summary block at the end of each `.sum` file
//   (`# of unexpected failures 3`), keyed `"<suite> <kind> <category>"`;
// - grouped per-status counts printed by result summarizers, where a
//   `/path/to/<suite>.sum` header is followed by ` <STATUS>: <N>` lines,
//   keyed `"<suite>-<STATUS>"`.

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::LazyLock;

/// Property name → count
pub type CountMap = BTreeMap<String, u64>;

/// Suites whose `.sum` files a GCC build produces by default
pub const DEFAULT_SUITES: [&str; 4] = ["gcc", "g++", "objc", "gfortran"];

static AGGREGATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        ^
        \#\s+of\s+
        ((?:un)?expected | unresolved)
        \s+
        (passes | failures | successes | testcases | tests)
        \s+
        ([0-9]+)
        \s*
        $",
    )
    .expect("aggregate count pattern is valid")
});

static GROUP_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(/.+)\.sum$").expect("group header pattern is valid"));

static GROUP_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^ (FAIL|PASS|XFAIL|KFAIL|XPASS|KPASS|UNTESTED|UNRESOLVED|UNSUPPORTED): ([0-9]+)$",
    )
    .expect("group count pattern is valid")
});

/// Parse the `# of ...` summary lines of one `.sum` file
///
/// # Example
/// ```
/// use dejadiff::sumfile::parse_aggregate_counts;
///
/// let counts = parse_aggregate_counts("gcc", "# of expected passes\t\t120\n# of unexpected failures 3\n");
/// assert_eq!(counts["gcc unexpected failures"], 3);
/// assert_eq!(counts["gcc expected passes"], 120);
/// ```
pub fn parse_aggregate_counts(group: &str, text: &str) -> CountMap {
    let mut counts = CountMap::new();
    for line in text.lines() {
        let Some(caps) = AGGREGATE_RE.captures(line) else {
            continue;
        };
        let Ok(n) = caps[3].parse::<u64>() else {
            continue;
        };
        counts.insert(format!("{} {} {}", group, &caps[1], &caps[2]), n);
    }
    counts
}

/// Collect aggregate counts for each suite under a GCC testsuite directory
///
/// Reads `<testsuite_dir>/<suite>/<suite>.sum` for each suite. Suites whose
/// file is missing are skipped.
pub fn collect_testsuite_counts<P, S>(testsuite_dir: P, suites: &[S]) -> Result<CountMap>
where
    P: AsRef<Path>,
    S: AsRef<str>,
{
    let testsuite_dir = testsuite_dir.as_ref();
    let mut counts = CountMap::new();

    for suite in suites {
        let suite = suite.as_ref();
        let path = testsuite_dir.join(suite).join(format!("{}.sum", suite));
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("skipping {}: no sum file", path.display());
                continue;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };
        counts.extend(parse_aggregate_counts(
            suite,
            &String::from_utf8_lossy(&bytes),
        ));
    }

    Ok(counts)
}

/// Parse grouped per-status counts
///
/// # Example
/// ```
/// use dejadiff::sumfile::parse_grouped_counts;
///
/// let out = "/build/gcc/testsuite/gcc/gcc.sum\n FAIL: 4\n PASS: 1000\n";
/// let counts = parse_grouped_counts(out);
/// assert_eq!(counts["gcc-FAIL"], 4);
/// assert_eq!(counts["gcc-PASS"], 1000);
/// ```
pub fn parse_grouped_counts(text: &str) -> CountMap {
    let mut counts = CountMap::new();
    let mut current_group: Option<String> = None;

    for line in text.lines() {
        if let Some(group) = &current_group {
            if let Some(caps) = GROUP_COUNT_RE.captures(line) {
                if let Ok(n) = caps[2].parse::<u64>() {
                    counts.insert(format!("{}-{}", group, &caps[1]), n);
                }
            }
        }

        if let Some(caps) = GROUP_HEADER_RE.captures(line) {
            let path = &caps[1];
            let name = path.rsplit('/').next().unwrap_or(path);
            current_group = Some(name.to_string());
        }
    }

    counts
}
