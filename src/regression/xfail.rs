// XFAIL ignore list: tests known to be unreliable on a builder
//
// File format, one entry per line:
//   gcc.dg/pr12345.c execution test
//   FAIL: gcc.dg/pr67890.c (test for excess errors)
//   # comment
// A leading `<STATUS>: ` is accepted so entries can be pasted from a `.sum`.

use crate::status::TestStatus;
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::Path;

/// Set of test names whose status changes are never reported as regressions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XfailList {
    names: BTreeSet<String>,
}

impl XfailList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an ignore list
    pub fn parse(text: &str) -> Self {
        let names = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| strip_status(line).to_string())
            .filter(|name| !name.is_empty())
            .collect();
        Self { names }
    }

    /// Load an ignore list; a missing file is an empty list
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    /// True if `name`, or the test it duplicates (`name <<N>>`), is listed
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name) || self.names.contains(base_name(name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for XfailList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

fn strip_status(line: &str) -> &str {
    if let Some((word, rest)) = line.split_once(": ") {
        if word.parse::<TestStatus>().is_ok() {
            return rest.trim();
        }
    }
    line
}

/// Strip the ` <<N>>` suffix the parser gives repeated test names
fn base_name(name: &str) -> &str {
    let Some(stripped) = name.strip_suffix(">>") else {
        return name;
    };
    let Some(idx) = stripped.rfind(" <<") else {
        return name;
    };
    let digits = &stripped[idx + 3..];
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        &name[..idx]
    } else {
        name
    }
}
