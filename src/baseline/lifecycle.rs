// Baseline lifecycle: compare a finished run, then decide what to persist
//
// Rules for regular runs:
// - no baseline yet: the run becomes the baseline
// - baseline present, run clean against it: the run replaces it
// - baseline present, run regressed: baseline kept, run flagged
// The run is also compared with the previous recorded run, which catches
// regressions even when the baseline is stale. Try runs are compared the
// same way but never modify the baseline or the recorded runs.

use crate::baseline::store::{BaselineStore, Result, RunSlot, StoreKey, StoredRun};
use crate::regression::{compare_with_ignores, RegressionReport};
use crate::sumfile::ResultSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of build produced the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
    /// A regular build of a new commit
    Regular,
    /// A rebuild of an already-built commit; it replaces the last run
    /// instead of following it
    Rebuild,
    /// A try build of an uncommitted patch
    Try,
}

/// Identification of one finished run
#[derive(Debug, Clone)]
pub struct RunContext {
    pub key: StoreKey,
    pub commit: String,
    pub kind: RunKind,
}

impl RunContext {
    pub fn new(key: StoreKey, commit: impl Into<String>, kind: RunKind) -> Self {
        Self {
            key,
            commit: commit.into(),
            kind,
        }
    }
}

/// Build-step result reported back to the build master
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepResult {
    Success,
    Warnings,
    Failure,
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StepResult::Success => "success",
            StepResult::Warnings => "warnings",
            StepResult::Failure => "failure",
        })
    }
}

/// What happened to the stored baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselineAction {
    /// No baseline existed; the run became the baseline
    Adopted,
    /// The run was clean against the baseline and replaced it
    Advanced,
    /// The run regressed; the baseline was left as it was
    Kept,
    /// Try run; nothing was persisted to the baseline
    Untouched,
}

impl fmt::Display for BaselineAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BaselineAction::Adopted => "adopted",
            BaselineAction::Advanced => "advanced",
            BaselineAction::Kept => "kept",
            BaselineAction::Untouched => "untouched",
        })
    }
}

/// Outcome of processing one run
#[derive(Debug, Clone, Serialize)]
pub struct RunVerdict {
    pub step: StepResult,
    pub action: BaselineAction,
    /// True when the run regressed against the baseline
    pub regressed: bool,
    /// Comparison against the baseline, if one existed
    pub baseline_report: Option<RegressionReport>,
    /// Comparison against the previous recorded run, if one existed
    pub previous_report: Option<RegressionReport>,
}

impl RunVerdict {
    /// Text of the `baseline_diff` log; empty when clean or no baseline
    pub fn baseline_diff(&self) -> String {
        self.baseline_report
            .as_ref()
            .map(RegressionReport::to_report_string)
            .unwrap_or_default()
    }

    /// Text of the `regressions` log; empty when clean or no previous run
    pub fn regressions(&self) -> String {
        self.previous_report
            .as_ref()
            .map(RegressionReport::to_report_string)
            .unwrap_or_default()
    }
}

/// Step result from the two comparisons
///
/// Regressions against the previous run fail the step; regressions only
/// against the baseline are warnings.
pub fn step_result(
    baseline_report: Option<&RegressionReport>,
    previous_report: Option<&RegressionReport>,
) -> StepResult {
    let dirty = |report: Option<&RegressionReport>| report.is_some_and(|r| !r.is_clean());
    if dirty(previous_report) {
        StepResult::Failure
    } else if dirty(baseline_report) {
        StepResult::Warnings
    } else {
        StepResult::Success
    }
}

/// Applies the lifecycle rules against a store
pub struct BaselineManager<S: BaselineStore> {
    store: S,
}

impl<S: BaselineStore> BaselineManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Compare `current` with the stored baseline and previous run, then
    /// persist according to the lifecycle rules
    pub fn process(&mut self, ctx: &RunContext, current: ResultSet) -> Result<RunVerdict> {
        let key = &ctx.key;
        let xfails = self.store.load_xfails(key)?;
        let baseline = self.store.load_baseline(key)?;

        // A rebuild replaced the last run, so it follows the one before it
        let previous_slot = match ctx.kind {
            RunKind::Rebuild => RunSlot::Prior,
            RunKind::Regular | RunKind::Try => RunSlot::Previous,
        };
        let previous = self.store.load_run(key, previous_slot)?;

        let baseline_report = baseline
            .as_ref()
            .map(|b| compare_with_ignores(&b.results, &current, &xfails));
        let previous_report = previous
            .as_ref()
            .map(|p| compare_with_ignores(&p.results, &current, &xfails));

        let step = step_result(baseline_report.as_ref(), previous_report.as_ref());
        let regressed = baseline_report.as_ref().is_some_and(|r| !r.is_clean());
        let record = StoredRun::new(key, &ctx.commit, current);

        let action = match ctx.kind {
            RunKind::Try => {
                self.store.save_try_run(key, &record)?;
                BaselineAction::Untouched
            }
            RunKind::Regular | RunKind::Rebuild => {
                let action = match (&baseline, regressed) {
                    (None, _) => BaselineAction::Adopted,
                    (Some(_), false) => BaselineAction::Advanced,
                    (Some(_), true) => BaselineAction::Kept,
                };
                if action != BaselineAction::Kept {
                    self.store.save_baseline(key, &record)?;
                }
                if ctx.kind == RunKind::Regular {
                    self.store.rotate_previous(key)?;
                }
                self.store.save_run(key, RunSlot::Previous, &record)?;
                action
            }
        };

        match action {
            BaselineAction::Adopted => {
                tracing::info!(key = %key, commit = %ctx.commit, "adopted first baseline")
            }
            BaselineAction::Advanced => {
                tracing::info!(key = %key, commit = %ctx.commit, "baseline advanced")
            }
            BaselineAction::Kept => tracing::info!(
                key = %key,
                commit = %ctx.commit,
                regressions = baseline_report.as_ref().map_or(0, |r| r.regressions.len()),
                "run regressed, baseline kept"
            ),
            BaselineAction::Untouched => {
                tracing::info!(key = %key, commit = %ctx.commit, "try run recorded")
            }
        }

        Ok(RunVerdict {
            step,
            action,
            regressed,
            baseline_report,
            previous_report,
        })
    }
}
