// Build outcome classification
//
// The build master hands over one log per step with the step's result.
// The first failed step that matters decides the outcome; some failures
// are only worth a note in the message and do not stop the scan.

use crate::baseline::StepResult;
use serde::{Deserialize, Serialize};

/// Marker GCC's build prints when the worker's disk fills up
const NO_SPACE_MARKER: &str = "No space left on device";

/// Build steps the notifier knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    /// Update of the shared master GCC repository
    UpdateMasterRepo,
    /// Update of the builder's GCC checkout
    UpdateRepo,
    Configure,
    Compile,
    /// The sum-file comparison step
    Regressions,
    /// Any step without special handling
    Other,
}

/// One log of one build step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepLog {
    pub step: StepKind,
    pub result: StepResult,
    /// Log name within the step (a step can have several logs)
    pub log_name: String,
    pub text: String,
}

/// Closed set of build outcomes a message is written for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BuildOutcome {
    UpdateFailed,
    ConfigureFailed { log: String },
    CompileFailed { log: String },
    RegressionsFound { diff: String },
    Ok,
}

impl BuildOutcome {
    /// Configure and compile failures break the build for everyone
    pub fn is_breakage(&self) -> bool {
        matches!(
            self,
            BuildOutcome::ConfigureFailed { .. } | BuildOutcome::CompileFailed { .. }
        )
    }
}

/// Failures noted in the message without deciding the outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildNote {
    WorkerOutOfSpace,
    MasterRepoUpdateFailed,
}

/// Outcome plus the notes collected on the way
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub outcome: BuildOutcome,
    pub notes: Vec<BuildNote>,
    /// A regressions step finished without failing
    pub regressions_step_passed: bool,
}

/// Classify a build from its step logs, in step order
///
/// # Example
/// ```
/// use dejadiff::baseline::StepResult;
/// use dejadiff::notify::{classify, BuildOutcome, StepKind, StepLog};
///
/// let logs = vec![StepLog {
///     step: StepKind::Compile,
///     result: StepResult::Failure,
///     log_name: "stdio".to_string(),
///     text: "make: *** [all] Error 2\n".to_string(),
/// }];
/// assert!(matches!(classify(&logs).outcome, BuildOutcome::CompileFailed { .. }));
/// ```
pub fn classify(logs: &[StepLog]) -> Classification {
    let mut notes = Vec::new();
    let mut regressions_step_passed = false;
    let mut outcome = BuildOutcome::Ok;

    for log in logs {
        if log.result != StepResult::Failure {
            if log.step == StepKind::Regressions {
                regressions_step_passed = true;
            }
            continue;
        }

        if log.text.contains(NO_SPACE_MARKER) {
            if !notes.contains(&BuildNote::WorkerOutOfSpace) {
                notes.push(BuildNote::WorkerOutOfSpace);
            }
            continue;
        }

        let decided = match log.step {
            StepKind::UpdateMasterRepo => {
                notes.push(BuildNote::MasterRepoUpdateFailed);
                None
            }
            StepKind::UpdateRepo => Some(BuildOutcome::UpdateFailed),
            StepKind::Configure => Some(BuildOutcome::ConfigureFailed {
                log: log.text.clone(),
            }),
            StepKind::Compile => Some(BuildOutcome::CompileFailed {
                log: log.text.clone(),
            }),
            StepKind::Regressions if log.log_name == "regressions" => {
                Some(BuildOutcome::RegressionsFound {
                    diff: log.text.clone(),
                })
            }
            StepKind::Regressions | StepKind::Other => None,
        };

        if let Some(decided) = decided {
            outcome = decided;
            break;
        }
    }

    tracing::debug!(?outcome, notes = notes.len(), "classified build");

    Classification {
        outcome,
        notes,
        regressions_step_passed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(step: StepKind, result: StepResult, log_name: &str, text: &str) -> StepLog {
        StepLog {
            step,
            result,
            log_name: log_name.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_all_green_is_ok() {
        let logs = vec![
            log(StepKind::UpdateRepo, StepResult::Success, "stdio", ""),
            log(StepKind::Compile, StepResult::Success, "stdio", ""),
            log(StepKind::Regressions, StepResult::Success, "stdio", ""),
        ];
        let c = classify(&logs);
        assert_eq!(c.outcome, BuildOutcome::Ok);
        assert!(c.notes.is_empty());
        assert!(c.regressions_step_passed);
    }

    #[test]
    fn test_first_decisive_failure_wins() {
        let logs = vec![
            log(StepKind::Configure, StepResult::Failure, "stdio", "configure: error: no gmp"),
            log(StepKind::Compile, StepResult::Failure, "stdio", "make failed"),
        ];
        assert_eq!(
            classify(&logs).outcome,
            BuildOutcome::ConfigureFailed {
                log: "configure: error: no gmp".to_string()
            }
        );
    }

    #[test]
    fn test_master_repo_failure_is_a_note() {
        let logs = vec![
            log(StepKind::UpdateMasterRepo, StepResult::Failure, "stdio", "timeout"),
            log(StepKind::Compile, StepResult::Failure, "stdio", "ICE"),
        ];
        let c = classify(&logs);
        assert_eq!(c.notes, vec![BuildNote::MasterRepoUpdateFailed]);
        assert!(c.outcome.is_breakage());
    }

    #[test]
    fn test_disk_full_is_skipped() {
        let logs = vec![
            log(
                StepKind::Compile,
                StepResult::Failure,
                "stdio",
                "cc1: error: No space left on device",
            ),
            log(StepKind::Regressions, StepResult::Failure, "regressions", "FAIL: x"),
        ];
        let c = classify(&logs);
        assert_eq!(c.notes, vec![BuildNote::WorkerOutOfSpace]);
        assert_eq!(
            c.outcome,
            BuildOutcome::RegressionsFound {
                diff: "FAIL: x".to_string()
            }
        );
    }

    #[test]
    fn test_regressions_only_from_regressions_log() {
        let logs = vec![log(
            StepKind::Regressions,
            StepResult::Failure,
            "baseline_diff",
            "FAIL: x",
        )];
        assert_eq!(classify(&logs).outcome, BuildOutcome::Ok);
    }

    #[test]
    fn test_update_failure() {
        let logs = vec![log(StepKind::UpdateRepo, StepResult::Failure, "stdio", "")];
        let c = classify(&logs);
        assert_eq!(c.outcome, BuildOutcome::UpdateFailed);
        assert!(!c.outcome.is_breakage());
    }
}
