//! Baseline storage and lifecycle
//!
//! A baseline is the last known good ResultSet for one (builder, branch)
//! pair. It is adopted from the first regular run, and afterwards only
//! advances to runs that introduce no regressions against it.

mod lifecycle;
mod store;

pub use lifecycle::{
    step_result, BaselineAction, BaselineManager, RunContext, RunKind, RunVerdict, StepResult,
};
pub use store::{
    BaselineStore, FileBaselineStore, MemoryBaselineStore, Result, RunSlot, StoreError, StoreKey,
    StoredRun, DEFAULT_BRANCH,
};
