//! Dejadiff - regression detection for DejaGnu test summaries
//!
//! This library parses the `.sum` files produced by GCC's DejaGnu testsuite,
//! compares runs to find regressions, keeps a per-(builder, branch) baseline
//! of the last known good run, and composes the notifications a build
//! master sends about a finished build.

pub mod baseline;
pub mod cli;
pub mod config;
pub mod json_output;
pub mod notify;
mod persist;
pub mod regression;
pub mod status;
pub mod sumfile;
