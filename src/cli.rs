//! CLI argument parsing for Dejadiff

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for results, counts and reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "dejadiff")]
#[command(version)]
#[command(about = "Regression detection for DejaGnu .sum files", long_about = None)]
pub struct Cli {
    /// Configuration file (default: ./dejadiff.toml if present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Root of the baseline store (overrides `store_dir` from the config)
    #[arg(long = "store-dir", global = true, value_name = "DIR")]
    pub store_dir: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long = "format", global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug tracing output to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the per-test results of a .sum file ("-" reads stdin)
    Parse {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Aggregate "# of ..." counts of each suite under a testsuite directory
    Counts {
        #[arg(value_name = "TESTSUITE_DIR")]
        testsuite_dir: PathBuf,

        /// Suite to scan (repeatable; default: the configured suites)
        #[arg(long = "suite", value_name = "SUITE")]
        suites: Vec<String>,
    },

    /// Per-status counts from grouped summarizer output ("-" reads stdin)
    GroupedCounts {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Compare two .sum files; exits 1 on regressions, 3 when OLD is absent
    Compare {
        #[arg(value_name = "OLD")]
        old: PathBuf,

        #[arg(value_name = "NEW")]
        new: PathBuf,

        /// XFAIL ignore list
        #[arg(long, value_name = "FILE")]
        xfail: Option<PathBuf>,
    },

    /// Run the baseline lifecycle for a finished build ("-" reads stdin)
    Process {
        #[command(flatten)]
        target: TargetArgs,

        /// Commit the build tested
        #[arg(long, value_name = "REV")]
        commit: String,

        /// Try build of an uncommitted patch
        #[arg(long = "try", conflicts_with = "rebuild")]
        try_build: bool,

        /// Rebuild of an already-built commit
        #[arg(long)]
        rebuild: bool,

        /// Exit 2 when the run only regressed against the baseline
        #[arg(long = "fail-on-warnings")]
        fail_on_warnings: bool,

        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Inspect the stored baseline
    Baseline {
        #[command(subcommand)]
        action: BaselineCommand,
    },

    /// Compose the notifications owed for a finished build
    Message {
        /// Build description as JSON ("-" reads stdin)
        #[arg(long, value_name = "FILE")]
        build: PathBuf,

        /// Scheduler that started the build; racy-test builds are skipped
        #[arg(long, value_name = "NAME")]
        scheduler: Option<String>,

        /// Act as the try-build notifier
        #[arg(long = "try-notifier")]
        try_notifier: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum BaselineCommand {
    /// Print the stored baseline and the commit it was recorded at
    Show {
        #[command(flatten)]
        target: TargetArgs,
    },
}

/// Selects one (builder, branch) entry of the store
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    #[arg(long, value_name = "NAME")]
    pub builder: String,

    /// Branch (default: master)
    #[arg(long, value_name = "BRANCH")]
    pub branch: Option<String>,
}
