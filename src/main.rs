use anyhow::{Context, Result};
use clap::Parser;
use dejadiff::baseline::{
    BaselineManager, BaselineStore, FileBaselineStore, RunContext, RunKind, StepResult, StoreKey,
};
use dejadiff::cli::{BaselineCommand, Cli, Command, OutputFormat, TargetArgs};
use dejadiff::config::Config;
use dejadiff::json_output::JsonOutput;
use dejadiff::notify::{
    is_mail_needed, BuildInfo, FileNotificationStore, Message, NotificationStore, Notifier,
};
use dejadiff::regression::{compare_with_ignores, framed, XfailList};
use dejadiff::sumfile::{
    collect_testsuite_counts, parse_grouped_counts, parse_sum_text, read_sum_file,
    render_sum_text, CountMap, ResultSet,
};
use std::io::Read;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status when regressions were found
const EXIT_REGRESSIONS: u8 = 1;
/// Exit status for warnings under `--fail-on-warnings`
const EXIT_WARNINGS: u8 = 2;
/// Exit status when the reference data is absent
const EXIT_NO_REFERENCE: u8 = 3;
/// Exit status for usage, I/O and store errors
const EXIT_ERROR: u8 = 4;

/// File name of the notification de-dup state under the store root
const NOTIFIED_FILE: &str = "notified.json";

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Read a whole input, "-" meaning stdin; `None` when the file is absent
fn read_input(path: &Path) -> Result<Option<String>> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(Some(text));
    }
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// Parse a sum file, "-" meaning stdin
fn read_results(path: &Path) -> Result<Option<ResultSet>> {
    if path == Path::new("-") {
        return Ok(read_input(path)?.map(|text| parse_sum_text(&text)));
    }
    read_sum_file(path)
}

fn require_results(path: &Path) -> Result<ResultSet> {
    read_results(path)?.with_context(|| format!("No sum file at {}", path.display()))
}

fn store_key(target: &TargetArgs) -> Result<StoreKey> {
    Ok(StoreKey::new(&target.builder, target.branch.as_deref())?)
}

fn print_json(output: &JsonOutput) -> Result<()> {
    println!("{}", output.to_json()?);
    Ok(())
}

fn print_counts(counts: CountMap, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for (key, value) in &counts {
                println!("{}={}", key, value);
            }
        }
        OutputFormat::Json => {
            let mut output = JsonOutput::new();
            output.set_counts(counts);
            print_json(&output)?;
        }
    }
    Ok(())
}

fn print_messages(messages: Vec<Message>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for message in &messages {
                println!("From: {}", message.from);
                println!("To: {}", message.to);
                println!("Subject: {}", message.subject);
                if let Some(id) = &message.message_id {
                    println!("Message-Id: {}", id);
                }
                println!();
                println!("{}", message.body);
            }
        }
        OutputFormat::Json => {
            let mut output = JsonOutput::new();
            output.set_messages(messages);
            print_json(&output)?;
        }
    }
    Ok(())
}

fn run_compare(old: &Path, new: &Path, xfail: Option<&Path>, format: OutputFormat) -> Result<u8> {
    let Some(previous) = read_results(old)? else {
        eprintln!("No previous results at {}", old.display());
        return Ok(EXIT_NO_REFERENCE);
    };
    let current = require_results(new)?;
    let xfails = match xfail {
        Some(path) => XfailList::from_file(path)?,
        None => XfailList::new(),
    };

    let report = compare_with_ignores(&previous, &current, &xfails);
    let code = if report.is_clean() { 0 } else { EXIT_REGRESSIONS };

    match format {
        OutputFormat::Text => print!("{}", report.to_report_string()),
        OutputFormat::Json => {
            let mut output = JsonOutput::new();
            output.set_report(report);
            print_json(&output)?;
        }
    }
    Ok(code)
}

fn run_process(
    config: &Config,
    target: &TargetArgs,
    commit: &str,
    kind: RunKind,
    fail_on_warnings: bool,
    file: &Path,
    format: OutputFormat,
) -> Result<u8> {
    let current = require_results(file)?;
    let ctx = RunContext::new(store_key(target)?, commit, kind);
    let mut manager = BaselineManager::new(FileBaselineStore::new(&config.store_dir));
    let verdict = manager
        .process(&ctx, current)
        .with_context(|| format!("Failed to process run for {}", ctx.key))?;

    let code = match verdict.step {
        StepResult::Success => 0,
        StepResult::Warnings if fail_on_warnings => EXIT_WARNINGS,
        StepResult::Warnings => 0,
        StepResult::Failure => EXIT_REGRESSIONS,
    };

    match format {
        OutputFormat::Text => {
            println!("baseline: {}", verdict.action);
            println!("step: {}", verdict.step);
            let baseline_diff = verdict.baseline_diff();
            if !baseline_diff.is_empty() {
                print!("{}", framed("Diff to baseline", &baseline_diff));
            }
            let regressions = verdict.regressions();
            if !regressions.is_empty() {
                print!("{}", framed("Diff to previous build", &regressions));
            }
        }
        OutputFormat::Json => {
            let mut output = JsonOutput::new();
            output.set_verdict(verdict);
            print_json(&output)?;
        }
    }
    Ok(code)
}

fn run_baseline_show(config: &Config, target: &TargetArgs, format: OutputFormat) -> Result<u8> {
    let key = store_key(target)?;
    let store = FileBaselineStore::new(&config.store_dir);
    let Some(baseline) = store.load_baseline(&key)? else {
        eprintln!("No baseline for {}", key);
        return Ok(EXIT_NO_REFERENCE);
    };
    let last_commit = store.last_commit(&key)?;

    match format {
        OutputFormat::Text => {
            println!("# builder: {}", baseline.builder);
            println!("# branch: {}", baseline.branch);
            println!("# commit: {}", baseline.commit);
            println!("# tests: {}", baseline.results.len());
            print!("{}", render_sum_text(&baseline.results));
        }
        OutputFormat::Json => {
            let mut output = JsonOutput::new();
            output.set_baseline(&baseline, last_commit);
            print_json(&output)?;
        }
    }
    Ok(0)
}

fn run_message(
    config: &Config,
    build: &Path,
    scheduler: Option<&str>,
    try_notifier: bool,
    format: OutputFormat,
) -> Result<u8> {
    if let Some(scheduler) = scheduler {
        if !is_mail_needed(scheduler, try_notifier) {
            tracing::debug!(scheduler, try_notifier, "no mail needed");
            return Ok(0);
        }
    }

    let text = read_input(build)?
        .with_context(|| format!("No build description at {}", build.display()))?;
    let mut info: BuildInfo = serde_json::from_str(&text)
        .with_context(|| format!("Invalid build description {}", build.display()))?;

    if info.xfail_commit.is_none() {
        let key = StoreKey::new(&info.builder, info.branch.as_deref())?;
        info.xfail_commit = FileBaselineStore::new(&config.store_dir).last_commit(&key)?;
    }

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let mut store = FileNotificationStore::new(config.store_dir.join(NOTIFIED_FILE));
    let expired = store.prune(now, config.notify_max_age)?;
    if expired > 0 {
        tracing::debug!(expired, "expired old notification marks");
    }
    let messages = Notifier::new(config, store).messages_for(&info, now)?;

    print_messages(messages, format)?;
    Ok(0)
}

/// Load the configuration, applying `--store-dir` on top of it
fn load_config(path: Option<&Path>, store_dir: Option<&Path>) -> Result<Config> {
    let mut config = Config::load(path)?;
    if let Some(store_dir) = store_dir {
        config.store_dir = store_dir.to_path_buf();
    }
    Ok(config)
}

fn run(args: Cli) -> Result<u8> {
    let Cli {
        config: config_path,
        store_dir,
        format,
        command,
        ..
    } = args;
    // Only subcommands that use the configuration read it
    let config = || load_config(config_path.as_deref(), store_dir.as_deref());

    match command {
        Command::Parse { file } => {
            let results = require_results(&file)?;
            match format {
                OutputFormat::Text => print!("{}", render_sum_text(&results)),
                OutputFormat::Json => {
                    let mut output = JsonOutput::new();
                    output.set_results(&results);
                    print_json(&output)?;
                }
            }
            Ok(0)
        }
        Command::Counts {
            testsuite_dir,
            suites,
        } => {
            let suites = if suites.is_empty() {
                config()?.suites
            } else {
                suites
            };
            print_counts(collect_testsuite_counts(&testsuite_dir, &suites)?, format)?;
            Ok(0)
        }
        Command::GroupedCounts { file } => {
            let text = read_input(&file)?
                .with_context(|| format!("No summary at {}", file.display()))?;
            print_counts(parse_grouped_counts(&text), format)?;
            Ok(0)
        }
        Command::Compare { old, new, xfail } => run_compare(&old, &new, xfail.as_deref(), format),
        Command::Process {
            target,
            commit,
            try_build,
            rebuild,
            fail_on_warnings,
            file,
        } => {
            let kind = if try_build {
                RunKind::Try
            } else if rebuild {
                RunKind::Rebuild
            } else {
                RunKind::Regular
            };
            run_process(
                &config()?,
                &target,
                &commit,
                kind,
                fail_on_warnings,
                &file,
                format,
            )
        }
        Command::Baseline {
            action: BaselineCommand::Show { target },
        } => run_baseline_show(&config()?, &target, format),
        Command::Message {
            build,
            scheduler,
            try_notifier,
        } => run_message(
            &config()?,
            &build,
            scheduler.as_deref(),
            try_notifier,
            format,
        ),
    }
}

fn main() -> ExitCode {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    match run(args) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
