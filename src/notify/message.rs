// Plain-text message composition
//
// Messages are returned to the host for delivery; nothing here talks to a
// mail server.

use crate::baseline::DEFAULT_BRANCH;
use crate::config::Config;
use crate::notify::outcome::{BuildNote, BuildOutcome, Classification, StepLog};
use crate::regression::framed;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// One commit included in a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub revision: String,
    pub author: String,
    /// Full commit message; the first line is the title
    pub comments: String,
}

impl Change {
    pub fn title(&self) -> &str {
        self.comments.lines().next().unwrap_or("")
    }
}

/// Everything the host knows about a finished build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub builder: String,
    #[serde(default)]
    pub branch: Option<String>,
    pub worker: String,
    pub build_url: String,
    #[serde(default)]
    pub build_number: Option<u64>,
    /// Commit the build tested
    pub revision: String,
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default)]
    pub is_try: bool,
    #[serde(default)]
    pub is_rebuild: bool,
    /// Patch text of a try build
    #[serde(default)]
    pub try_patch: Option<String>,
    /// Who asked for the try build
    #[serde(default)]
    pub try_recipient: Option<String>,
    /// Commit of the builder's results repository holding this run's logs
    #[serde(default)]
    pub results_commit: Option<String>,
    /// Commit of the XFAIL list repository
    #[serde(default)]
    pub xfail_commit: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepLog>,
}

impl BuildInfo {
    pub fn branch(&self) -> &str {
        self.branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }
}

/// A composed, undelivered message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// Subject of the per-commit root message
///
/// ```
/// use dejadiff::notify::root_subject;
///
/// assert_eq!(root_subject("trunk", "Fix PR123"), "[gcc] Fix PR123");
/// assert_eq!(root_subject("gcc-14", "Fix PR123"), "[gcc/gcc-14] Fix PR123");
/// ```
pub fn root_subject(branch: &str, title: &str) -> String {
    if branch == "trunk" {
        format!("[gcc] {}", title)
    } else {
        format!("[gcc/{}] {}", branch, title)
    }
}

/// Whether a notifier should mail about a build started by `scheduler`
///
/// Racy-test schedulers never mail. Try schedulers mail only through the
/// try notifier, all others only through the regular one.
pub fn is_mail_needed(scheduler: &str, try_notifier: bool) -> bool {
    if scheduler.starts_with("racy") {
        false
    } else if scheduler.starts_with("try") {
        try_notifier
    } else {
        !try_notifier
    }
}

fn ascii_only(text: &str) -> String {
    text.chars().filter(char::is_ascii).collect()
}

/// Percent-encode a URL path component, keeping `/`
fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'.' | b'-' | b'~' | b'/' => {
                out.push(byte as char)
            }
            _ => {
                let _ = write!(out, "%{:02X}", byte);
            }
        }
    }
    out
}

/// Keep a compile log readable in a mail body
///
/// Logs over `limit` characters are cut to their last `tail_lines` lines,
/// behind a short explanation.
pub fn truncate_log(text: &str, limit: usize, tail_lines: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let lines: Vec<&str> = text.split('\n').collect();
    let tail = &lines[lines.len().saturating_sub(tail_lines)..];
    format!(
        "\n+++ The full log is too big to be posted here.\n+++ These are the last {} lines of it.\n\n{}",
        tail_lines,
        tail.join("\n")
    )
}

/// Root message announcing the results thread for one commit
pub fn compose_root_message(config: &Config, info: &BuildInfo) -> Message {
    let branch = info.branch();
    let rev = &info.revision;
    let mut text = String::new();

    let (title, to, message_id) = if info.is_try {
        let _ = writeln!(text, "*** TEST RESULTS FOR TRY BUILD ***\n");
        let _ = writeln!(text, "Branch: {}", branch);
        let _ = writeln!(text, "Commit tested against: {}\n", rev);
        text.push_str("Patch tested:\n\n");
        text.push_str(info.try_patch.as_deref().unwrap_or(""));
        (
            format!("Try Build against commit {}", rev),
            info.try_recipient
                .clone()
                .unwrap_or_else(|| config.mail_to.clone()),
            format!("<{}-try@gcc-build>", rev),
        )
    } else {
        let change = info.changes.first();
        let comments = change.map_or("", |c| c.comments.as_str());
        let title = change.map_or("", Change::title);
        let _ = writeln!(text, "*** TEST RESULTS FOR COMMIT {} ***\n", rev);
        let _ = writeln!(text, "Author: {}", change.map_or("", |c| c.author.as_str()));
        let _ = writeln!(text, "Branch: {}", branch);
        let _ = writeln!(text, "Commit: {}\n", rev);
        let _ = writeln!(text, "{}\n", title);
        text.push_str(&comments.lines().skip(1).collect::<Vec<_>>().join("\n"));
        (
            title.to_string(),
            config.mail_to.clone(),
            format!("<{}@gcc-build>", rev),
        )
    };

    Message {
        from: config.mail_from.clone(),
        to,
        subject: root_subject(branch, &title),
        body: ascii_only(&text),
        message_id: Some(message_id),
    }
}

/// Message telling a commit's author that it broke the build
pub fn compose_author_message(config: &Config, change: &Change, details: &str) -> Message {
    let title = change.title();
    let mut text = String::from("Hello there,\n\nYour commit:\n\n");
    let _ = writeln!(text, "\t{}", title);
    let _ = writeln!(text, "\t{}\n", change.revision);
    text.push_str("broke GCC.  Please fix it, or the GCC gods will get you.\n\n");
    text.push_str("You can find details of the breakage below.\n\n");
    text.push_str("Cheers,\n\nYour GCC BuildBot.\n\n");
    text.push_str("+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+\n\n");
    text.push('\n');
    text.push_str(details);

    Message {
        from: config.mail_from.clone(),
        to: ascii_only(&change.author),
        subject: format!("Your commit '{}' broke GCC", title),
        body: text,
        message_id: None,
    }
}

/// Per-build message for the testers list
pub fn compose_build_message(
    config: &Config,
    info: &BuildInfo,
    classification: &Classification,
) -> Message {
    let name = &info.builder;
    let branch = info.branch();
    let mut subject = if info.is_try {
        format!("Try Build on {}, branch {}", name, branch)
    } else {
        format!("Failures on {}, branch {}", name, branch)
    };

    let mut text = String::new();
    let _ = writeln!(text, "Buildworker:\n\t{}", info.worker);
    let _ = writeln!(text, "\nFull Build URL:\n\t<{}>", info.build_url);

    if info.is_try {
        let _ = writeln!(text, "\nLast commit(s) before Try Build:\n\t{}", info.revision);
    } else {
        text.push_str("\nCommit(s) tested:\n");
        for change in &info.changes {
            let _ = writeln!(text, "\t{}", change.revision);
        }
        text.push_str("\nAuthor(s) (in the same order as the commits):\n");
        for change in &info.changes {
            let _ = writeln!(text, "\t{}", change.author);
        }
        let title = info.changes.first().map_or("", Change::title);
        let _ = writeln!(text, "\nSubject:\n\t{}", title);
    }

    text.push_str("\nTestsuite log (gcc.sum and gcc.log) URL(s):\n");
    match &info.results_commit {
        Some(commit) => {
            let _ = writeln!(
                text,
                "\t<{}/{}/.git/tree/?h={}&id={}>",
                config.git_web_url,
                name,
                quote(branch),
                commit
            );
        }
        None => {
            let _ = writeln!(text, "\t<Error fetching commit ID for {}>", info.revision);
        }
    }

    text.push('\n');
    if info.is_rebuild {
        text.push_str("\n*** WARNING: This was a REBUILD request! ***\n");
        let _ = writeln!(
            text,
            "*** The previous build (build #{}) MAY NOT BE the ancestor of the current build! ***\n",
            info.build_number
                .map_or_else(|| "?".to_string(), |n| n.to_string())
        );
    }

    for note in &classification.notes {
        match note {
            BuildNote::WorkerOutOfSpace => {
                text.push_str(
                    "*** Internal error on buildworker (no space left on device). ***\n",
                );
                let _ = writeln!(
                    text,
                    "*** Please report this to the buildworker owner (see <{}/buildworker/{}>) ***\n",
                    config.build_master_url, info.worker
                );
            }
            BuildNote::MasterRepoUpdateFailed => text.push_str(
                "*** Failed to update master GCC git repository.  The build can continue. ***\n\n",
            ),
        }
    }

    match &classification.outcome {
        BuildOutcome::UpdateFailed => text.push_str(
            "*** Failed to update GCC git repository.  This is probably a timeout problem. ***\n\n",
        ),
        BuildOutcome::ConfigureFailed { log } => {
            text.push_str(&framed("Failed to configure GCC.", log));
            subject = format!("*** COMPILATION FAILED *** {}", subject);
        }
        BuildOutcome::CompileFailed { log } => {
            let log = truncate_log(
                &ascii_only(log),
                config.compile_log_limit,
                config.compile_log_tail_lines,
            );
            text.push_str(&framed("Failed to compile GCC.", &log));
            subject = format!("*** COMPILATION FAILED *** {}", subject);
        }
        BuildOutcome::RegressionsFound { diff } => {
            text.push_str(&framed("Diff to previous build", diff));
            write_xfail_section(&mut text, config, info);
        }
        BuildOutcome::Ok => {
            if info.is_try && classification.regressions_step_passed {
                text.push_str("\nCongratulations!  No regressions were found in this build!\n\n");
            }
        }
    }
    text.push('\n');

    if !info.is_try && classification.outcome.is_breakage() {
        subject.push_str(" *** BREAKAGE ***");
    }

    let to = if info.is_try {
        info.try_recipient
            .clone()
            .unwrap_or_else(|| config.mail_to.clone())
    } else {
        config.mail_to.clone()
    };

    Message {
        from: config.mail_from.clone(),
        to,
        subject,
        body: text,
        message_id: None,
    }
}

fn write_xfail_section(text: &mut String, config: &Config, info: &BuildInfo) {
    let name = &info.builder;
    let branch = info.branch();
    text.push_str("\n\n*** Complete list of XFAILs for this builder ***\n\n");
    match &info.xfail_commit {
        Some(commit) => {
            text.push_str("To obtain the list of XFAIL tests for this builder, go to:\n\n");
            let _ = writeln!(
                text,
                "\t<{};a=blob;f=xfails/{}/xfails/{}/xfail;hb={}>\n",
                config.xfail_web_url, name, branch, commit
            );
            text.push_str(
                "You can also see a pretty-printed version of the list, with more information\n",
            );
            text.push_str("about each XFAIL, by going to:\n\n");
            let _ = writeln!(
                text,
                "\t<{};a=blob;f=xfails/{}/xfails/{}/xfail.table;hb={}>",
                config.xfail_web_url, name, branch, commit
            );
        }
        None => text.push_str(
            "FAILURE TO OBTAIN THE COMMIT FOR THE XFAIL LIST.  PLEASE CONTACT THE BUILDBOT ADMIN.\n",
        ),
    }
}
