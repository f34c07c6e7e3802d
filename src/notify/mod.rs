//! Build notifications
//!
//! Classifies a finished build from its step logs and composes the
//! plain-text messages it owes: a root message per tested commit, a
//! per-build message for the testers list, and a breakage message for
//! the author of a commit that broke the build. Delivery is left to the
//! host; de-duplication state lives behind [`NotificationStore`].

mod dedup;
mod message;
mod notifier;
mod outcome;

pub use dedup::{
    FileNotificationStore, MemoryNotificationStore, NotificationStore, NotifyError, Result,
};
pub use message::{
    compose_author_message, compose_build_message, compose_root_message, is_mail_needed,
    root_subject, truncate_log, BuildInfo, Change, Message,
};
pub use notifier::Notifier;
pub use outcome::{classify, BuildNote, BuildOutcome, Classification, StepKind, StepLog};
