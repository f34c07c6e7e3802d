// Decides which messages a finished build produces
//
// - one root message per tested commit (key `<rev>`, or `<rev>-try`)
// - one message per build for the testers list
// - one message to the author when their commit breaks the build, sent
//   once per breakage (key `breakage-<builder>`) and re-armed as soon as
//   a build of that builder is no longer broken

use crate::config::Config;
use crate::notify::dedup::{NotificationStore, Result};
use crate::notify::message::{
    compose_author_message, compose_build_message, compose_root_message, BuildInfo, Message,
};
use crate::notify::outcome::classify;

pub struct Notifier<'a, N: NotificationStore> {
    config: &'a Config,
    store: N,
}

impl<'a, N: NotificationStore> Notifier<'a, N> {
    pub fn new(config: &'a Config, store: N) -> Self {
        Self { config, store }
    }

    pub fn store(&self) -> &N {
        &self.store
    }

    /// Compose the messages owed for `info`, marking them as notified
    ///
    /// `now` is the current time in Unix seconds.
    pub fn messages_for(&mut self, info: &BuildInfo, now: u64) -> Result<Vec<Message>> {
        let mut messages = Vec::new();

        let root_key = if info.is_try {
            format!("{}-try", info.revision)
        } else {
            info.revision.clone()
        };
        if !self.store.has_notified(&root_key)? {
            self.store.mark_notified(&root_key, now)?;
            messages.push(compose_root_message(self.config, info));
        }

        let classification = classify(&info.steps);
        let build_message = compose_build_message(self.config, info, &classification);

        if !info.is_try {
            let breakage_key = format!("breakage-{}", info.builder);
            if classification.outcome.is_breakage() {
                if !self.store.has_notified(&breakage_key)? {
                    self.store.mark_notified(&breakage_key, now)?;
                    if let Some(change) = info.changes.first() {
                        messages.push(compose_author_message(
                            self.config,
                            change,
                            &build_message.body,
                        ));
                    }
                } else {
                    tracing::debug!(builder = %info.builder, "breakage already reported");
                }
            } else {
                self.store.clear(&breakage_key)?;
            }
        }

        messages.push(build_message);
        Ok(messages)
    }
}
