//! Observer hooks (§9: `HeartbeatSent`, `EntriesAppended`).
//!
//! Thin synchronous notification callbacks, invoked right after the
//! corresponding side effect. Grounded on the `Tick` accumulator in the
//! original consensus module (`Tick::write_meta`/`write_config`/`send`),
//! which serves the same purpose of surfacing externally-visible effects of
//! one state transition to the caller — here the async equivalent is a
//! subscriber list invoked inline rather than a struct the caller drains.

use crate::messages::LogEntry;

type HeartbeatSentHook = Box<dyn Fn() + Send + Sync>;
type EntriesAppendedHook = Box<dyn Fn(&[LogEntry]) + Send + Sync>;

#[derive(Default)]
pub struct ObserverList {
    heartbeat_sent: Vec<HeartbeatSentHook>,
    entries_appended: Vec<EntriesAppendedHook>,
}

impl ObserverList {
    pub fn new() -> Self {
        ObserverList::default()
    }

    pub fn on_heartbeat_sent(&mut self, hook: impl Fn() + Send + Sync + 'static) {
        self.heartbeat_sent.push(Box::new(hook));
    }

    pub fn on_entries_appended(&mut self, hook: impl Fn(&[LogEntry]) + Send + Sync + 'static) {
        self.entries_appended.push(Box::new(hook));
    }

    pub(crate) fn notify_heartbeat_sent(&self) {
        for hook in &self.heartbeat_sent {
            hook();
        }
    }

    pub(crate) fn notify_entries_appended(&self, entries: &[LogEntry]) {
        for hook in &self.entries_appended {
            hook(entries);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::messages::LogEntryKind;

    #[test]
    fn heartbeat_hook_fires_once_per_notification() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut observers = ObserverList::new();
        let count_clone = count.clone();
        observers.on_heartbeat_sent(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        observers.notify_heartbeat_sent();
        observers.notify_heartbeat_sent();

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn entries_appended_hook_receives_the_batch() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mut observers = ObserverList::new();
        let seen_clone = seen.clone();
        observers.on_entries_appended(move |entries| {
            seen_clone.store(entries.len(), Ordering::SeqCst);
        });

        let entries = vec![LogEntry {
            index: 1,
            term: 1,
            payload: Bytes::new(),
            kind: LogEntryKind::Client,
        }];
        observers.notify_entries_appended(&entries);

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
