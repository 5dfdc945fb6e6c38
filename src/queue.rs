//! Pending-Command Queue (C6, §4.6).
//!
//! A plain FIFO of commands awaiting commit. Kept as a bare (non-locking)
//! structure; the Leader guards it with its own mutex alongside whatever
//! else needs to move in lock-step (§5).

use std::collections::VecDeque;

use crate::messages::{CommandOutcome, CompletionHandle, LogIndex};

struct PendingEntry {
    assigned_index: LogIndex,
    completion: CompletionHandle,
}

#[derive(Default)]
pub struct PendingCommandQueue {
    entries: VecDeque<PendingEntry>,
}

impl PendingCommandQueue {
    pub fn new() -> Self {
        PendingCommandQueue::default()
    }

    /// Enqueues a command awaiting commit. `assigned_index` must be strictly
    /// greater than any index already enqueued (§3: "strictly increasing
    /// assignedIndex").
    pub fn enqueue(&mut self, assigned_index: LogIndex, completion: CompletionHandle) {
        if let Some(back) = self.entries.back() {
            debug_assert!(
                assigned_index > back.assigned_index,
                "pending command queue requires strictly increasing assigned indexes"
            );
        }
        self.entries.push_back(PendingEntry {
            assigned_index,
            completion,
        });
    }

    /// Resolves, in FIFO order, every command whose `assigned_index` is now
    /// `<= n`, per §4.6.
    pub fn complete_up_to(&mut self, n: LogIndex) {
        while let Some(front) = self.entries.front() {
            if front.assigned_index > n {
                break;
            }
            let entry = self.entries.pop_front().expect("front just matched");
            // The client may have dropped its receiver; that is not this
            // queue's concern.
            let _ = entry.completion.send(CommandOutcome::Committed);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[test]
    fn completes_in_assigned_index_order() {
        let mut queue = PendingCommandQueue::new();
        let (tx1, mut rx1) = oneshot::channel();
        let (tx2, mut rx2) = oneshot::channel();
        let (tx3, mut rx3) = oneshot::channel();

        queue.enqueue(1, tx1);
        queue.enqueue(3, tx2);
        queue.enqueue(5, tx3);

        queue.complete_up_to(3);

        assert_eq!(rx1.try_recv(), Ok(CommandOutcome::Committed));
        assert_eq!(rx2.try_recv(), Ok(CommandOutcome::Committed));
        assert!(rx3.try_recv().is_err());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn leaves_queue_untouched_when_nothing_is_committed_yet() {
        let mut queue = PendingCommandQueue::new();
        let (tx, mut rx) = oneshot::channel();
        queue.enqueue(10, tx);

        queue.complete_up_to(5);

        assert!(rx.try_recv().is_err());
        assert_eq!(queue.len(), 1);
    }
}
