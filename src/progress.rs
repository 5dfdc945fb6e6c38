//! Progress Table (C1, §4.1).
//!
//! Tracks `nextIndex`/`matchIndex` per peer plus the snapshot-in-flight set.
//! The spec's "lock-free concurrent hash maps, every mutation atomic per
//! (peer, field)" (§9) is implemented here as a single `tokio::sync::Mutex`
//! guarding everything together: contention is negligible at cluster scale
//! and multi-field atomicity (P1) comes for free.
//!
//! The snapshot-in-flight slot stores a *pre-armed but not started*
//! streamer: a closure that, when invoked, spawns the actual streaming task
//! and hands back its `JoinHandle` (§4.3, §9). This lets the Replicator
//! create the streamer and reserve the in-flight slot atomically with
//! sending the `CanInstallSnapshotRequest` probe, while deferring the
//! (potentially very slow) transfer itself until the follower accepts.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::messages::{LogIndex, ServerId};

/// A follower's replication progress as seen by the leader (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerProgress {
    pub next_index: LogIndex,
    pub match_index: LogIndex,
}

/// A snapshot streamer that has been built but not yet spawned; invoking it
/// spawns the transfer task and returns its handle.
pub type PreparedStreamer = Box<dyn FnOnce() -> JoinHandle<()> + Send>;

enum SnapshotSlot {
    Pending(Option<PreparedStreamer>),
    Streaming(#[allow(dead_code)] JoinHandle<()>),
}

#[derive(Default)]
struct Inner {
    peers: HashMap<ServerId, PeerProgress>,
    snapshots: HashMap<ServerId, SnapshotSlot>,
}

fn normalize(peer: &str) -> ServerId {
    peer.to_lowercase()
}

#[derive(Default)]
pub struct ProgressTable {
    inner: Mutex<Inner>,
}

impl ProgressTable {
    pub fn new() -> Self {
        ProgressTable::default()
    }

    /// `initialize(lastLogIndex, voters)`: `nextIndex[p] = lastLogIndex + 1`,
    /// `matchIndex[p] = 0` for every voting peer (§4.1). Callers pass only
    /// the *other* voters here; the leader's own entry is seeded separately
    /// via [`ProgressTable::record_success`] to satisfy invariant P3.
    pub async fn initialize(&self, last_log_index: LogIndex, peers: impl IntoIterator<Item = ServerId>) {
        let mut inner = self.inner.lock().await;
        for peer in peers {
            inner.peers.insert(
                normalize(&peer),
                PeerProgress {
                    next_index: last_log_index + 1,
                    match_index: 0,
                },
            );
        }
    }

    pub async fn next_index(&self, peer: &str) -> Option<LogIndex> {
        self.inner.lock().await.peers.get(&normalize(peer)).map(|p| p.next_index)
    }

    pub async fn get(&self, peer: &str) -> Option<PeerProgress> {
        self.inner.lock().await.peers.get(&normalize(peer)).copied()
    }

    /// `record_success(peer, lastLogIndex)`: `matchIndex[peer] = lastLogIndex`,
    /// `nextIndex[peer] = lastLogIndex + 1` (§4.1). Also used to seed and
    /// advance the leader's own entry (P3), since the formula is identical.
    pub async fn record_success(&self, peer: &str, last_log_index: LogIndex) {
        let mut inner = self.inner.lock().await;
        inner.peers.insert(
            normalize(peer),
            PeerProgress {
                next_index: last_log_index + 1,
                match_index: last_log_index,
            },
        );
    }

    /// `record_rejection(peer)`: decrement `nextIndex[peer]` by one, clamped
    /// at 1 (§4.1, invariant P2).
    pub async fn record_rejection(&self, peer: &str) {
        let mut inner = self.inner.lock().await;
        let entry = inner.peers.entry(normalize(peer)).or_insert(PeerProgress {
            next_index: 1,
            match_index: 0,
        });
        entry.next_index = entry.next_index.saturating_sub(1).max(1);
    }

    pub async fn is_snapshot_in_flight(&self, peer: &str) -> bool {
        self.inner.lock().await.snapshots.contains_key(&normalize(peer))
    }

    /// Reserves the snapshot-in-flight slot for `peer` with a streamer that
    /// has not yet been started (invariant P4 begins here).
    pub async fn mark_snapshot_pending(&self, peer: &str, streamer: PreparedStreamer) {
        let mut inner = self.inner.lock().await;
        inner.snapshots.insert(normalize(peer), SnapshotSlot::Pending(Some(streamer)));
    }

    /// Invokes the previously prepared streamer for `peer`, transitioning
    /// the slot from pending to streaming. Returns `true` if a streamer was
    /// started, `false` if there was nothing pending (e.g. already started,
    /// or cleared in the meantime).
    pub async fn start_prepared_snapshot(&self, peer: &str) -> bool {
        let mut inner = self.inner.lock().await;
        let key = normalize(peer);
        let streamer = match inner.snapshots.get_mut(&key) {
            Some(SnapshotSlot::Pending(slot)) => slot.take(),
            _ => None,
        };
        match streamer {
            Some(streamer) => {
                let handle = streamer();
                inner.snapshots.insert(key, SnapshotSlot::Streaming(handle));
                true
            }
            None => false,
        }
    }

    /// Clears the in-flight flag for `peer`, ending invariant P4's window.
    /// Used both when a streamer completes/aborts and when a probe is
    /// refused or superseded by a higher term.
    pub async fn clear_snapshot(&self, peer: &str) {
        self.inner.lock().await.snapshots.remove(&normalize(peer));
    }

    /// A snapshot of every tracked peer's (including the leader's own)
    /// match index, for the Commit Calculator (C5).
    pub async fn match_indexes_snapshot(&self) -> HashMap<ServerId, LogIndex> {
        self.inner
            .lock()
            .await
            .peers
            .iter()
            .map(|(id, progress)| (id.clone(), progress.match_index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn initialize_sets_next_index_past_last_log_index() {
        let table = ProgressTable::new();
        table.initialize(9, vec!["b".to_string(), "c".to_string()]).await;

        assert_eq!(
            table.get("b").await,
            Some(PeerProgress {
                next_index: 10,
                match_index: 0
            })
        );
    }

    #[tokio::test]
    async fn record_success_sets_match_and_next_index() {
        let table = ProgressTable::new();
        table.initialize(0, vec!["b".to_string()]).await;

        table.record_success("B", 5).await;

        assert_eq!(
            table.get("b").await,
            Some(PeerProgress {
                next_index: 6,
                match_index: 5
            })
        );
    }

    #[tokio::test]
    async fn record_rejection_decrements_next_index_and_clamps_at_one() {
        let table = ProgressTable::new();
        table.initialize(10, vec!["b".to_string()]).await;
        table.record_success("b", 6).await; // next_index = 7

        table.record_rejection("b").await;
        assert_eq!(table.next_index("b").await, Some(6));

        for _ in 0..10 {
            table.record_rejection("b").await;
        }
        assert_eq!(table.next_index("b").await, Some(1));
    }

    #[tokio::test]
    async fn peer_lookups_are_case_insensitive() {
        let table = ProgressTable::new();
        table.initialize(0, vec!["Node-B".to_string()]).await;
        assert!(table.get("node-b").await.is_some());
        assert!(table.get("NODE-B").await.is_some());
    }

    #[tokio::test]
    async fn snapshot_in_flight_blocks_until_cleared() {
        let table = ProgressTable::new();
        assert!(!table.is_snapshot_in_flight("c").await);

        table
            .mark_snapshot_pending("c", Box::new(|| tokio::spawn(async {})))
            .await;
        assert!(table.is_snapshot_in_flight("c").await);

        let started = table.start_prepared_snapshot("c").await;
        assert!(started);
        assert!(table.is_snapshot_in_flight("c").await);

        table.clear_snapshot("c").await;
        assert!(!table.is_snapshot_in_flight("c").await);
    }

    #[tokio::test]
    async fn starting_an_already_started_snapshot_is_a_no_op() {
        let table = ProgressTable::new();
        table
            .mark_snapshot_pending("c", Box::new(|| tokio::spawn(async {})))
            .await;

        assert!(table.start_prepared_snapshot("c").await);
        assert!(!table.start_prepared_snapshot("c").await);
    }

    #[tokio::test]
    async fn match_indexes_snapshot_includes_self_and_peers() {
        let table = ProgressTable::new();
        table.initialize(0, vec!["b".to_string(), "c".to_string()]).await;
        table.record_success("a", 5).await; // self
        table.record_success("b", 5).await;

        let snapshot = table.match_indexes_snapshot().await;
        assert_eq!(snapshot.get("a"), Some(&5));
        assert_eq!(snapshot.get("b"), Some(&5));
        assert_eq!(snapshot.get("c"), Some(&0));
    }
}
