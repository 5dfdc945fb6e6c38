//! External collaborator contracts (§6).
//!
//! Everything in this module is implemented by the surrounding engine, not
//! by this crate: the persistent log store, the application state machine,
//! the transport layer, and the role-machine ("Engine") itself are all out
//! of scope per §1. The Leader only ever talks to them through these
//! traits, mirroring how the original consensus module treats its log store
//! as a trait object it borrows rather than owns
//! (`log: Arc<LogStorage + Send + Sync + 'static>`).

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::messages::{InstallSnapshotRequest, LogEntry, LogEntryKind, LogIndex, OutboundMessage, ServerId};
use crate::messages::{SnapshotMetadata, Term};
use crate::topology::Topology;

/// `PersistentLog`: `lastLogEntry()`, `getLogEntry(index)`,
/// `logEntriesAfter(index)`, `appendToLeaderLog(command)`,
/// `getLastSnapshot()`, `currentTerm` (§6).
#[async_trait]
pub trait PersistentLog: Send + Sync {
    /// The latest term this server has observed; not mutated by the Leader
    /// directly (term bumps flow through [`Engine::update_current_term`]).
    fn current_term(&self) -> Term;

    async fn last_log_entry(&self) -> Option<LogEntry>;

    async fn get_log_entry(&self, index: LogIndex) -> Option<LogEntry>;

    /// Up to `max` entries strictly after `index`, in order.
    async fn log_entries_after(&self, index: LogIndex, max: u32) -> Result<Vec<LogEntry>>;

    /// Appends a new entry authored by this leader and returns its assigned
    /// index.
    async fn append_to_leader_log(&self, kind: LogEntryKind, payload: Bytes) -> Result<LogIndex>;

    async fn get_last_snapshot(&self) -> Option<SnapshotMetadata>;
}

/// Writes one snapshot body to a transport-provided sink. Consumed by value
/// because a snapshot writer represents a single, one-shot scoped
/// acquisition (§6: "scoped acquisition with guaranteed release").
#[async_trait]
pub trait SnapshotWriter: Send {
    async fn write_snapshot(self: Box<Self>, sink: &mut (dyn tokio::io::AsyncWrite + Send + Unpin)) -> Result<()>;
}

/// `StateMachine`: only the snapshot-writer acquisition is in the Leader's
/// interaction surface (§6); applying committed entries is the `Engine`'s
/// concern.
#[async_trait]
pub trait StateMachine: Send + Sync {
    async fn snapshot_writer(&self) -> Result<(SnapshotMetadata, Box<dyn SnapshotWriter>)>;
}

/// `Transport`: `send(peer, message)` fire-and-forget,
/// `stream(peer, header, bodyWriter)` blocking streaming send (§6).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, peer: &str, message: OutboundMessage);

    async fn stream_snapshot(
        &self,
        peer: &str,
        header: InstallSnapshotRequest,
        writer: Box<dyn SnapshotWriter>,
    ) -> Result<()>;
}

/// `Engine`: `name`, `commitIndex`, `currentTopology`, `changingTopology?`,
/// `updateCurrentTerm(term, leaderId)`, `applyCommits(from, to)` (§6). The
/// remaining `Engine` fields from §6 (`messageTimeout`, `maxEntriesPerRequest`,
/// `cancellationToken`) are supplied to the Leader directly at construction
/// time instead (see [`crate::config::Config`] and
/// [`crate::leader::Leader::spawn`]).
#[async_trait]
pub trait Engine: Send + Sync {
    fn name(&self) -> &str;

    fn commit_index(&self) -> LogIndex;

    fn current_topology(&self) -> Topology;

    fn changing_topology(&self) -> Option<Topology>;

    /// Called whenever a higher term is observed; the enclosing engine is
    /// responsible for the resulting step-down (§4.4, §7).
    async fn update_current_term(&self, term: Term, leader_id: Option<ServerId>);

    /// Applies log entries `(from, to]` to the state machine and advances
    /// the engine's durable commit index (§4.4).
    async fn apply_commits(&self, from: LogIndex, to: LogIndex) -> Result<()>;

    /// Called when a fatal error (a persistent-log read failure encountered
    /// while assembling a replication request) forces this Leader instance
    /// out of service; the enclosing engine is responsible for the
    /// resulting role transition (§7).
    async fn notify_fatal_error(&self, error: &crate::error::Error);
}
