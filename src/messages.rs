//! Wire-agnostic message and log types (§3, §6).
//!
//! Field order here follows the design-level order given in the spec's
//! external-interfaces section, not any particular wire encoding: the
//! transport collaborator (out of scope for this crate) owns the actual
//! byte-level representation.

use bytes::Bytes;
use serde_derive::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Peer identifiers are compared case-insensitively (§3); this type carries
/// the identifier as originally supplied, with normalization happening at
/// the [`crate::progress::ProgressTable`] / [`crate::topology::Topology`]
/// boundary.
pub type ServerId = String;
pub type Term = u64;
pub type LogIndex = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogEntryKind {
    Nop,
    Client,
    TopologyChange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub index: LogIndex,
    pub term: Term,
    pub payload: Bytes,
    pub kind: LogEntryKind,
}

/// Metadata describing the most recent snapshot retained by the log store
/// (§4.3). Absence means no snapshot has ever been taken.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotMetadata {
    pub index: LogIndex,
    pub term: Term,
}

/// The outcome delivered to a client's [`CompletionHandle`] once its command
/// reaches a conclusion (§3). Only `Committed` is produced by this crate;
/// `Failed` exists for the enclosing role machine to use when it rejects
/// outstanding completions on step-down (§3 Lifecycle, out of scope here).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Committed,
    Failed,
}

/// A promise a client is awaiting for a single proposed command (§3). Only
/// the Leader that appended the command owns the sending half.
pub type CompletionHandle = oneshot::Sender<CommandOutcome>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendEntriesRequest {
    pub term: Term,
    pub leader_id: ServerId,
    pub prev_log_index: LogIndex,
    pub prev_log_term: Term,
    pub entries: Vec<LogEntry>,
    pub leader_commit: LogIndex,
    pub from: ServerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendEntriesResponse {
    pub current_term: Term,
    pub success: bool,
    pub last_log_index: LogIndex,
    pub source: ServerId,
    pub leader_id: ServerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanInstallSnapshotRequest {
    pub from: ServerId,
    pub leader_id: ServerId,
    pub index: LogIndex,
    pub term: Term,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanInstallSnapshotResponse {
    pub from: ServerId,
    pub success: bool,
    pub is_currently_installing: bool,
    pub index: LogIndex,
    pub term: Term,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallSnapshotRequest {
    pub term: Term,
    pub last_included_index: LogIndex,
    pub last_included_term: Term,
    pub from: ServerId,
}

/// Shares the envelope with Leader-originated messages (§6) but is never
/// sent by this crate; election is out of scope (Non-goals, §1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestVoteRequest {
    pub term: Term,
    pub candidate_id: ServerId,
    pub last_log_index: LogIndex,
    pub last_log_term: Term,
}

/// The two message kinds the Leader ever originates via
/// [`crate::collaborators::Transport::send`].
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    AppendEntries(AppendEntriesRequest),
    CanInstallSnapshot(CanInstallSnapshotRequest),
}
