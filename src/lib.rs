//! Leader replication core of a Raft consensus implementation.
//!
//! This crate owns exactly what a node does while it holds leadership: per
//! follower progress tracking, heartbeat/replication fan-out, the two-phase
//! snapshot handshake for followers that have fallen behind the retained
//! log, joint-consensus commit calculation, and completion of client
//! commands once durably replicated. Everything else — the persistent log,
//! the application state machine, the transport, and election/Follower
//! behavior — is supplied by the embedding engine through the traits in
//! [`collaborators`].

pub mod collaborators;
pub mod commit;
pub mod config;
pub mod error;
pub mod heartbeat;
pub mod leader;
pub mod messages;
pub mod observer;
pub mod progress;
pub mod queue;
pub mod replicator;
pub mod response;
pub mod topology;

pub use collaborators::{Engine, PersistentLog, SnapshotWriter, StateMachine, Transport};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use leader::Leader;
pub use messages::{
    AppendEntriesRequest, AppendEntriesResponse, CanInstallSnapshotRequest, CanInstallSnapshotResponse,
    CommandOutcome, CompletionHandle, InstallSnapshotRequest, LogEntry, LogEntryKind, LogIndex, OutboundMessage,
    ServerId, SnapshotMetadata, Term,
};
pub use observer::ObserverList;
pub use topology::Topology;
