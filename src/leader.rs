//! The Leader itself (§3 Lifecycle, §4.7, §5).
//!
//! Owns the Progress Table, Pending-Command Queue, and heartbeat task for
//! the duration of one leadership term. Everything else — the log, state
//! machine, transport, and role machine — is borrowed from the engine via
//! the collaborator traits in [`crate::collaborators`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::collaborators::{Engine, PersistentLog, StateMachine, Transport};
use crate::config::Config;
use crate::error::Result;
use crate::heartbeat;
use crate::messages::{
    AppendEntriesResponse, CanInstallSnapshotResponse, CommandOutcome, CompletionHandle, LogEntryKind, LogIndex,
    ServerId,
};
use crate::observer::ObserverList;
use crate::progress::ProgressTable;
use crate::queue::PendingCommandQueue;
use crate::response;

pub struct Leader {
    id: ServerId,
    config: Config,
    log: Arc<dyn PersistentLog>,
    state_machine: Arc<dyn StateMachine>,
    transport: Arc<dyn Transport>,
    engine: Arc<dyn Engine>,
    progress: ProgressTable,
    queue: Mutex<PendingCommandQueue>,
    observers: ObserverList,
    cancellation: CancellationToken,
    last_heartbeat: Mutex<Instant>,
    heartbeat_task: Mutex<Option<JoinHandle<()>>>,
}

impl Leader {
    /// Creates and starts a new Leader (§3 Lifecycle): initializes the
    /// Progress Table, appends the leadership `Nop`, and spawns the
    /// heartbeat driver. `parent_cancellation` ties this Leader's disposal
    /// token to the enclosing engine's global cancellation (§5).
    #[instrument(level = "debug", skip_all, fields(leader = %id))]
    pub async fn spawn(
        id: ServerId,
        config: Config,
        log: Arc<dyn PersistentLog>,
        state_machine: Arc<dyn StateMachine>,
        transport: Arc<dyn Transport>,
        engine: Arc<dyn Engine>,
        observers: ObserverList,
        parent_cancellation: &CancellationToken,
    ) -> Result<Arc<Leader>> {
        let last_log_index = log.last_log_entry().await.map(|entry| entry.index).unwrap_or(0);

        let leader = Arc::new(Leader {
            id: id.clone(),
            config,
            log,
            state_machine,
            transport,
            engine,
            progress: ProgressTable::new(),
            queue: Mutex::new(PendingCommandQueue::new()),
            observers,
            cancellation: parent_cancellation.child_token(),
            last_heartbeat: Mutex::new(Instant::now()),
            heartbeat_task: Mutex::new(None),
        });

        let peers = leader.peer_set();
        leader.progress.initialize(last_log_index, peers).await;
        leader.progress.record_success(&leader.id, last_log_index).await;

        let nop_index = leader.log.append_to_leader_log(LogEntryKind::Nop, Bytes::new()).await?;
        leader.progress.record_success(&leader.id, nop_index).await;

        let handle = heartbeat::spawn(Arc::clone(&leader));
        *leader.heartbeat_task.lock().await = Some(handle);

        info!(last_log_index, nop_index, "leader started");
        Ok(leader)
    }

    /// Cancels the heartbeat driver and awaits its exit, bounded by
    /// `2 * message_timeout` (§5). Snapshot streamers are left to observe
    /// cancellation cooperatively and self-clean; they are not awaited here.
    #[instrument(level = "debug", skip(self), fields(leader = %self.id))]
    pub async fn dispose(&self) {
        self.cancellation.cancel();

        let handle = self.heartbeat_task.lock().await.take();
        if let Some(handle) = handle {
            let bound = 2 * self.config.message_timeout();
            if tokio::time::timeout(bound, handle).await.is_err() {
                warn!("heartbeat task did not exit within the disposal bound");
            }
        }
    }

    /// Appends a client command, recording the leader's own progress
    /// (invariant P3) and enqueueing its completion handle if present (§3,
    /// §4.6).
    pub async fn propose_command(&self, payload: Bytes, completion: Option<CompletionHandle>) -> Result<LogIndex> {
        let index = self.log.append_to_leader_log(LogEntryKind::Client, payload).await?;
        self.progress.record_success(&self.id, index).await;

        if let Some(completion) = completion {
            self.queue.lock().await.enqueue(index, completion);
        }

        Ok(index)
    }

    /// External heartbeat-timeout invocation (§4.7): while still leader,
    /// this only stamps the local clock so the engine's shared follower
    /// timeout logic is not misled into thinking leadership has stalled.
    pub async fn note_heartbeat_received(&self) {
        *self.last_heartbeat.lock().await = Instant::now();
    }

    pub async fn time_since_last_heartbeat(&self) -> Duration {
        self.last_heartbeat.lock().await.elapsed()
    }

    /// Dispatches an inbound `AppendEntriesResponse` (C4, §4.4). Returns
    /// `true` if a higher term was observed and this Leader should be
    /// disposed by the caller.
    pub async fn handle_append_entries_response(self: &Arc<Self>, response: AppendEntriesResponse) -> Result<bool> {
        response::handle_append_entries_response(self, response).await
    }

    /// Dispatches an inbound `CanInstallSnapshotResponse` (C4, §4.4).
    pub async fn handle_can_install_snapshot_response(
        self: &Arc<Self>,
        response: CanInstallSnapshotResponse,
    ) -> Result<bool> {
        response::handle_can_install_snapshot_response(self, response).await
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn log(&self) -> &Arc<dyn PersistentLog> {
        &self.log
    }

    pub(crate) fn state_machine(&self) -> &Arc<dyn StateMachine> {
        &self.state_machine
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub(crate) fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    /// The Progress Table, exposed for monitoring/introspection as well as
    /// internal use by the replicator and response handler.
    pub fn progress(&self) -> &ProgressTable {
        &self.progress
    }

    pub(crate) fn queue(&self) -> &Mutex<PendingCommandQueue> {
        &self.queue
    }

    pub(crate) fn observers(&self) -> &ObserverList {
        &self.observers
    }

    pub(crate) fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Every voter in either active topology except the local identity,
    /// case-insensitive (§3 Lifecycle, §4.2). Recomputed on every call so
    /// that a topology change takes effect on the next heartbeat round.
    pub(crate) fn peer_set(&self) -> Vec<ServerId> {
        let self_id = self.id.to_lowercase();
        let mut voters: Vec<ServerId> = self.engine.current_topology().voters().iter().cloned().collect();

        if let Some(changing) = self.engine.changing_topology() {
            for voter in changing.voters() {
                if !voters.contains(voter) {
                    voters.push(voter.clone());
                }
            }
        }

        voters.retain(|voter| voter != &self_id);
        voters
    }
}
