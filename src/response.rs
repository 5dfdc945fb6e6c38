//! Response Handler (C4, §4.4).
//!
//! Interprets inbound `AppendEntriesResponse`/`CanInstallSnapshotResponse`,
//! advances the Progress Table, and triggers commit advance or step-down.
//! Dispatched by the enclosing engine's message pump; may run concurrently
//! with the heartbeat driver and with other response handlers.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::commit::joint_quorum_commit_index;
use crate::error::Result;
use crate::leader::Leader;
use crate::messages::{AppendEntriesResponse, CanInstallSnapshotResponse};

/// Handles one `AppendEntriesResponse`. Returns `Ok(true)` if this Leader
/// should step down (the caller's message pump should stop dispatching
/// further work to it), `Ok(false)` otherwise.
#[instrument(level = "trace", skip(leader, response))]
pub async fn handle_append_entries_response(leader: &Arc<Leader>, response: AppendEntriesResponse) -> Result<bool> {
    let current_term = leader.log().current_term();
    if response.current_term > current_term {
        warn!(
            source = %response.source,
            their_term = response.current_term,
            our_term = current_term,
            "higher term observed, stepping down"
        );
        leader
            .engine()
            .update_current_term(response.current_term, Some(response.leader_id))
            .await;
        return Ok(true);
    }

    if !response.success {
        debug!(peer = %response.source, "append entries rejected, walking next_index back");
        leader.progress().record_rejection(&response.source).await;
        return Ok(false);
    }

    leader.progress().record_success(&response.source, response.last_log_index).await;
    advance_commit(leader).await?;
    Ok(false)
}

/// Handles one `CanInstallSnapshotResponse` (§4.4).
#[instrument(level = "trace", skip(leader, response))]
pub async fn handle_can_install_snapshot_response(
    leader: &Arc<Leader>,
    response: CanInstallSnapshotResponse,
) -> Result<bool> {
    if !response.success {
        debug!(peer = %response.from, "snapshot refused, follower already past this snapshot");
        leader.progress().record_success(&response.from, response.index).await;
        leader.progress().clear_snapshot(&response.from).await;
        return Ok(false);
    }

    if response.is_currently_installing {
        warn!(peer = %response.from, "follower already installing a snapshot, retrying later");
        leader.progress().clear_snapshot(&response.from).await;
        return Ok(false);
    }

    leader.progress().start_prepared_snapshot(&response.from).await;
    Ok(false)
}

/// Commit advance (§4.4): compute the joint quorum commit index, apply
/// newly committed entries, then drain the Pending-Command Queue.
async fn advance_commit(leader: &Arc<Leader>) -> Result<()> {
    let match_indexes = leader.progress().match_indexes_snapshot().await;
    let current_topology = leader.engine().current_topology();
    let changing_topology = leader.engine().changing_topology();

    let new_commit_index =
        match joint_quorum_commit_index(&current_topology, changing_topology.as_ref(), &match_indexes) {
            Some(index) => index,
            None => return Ok(()),
        };

    let commit_index = leader.engine().commit_index();
    if new_commit_index <= commit_index {
        return Ok(());
    }

    leader.engine().apply_commits(commit_index, new_commit_index).await?;
    leader.queue().lock().await.complete_up_to(new_commit_index);
    Ok(())
}
