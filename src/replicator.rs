//! Replicator (C3, §4.3).
//!
//! Per-peer decision between a normal AppendEntries send and initiating the
//! two-phase snapshot handshake. One call handles exactly one peer, for one
//! heartbeat round; the Heartbeat Loop (C2) calls this once per peer in its
//! fan-out.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::error::Result;
use crate::leader::Leader;
use crate::messages::{AppendEntriesRequest, CanInstallSnapshotRequest, InstallSnapshotRequest, OutboundMessage};
use crate::progress::PreparedStreamer;

/// Runs the §4.3 decision procedure for a single peer.
#[instrument(level = "trace", skip(leader))]
pub async fn replicate_to_peer(leader: &Arc<Leader>, peer: &str) -> Result<()> {
    if leader.progress().is_snapshot_in_flight(peer).await {
        debug!(peer, "snapshot in flight, skipping this round");
        return Ok(());
    }

    let next_index = leader.progress().next_index(peer).await.unwrap_or(1);
    let snapshot = leader.log().get_last_snapshot().await;

    if let Some(snapshot) = snapshot {
        if next_index < snapshot.index {
            start_snapshot_handshake(leader, peer, snapshot.index, snapshot.term).await;
            return Ok(());
        }
    }

    let entries = leader
        .log()
        .log_entries_after(next_index, leader.config().max_entries_per_request)
        .await?;

    let (prev_log_index, prev_log_term) = match entries.first() {
        Some(first) => match leader.log().get_log_entry(first.index - 1).await {
            Some(prev) => (prev.index, prev.term),
            None => (0, 0),
        },
        None => match leader.log().last_log_entry().await {
            Some(prev) => (prev.index, prev.term),
            None => (0, 0),
        },
    };

    let request = AppendEntriesRequest {
        term: leader.log().current_term(),
        leader_id: leader.id().to_string(),
        prev_log_index,
        prev_log_term,
        entries: entries.clone(),
        leader_commit: leader.engine().commit_index(),
        from: leader.id().to_string(),
    };

    leader.transport().send(peer, OutboundMessage::AppendEntries(request)).await;
    leader.observers().notify_entries_appended(&entries);

    Ok(())
}

/// Builds the pre-armed streamer, reserves the in-flight slot, and sends the
/// `CanInstallSnapshotRequest` probe (§4.3 step 3, §9).
async fn start_snapshot_handshake(leader: &Arc<Leader>, peer: &str, snapshot_index: u64, snapshot_term: u64) {
    let streamer = build_streamer(leader, peer);
    leader.progress().mark_snapshot_pending(peer, streamer).await;

    let probe = CanInstallSnapshotRequest {
        from: leader.id().to_string(),
        leader_id: leader.id().to_string(),
        index: snapshot_index,
        term: snapshot_term,
    };
    leader.transport().send(peer, OutboundMessage::CanInstallSnapshot(probe)).await;
}

fn build_streamer(leader: &Arc<Leader>, peer: &str) -> PreparedStreamer {
    let leader = Arc::clone(leader);
    let peer = peer.to_string();
    Box::new(move || {
        tokio::spawn(async move {
            if let Err(err) = stream_snapshot(&leader, &peer).await {
                warn!(peer = %peer, error = %err, "snapshot streaming failed");
            }
            leader.progress().clear_snapshot(&peer).await;
        })
    })
}

async fn stream_snapshot(leader: &Arc<Leader>, peer: &str) -> Result<()> {
    let (metadata, writer) = leader.state_machine().snapshot_writer().await?;
    let header = InstallSnapshotRequest {
        term: leader.log().current_term(),
        last_included_index: metadata.index,
        last_included_term: metadata.term,
        from: leader.id().to_string(),
    };
    leader.transport().stream_snapshot(peer, header, writer).await
}
