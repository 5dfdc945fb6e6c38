//! Heartbeat Loop (C2, §4.2).
//!
//! A single cooperative task that fans out replication to every peer on a
//! fixed cadence until cancelled. Spawned once by [`crate::leader::Leader`]
//! at leadership start, cancelled on disposal.

use std::sync::Arc;

use tracing::{instrument, trace, warn};

use crate::leader::Leader;
use crate::replicator::replicate_to_peer;

/// Spawns the heartbeat driver, returning its `JoinHandle`.
pub fn spawn(leader: Arc<Leader>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run(leader))
}

#[instrument(level = "trace", skip(leader))]
async fn run(leader: Arc<Leader>) {
    let cancellation = leader.cancellation().clone();

    loop {
        if cancellation.is_cancelled() {
            break;
        }

        for peer in peer_set(&leader) {
            if cancellation.is_cancelled() {
                break;
            }
            if let Err(err) = replicate_to_peer(&leader, &peer).await {
                warn!(peer, error = %err, "fatal error replicating to peer, stepping down");
                leader.engine().notify_fatal_error(&err).await;
                return;
            }
        }

        leader.observers().notify_heartbeat_sent();
        trace!("heartbeat round complete");

        tokio::select! {
            _ = cancellation.cancelled() => break,
            _ = tokio::time::sleep(leader.config().heartbeat_period()) => {}
        }
    }
}

/// The case-insensitive union of both active topologies' voters, minus the
/// local identity (§4.2).
fn peer_set(leader: &Arc<Leader>) -> Vec<String> {
    let self_id = leader.id().to_lowercase();
    let mut peers: Vec<String> = leader
        .engine()
        .current_topology()
        .voters()
        .iter()
        .cloned()
        .collect();

    if let Some(changing) = leader.engine().changing_topology() {
        for voter in changing.voters() {
            if !peers.contains(voter) {
                peers.push(voter.clone());
            }
        }
    }

    peers.retain(|voter| voter != &self_id);
    peers
}
