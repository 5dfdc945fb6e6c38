//! Commit Calculator (C5, §4.5).
//!
//! Pure functions over a topology and a snapshot of match indexes; no
//! locking or I/O here, matching the bucket-and-boost algorithm described in
//! §4.5 line for line, one topology at a time, then intersected for joint
//! consensus.

use std::collections::{BTreeMap, HashMap};

use crate::messages::{LogIndex, ServerId};
use crate::topology::Topology;

/// Highest log index `N` such that at least `topology.quorum_size()` of its
/// voters have `match_index >= N`. `None` corresponds to the spec's `-1`
/// ("no majority yet").
pub fn quorum_commit_index(topology: &Topology, match_indexes: &HashMap<ServerId, LogIndex>) -> Option<LogIndex> {
    // Bucket match indexes of this topology's voters by value (step 1), a
    // missing voter is treated as never having replicated anything (index 0).
    let mut counts: BTreeMap<LogIndex, usize> = BTreeMap::new();
    for voter in topology.voters() {
        let index = match_indexes.get(voter).copied().unwrap_or(0);
        *counts.entry(index).or_insert(0) += 1;
    }

    let quorum = topology.quorum_size();
    let mut boost = 0usize;

    // Walk distinct values descending (step 2/3): `BTreeMap` iterates
    // ascending, so reverse it.
    for (&value, &count) in counts.iter().rev() {
        let confirmations = count + boost;
        if confirmations >= quorum {
            return Some(value);
        }
        boost += count;
    }

    None
}

/// Joint-consensus commit index: the minimum of the two active topologies'
/// quorum commit indexes, or `None` if either has no majority yet (§4.5).
pub fn joint_quorum_commit_index(
    current: &Topology,
    changing: Option<&Topology>,
    match_indexes: &HashMap<ServerId, LogIndex>,
) -> Option<LogIndex> {
    let current_index = quorum_commit_index(current, match_indexes)?;
    match changing {
        None => Some(current_index),
        Some(changing) => {
            let changing_index = quorum_commit_index(changing, match_indexes)?;
            Some(current_index.min(changing_index))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexes(pairs: &[(&str, LogIndex)]) -> HashMap<ServerId, LogIndex> {
        pairs.iter().map(|(id, idx)| (id.to_string(), *idx)).collect()
    }

    macro_rules! test_quorum_commit_index {
        ($name:ident, voters => $voters:expr, matches => $matches:expr, expected => $expected:expr) => {
            #[test]
            fn $name() {
                let topology = Topology::new($voters.iter().map(|s: &&str| s.to_string()));
                let result = quorum_commit_index(&topology, &indexes($matches));
                assert_eq!(result, $expected);
            }
        };
    }

    // S1: 3 nodes, A=5 (self), B=5, C=3, quorum 2 -> 5.
    test_quorum_commit_index!(
        three_node_quorum_commit,
        voters => ["a", "b", "c"],
        matches => &[("a", 5), ("b", 5), ("c", 3)],
        expected => Some(5)
    );

    test_quorum_commit_index!(
        no_majority_yet_returns_none,
        voters => ["a", "b", "c"],
        matches => &[("a", 5), ("b", 1), ("c", 1)],
        expected => None
    );

    test_quorum_commit_index!(
        single_node_cluster_trivially_commits,
        voters => ["a"],
        matches => &[("a", 42)],
        expected => Some(42)
    );

    test_quorum_commit_index!(
        missing_voter_treated_as_zero,
        voters => ["a", "b", "c"],
        matches => &[("a", 7)],
        expected => None
    );

    #[test]
    fn joint_consensus_takes_the_minimum_of_both_topologies() {
        // S4: current={A,B,C} q=2, changing={C,D,E} q=2.
        let current = Topology::new(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        let changing = Topology::new(vec!["c".to_string(), "d".to_string(), "e".to_string()]);
        let matches = indexes(&[("a", 10), ("b", 10), ("c", 10), ("d", 4), ("e", 4)]);

        assert_eq!(quorum_commit_index(&current, &matches), Some(10));
        assert_eq!(quorum_commit_index(&changing, &matches), Some(4));
        assert_eq!(joint_quorum_commit_index(&current, Some(&changing), &matches), Some(4));
    }

    #[test]
    fn joint_consensus_with_no_changing_topology_matches_current() {
        let current = Topology::new(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        let matches = indexes(&[("a", 5), ("b", 5), ("c", 3)]);
        assert_eq!(joint_quorum_commit_index(&current, None, &matches), Some(5));
    }

    #[test]
    fn joint_consensus_is_none_if_either_topology_lacks_a_majority() {
        let current = Topology::new(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        let changing = Topology::new(vec!["c".to_string(), "d".to_string(), "e".to_string()]);
        let matches = indexes(&[("a", 10), ("b", 10), ("c", 10)]);
        assert_eq!(joint_quorum_commit_index(&current, Some(&changing), &matches), None);
    }
}
