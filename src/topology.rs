//! Cluster topology and quorum sizing (§3).
//!
//! A `Topology` is a flat set of voting peer identifiers plus the derived
//! quorum size. Two may be active at once for joint consensus (§4.5); the
//! Leader never mutates a `Topology` itself, it only reads whatever the
//! `Engine` collaborator currently reports.

use std::collections::HashSet;

use crate::messages::ServerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    /// Voter identifiers, normalized to lowercase so membership checks are
    /// case-insensitive per §3.
    voters: HashSet<ServerId>,
}

impl Topology {
    pub fn new(voters: impl IntoIterator<Item = ServerId>) -> Self {
        Topology {
            voters: voters.into_iter().map(|v| v.to_lowercase()).collect(),
        }
    }

    pub fn voters(&self) -> &HashSet<ServerId> {
        &self.voters
    }

    pub fn contains(&self, id: &str) -> bool {
        self.voters.contains(&id.to_lowercase())
    }

    /// `⌊n/2⌋ + 1` of this topology's voters.
    pub fn quorum_size(&self) -> usize {
        self.voters.len() / 2 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quorum_size_is_floor_half_plus_one() {
        assert_eq!(Topology::new(vec!["a".into()]).quorum_size(), 1);
        assert_eq!(Topology::new(vec!["a".into(), "b".into()]).quorum_size(), 2);
        assert_eq!(
            Topology::new(vec!["a".into(), "b".into(), "c".into()]).quorum_size(),
            2
        );
        assert_eq!(
            Topology::new(vec!["a".into(), "b".into(), "c".into(), "d".into(), "e".into()]).quorum_size(),
            3
        );
    }

    #[test]
    fn membership_is_case_insensitive() {
        let topology = Topology::new(vec!["Node-A".to_string()]);
        assert!(topology.contains("node-a"));
        assert!(topology.contains("NODE-A"));
    }
}
