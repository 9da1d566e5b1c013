//! Counting state: per-candidate tally and the record of who has voted

use crate::types::VoteRecord;
use std::collections::BTreeMap;

/// Per-candidate vote counters, indexed like the candidate list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    counts: Vec<u64>,
}

impl Tally {
    /// All-zero tally for `candidates` entries
    pub fn new(candidates: usize) -> Self {
        Self {
            counts: vec![0; candidates],
        }
    }

    pub fn increment(&mut self, index: usize) {
        self.counts[index] += 1;
    }

    /// Undo one `increment`; never goes below zero
    pub fn decrement(&mut self, index: usize) {
        self.counts[index] = self.counts[index].saturating_sub(1);
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn reset(&mut self) {
        self.counts.iter_mut().for_each(|count| *count = 0);
    }
}

/// Voters who have a counted vote, with the candidate index they chose
///
/// Ordered by voter id so the persisted file is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoterRecord {
    voters: BTreeMap<String, usize>,
}

impl VoterRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, voter_id: &str) -> bool {
        self.voters.contains_key(voter_id)
    }

    /// Add a voter; returns false (and changes nothing) if already present
    pub fn insert(&mut self, voter_id: &str, candidate_index: usize) -> bool {
        if self.contains(voter_id) {
            return false;
        }
        self.voters.insert(voter_id.to_string(), candidate_index);
        true
    }

    pub fn remove(&mut self, voter_id: &str) -> Option<usize> {
        self.voters.remove(voter_id)
    }

    pub fn choice(&self, voter_id: &str) -> Option<usize> {
        self.voters.get(voter_id).copied()
    }

    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }

    pub fn clear(&mut self) {
        self.voters.clear();
    }

    /// Current state as persistable records, ordered by voter id
    pub fn records(&self) -> Vec<VoteRecord> {
        self.voters
            .iter()
            .map(|(voter_id, &index)| VoteRecord::new(voter_id.clone(), index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_counts() {
        let mut tally = Tally::new(3);
        tally.increment(0);
        tally.increment(2);
        tally.increment(2);
        assert_eq!(tally.counts(), &[1, 0, 2]);
        assert_eq!(tally.total(), 3);

        tally.decrement(2);
        tally.decrement(1);
        assert_eq!(tally.counts(), &[1, 0, 1]);

        tally.reset();
        assert_eq!(tally.total(), 0);
    }

    #[test]
    fn test_voter_record_first_insert_wins() {
        let mut voters = VoterRecord::new();
        assert!(voters.insert("bob", 1));
        assert!(!voters.insert("bob", 3));
        assert_eq!(voters.choice("bob"), Some(1));

        assert!(voters.insert("alice", 0));
        let records = voters.records();
        assert_eq!(
            records,
            vec![VoteRecord::new("alice", 0), VoteRecord::new("bob", 1)]
        );

        assert_eq!(voters.remove("bob"), Some(1));
        assert!(!voters.contains("bob"));
        assert_eq!(voters.len(), 1);
    }
}
