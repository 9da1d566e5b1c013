//! The ballot store: candidates, tally, voter record and their persistence
//!
//! Flow of a vote:
//! 1. Voter id checked against the id policy
//! 2. Voters with a counted vote are turned away
//! 3. The 1-based choice is resolved to a candidate
//! 4. Tally and voter record are updated and the full state is persisted
//! 5. A failed write rolls the in-memory change back before the error is returned

use crate::config::BallotConfig;
use crate::store::storage::{FileStorage, RecordStorage};
use crate::store::tally::{Tally, VoterRecord};
use crate::types::{
    Candidates, LoadReport, MalformedLine, ResultsReport, VoteOutcome, VoteRecord, VoteResult,
    VoterIdPolicy,
};
use crate::{RecordError, Result};

/// Owns the ballot state and keeps it in step with its storage backend
pub struct BallotStore {
    candidates: Candidates,
    policy: VoterIdPolicy,
    tally: Tally,
    voters: VoterRecord,
    storage: Box<dyn RecordStorage>,
}

impl std::fmt::Debug for BallotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BallotStore")
            .field("candidates", &self.candidates)
            .field("tally", &self.tally)
            .field("voters", &self.voters.len())
            .field("storage", &self.storage.describe())
            .finish()
    }
}

impl BallotStore {
    /// Create an empty store without reading the backend
    pub fn new(candidates: Candidates, storage: impl RecordStorage + 'static) -> Self {
        let tally = Tally::new(candidates.len());
        Self {
            candidates,
            policy: VoterIdPolicy::default(),
            tally,
            voters: VoterRecord::new(),
            storage: Box::new(storage),
        }
    }

    /// Replace the voter id policy applied to new votes
    pub fn with_voter_id_policy(mut self, policy: VoterIdPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Create a store and load whatever the backend has persisted
    pub fn open(
        candidates: Candidates,
        storage: impl RecordStorage + 'static,
    ) -> Result<(Self, LoadReport)> {
        let mut store = Self::new(candidates, storage);
        let report = store.load()?;
        Ok((store, report))
    }

    /// Open the file-backed store described by `config`
    pub fn from_config(config: &BallotConfig) -> Result<(Self, LoadReport)> {
        let mut store = Self::new(
            config.candidates.clone(),
            FileStorage::new(&config.store_path),
        )
        .with_voter_id_policy(config.voter_id_policy.clone());
        let report = store.load()?;
        Ok((store, report))
    }

    /// Rebuild the in-memory state from the backend
    ///
    /// Malformed lines and repeated voter ids are skipped and reported; only a
    /// failure to read the backend at all is an error, in which case the store
    /// is left empty.
    pub fn load(&mut self) -> Result<LoadReport> {
        self.tally.reset();
        self.voters.clear();

        let Some(lines) = self.storage.read_lines()? else {
            tracing::info!(storage = %self.storage.describe(), "No persisted votes, starting empty");
            return Ok(LoadReport::default());
        };

        let mut report = LoadReport::default();
        for (offset, raw) in lines.into_iter().enumerate() {
            let line_number = offset + 1;
            let parsed = match String::from_utf8(raw) {
                Ok(text) => {
                    let line = text.trim_end_matches('\r');
                    if line.trim().is_empty() {
                        continue;
                    }
                    VoteRecord::parse_line(line, self.candidates.len())
                        .map_err(|reason| (line.to_string(), reason))
                }
                Err(err) => Err((
                    String::from_utf8_lossy(err.as_bytes()).into_owned(),
                    RecordError::InvalidUtf8,
                )),
            };

            let record = match parsed {
                Ok(record) => record,
                Err((content, reason)) => {
                    tracing::warn!(line = line_number, %reason, "Skipping malformed vote record");
                    report.malformed.push(MalformedLine {
                        line: line_number,
                        content,
                        reason,
                    });
                    continue;
                }
            };

            if !self.voters.insert(&record.voter_id, record.candidate_index) {
                tracing::warn!(
                    line = line_number,
                    voter_id = %record.voter_id,
                    "Ignoring repeated record for voter"
                );
                report.duplicates += 1;
                continue;
            }

            self.tally.increment(record.candidate_index);
            report.loaded += 1;
        }

        tracing::info!(
            storage = %self.storage.describe(),
            loaded = report.loaded,
            duplicates = report.duplicates,
            malformed = report.malformed.len(),
            "Persisted votes loaded"
        );

        Ok(report)
    }

    /// Cast a vote with a 1-based choice as typed by the voter
    pub fn cast_vote(&mut self, voter_id: &str, choice: &str) -> Result<VoteOutcome> {
        let choice = choice.trim();
        let parsed = choice
            .parse::<i64>()
            .map_err(|_| format!("{choice:?} is not a number"));
        self.cast(voter_id, parsed)
    }

    /// Cast a vote with a 1-based numeric choice
    pub fn cast_vote_number(&mut self, voter_id: &str, choice: i64) -> Result<VoteOutcome> {
        self.cast(voter_id, Ok(choice))
    }

    fn cast(
        &mut self,
        voter_id: &str,
        choice: std::result::Result<i64, String>,
    ) -> Result<VoteOutcome> {
        let voter_id = voter_id.trim();

        if let Err(reason) = self.policy.check(voter_id) {
            tracing::warn!(%reason, "Vote rejected: invalid voter id");
            return Ok(VoteOutcome::InvalidVoterId { reason });
        }

        if self.voters.contains(voter_id) {
            tracing::warn!(voter_id, "Vote rejected: already voted");
            return Ok(VoteOutcome::AlreadyVoted);
        }

        let index = match choice.and_then(|number| self.resolve_choice(number)) {
            Ok(index) => index,
            Err(reason) => {
                tracing::warn!(voter_id, %reason, "Vote rejected: invalid choice");
                return Ok(VoteOutcome::InvalidChoice { reason });
            }
        };

        self.tally.increment(index);
        self.voters.insert(voter_id, index);

        if let Err(err) = self.storage.write_records(&self.voters.records()) {
            self.voters.remove(voter_id);
            self.tally.decrement(index);
            tracing::error!(voter_id, error = %err, "Vote not persisted, rolled back");
            return Err(err);
        }

        let candidate = self.candidate_name(index);
        tracing::info!(voter_id, candidate = %candidate, "Vote recorded");
        Ok(VoteOutcome::Recorded { candidate })
    }

    /// Zero-based index for a 1-based choice
    fn resolve_choice(&self, choice: i64) -> std::result::Result<usize, String> {
        let count = self.candidates.len();
        usize::try_from(choice)
            .ok()
            .filter(|&number| (1..=count).contains(&number))
            .map(|number| number - 1)
            .ok_or_else(|| format!("choice must be between 1 and {count}, got {choice}"))
    }

    fn candidate_name(&self, index: usize) -> String {
        self.candidates.name(index).unwrap_or_default().to_string()
    }

    /// Vote counts in candidate declaration order
    pub fn results(&self) -> Vec<VoteResult> {
        self.candidates
            .iter()
            .zip(self.tally.counts())
            .map(|(candidate, &votes)| VoteResult {
                candidate: candidate.to_string(),
                votes,
            })
            .collect()
    }

    /// Results with totals and shares
    pub fn report(&self) -> ResultsReport {
        ResultsReport::from_results(self.results())
    }

    pub fn has_voted(&self, voter_id: &str) -> bool {
        self.voters.contains(voter_id.trim())
    }

    /// Candidate the voter's counted vote went to
    pub fn recorded_choice(&self, voter_id: &str) -> Option<&str> {
        self.voters
            .choice(voter_id.trim())
            .and_then(|index| self.candidates.name(index))
    }

    pub fn total_votes(&self) -> u64 {
        self.tally.total()
    }

    pub fn voter_count(&self) -> usize {
        self.voters.len()
    }

    pub fn candidates(&self) -> &Candidates {
        &self.candidates
    }

    pub fn voter_id_policy(&self) -> &VoterIdPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RecordError;
    use crate::store::storage::MemoryStorage;

    fn actors() -> Candidates {
        Candidates::new(["Leo", "Marlon", "Johnny", "Christian"]).unwrap()
    }

    fn counts(store: &BallotStore) -> Vec<u64> {
        store.results().iter().map(|result| result.votes).collect()
    }

    #[test]
    fn test_voting_scenario() {
        let storage = MemoryStorage::new();
        let (mut store, report) = BallotStore::open(actors(), storage.clone()).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.loaded, 0);

        let outcome = store.cast_vote("alice", "1").unwrap();
        assert_eq!(
            outcome,
            VoteOutcome::Recorded {
                candidate: "Leo".to_string()
            }
        );
        assert_eq!(
            store.results(),
            vec![
                VoteResult { candidate: "Leo".into(), votes: 1 },
                VoteResult { candidate: "Marlon".into(), votes: 0 },
                VoteResult { candidate: "Johnny".into(), votes: 0 },
                VoteResult { candidate: "Christian".into(), votes: 0 },
            ]
        );

        assert_eq!(store.cast_vote("alice", "2").unwrap(), VoteOutcome::AlreadyVoted);
        assert_eq!(counts(&store), vec![1, 0, 0, 0]);

        assert!(matches!(
            store.cast_vote("bob", "9").unwrap(),
            VoteOutcome::InvalidChoice { .. }
        ));
        assert_eq!(counts(&store), vec![1, 0, 0, 0]);
        assert!(!store.has_voted("bob"));

        assert_eq!(storage.lines(), Some(vec!["alice:0".to_string()]));
        assert_eq!(storage.write_count(), 1);
    }

    #[test]
    fn test_choice_range_validation() {
        let storage = MemoryStorage::new();
        let mut store = BallotStore::new(actors(), storage.clone());

        for choice in ["0", "-1", "5", "abc", "", "1.5"] {
            let outcome = store.cast_vote("carol", choice).unwrap();
            assert!(
                matches!(outcome, VoteOutcome::InvalidChoice { .. }),
                "choice {choice:?} gave {outcome:?}"
            );
        }
        assert!(matches!(
            store.cast_vote_number("carol", i64::MIN).unwrap(),
            VoteOutcome::InvalidChoice { .. }
        ));

        assert_eq!(store.total_votes(), 0);
        assert_eq!(store.voter_count(), 0);
        assert_eq!(storage.write_count(), 0);

        // whitespace around the choice is tolerated
        assert!(store.cast_vote("carol", " 4 ").unwrap().is_recorded());
        assert_eq!(store.recorded_choice("carol"), Some("Christian"));
    }

    #[test]
    fn test_already_voted_checked_before_choice() {
        let mut store = BallotStore::new(actors(), MemoryStorage::new());
        store.cast_vote_number("dave", 2).unwrap();
        assert_eq!(store.cast_vote("dave", "nonsense").unwrap(), VoteOutcome::AlreadyVoted);
        assert_eq!(store.cast_vote(" dave ", "1").unwrap(), VoteOutcome::AlreadyVoted);
    }

    #[test]
    fn test_voter_id_rejections() {
        let storage = MemoryStorage::new();
        let mut store = BallotStore::new(actors(), storage.clone()).with_voter_id_policy(
            VoterIdPolicy {
                min_len: 4,
                max_len: Some(10),
                alphanumeric_only: true,
            },
        );

        for voter_id in ["", "   ", "abc", "has:colon", "ABC@123", "ABCDEFGHIJK"] {
            assert!(
                matches!(
                    store.cast_vote(voter_id, "1").unwrap(),
                    VoteOutcome::InvalidVoterId { .. }
                ),
                "voter id {voter_id:?} should be rejected"
            );
        }
        assert_eq!(store.total_votes(), 0);
        assert_eq!(storage.write_count(), 0);

        assert!(store.cast_vote("ABC123", "3").unwrap().is_recorded());
    }

    #[test]
    fn test_persistence_failure_rolls_back() {
        let storage = MemoryStorage::new();
        let mut store = BallotStore::new(actors(), storage.clone());
        store.cast_vote("alice", "1").unwrap();

        storage.set_fail_writes(true);
        let err = store.cast_vote("bob", "2").unwrap_err();
        assert!(err.is_persistence());
        assert!(!store.has_voted("bob"));
        assert_eq!(counts(&store), vec![1, 0, 0, 0]);
        assert_eq!(storage.lines(), Some(vec!["alice:0".to_string()]));

        // the voter can retry once the backend recovers
        storage.set_fail_writes(false);
        assert!(store.cast_vote("bob", "2").unwrap().is_recorded());
        assert_eq!(counts(&store), vec![1, 1, 0, 0]);
    }

    #[test]
    fn test_load_skips_malformed_and_duplicate_lines() {
        let storage = MemoryStorage::with_lines([
            "alice:0",
            "",
            "bob",
            "carol:x",
            "dave:4",
            "alice:3",
            "erin:2\r",
            ":1",
        ]);
        let (store, report) = BallotStore::open(actors(), storage).unwrap();

        assert_eq!(report.loaded, 2);
        assert_eq!(report.duplicates, 1);
        let reasons: Vec<_> = report
            .malformed
            .iter()
            .map(|bad| (bad.line, bad.reason.clone()))
            .collect();
        assert_eq!(reasons.len(), 4);
        assert_eq!(reasons[0], (3, RecordError::MissingDelimiter));
        assert_eq!(reasons[1], (4, RecordError::InvalidIndex("x".into())));
        assert_eq!(
            reasons[2],
            (5, RecordError::IndexOutOfRange { index: 4, candidates: 4 })
        );
        assert!(matches!(reasons[3], (8, RecordError::InvalidVoterId(_))));

        assert_eq!(counts(&store), vec![1, 0, 1, 0]);
        assert_eq!(store.recorded_choice("alice"), Some("Leo"));
        assert_eq!(store.recorded_choice("erin"), Some("Johnny"));
    }

    #[test]
    fn test_reload_replaces_state() {
        let storage = MemoryStorage::new();
        let mut store = BallotStore::new(actors(), storage.clone());
        store.cast_vote("alice", "2").unwrap();

        let report = store.load().unwrap();
        assert_eq!(report.loaded, 1);
        assert_eq!(store.total_votes(), 1);
        assert_eq!(store.voter_count(), 1);
    }

    #[test]
    fn test_results_are_idempotent() {
        let mut store = BallotStore::new(actors(), MemoryStorage::new());
        store.cast_vote("alice", "3").unwrap();
        assert_eq!(store.results(), store.results());

        let report = store.report();
        assert_eq!(report.total_votes, 1);
        assert_eq!(report.entries[2].percentage, 100.0);
    }
}
