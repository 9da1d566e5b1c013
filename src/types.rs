//! # Core Types for the Ballot Store
//!
//! This module defines the data structures shared by the store, the storage
//! backends and the menu.
//!
//! ## Type Categories
//!
//! ### Ballot definition
//! - [`Candidates`]: the fixed, ordered list of names voters choose from
//! - [`VoterIdPolicy`]: which voter identities are accepted when casting
//!
//! ### Persisted state
//! - [`VoteRecord`]: one voter's recorded choice, one line on disk
//! - [`LoadReport`]: what happened while reading the persisted file
//!
//! ### Outcomes and reporting
//! - [`VoteOutcome`]: business result of a cast attempt
//! - [`VoteResult`]: per-candidate count, in declaration order
//! - [`ResultsReport`]: counts plus shares, serializable to JSON
//!
//! ## Usage Examples
//!
//! ```rust
//! use ballot_box::types::{Candidates, VoteRecord};
//!
//! let candidates = Candidates::new(["Leo", "Marlon", "Johnny", "Christian"]).unwrap();
//! assert_eq!(candidates.len(), 4);
//! assert_eq!(candidates.name(2), Some("Johnny"));
//!
//! let record = VoteRecord::parse_line("alice:0", candidates.len()).unwrap();
//! assert_eq!(record.to_line(), "alice:0");
//! ```

use crate::errors::RecordError;
use crate::{Result, validation_error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Separator between voter id and candidate index in a persisted line
pub const RECORD_DELIMITER: char = ':';

/// Candidates used when none are configured
pub const DEFAULT_CANDIDATES: [&str; 4] = [
    "Leonardo DiCaprio",
    "Marlon Brando",
    "Johnny Depp",
    "Christian Bale",
];

/// Immutable, ordered list of candidate names
///
/// Candidates are identified by their zero-based position. The list is fixed
/// for the lifetime of a store: persisted records refer to candidates by
/// index, so reordering the list between runs reassigns existing votes.
///
/// # Validation
///
/// - At least one candidate
/// - No blank names (surrounding whitespace is trimmed)
/// - No duplicate names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Candidates {
    names: Vec<String>,
}

impl Candidates {
    /// Build a validated candidate list
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names
            .into_iter()
            .map(|name| name.into().trim().to_string())
            .collect();

        if names.is_empty() {
            return Err(validation_error!("candidates: at least one candidate is required"));
        }

        for (index, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(validation_error!("candidates: name at position {} is blank", index + 1));
            }
            if names[..index].contains(name) {
                return Err(validation_error!("candidates: duplicate name {:?}", name));
            }
        }

        Ok(Self { names })
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false for a validated list; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name at a zero-based index
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Names in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl TryFrom<Vec<String>> for Candidates {
    type Error = crate::Error;

    fn try_from(names: Vec<String>) -> Result<Self> {
        Self::new(names)
    }
}

impl From<Candidates> for Vec<String> {
    fn from(candidates: Candidates) -> Self {
        candidates.names
    }
}

impl Default for Candidates {
    fn default() -> Self {
        Self {
            names: DEFAULT_CANDIDATES.iter().map(|name| name.to_string()).collect(),
        }
    }
}

/// Rules a voter id must satisfy before a vote is accepted
///
/// Independent of the policy, an id is never accepted if it is empty or
/// contains the record delimiter or a line break, because it could not be
/// persisted as a single line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterIdPolicy {
    /// Minimum length in characters (at least 1)
    pub min_len: usize,

    /// Maximum length in characters, if bounded
    pub max_len: Option<usize>,

    /// Only ASCII letters and digits
    pub alphanumeric_only: bool,
}

impl Default for VoterIdPolicy {
    fn default() -> Self {
        Self {
            min_len: 1,
            max_len: None,
            alphanumeric_only: false,
        }
    }
}

impl VoterIdPolicy {
    /// Check an already-trimmed voter id, returning a human-readable reason on failure
    pub fn check(&self, voter_id: &str) -> std::result::Result<(), String> {
        check_storable_id(voter_id)?;

        let len = voter_id.chars().count();
        if len < self.min_len {
            return Err(format!(
                "voter id must be at least {} characters",
                self.min_len
            ));
        }
        if let Some(max_len) = self.max_len {
            if len > max_len {
                return Err(format!("voter id must be at most {max_len} characters"));
            }
        }
        if self.alphanumeric_only && !voter_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err("voter id must contain only letters and numbers".to_string());
        }

        Ok(())
    }
}

/// Minimal shape every persisted voter id must have
fn check_storable_id(voter_id: &str) -> std::result::Result<(), String> {
    if voter_id.is_empty() {
        return Err("voter id is empty".to_string());
    }
    if voter_id.contains(RECORD_DELIMITER) {
        return Err(format!("voter id must not contain '{RECORD_DELIMITER}'"));
    }
    if voter_id.contains(['\r', '\n']) {
        return Err("voter id must not contain line breaks".to_string());
    }
    Ok(())
}

/// One voter's recorded choice, persisted as `<voterId>:<candidateIndex>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoteRecord {
    pub voter_id: String,
    /// Zero-based candidate index
    pub candidate_index: usize,
}

impl VoteRecord {
    pub fn new(voter_id: impl Into<String>, candidate_index: usize) -> Self {
        Self {
            voter_id: voter_id.into(),
            candidate_index,
        }
    }

    /// Parse one persisted line against a ballot of `candidates` entries
    ///
    /// The id is trimmed exactly as [`crate::BallotStore`] trims ids when
    /// casting, so a persisted voter is always found again. Only the
    /// structural shape of the id is checked here. A stricter
    /// [`VoterIdPolicy`] applies to new votes, not to records already on disk.
    pub fn parse_line(line: &str, candidates: usize) -> std::result::Result<Self, RecordError> {
        let (voter_id, index) = line
            .split_once(RECORD_DELIMITER)
            .ok_or(RecordError::MissingDelimiter)?;
        let voter_id = voter_id.trim();

        check_storable_id(voter_id).map_err(RecordError::InvalidVoterId)?;

        let candidate_index: usize = index
            .trim()
            .parse()
            .map_err(|_| RecordError::InvalidIndex(index.to_string()))?;

        if candidate_index >= candidates {
            return Err(RecordError::IndexOutOfRange {
                index: candidate_index,
                candidates,
            });
        }

        Ok(Self::new(voter_id, candidate_index))
    }

    /// Persisted form, without the trailing newline
    pub fn to_line(&self) -> String {
        format!("{}{}{}", self.voter_id, RECORD_DELIMITER, self.candidate_index)
    }
}

/// Business result of a vote attempt
///
/// Rejections are ordinary outcomes, not errors: the store is unchanged and
/// the caller decides how to present them. Storage failures are reported
/// through [`crate::Error::Persistence`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Vote counted and persisted
    Recorded { candidate: String },

    /// This voter id already has a counted vote
    AlreadyVoted,

    /// The choice was not a number in `1..=N`
    InvalidChoice { reason: String },

    /// The voter id was rejected by the id policy
    InvalidVoterId { reason: String },
}

impl VoteOutcome {
    /// Whether the vote was counted
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded { .. })
    }
}

/// Vote count for one candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteResult {
    pub candidate: String,
    pub votes: u64,
}

/// One row of a [`ResultsReport`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub candidate: String,
    pub votes: u64,
    /// Share of all counted votes, `0.0..=100.0`; zero when nothing was counted
    pub percentage: f64,
}

/// Snapshot of the tally for display or export
///
/// ```rust
/// use ballot_box::types::{ResultsReport, VoteResult};
///
/// let report = ResultsReport::from_results(vec![
///     VoteResult { candidate: "Leo".into(), votes: 3 },
///     VoteResult { candidate: "Marlon".into(), votes: 1 },
/// ]);
/// assert_eq!(report.total_votes, 4);
/// assert_eq!(report.entries[0].percentage, 75.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsReport {
    pub generated_at: DateTime<Utc>,
    pub total_votes: u64,
    pub entries: Vec<ReportEntry>,
}

impl ResultsReport {
    /// Build a report from per-candidate counts, keeping their order
    pub fn from_results(results: Vec<VoteResult>) -> Self {
        let total_votes: u64 = results.iter().map(|result| result.votes).sum();

        let entries = results
            .into_iter()
            .map(|result| {
                let percentage = if total_votes == 0 {
                    0.0
                } else {
                    result.votes as f64 * 100.0 / total_votes as f64
                };
                ReportEntry {
                    candidate: result.candidate,
                    votes: result.votes,
                    percentage,
                }
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            total_votes,
            entries,
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A persisted line that was skipped during load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number in the persisted file
    pub line: usize,
    pub content: String,
    pub reason: RecordError,
}

/// Summary of reading the persisted file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records counted into the tally
    pub loaded: usize,

    /// Lines for a voter id that had already been loaded (first one wins)
    pub duplicates: usize,

    /// Lines that could not be parsed
    pub malformed: Vec<MalformedLine>,
}

impl LoadReport {
    /// True when every non-blank line was counted
    pub fn is_clean(&self) -> bool {
        self.duplicates == 0 && self.malformed.is_empty()
    }
}
