//! Configuration management for the ballot store
//!
//! Loads settings from environment variables (and a `.env` file if present)
//! with validation.

use crate::types::{Candidates, VoterIdPolicy};
use crate::{Result, config_error};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default location of the persisted record file
pub const DEFAULT_STORE_PATH: &str = "votes.txt";

/// Ballot definition and storage location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallotConfig {
    /// Persisted record file (default: `votes.txt`)
    pub store_path: PathBuf,

    /// Candidates in ballot order
    pub candidates: Candidates,

    /// Rules applied to voter ids when casting
    pub voter_id_policy: VoterIdPolicy,
}

impl BallotConfig {
    /// Load ballot configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_path = std::env::var("BALLOT_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORE_PATH));

        let candidates = match std::env::var("BALLOT_CANDIDATES") {
            Ok(list) => Self::parse_candidates(&list)?,
            Err(_) => Candidates::default(),
        };

        let min_len = std::env::var("BALLOT_VOTER_ID_MIN_LEN")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .map_err(|_| config_error!("Invalid BALLOT_VOTER_ID_MIN_LEN"))?;

        let max_len = match std::env::var("BALLOT_VOTER_ID_MAX_LEN") {
            Ok(value) => Some(
                value
                    .parse()
                    .map_err(|_| config_error!("Invalid BALLOT_VOTER_ID_MAX_LEN"))?,
            ),
            Err(_) => None,
        };

        let alphanumeric_only = match std::env::var("BALLOT_VOTER_ID_ALPHANUMERIC") {
            Ok(value) => Self::parse_flag(&value, "BALLOT_VOTER_ID_ALPHANUMERIC")?,
            Err(_) => false,
        };

        let voter_id_policy = VoterIdPolicy {
            min_len,
            max_len,
            alphanumeric_only,
        };
        Self::validate_policy(&voter_id_policy)?;

        Ok(Self {
            store_path,
            candidates,
            voter_id_policy,
        })
    }

    /// Create configuration for testing
    pub fn for_testing() -> Self {
        Self {
            store_path: std::env::temp_dir().join(format!("ballot-{}.txt", uuid::Uuid::new_v4())),
            candidates: Candidates::default(),
            voter_id_policy: VoterIdPolicy::default(),
        }
    }

    /// Comma-separated candidate names
    fn parse_candidates(list: &str) -> Result<Candidates> {
        Candidates::new(list.split(',')).map_err(|err| config_error!("BALLOT_CANDIDATES: {}", err))
    }

    fn parse_flag(value: &str, name: &str) -> Result<bool> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(config_error!("{} must be a boolean", name)),
        }
    }

    fn validate_policy(policy: &VoterIdPolicy) -> Result<()> {
        if policy.min_len == 0 {
            return Err(config_error!("BALLOT_VOTER_ID_MIN_LEN must be at least 1"));
        }
        if let Some(max_len) = policy.max_len {
            if max_len < policy.min_len {
                return Err(config_error!(
                    "BALLOT_VOTER_ID_MAX_LEN ({}) is below BALLOT_VOTER_ID_MIN_LEN ({})",
                    max_len,
                    policy.min_len
                ));
            }
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `ballot_box=debug`
    pub level: String,
    /// `compact` or `pretty`
    pub format: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub ballot: BallotConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment
    pub fn from_env() -> Result<Self> {
        let ballot = BallotConfig::from_env()?;
        let logging = LoggingConfig::from_env();

        Ok(Self { ballot, logging })
    }

    /// Create configuration for testing
    pub fn for_testing() -> Self {
        Self {
            ballot: BallotConfig::for_testing(),
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ballot_config_defaults() {
        let config = BallotConfig::for_testing();
        assert_eq!(config.candidates.len(), 4);
        assert_eq!(config.voter_id_policy, VoterIdPolicy::default());
        assert!(config.store_path.starts_with(std::env::temp_dir()));
    }

    #[test]
    fn test_candidate_list_parsing() {
        let candidates = BallotConfig::parse_candidates("Leo, Marlon ,Johnny").unwrap();
        assert_eq!(candidates.iter().collect::<Vec<_>>(), vec!["Leo", "Marlon", "Johnny"]);

        assert!(BallotConfig::parse_candidates("Leo,,Marlon").is_err());
        assert!(BallotConfig::parse_candidates("Leo,Leo").is_err());
    }

    #[test]
    fn test_flag_and_policy_validation() {
        assert!(BallotConfig::parse_flag("YES", "X").unwrap());
        assert!(!BallotConfig::parse_flag("0", "X").unwrap());
        assert!(BallotConfig::parse_flag("maybe", "X").is_err());

        let zero_min = VoterIdPolicy {
            min_len: 0,
            ..VoterIdPolicy::default()
        };
        assert!(BallotConfig::validate_policy(&zero_min).is_err());

        let inverted = VoterIdPolicy {
            min_len: 5,
            max_len: Some(3),
            alphanumeric_only: false,
        };
        assert!(BallotConfig::validate_policy(&inverted).is_err());
        assert!(BallotConfig::validate_policy(&VoterIdPolicy::default()).is_ok());
    }
}
