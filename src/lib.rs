//! Ballot Box
//!
//! Records one vote per voter id for a fixed list of candidates, keeps the
//! tally in a flat file across restarts and reports counts on demand.

pub mod config;
pub mod errors;
pub mod menu;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use errors::{Error, RecordError, Result};
pub use store::BallotStore;
pub use types::{Candidates, VoteOutcome, VoteResult};

use tracing_subscriber::EnvFilter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging with the default filter
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "ballot_box=info".into()),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| Error::internal(err.to_string()))?;

    tracing::info!("Ballot box v{} initialized", VERSION);
    Ok(())
}

/// Initialize logging from configuration
///
/// `RUST_LOG` still takes precedence over the configured level. Logs go to
/// stderr so the menu keeps stdout to itself.
pub fn init_with(logging: &config::LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|err| Error::config(format!("Invalid LOG_LEVEL {:?}: {err}", logging.level)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match logging.format.as_str() {
        "pretty" => builder.pretty().try_init(),
        "compact" => builder.compact().try_init(),
        other => return Err(Error::config(format!("Unknown LOG_FORMAT {other:?}"))),
    };
    installed.map_err(|err| Error::internal(err.to_string()))?;

    tracing::info!(format = %logging.format, "Ballot box v{} initialized", VERSION);
    Ok(())
}
