//! Ballot store and its persistence backends

pub mod ballot;
pub mod storage;
pub mod tally;

pub use ballot::BallotStore;
pub use storage::{FileStorage, MemoryStorage, RecordStorage};
pub use tally::{Tally, VoterRecord};
