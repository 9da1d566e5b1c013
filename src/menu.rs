//! Interactive text menu over a [`BallotStore`]
//!
//! The menu only collects input and prints outcomes; every rule lives in the
//! store. Input and output are generic so the loop can be driven from tests.

use crate::store::BallotStore;
use crate::types::{LoadReport, VoteOutcome};
use crate::{Error, Result};
use std::io::{BufRead, Write};

/// Text menu bound to an input and an output stream
pub struct Menu<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give back the output stream, e.g. to inspect what was printed
    pub fn into_output(self) -> W {
        self.output
    }

    /// Tell the operator about lines skipped while loading
    pub fn show_load_report(&mut self, report: &LoadReport) -> Result<()> {
        for bad in &report.malformed {
            let err = Error::malformed(bad.line, bad.reason.clone());
            self.say(&format!("Warning: {err} ({:?})", bad.content))?;
        }
        if report.duplicates > 0 {
            self.say(&format!(
                "Warning: ignored {} repeated vote record(s)",
                report.duplicates
            ))?;
        }
        Ok(())
    }

    /// Run until the voter quits or input ends
    pub fn run(&mut self, store: &mut BallotStore) -> Result<()> {
        loop {
            self.say("\n--- Main Menu ---")?;
            self.say("1. Vote")?;
            self.say("2. View current vote counts")?;
            self.say("3. Quit")?;
            let Some(choice) = self.prompt("Enter your choice: ")? else {
                return Ok(());
            };

            match choice.as_str() {
                "1" => {
                    if !self.vote(store)? {
                        return Ok(());
                    }
                }
                "2" => self.show_results(store)?,
                "3" => {
                    self.say("Goodbye!")?;
                    return Ok(());
                }
                _ => self.say("Invalid choice.")?,
            }
        }
    }

    /// One voting round; returns false when input ended mid-way
    fn vote(&mut self, store: &mut BallotStore) -> Result<bool> {
        let Some(voter_id) = self.prompt("Enter your ID: ")? else {
            return Ok(false);
        };

        if store.has_voted(&voter_id) {
            self.say("You already voted.")?;
            return Ok(true);
        }

        self.say("Choose your candidate:")?;
        let names: Vec<String> = store.candidates().iter().map(str::to_string).collect();
        for (position, name) in names.iter().enumerate() {
            self.say(&format!("{}. {}", position + 1, name))?;
        }
        let Some(choice) = self.prompt(&format!("Enter your choice (1-{}): ", names.len()))?
        else {
            return Ok(false);
        };

        match store.cast_vote(&voter_id, &choice) {
            Ok(VoteOutcome::Recorded { candidate }) => {
                self.say(&format!("Vote recorded for {candidate}"))?
            }
            Ok(VoteOutcome::AlreadyVoted) => self.say("You already voted.")?,
            Ok(VoteOutcome::InvalidChoice { .. }) => self.say("Invalid choice.")?,
            Ok(VoteOutcome::InvalidVoterId { reason }) => {
                self.say(&format!("Invalid ID: {reason}"))?
            }
            Err(err) => self.say(&format!("Your vote was not saved: {err}"))?,
        }
        Ok(true)
    }

    fn show_results(&mut self, store: &BallotStore) -> Result<()> {
        self.say("\n--- Vote Counts ---")?;
        for result in store.results() {
            self.say(&format!("{}: {} votes", result.candidate, result.votes))?;
        }
        Ok(())
    }

    fn say(&mut self, line: &str) -> Result<()> {
        writeln!(self.output, "{line}").map_err(Error::Console)
    }

    /// Print `text` and read one trimmed line; `None` at end of input
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{text}").map_err(Error::Console)?;
        self.output.flush().map_err(Error::Console)?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).map_err(Error::Console)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;
    use crate::types::Candidates;
    use std::io::Cursor;

    fn run_script(store: &mut BallotStore, script: &str) -> String {
        let mut menu = Menu::new(Cursor::new(script.as_bytes().to_vec()), Vec::new());
        menu.run(store).unwrap();
        String::from_utf8(menu.into_output()).unwrap()
    }

    fn store() -> BallotStore {
        let candidates = Candidates::new(["Leo", "Marlon", "Johnny", "Christian"]).unwrap();
        BallotStore::new(candidates, MemoryStorage::new())
    }

    #[test]
    fn test_vote_then_results_then_quit() {
        let mut store = store();
        let output = run_script(&mut store, "1\nalice\n1\n2\n3\n");

        assert!(output.contains("4. Christian"));
        assert!(output.contains("Enter your choice (1-4): "));
        assert!(output.contains("Vote recorded for Leo"));
        assert!(output.contains("Leo: 1 votes"));
        assert!(output.contains("Marlon: 0 votes"));
        assert!(output.ends_with("Goodbye!\n"));
        assert_eq!(store.total_votes(), 1);
    }

    #[test]
    fn test_rejections_keep_the_loop_running() {
        let mut store = store();
        let output = run_script(&mut store, "1\nalice\n2\n1\nalice\n1\nbob\n9\n7\n3\n");

        assert!(output.contains("Vote recorded for Marlon"));
        assert!(output.contains("You already voted."));
        assert!(output.contains("Invalid choice."));
        assert!(output.contains("Goodbye!"));
        assert_eq!(store.total_votes(), 1);
        assert!(!store.has_voted("bob"));
    }

    #[test]
    fn test_end_of_input_stops_quietly() {
        let mut store = store();
        let output = run_script(&mut store, "1\ncarol\n");
        assert!(!output.contains("Goodbye!"));
        assert_eq!(store.total_votes(), 0);
    }

    #[test]
    fn test_load_report_warnings() {
        let storage = MemoryStorage::with_lines(["alice:0", "alice:1", "broken"]);
        let (_, report) = BallotStore::open(Candidates::default(), storage).unwrap();

        let mut menu = Menu::new(Cursor::new(Vec::<u8>::new()), Vec::<u8>::new());
        menu.show_load_report(&report).unwrap();
        let output = String::from_utf8(menu.into_output()).unwrap();
        assert!(output.contains("Malformed record on line 3"));
        assert!(output.contains("ignored 1 repeated vote record(s)"));
    }
}
