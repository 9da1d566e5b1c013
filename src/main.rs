use ballot_box::config::Config;
use ballot_box::menu::Menu;
use ballot_box::{BallotStore, Result};

fn main() -> Result<()> {
    let config = Config::from_env()?;
    ballot_box::init_with(&config.logging)?;

    tracing::info!(
        store = %config.ballot.store_path.display(),
        candidates = config.ballot.candidates.len(),
        "Opening ballot store"
    );
    let (mut store, report) = BallotStore::from_config(&config.ballot)?;

    let stdin = std::io::stdin();
    let mut menu = Menu::new(stdin.lock(), std::io::stdout());
    menu.show_load_report(&report)?;
    menu.run(&mut store)?;

    tracing::info!(votes = store.total_votes(), "Ballot box closed");
    Ok(())
}
