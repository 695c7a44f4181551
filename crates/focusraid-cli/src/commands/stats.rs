use chrono::Utc;
use clap::Subcommand;
use focusraid_core::Database;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today,
    /// Today's session results
    Results,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let today = Utc::now().date_naive();

    match action {
        StatsAction::Today => {
            let stats = db.stats_for(today)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Results => {
            let results = db.results_on(today)?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }
    Ok(())
}
