use clap::Subcommand;

use super::host::{print_json, Host};

#[derive(Subcommand)]
pub enum RestAction {
    /// Start a rest countdown
    Start {
        /// Length in minutes (defaults to `defaults.rest_minutes`)
        #[arg(long)]
        minutes: Option<f64>,
    },
}

pub fn run(action: RestAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut host = Host::open()?;
    match action {
        RestAction::Start { minutes } => {
            let minutes = minutes.unwrap_or(f64::from(host.config.defaults.rest_minutes));
            host.live.start_rest(minutes * 60.0);
        }
    }
    print_json(&host.commit(true)?)
}
