use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "focusraid", version, about = "FocusRaid CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Boss battle control
    Battle {
        #[command(subcommand)]
        action: commands::battle::BattleAction,
    },
    /// Rest (bonfire) control
    Rest {
        #[command(subcommand)]
        action: commands::rest::RestAction,
    },
    /// Split one focus block across several tasks
    Group {
        #[command(subcommand)]
        action: commands::group::GroupAction,
    },
    /// Tick the engine and print its state as JSON
    Status,
    /// Charge the time since the last invocation after a crash
    Recover,
    /// Session statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("FOCUSRAID_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Battle { action } => commands::battle::run(action),
        Commands::Rest { action } => commands::rest::run(action),
        Commands::Group { action } => commands::group::run(action),
        Commands::Status => commands::battle::status(),
        Commands::Recover => commands::battle::recover(),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
