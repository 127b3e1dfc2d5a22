use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{ConfigCommand, ItemSubcommand, WatchCommand};
use itemsync::{Config, HttpRemote};

#[derive(Parser)]
#[command(name = "itemsync")]
#[command(version)]
#[command(about = "Keep a list of items in sync with a realtime store", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Item(ItemSubcommand),

    /// Show the live list and edit it interactively
    Watch(WatchCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

/// Used when `RUST_LOG` is unset. Warnings share stderr with failure toasts.
const DEFAULT_LOG_FILTER: &str = "itemsync=warn";

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Item(cmd)) => {
            let remote = HttpRemote::from_config(&config);
            cmd.run(&remote).await?;
        }
        Some(Commands::Watch(cmd)) => {
            let remote = HttpRemote::from_config(&config);
            cmd.run(&remote).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_filter_shows_warnings() {
        let targets: tracing_subscriber::filter::Targets = DEFAULT_LOG_FILTER.parse().unwrap();
        assert!(targets.would_enable("itemsync::actions", &tracing::Level::WARN));
        assert!(!targets.would_enable("itemsync::actions", &tracing::Level::INFO));
    }

    #[test]
    fn test_cli_parses_update() {
        let cli = Cli::try_parse_from(["itemsync", "update", "1", "2", "Pencil"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Item(_))));
    }
}
