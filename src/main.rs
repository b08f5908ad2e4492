//! ytdumper - Archive new YouTube playlist videos as tagged MP3s

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;
mod sync;
mod utils;
mod youtube;

use cli::{Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref(), cli.settings.clone().into())?;

    init_logging(cli.verbose, &config)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            cli::commands::run(&config).await?;
        }
        Commands::Once => {
            cli::commands::once(&config).await?;
        }
        Commands::Status => {
            cli::commands::status(&config)?;
        }
        Commands::Completion { shell } => {
            cli::commands::completion(shell);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, config: &Config) -> Result<()> {
    let filter = if verbose {
        "ytdumper=debug,reqwest=debug"
    } else {
        "ytdumper=info"
    };

    // Optional plain-text copy of the log
    let file_layer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    Ok(())
}
