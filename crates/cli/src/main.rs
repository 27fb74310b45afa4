use anyhow::Context;
use clap::{Parser, Subcommand};

mod commands;

use commands::{FetchTokenArgs, OptionMarginsArgs};
use margin_scout_core::ConfigLoader;

#[derive(Parser)]
#[command(name = "margin-scout")]
#[command(about = "Upstox access tokens and option margin reports", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = ConfigLoader::DEFAULT_PATH, global = true)]
    config: String,

    /// Key=value file with credentials (overrides report.env_file)
    #[arg(long, global = true)]
    env_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Exchange the authorization code for an access token and store it
    FetchToken(FetchTokenArgs),
    /// Fetch an option chain, attach margin and premium, export to CSV
    OptionMargins(OptionMarginsArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut config = ConfigLoader::load_from(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config))?;
    if let Some(env_file) = cli.env_file {
        config.report.env_file = env_file;
    }

    // Variables already set in the process win over the file
    match dotenvy::from_path(&config.report.env_file) {
        Ok(()) => tracing::debug!("Loaded environment from {}", config.report.env_file),
        Err(e) if e.not_found() => {
            tracing::debug!("No env file at {}", config.report.env_file);
        }
        Err(e) => {
            tracing::warn!("Failed to read env file {}: {}", config.report.env_file, e);
        }
    }

    match cli.command {
        Commands::FetchToken(args) => {
            commands::run_fetch_token(args, &config).await?;
        }
        Commands::OptionMargins(args) => {
            commands::run_option_margins(args, &config).await?;
        }
    }

    Ok(())
}
