//! Option-margins command.
//!
//! Fetches one side of an index option chain, prices each contract for
//! one lot (premium and margin to sell), writes the table to CSV and
//! prints a summary.

use anyhow::{Context, Result};
use clap::Args;
use margin_scout_core::AppConfig;
use margin_scout_report::{enrich_contracts, fetch_contracts, instrument_key, CsvExporter};
use margin_scout_upstox::{AccessToken, UpstoxAuthConfig, UpstoxClient};

/// Arguments for the option-margins command.
#[derive(Args, Debug, Clone)]
pub struct OptionMarginsArgs {
    /// Underlying index name (e.g., "Nifty 50", "Nifty Bank")
    #[arg(long, default_value = "Nifty 50")]
    pub instrument: String,

    /// Expiry date in YYYY-MM-DD format
    #[arg(long)]
    pub expiry: String,

    /// Option side: PE (puts) or CE (calls)
    #[arg(long, default_value = "PE")]
    pub side: String,

    /// Output CSV file path (defaults to report.output_path)
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Runs the option-margins command.
///
/// # Errors
/// Returns an error if the access token is missing, the side or expiry is
/// invalid, or the CSV cannot be written. API failures degrade to empty
/// tables or zero margins instead.
pub async fn run_option_margins(args: OptionMarginsArgs, config: &AppConfig) -> Result<()> {
    let token = AccessToken::from_env(&UpstoxAuthConfig::default())
        .context("ACCESS_TOKEN must be set; run fetch-token first")?;
    let enrich_config = super::enrich_config(&config.report)?;
    let client = UpstoxClient::new(super::client_config(&config.upstox)?, token)?;

    let underlying = instrument_key(&config.report.instrument_prefix, &args.instrument);
    tracing::info!(
        "Fetching {} option chain for {} expiring {}",
        args.side,
        underlying,
        args.expiry
    );

    let contracts = fetch_contracts(&client, &underlying, &args.expiry, &args.side).await?;

    let report = enrich_contracts(&client, contracts, &enrich_config).await;

    let output = args
        .output
        .unwrap_or_else(|| config.report.output_path.clone());
    CsvExporter::write(&output, &report)?;
    tracing::info!("Results written to {} ({} rows)", output, report.len());

    println!("{}", report.summary().format());

    Ok(())
}
