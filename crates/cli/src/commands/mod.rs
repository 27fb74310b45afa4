//! CLI commands.

pub mod fetch_token;
pub mod option_margins;

pub use fetch_token::{run_fetch_token, FetchTokenArgs};
pub use option_margins::{run_option_margins, OptionMarginsArgs};

use anyhow::{bail, Context, Result};
use margin_scout_core::{ReportConfig, UpstoxConfig};
use margin_scout_report::EnrichConfig;
use margin_scout_upstox::UpstoxClientConfig;
use std::num::NonZeroU32;

/// HTTP settings shared by both commands.
pub(crate) fn client_config(config: &UpstoxConfig) -> Result<UpstoxClientConfig> {
    let requests_per_minute = NonZeroU32::new(config.requests_per_minute)
        .context("upstox.requests_per_minute must be greater than zero")?;

    Ok(UpstoxClientConfig::default()
        .with_base_url(config.api_url.as_str())
        .with_rate_limit(requests_per_minute)
        .with_timeout_secs(config.timeout_secs))
}

/// Margin leg parameters; a zero lot size would quote empty positions.
pub(crate) fn enrich_config(config: &ReportConfig) -> Result<EnrichConfig> {
    if config.lot_size == 0 {
        bail!("report.lot_size must be greater than zero");
    }

    Ok(EnrichConfig {
        lot_size: config.lot_size,
        product: config.product.clone(),
    })
}
