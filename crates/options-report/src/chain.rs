//! Option chain fetch with the report's failure policy.
//!
//! Invalid caller input (side, expiry) is the only error that propagates.
//! A failed request or an empty chain becomes an empty table.

use margin_scout_upstox::{OptionContract, OptionSide, Result};

use crate::source::OptionChainSource;

/// Builds the underlying key, e.g. `NSE_INDEX|Nifty 50`.
pub fn instrument_key(prefix: &str, instrument_name: &str) -> String {
    format!("{prefix}|{instrument_name}")
}

/// Fetch one side of the chain for `instrument_key`.
///
/// The side is checked before the source is touched, so `"XX"` never
/// reaches the network.
pub async fn fetch_contracts<S>(
    source: &S,
    instrument_key: &str,
    expiry_date: &str,
    side: &str,
) -> Result<Vec<OptionContract>>
where
    S: OptionChainSource + ?Sized,
{
    let side: OptionSide = side.parse()?;

    match source
        .option_contracts(instrument_key, expiry_date, side.as_api_str())
        .await
    {
        Ok(contracts) if contracts.is_empty() => {
            tracing::warn!(
                instrument_key,
                expiry_date,
                %side,
                "No option chain data found for the given parameters"
            );
            Ok(contracts)
        }
        Ok(contracts) => {
            tracing::info!(
                instrument_key,
                expiry_date,
                %side,
                count = contracts.len(),
                "Fetched option chain"
            );
            Ok(contracts)
        }
        Err(e) if e.is_invalid_argument() => Err(e),
        Err(e) => {
            tracing::warn!(instrument_key, expiry_date, "Option chain request failed: {}", e);
            Ok(Vec::new())
        }
    }
}
