//! Data sources the report pipeline reads from.
//!
//! The pipeline only needs two capabilities: one side of an option chain,
//! and the margin for a single leg. [`UpstoxClient`] provides both; tests
//! substitute in-memory fakes.

use async_trait::async_trait;
use margin_scout_upstox::{
    MarginInstrument, MarginRequest, OptionContract, Result, UpstoxClient,
};
use rust_decimal::Decimal;

#[async_trait]
pub trait OptionChainSource: Send + Sync {
    /// One side (`PE`/`CE`) of the chain for `instrument_key` at `expiry_date`.
    async fn option_contracts(
        &self,
        instrument_key: &str,
        expiry_date: &str,
        side: &str,
    ) -> Result<Vec<OptionContract>>;
}

#[async_trait]
pub trait MarginSource: Send + Sync {
    /// Total margin for one leg, or `None` when the response lacks it.
    async fn total_margin(&self, instrument: &MarginInstrument) -> Result<Option<Decimal>>;
}

#[async_trait]
impl OptionChainSource for UpstoxClient {
    async fn option_contracts(
        &self,
        instrument_key: &str,
        expiry_date: &str,
        side: &str,
    ) -> Result<Vec<OptionContract>> {
        self.get_option_contracts(instrument_key, expiry_date, side)
            .await
    }
}

#[async_trait]
impl MarginSource for UpstoxClient {
    async fn total_margin(&self, instrument: &MarginInstrument) -> Result<Option<Decimal>> {
        let request = MarginRequest::single(instrument.clone());
        let response = self.get_margin(&request).await?;
        let margin = response.first_total_margin();
        if margin.is_none() {
            tracing::debug!(?response, "Margin response without data.margins[0].total_margin");
        }
        Ok(margin)
    }
}
