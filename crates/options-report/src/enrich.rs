//! Premium and margin enrichment.
//!
//! Rows are processed one at a time, in chain order. A row whose quote is
//! not positive, or whose premium overflows, is zeroed without a margin
//! request; a row whose margin request fails is zeroed on margin only. Neither stops the batch, so the
//! output always has one row per input contract.

use margin_scout_core::{DEFAULT_LOT_SIZE, DEFAULT_PRODUCT};
use margin_scout_upstox::{MarginInstrument, OptionContract};
use rust_decimal::Decimal;

use crate::report::{EnrichedContract, OptionReport};
use crate::source::MarginSource;

/// Parameters for the margin leg sent per contract.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// Units per lot; also the quantity quoted for margin.
    pub lot_size: u32,
    /// Product code sent with each margin request.
    pub product: String,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            lot_size: DEFAULT_LOT_SIZE,
            product: DEFAULT_PRODUCT.to_string(),
        }
    }
}

impl EnrichConfig {
    /// Price times lot size, or `None` if the product overflows.
    pub fn premium(&self, price: Decimal) -> Option<Decimal> {
        price.checked_mul(Decimal::from(self.lot_size))
    }
}

fn zeroed(contract: OptionContract) -> EnrichedContract {
    EnrichedContract {
        contract,
        margin_required: Decimal::ZERO,
        premium_earned: Decimal::ZERO,
    }
}

/// Attach premium and margin to every contract.
pub async fn enrich_contracts<M>(
    source: &M,
    contracts: Vec<OptionContract>,
    config: &EnrichConfig,
) -> OptionReport
where
    M: MarginSource + ?Sized,
{
    if contracts.is_empty() {
        tracing::info!("No data available for margin calculation");
        return OptionReport::default();
    }

    let mut rows = Vec::with_capacity(contracts.len());

    for contract in contracts {
        if contract.price <= Decimal::ZERO {
            tracing::warn!(
                instrument_key = %contract.instrument_key,
                price = %contract.price,
                "Invalid price, skipping margin request"
            );
            rows.push(zeroed(contract));
            continue;
        }

        let Some(premium_earned) = config.premium(contract.price) else {
            tracing::warn!(
                instrument_key = %contract.instrument_key,
                price = %contract.price,
                "Premium out of range, skipping margin request"
            );
            rows.push(zeroed(contract));
            continue;
        };
        let leg = MarginInstrument::sell(
            contract.instrument_key.clone(),
            config.lot_size,
            config.product.clone(),
        );
        let margin_required = margin_or_zero(source, &leg).await;

        rows.push(EnrichedContract {
            contract,
            margin_required,
            premium_earned,
        });
    }

    tracing::info!(rows = rows.len(), "Margin calculation complete");
    OptionReport { rows }
}

async fn margin_or_zero<M>(source: &M, leg: &MarginInstrument) -> Decimal
where
    M: MarginSource + ?Sized,
{
    match source.total_margin(leg).await {
        Ok(Some(margin)) if margin >= Decimal::ZERO => margin,
        Ok(Some(margin)) => {
            tracing::warn!(
                instrument_key = %leg.instrument_key,
                %margin,
                "Negative margin reported, using 0"
            );
            Decimal::ZERO
        }
        Ok(None) => {
            tracing::warn!(
                instrument_key = %leg.instrument_key,
                "Unexpected response structure for margin, using 0"
            );
            Decimal::ZERO
        }
        Err(e) if e.is_transient() => {
            tracing::warn!(
                instrument_key = %leg.instrument_key,
                "Margin request failed (transient, not retried), using 0: {}",
                e
            );
            Decimal::ZERO
        }
        Err(e) => {
            tracing::warn!(
                instrument_key = %leg.instrument_key,
                "Error fetching margin, using 0: {}",
                e
            );
            Decimal::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use margin_scout_upstox::{OptionSide, Result, UpstoxError};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::Mutex;

    enum Reply {
        Margin(Decimal),
        MissingPath,
        Fail,
        Reject,
    }

    /// Margin source keyed by instrument; records every leg it is asked for.
    struct FakeMargins {
        replies: HashMap<String, Reply>,
        seen: Mutex<Vec<MarginInstrument>>,
    }

    impl FakeMargins {
        fn new(replies: Vec<(&str, Reply)>) -> Self {
            Self {
                replies: replies
                    .into_iter()
                    .map(|(k, r)| (k.to_string(), r))
                    .collect(),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen_keys(&self) -> Vec<String> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(|l| l.instrument_key.clone())
                .collect()
        }
    }

    #[async_trait]
    impl MarginSource for FakeMargins {
        async fn total_margin(&self, instrument: &MarginInstrument) -> Result<Option<Decimal>> {
            self.seen.lock().unwrap().push(instrument.clone());
            match self.replies.get(&instrument.instrument_key) {
                Some(Reply::Margin(m)) => Ok(Some(*m)),
                Some(Reply::MissingPath) | None => Ok(None),
                Some(Reply::Fail) => Err(UpstoxError::Timeout("30s elapsed".to_string())),
                Some(Reply::Reject) => Err(UpstoxError::api(400, "invalid instrument")),
            }
        }
    }

    fn put(key: &str, price: Decimal) -> OptionContract {
        OptionContract {
            instrument_key: key.to_string(),
            strike_price: dec!(24000),
            side: OptionSide::Put,
            price,
        }
    }

    #[tokio::test]
    async fn test_premium_is_price_times_lot() {
        let source = FakeMargins::new(vec![("NSE_FO|1", Reply::Margin(dec!(112000.5)))]);

        let report = enrich_contracts(
            &source,
            vec![put("NSE_FO|1", dec!(11.95))],
            &EnrichConfig::default(),
        )
        .await;

        assert_eq!(report.len(), 1);
        assert_eq!(report.rows[0].premium_earned, dec!(298.75));
        assert_eq!(report.rows[0].margin_required, dec!(112000.5));
    }

    #[tokio::test]
    async fn test_non_positive_price_is_zeroed_without_request() {
        let source = FakeMargins::new(vec![
            ("NSE_FO|1", Reply::Margin(dec!(1000))),
            ("NSE_FO|2", Reply::Margin(dec!(1000))),
        ]);

        let report = enrich_contracts(
            &source,
            vec![put("NSE_FO|1", dec!(0)), put("NSE_FO|2", dec!(-1.5))],
            &EnrichConfig::default(),
        )
        .await;

        assert_eq!(report.len(), 2);
        for row in &report.rows {
            assert_eq!(row.margin_required, Decimal::ZERO);
            assert_eq!(row.premium_earned, Decimal::ZERO);
        }
        assert!(source.seen_keys().is_empty());
    }

    #[tokio::test]
    async fn test_missing_margin_path_defaults_to_zero_and_continues() {
        let source = FakeMargins::new(vec![
            ("NSE_FO|1", Reply::MissingPath),
            ("NSE_FO|2", Reply::Margin(dec!(90000))),
        ]);

        let report = enrich_contracts(
            &source,
            vec![put("NSE_FO|1", dec!(5)), put("NSE_FO|2", dec!(6))],
            &EnrichConfig::default(),
        )
        .await;

        assert_eq!(report.rows[0].margin_required, Decimal::ZERO);
        assert_eq!(report.rows[0].premium_earned, dec!(125));
        assert_eq!(report.rows[1].margin_required, dec!(90000));
        assert_eq!(source.seen_keys(), ["NSE_FO|1", "NSE_FO|2"]);
    }

    #[tokio::test]
    async fn test_failed_request_is_isolated_to_its_row() {
        let source = FakeMargins::new(vec![
            ("NSE_FO|1", Reply::Margin(dec!(50000))),
            ("NSE_FO|2", Reply::Fail),
            ("NSE_FO|3", Reply::Margin(dec!(70000))),
        ]);

        let report = enrich_contracts(
            &source,
            vec![
                put("NSE_FO|1", dec!(1)),
                put("NSE_FO|2", dec!(2)),
                put("NSE_FO|3", dec!(3)),
            ],
            &EnrichConfig::default(),
        )
        .await;

        let margins: Vec<_> = report.rows.iter().map(|r| r.margin_required).collect();
        assert_eq!(margins, [dec!(50000), Decimal::ZERO, dec!(70000)]);
        // Premium still computed on the failed row
        assert_eq!(report.rows[1].premium_earned, dec!(50));
    }

    #[tokio::test]
    async fn test_rejected_request_is_zeroed_and_continues() {
        let source = FakeMargins::new(vec![
            ("NSE_FO|1", Reply::Reject),
            ("NSE_FO|2", Reply::Margin(dec!(60000))),
        ]);

        let report = enrich_contracts(
            &source,
            vec![put("NSE_FO|1", dec!(2)), put("NSE_FO|2", dec!(2))],
            &EnrichConfig::default(),
        )
        .await;

        assert_eq!(report.rows[0].margin_required, Decimal::ZERO);
        assert_eq!(report.rows[1].margin_required, dec!(60000));
    }

    #[tokio::test]
    async fn test_negative_margin_is_clamped() {
        let source = FakeMargins::new(vec![("NSE_FO|1", Reply::Margin(dec!(-10)))]);

        let report = enrich_contracts(
            &source,
            vec![put("NSE_FO|1", dec!(4))],
            &EnrichConfig::default(),
        )
        .await;

        assert_eq!(report.rows[0].margin_required, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_sends_sell_leg_with_lot_quantity_and_product() {
        let source = FakeMargins::new(vec![("NSE_FO|9", Reply::Margin(dec!(1)))]);
        let config = EnrichConfig {
            lot_size: 75,
            product: "I".to_string(),
        };

        let report = enrich_contracts(&source, vec![put("NSE_FO|9", dec!(2))], &config).await;

        let seen = source.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], MarginInstrument::sell("NSE_FO|9", 75, "I"));
        assert_eq!(report.rows[0].premium_earned, dec!(150));
    }

    #[tokio::test]
    async fn test_premium_overflow_is_zeroed_and_isolated() {
        let source = FakeMargins::new(vec![
            ("NSE_FO|1", Reply::Margin(dec!(1000))),
            ("NSE_FO|2", Reply::Margin(dec!(2000))),
        ]);

        let report = enrich_contracts(
            &source,
            vec![put("NSE_FO|1", Decimal::MAX), put("NSE_FO|2", dec!(3))],
            &EnrichConfig::default(),
        )
        .await;

        assert_eq!(report.len(), 2);
        assert_eq!(report.rows[0].premium_earned, Decimal::ZERO);
        assert_eq!(report.rows[0].margin_required, Decimal::ZERO);
        assert_eq!(report.rows[1].premium_earned, dec!(75));
        assert_eq!(report.rows[1].margin_required, dec!(2000));
        assert_eq!(source.seen_keys(), ["NSE_FO|2"]);
    }

    #[test]
    fn test_default_config_matches_core_defaults() {
        let config = EnrichConfig::default();
        assert_eq!(config.lot_size, DEFAULT_LOT_SIZE);
        assert_eq!(config.product, DEFAULT_PRODUCT);
        assert_eq!(config.premium(Decimal::MAX), None);
    }

    #[tokio::test]
    async fn test_empty_input_gives_empty_report() {
        let source = FakeMargins::new(vec![]);

        let report = enrich_contracts(&source, vec![], &EnrichConfig::default()).await;

        assert!(report.is_empty());
        assert_eq!(report.columns().len(), 6);
        assert!(source.seen_keys().is_empty());
    }
}
