//! Enriched report table and its summary.

use margin_scout_upstox::OptionContract;
use rust_decimal::Decimal;
use serde::Serialize;

/// Column names, in export order.
pub const COLUMNS: [&str; 6] = [
    "instrument_name",
    "strike_price",
    "side",
    "bid/ask",
    "margin_required",
    "premium_earned",
];

/// An option contract with its premium and margin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedContract {
    pub contract: OptionContract,
    /// Margin to sell one lot; zero when unavailable.
    pub margin_required: Decimal,
    /// Quoted price times lot size; zero when the quote is not positive.
    pub premium_earned: Decimal,
}

impl EnrichedContract {
    /// Premium per unit of margin, if any margin was reported and the
    /// quotient is representable.
    pub fn premium_to_margin(&self) -> Option<Decimal> {
        if self.margin_required > Decimal::ZERO {
            self.premium_earned.checked_div(self.margin_required)
        } else {
            None
        }
    }

    /// Row values in [`COLUMNS`] order.
    pub fn record(&self) -> [String; 6] {
        [
            self.contract.instrument_key.clone(),
            self.contract.strike_price.to_string(),
            self.contract.side.to_string(),
            self.contract.price.to_string(),
            self.margin_required.to_string(),
            self.premium_earned.to_string(),
        ]
    }
}

/// Output of the enrichment stage. Row order matches the option chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptionReport {
    pub rows: Vec<EnrichedContract>,
}

impl OptionReport {
    pub fn columns(&self) -> &'static [&'static str] {
        &COLUMNS
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn summary(&self) -> ReportSummary {
        let best = self
            .rows
            .iter()
            .filter_map(|r| r.premium_to_margin().map(|ratio| (r, ratio)))
            .max_by(|a, b| a.1.cmp(&b.1))
            .map(|(r, ratio)| BestContract {
                instrument_key: r.contract.instrument_key.clone(),
                strike_price: r.contract.strike_price,
                premium_to_margin: ratio.round_dp(4),
            });

        ReportSummary {
            rows: self.rows.len(),
            priced_rows: self
                .rows
                .iter()
                .filter(|r| r.contract.price > Decimal::ZERO)
                .count(),
            margined_rows: self
                .rows
                .iter()
                .filter(|r| r.margin_required > Decimal::ZERO)
                .count(),
            total_premium: checked_total(self.rows.iter().map(|r| r.premium_earned)),
            total_margin: checked_total(self.rows.iter().map(|r| r.margin_required)),
            best,
        }
    }
}

fn checked_total(mut values: impl Iterator<Item = Decimal>) -> Option<Decimal> {
    values.try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}

/// Contract with the highest premium/margin ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct BestContract {
    pub instrument_key: String,
    pub strike_price: Decimal,
    pub premium_to_margin: Decimal,
}

/// Aggregate view printed after export.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    pub rows: usize,
    pub priced_rows: usize,
    pub margined_rows: usize,
    /// `None` when the sum overflows.
    pub total_premium: Option<Decimal>,
    pub total_margin: Option<Decimal>,
    pub best: Option<BestContract>,
}

impl ReportSummary {
    pub fn format(&self) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str("                  OPTION MARGIN SUMMARY                        \n");
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str(&format!("Contracts:             {}\n", self.rows));
        output.push_str(&format!("With quote:            {}\n", self.priced_rows));
        output.push_str(&format!("With margin:           {}\n", self.margined_rows));
        output.push_str(&format!(
            "Total premium:         {}\n",
            format_total(self.total_premium)
        ));
        output.push_str(&format!(
            "Total margin:          {}\n",
            format_total(self.total_margin)
        ));

        match &self.best {
            Some(best) => {
                output.push_str(&format!(
                    "Best premium/margin:   {} (strike {}) at {}\n",
                    best.instrument_key, best.strike_price, best.premium_to_margin
                ));
            }
            None => output.push_str("Best premium/margin:   n/a\n"),
        }
        output.push_str("═══════════════════════════════════════════════════════════════\n");

        output
    }
}

fn format_total(total: Option<Decimal>) -> String {
    total.map_or_else(|| "overflow".to_string(), |t| format!("{t:.2}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use margin_scout_upstox::OptionSide;
    use rust_decimal_macros::dec;

    fn row(key: &str, price: Decimal, margin: Decimal) -> EnrichedContract {
        EnrichedContract {
            contract: OptionContract {
                instrument_key: key.to_string(),
                strike_price: dec!(24000),
                side: OptionSide::Put,
                price,
            },
            margin_required: margin,
            premium_earned: if price > Decimal::ZERO {
                price * dec!(25)
            } else {
                Decimal::ZERO
            },
        }
    }

    #[test]
    fn test_record_follows_column_order() {
        let r = row("NSE_FO|1", dec!(11.95), dec!(100000));
        assert_eq!(
            r.record(),
            [
                "NSE_FO|1".to_string(),
                "24000".to_string(),
                "PE".to_string(),
                "11.95".to_string(),
                "100000".to_string(),
                "298.75".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_report_keeps_schema() {
        let report = OptionReport::default();
        assert!(report.is_empty());
        assert_eq!(report.columns().len(), 6);
        assert_eq!(report.columns()[3], "bid/ask");
    }

    #[test]
    fn test_summary_totals_and_best() {
        let report = OptionReport {
            rows: vec![
                row("NSE_FO|1", dec!(10), dec!(100000)),
                row("NSE_FO|2", dec!(40), dec!(200000)),
                row("NSE_FO|3", dec!(0), dec!(0)),
            ],
        };

        let s = report.summary();
        assert_eq!(s.rows, 3);
        assert_eq!(s.priced_rows, 2);
        assert_eq!(s.margined_rows, 2);
        assert_eq!(s.total_premium, Some(dec!(1250)));
        assert_eq!(s.total_margin, Some(dec!(300000)));

        let best = s.best.unwrap();
        assert_eq!(best.instrument_key, "NSE_FO|2");
        assert_eq!(best.premium_to_margin, dec!(0.005));
    }

    #[test]
    fn test_summary_without_margins_has_no_best() {
        let report = OptionReport {
            rows: vec![row("NSE_FO|1", dec!(10), dec!(0))],
        };
        let s = report.summary();
        assert!(s.best.is_none());
        assert!(s.format().contains("n/a"));
    }

    #[test]
    fn test_format_includes_totals() {
        let report = OptionReport {
            rows: vec![row("NSE_FO|1", dec!(10), dec!(100000))],
        };
        let text = report.summary().format();
        assert!(text.contains("Contracts:             1"));
        assert!(text.contains("250.00"));
        assert!(text.contains("NSE_FO|1"));
    }

    #[test]
    fn test_ratio_overflow_is_skipped() {
        let mut tiny = row("NSE_FO|1", dec!(10), Decimal::new(1, 27));
        tiny.premium_earned = dec!(250);
        let report = OptionReport {
            rows: vec![tiny, row("NSE_FO|2", dec!(10), dec!(100000))],
        };

        assert_eq!(report.rows[0].premium_to_margin(), None);
        let s = report.summary();
        assert_eq!(s.best.unwrap().instrument_key, "NSE_FO|2");
    }

    #[test]
    fn test_total_overflow_is_reported() {
        let report = OptionReport {
            rows: vec![
                row("NSE_FO|1", dec!(0), Decimal::MAX),
                row("NSE_FO|2", dec!(0), Decimal::MAX),
            ],
        };

        let s = report.summary();
        assert_eq!(s.total_margin, None);
        assert_eq!(s.total_premium, Some(Decimal::ZERO));
        assert!(s.format().contains("Total margin:          overflow"));
    }
}
