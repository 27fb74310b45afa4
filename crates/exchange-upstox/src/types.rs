//! Data models for the Upstox option chain and margin endpoints.
//!
//! Prices and margins use `rust_decimal::Decimal`. Wire types keep every
//! field optional so a partially populated response degrades to zero
//! instead of failing to parse.

use crate::error::{Result, UpstoxError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Option Types
// =============================================================================

/// Side of an option contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionSide {
    /// Put option (`PE`), priced off the bid.
    #[serde(rename = "PE")]
    Put,
    /// Call option (`CE`), priced off the ask.
    #[serde(rename = "CE")]
    Call,
}

impl OptionSide {
    /// Returns the exchange code (`PE` / `CE`).
    #[must_use]
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Self::Put => "PE",
            Self::Call => "CE",
        }
    }
}

impl fmt::Display for OptionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

impl FromStr for OptionSide {
    type Err = UpstoxError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PE" => Ok(Self::Put),
            "CE" => Ok(Self::Call),
            other => Err(UpstoxError::invalid_argument(format!(
                "side must be 'PE' for put or 'CE' for call, got '{other}'"
            ))),
        }
    }
}

/// One row of the option chain for the requested side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    /// Upstox instrument key (e.g. `NSE_FO|54524`).
    pub instrument_key: String,

    /// Strike price.
    pub strike_price: Decimal,

    /// Put or call.
    pub side: OptionSide,

    /// Bid for puts, ask for calls; zero when the quote is absent.
    pub price: Decimal,
}

// =============================================================================
// Margin Types
// =============================================================================

/// Order direction used for margin estimation. Only written legs are quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Sell,
}

/// One leg in a margin request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarginInstrument {
    pub instrument_key: String,
    pub quantity: u32,
    pub transaction_type: TransactionType,
    pub product: String,
}

impl MarginInstrument {
    /// Margin leg for writing `quantity` units of `instrument_key`.
    pub fn sell(instrument_key: impl Into<String>, quantity: u32, product: impl Into<String>) -> Self {
        Self {
            instrument_key: instrument_key.into(),
            quantity,
            transaction_type: TransactionType::Sell,
            product: product.into(),
        }
    }
}

/// Body of `POST /charges/margin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarginRequest {
    pub instruments: Vec<MarginInstrument>,
}

impl MarginRequest {
    /// Request with a single leg.
    #[must_use]
    pub fn single(instrument: MarginInstrument) -> Self {
        Self {
            instruments: vec![instrument],
        }
    }
}

/// Response of `POST /charges/margin`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarginResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data: Option<MarginData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarginData {
    #[serde(default)]
    pub margins: Option<Vec<MarginDetail>>,
}

/// Per-leg margin breakdown.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarginDetail {
    #[serde(default)]
    pub total_margin: Option<f64>,
}

impl MarginResponse {
    /// `data.margins[0].total_margin`, if every step of the path is present.
    #[must_use]
    pub fn first_total_margin(&self) -> Option<Decimal> {
        self.data
            .as_ref()?
            .margins
            .as_ref()?
            .first()?
            .total_margin
            .and_then(|v| Decimal::try_from(v).ok())
    }
}

// =============================================================================
// Option Chain Wire Types
// =============================================================================

/// Response of `GET /option/chain`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawOptionChainResponse {
    #[serde(default)]
    pub data: Option<Vec<RawChainEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawChainEntry {
    #[serde(default)]
    pub strike_price: Option<f64>,
    #[serde(default)]
    pub call_options: Option<RawOptionLeg>,
    #[serde(default)]
    pub put_options: Option<RawOptionLeg>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawOptionLeg {
    pub instrument_key: String,
    #[serde(default)]
    pub market_data: Option<RawMarketData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawMarketData {
    #[serde(default)]
    pub bid_price: Option<f64>,
    #[serde(default)]
    pub ask_price: Option<f64>,
}

impl RawChainEntry {
    /// Converts the entry into a row for `side`, or `None` when that side is not listed.
    pub(crate) fn into_contract(self, side: OptionSide) -> Option<OptionContract> {
        let leg = match side {
            OptionSide::Put => self.put_options,
            OptionSide::Call => self.call_options,
        }?;

        let quote = leg.market_data.and_then(|md| match side {
            OptionSide::Put => md.bid_price,
            OptionSide::Call => md.ask_price,
        });

        Some(OptionContract {
            instrument_key: leg.instrument_key,
            strike_price: to_decimal(self.strike_price),
            side,
            price: to_decimal(quote),
        })
    }
}

fn to_decimal(value: Option<f64>) -> Decimal {
    value
        .map(|v| Decimal::try_from(v).unwrap_or_default())
        .unwrap_or_default()
}

// =============================================================================
// Token Types
// =============================================================================

/// Response of `POST /login/authorization/token`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawTokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}
