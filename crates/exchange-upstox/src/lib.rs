//! Upstox v2 REST integration for option writers.
//!
//! This crate provides:
//! - Authorization-code exchange for a bearer access token
//! - Rate-limited client for the option chain and margin calculator
//! - Data models for option contracts and margin requests
//!
//! # Example
//!
//! ```ignore
//! use margin_scout_upstox::{AccessToken, UpstoxClient, UpstoxClientConfig};
//! use margin_scout_upstox::types::{MarginInstrument, MarginRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let token = AccessToken::from_env(&Default::default())?;
//!     let client = UpstoxClient::new(UpstoxClientConfig::default(), token)?;
//!
//!     let puts = client
//!         .get_option_contracts("NSE_INDEX|Nifty 50", "2024-11-28", "PE")
//!         .await?;
//!
//!     for put in &puts {
//!         let req = MarginRequest::single(MarginInstrument::sell(&put.instrument_key, 25, "D"));
//!         let margin = client.get_margin(&req).await?;
//!         println!("{} {:?}", put.instrument_key, margin.first_total_margin());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Authentication
//!
//! Credentials are read from the environment:
//!
//! - `API_KEY`: app client id
//! - `API_SECRET`: app client secret
//! - `CODE`: one-time authorization code from the login redirect
//! - `ACCESS_TOKEN`: token issued by a previous exchange
//!
//! # API Endpoints
//!
//! - `POST /login/authorization/token` - Exchange authorization code
//! - `GET /option/chain` - Option chain for an underlying and expiry
//! - `POST /charges/margin` - Margin required for a set of legs

pub mod auth;
pub mod client;
pub mod error;
pub mod types;

pub use auth::{AccessToken, UpstoxAuth, UpstoxAuthConfig, UpstoxCredentials};
pub use client::{UpstoxClient, UpstoxClientConfig, UPSTOX_API_URL};
pub use error::{Result, UpstoxError};
pub use types::{
    MarginInstrument, MarginRequest, MarginResponse, OptionContract, OptionSide, TransactionType,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_exports() {
        let _ = UpstoxAuthConfig::default();
        let _ = UpstoxClientConfig::default();
    }

    #[test]
    fn test_constants_accessible() {
        assert!(UPSTOX_API_URL.starts_with("https://"));
        assert!(auth::TOKEN_PATH.starts_with('/'));
        assert!(client::OPTION_CHAIN_PATH.starts_with('/'));
        assert!(client::MARGIN_PATH.starts_with('/'));
    }
}
