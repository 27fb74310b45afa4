//! Upstox v2 REST client with rate limiting.
//!
//! Covers the two market-data endpoints used for option writing:
//! the option chain and the margin calculator. Every request carries the
//! bearer token and waits on a governor rate limiter. Nothing is retried.
//!
//! # Example
//!
//! ```ignore
//! use margin_scout_upstox::{AccessToken, UpstoxClient, UpstoxClientConfig};
//!
//! let client = UpstoxClient::new(UpstoxClientConfig::default(), AccessToken::new(token))?;
//! let puts = client.get_option_contracts("NSE_INDEX|Nifty 50", "2024-11-28", "PE").await?;
//! ```

use crate::auth::AccessToken;
use crate::error::{Result, UpstoxError};
use crate::types::{
    MarginRequest, MarginResponse, OptionContract, OptionSide, RawOptionChainResponse,
};
use chrono::NaiveDate;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Client;
use serde::Serialize;
use std::num::NonZeroU32;
use std::sync::Arc;

// =============================================================================
// Constants
// =============================================================================

/// Upstox v2 production API base URL.
pub const UPSTOX_API_URL: &str = "https://api.upstox.com/v2";

/// Option chain endpoint.
pub const OPTION_CHAIN_PATH: &str = "/option/chain";

/// Margin calculator endpoint.
pub const MARGIN_PATH: &str = "/charges/margin";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the Upstox client.
#[derive(Debug, Clone)]
pub struct UpstoxClientConfig {
    /// Base URL for the API.
    pub base_url: String,

    /// Requests per minute limit.
    pub requests_per_minute: NonZeroU32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstoxClientConfig {
    fn default() -> Self {
        Self {
            base_url: UPSTOX_API_URL.to_string(),
            requests_per_minute: nonzero!(250u32),
            timeout_secs: 30,
        }
    }
}

impl UpstoxClientConfig {
    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the rate limit.
    #[must_use]
    pub fn with_rate_limit(mut self, requests_per_minute: NonZeroU32) -> Self {
        self.requests_per_minute = requests_per_minute;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

// =============================================================================
// UpstoxClient
// =============================================================================

/// Authenticated Upstox REST client.
pub struct UpstoxClient {
    config: UpstoxClientConfig,
    http: Client,
    rate_limiter: Arc<
        RateLimiter<
            governor::state::NotKeyed,
            governor::state::InMemoryState,
            governor::clock::DefaultClock,
        >,
    >,
    token: AccessToken,
}

impl std::fmt::Debug for UpstoxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstoxClient")
            .field("base_url", &self.config.base_url)
            .field("requests_per_minute", &self.config.requests_per_minute)
            .finish_non_exhaustive()
    }
}

impl UpstoxClient {
    /// Creates a new client with the given configuration and token.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: UpstoxClientConfig, token: AccessToken) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UpstoxError::Network(format!("failed to build HTTP client: {e}")))?;

        let quota = Quota::per_minute(config.requests_per_minute);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            config,
            http,
            rate_limiter,
            token,
        })
    }

    /// Waits for the rate limiter and makes an authenticated GET request.
    async fn get<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.config.base_url, path);
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .query(query)
            .header("Accept", "application/json")
            .header("Authorization", self.token.bearer_header())
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Waits for the rate limiter and makes an authenticated JSON POST request.
    async fn post<T: serde::de::DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.config.base_url, path);
        tracing::debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .header("Accept", "application/json")
            .header("Authorization", self.token.bearer_header())
            .json(body)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(UpstoxError::rate_limit(retry_after));
        }

        if status.as_u16() == 401 {
            let text = response.text().await.unwrap_or_default();
            return Err(UpstoxError::Authentication(text));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(UpstoxError::api(status.as_u16(), text));
        }

        let body = response.json::<T>().await?;
        Ok(body)
    }

    /// Validates an ISO `YYYY-MM-DD` expiry date.
    fn validate_expiry(expiry_date: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(expiry_date, "%Y-%m-%d").map_err(|_| {
            UpstoxError::invalid_argument(format!(
                "expiry date must be YYYY-MM-DD, got '{expiry_date}'"
            ))
        })
    }

    // =========================================================================
    // Option Chain
    // =========================================================================

    /// Fetches one side of the option chain.
    ///
    /// `side` is validated before any request is sent: anything other than
    /// `PE` or `CE` fails with [`UpstoxError::InvalidArgument`]. Rows follow
    /// the order of the response; strikes without a contract on `side` are
    /// skipped. An empty `data` list yields an empty vector.
    ///
    /// # Arguments
    /// * `instrument_key` - Underlying key, e.g. `NSE_INDEX|Nifty 50`
    /// * `expiry_date` - Expiry in `YYYY-MM-DD`
    /// * `side` - `PE` or `CE`
    ///
    /// # Errors
    /// Returns error on invalid input or if the API call fails.
    pub async fn get_option_contracts(
        &self,
        instrument_key: &str,
        expiry_date: &str,
        side: &str,
    ) -> Result<Vec<OptionContract>> {
        let side: OptionSide = side.parse()?;
        Self::validate_expiry(expiry_date)?;

        let query = [("instrument_key", instrument_key), ("expiry_date", expiry_date)];
        let response: RawOptionChainResponse = self.get(OPTION_CHAIN_PATH, &query).await?;

        let contracts: Vec<OptionContract> = response
            .data
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| entry.into_contract(side))
            .collect();

        tracing::debug!(
            instrument_key,
            expiry_date,
            %side,
            count = contracts.len(),
            "Parsed option chain"
        );
        Ok(contracts)
    }

    // =========================================================================
    // Margin
    // =========================================================================

    /// Requests a margin estimate.
    ///
    /// # Errors
    /// Returns error if the API call fails or the body is not JSON.
    pub async fn get_margin(&self, request: &MarginRequest) -> Result<MarginResponse> {
        self.post(MARGIN_PATH, request).await
    }
}
