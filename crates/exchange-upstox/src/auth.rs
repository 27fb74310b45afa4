//! OAuth authorization-code exchange for the Upstox API.
//!
//! Upstox issues a one-time `code` after the user logs in through the
//! browser. Exchanging it together with the app's client id and secret
//! yields a bearer access token valid until the end of the trading day.
//!
//! # Security
//!
//! - Secret, code and token are held as [`SecretString`]
//! - `Debug` output never contains them
//!
//! # Example
//!
//! ```ignore
//! use margin_scout_upstox::{UpstoxAuth, UpstoxAuthConfig, UpstoxClientConfig, UpstoxCredentials};
//!
//! let creds = UpstoxCredentials::from_env(&UpstoxAuthConfig::default(), "https://127.0.0.2")?;
//! let auth = UpstoxAuth::new(&UpstoxClientConfig::default())?;
//! let token = auth.exchange_code(&creds).await?;
//! ```

use crate::client::UpstoxClientConfig;
use crate::error::{Result, UpstoxError};
use crate::types::RawTokenResponse;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

/// Token exchange endpoint, relative to the API base URL.
pub const TOKEN_PATH: &str = "/login/authorization/token";

/// Grant type sent with every token exchange.
pub const GRANT_TYPE: &str = "authorization_code";

// =============================================================================
// Configuration
// =============================================================================

/// Names of the environment variables holding credentials.
#[derive(Debug, Clone)]
pub struct UpstoxAuthConfig {
    pub api_key_env: String,
    pub api_secret_env: String,
    pub code_env: String,
    pub access_token_env: String,
}

impl Default for UpstoxAuthConfig {
    fn default() -> Self {
        Self {
            api_key_env: "API_KEY".to_string(),
            api_secret_env: "API_SECRET".to_string(),
            code_env: "CODE".to_string(),
            access_token_env: "ACCESS_TOKEN".to_string(),
        }
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| {
        UpstoxError::Configuration(format!("missing environment variable: {name}"))
    })
}

// =============================================================================
// Credentials
// =============================================================================

/// Client credentials plus the one-time authorization code.
pub struct UpstoxCredentials {
    api_key: String,
    api_secret: SecretString,
    code: SecretString,
    redirect_uri: String,
}

impl std::fmt::Debug for UpstoxCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstoxCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("code", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

impl UpstoxCredentials {
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        code: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: SecretString::from(api_secret.into()),
            code: SecretString::from(code.into()),
            redirect_uri: redirect_uri.into(),
        }
    }

    /// Reads key, secret and code from the environment.
    ///
    /// # Errors
    /// Returns error if any of the variables is missing.
    pub fn from_env(config: &UpstoxAuthConfig, redirect_uri: impl Into<String>) -> Result<Self> {
        let api_key = require_env(&config.api_key_env)?;
        let api_secret = require_env(&config.api_secret_env)?;
        let code = require_env(&config.code_env)?;

        Ok(Self::new(api_key, api_secret, code, redirect_uri))
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    fn form(&self) -> [(&'static str, &str); 5] {
        [
            ("code", self.code.expose_secret()),
            ("client_id", &self.api_key),
            ("client_secret", self.api_secret.expose_secret()),
            ("redirect_uri", &self.redirect_uri),
            ("grant_type", GRANT_TYPE),
        ]
    }
}

// =============================================================================
// Access Token
// =============================================================================

/// Bearer token for authenticated endpoints.
#[derive(Clone)]
pub struct AccessToken(SecretString);

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Reads the token persisted by a previous exchange.
    ///
    /// # Errors
    /// Returns error if the variable is missing or empty.
    pub fn from_env(config: &UpstoxAuthConfig) -> Result<Self> {
        let token = require_env(&config.access_token_env)?;
        if token.trim().is_empty() {
            return Err(UpstoxError::Configuration(format!(
                "{} is empty, run fetch-token first",
                config.access_token_env
            )));
        }
        Ok(Self::new(token))
    }

    /// Raw token value, for persistence only.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// `Authorization` header value.
    #[must_use]
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0.expose_secret())
    }
}

// =============================================================================
// UpstoxAuth
// =============================================================================

/// Performs the authorization-code exchange.
#[derive(Debug)]
pub struct UpstoxAuth {
    http: Client,
    base_url: String,
}

impl UpstoxAuth {
    /// Creates an authenticator sharing the client's base URL and timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &UpstoxClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UpstoxError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    /// Exchanges the authorization code for an access token.
    ///
    /// # Errors
    /// Returns error on HTTP failure, a non-JSON body, or a body without `access_token`.
    pub async fn exchange_code(&self, credentials: &UpstoxCredentials) -> Result<AccessToken> {
        let url = format!("{}{}", self.base_url, TOKEN_PATH);
        tracing::debug!(client_id = credentials.api_key(), "POST {}", url);

        let response = self
            .http
            .post(&url)
            .header("Accept", "application/json")
            .form(&credentials.form())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => UpstoxError::Authentication(text),
                code => UpstoxError::api(code, text),
            });
        }

        let body: RawTokenResponse = response.json().await?;
        let token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| UpstoxError::missing_field("access_token"))?;

        tracing::info!(
            user_id = body.user_id.as_deref().unwrap_or("unknown"),
            "Access token issued"
        );
        Ok(AccessToken::new(token))
    }
}
