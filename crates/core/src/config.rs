use serde::{Deserialize, Serialize};

/// Default Upstox v2 REST base URL.
pub const DEFAULT_API_URL: &str = "https://api.upstox.com/v2";

/// Redirect URI registered with the Upstox app.
pub const DEFAULT_REDIRECT_URI: &str = "https://127.0.0.2";

/// Contract multiplier for index options.
pub const DEFAULT_LOT_SIZE: u32 = 25;

/// Product code sent with margin requests.
pub const DEFAULT_PRODUCT: &str = "D";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub upstox: UpstoxConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstoxConfig {
    pub api_url: String,
    pub redirect_uri: String,
    pub timeout_secs: u64,
    pub requests_per_minute: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Contracts per lot; premium is quoted price times this.
    pub lot_size: u32,
    /// Exchange segment prepended to the instrument name (`NSE_INDEX|Nifty 50`).
    pub instrument_prefix: String,
    /// Product code sent with margin requests (`D` = delivery/intraday code used by Upstox).
    pub product: String,
    pub output_path: String,
    /// Key=value store holding credentials and the persisted access token.
    pub env_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upstox: UpstoxConfig {
                api_url: DEFAULT_API_URL.to_string(),
                redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
                timeout_secs: 30,
                requests_per_minute: 250,
            },
            report: ReportConfig {
                lot_size: DEFAULT_LOT_SIZE,
                instrument_prefix: "NSE_INDEX".to_string(),
                product: DEFAULT_PRODUCT.to_string(),
                output_path: "option_chain_results.csv".to_string(),
                env_file: ".env".to_string(),
            },
        }
    }
}
