use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub wallet: WalletConfig,
    pub price_feed: PriceFeedConfig,
    pub autopay: AutoPayConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// "lnbits" or "none"
    pub provider: String,
    pub lnbits_url: String,
    pub lnbits_api_key: Option<String>,
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceFeedConfig {
    pub url: String,
    pub currency: String,
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutoPayConfig {
    pub sats_per_trigger: u64,
    pub recipient: String,
    pub scroll_threshold: f64,
    pub cooldown_secs: u64,
    pub throttle_ms: u64,
    pub history_limit: usize,
    /// No timeout when unset
    pub payment_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    pub tick_rate_ms: u64,
    /// Pixel-equivalent height of one terminal row in the scroll area
    pub row_height_px: u32,
    pub log_dir: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            provider: "lnbits".to_string(),
            lnbits_url: "https://demo.lnbits.com".to_string(),
            lnbits_api_key: None,
            http_timeout_secs: 30,
        }
    }
}

impl Default for PriceFeedConfig {
    fn default() -> Self {
        Self {
            url: "https://api.coingecko.com/api/v3".to_string(),
            currency: "usd".to_string(),
            http_timeout_secs: 10,
        }
    }
}

impl Default for AutoPayConfig {
    fn default() -> Self {
        Self {
            sats_per_trigger: 1,
            recipient: "satoshi@getalby.com".to_string(),
            scroll_threshold: 300.0,
            cooldown_secs: 5,
            throttle_ms: 200,
            history_limit: 10,
            payment_timeout_secs: None,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 100,
            row_height_px: 20,
            log_dir: "logs".to_string(),
        }
    }
}

impl AutoPayConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn payment_timeout(&self) -> Option<Duration> {
        self.payment_timeout_secs.map(Duration::from_secs)
    }
}

/// Parse an env var, falling back to `default` when unset
fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => Ok(value.trim().parse()?),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let wallet = WalletConfig::default();
        let price_feed = PriceFeedConfig::default();
        let autopay = AutoPayConfig::default();
        let ui = UiConfig::default();

        Ok(Self {
            wallet: WalletConfig {
                provider: env::var("WALLET_PROVIDER").unwrap_or(wallet.provider),
                lnbits_url: env::var("LNBITS_URL").unwrap_or(wallet.lnbits_url),
                lnbits_api_key: env::var("LNBITS_API_KEY").ok().filter(|k| !k.trim().is_empty()),
                http_timeout_secs: env_or("WALLET_HTTP_TIMEOUT_SECS", wallet.http_timeout_secs)?,
            },
            price_feed: PriceFeedConfig {
                url: env::var("PRICE_FEED_URL").unwrap_or(price_feed.url),
                currency: env::var("PRICE_FEED_CURRENCY").unwrap_or(price_feed.currency),
                http_timeout_secs: env_or("PRICE_FEED_TIMEOUT_SECS", price_feed.http_timeout_secs)?,
            },
            autopay: AutoPayConfig {
                sats_per_trigger: env_or("AUTOPAY_SATS", autopay.sats_per_trigger)?,
                recipient: env::var("AUTOPAY_RECIPIENT").unwrap_or(autopay.recipient),
                scroll_threshold: env_or("AUTOPAY_SCROLL_THRESHOLD", autopay.scroll_threshold)?,
                cooldown_secs: env_or("AUTOPAY_COOLDOWN_SECS", autopay.cooldown_secs)?,
                throttle_ms: env_or("AUTOPAY_THROTTLE_MS", autopay.throttle_ms)?,
                history_limit: env_or("AUTOPAY_HISTORY_LIMIT", autopay.history_limit)?,
                payment_timeout_secs: match env::var("AUTOPAY_PAYMENT_TIMEOUT_SECS") {
                    Ok(v) if !v.trim().is_empty() => Some(v.trim().parse()?),
                    _ => None,
                },
            },
            ui: UiConfig {
                tick_rate_ms: env_or("UI_TICK_RATE_MS", ui.tick_rate_ms)?,
                row_height_px: env_or("UI_ROW_HEIGHT_PX", ui.row_height_px)?,
                log_dir: env::var("LOG_DIR").unwrap_or(ui.log_dir),
            },
        })
    }
}
