use log::*;
use sb_common::Secret;

pub const DEFAULT_YANDEX_API_URL: &str = "https://api.partner.market.yandex.ru";
pub const DEFAULT_YANDEX_MARKET_URL: &str = "https://market.yandex.ru/product/";
pub const DEFAULT_OZON_API_URL: &str = "https://api-seller.ozon.ru";
pub const DEFAULT_OZON_MARKET_URL: &str = "https://www.ozon.ru/product/";

/// Credentials and endpoints for the Yandex-style marketplace API.
#[derive(Debug, Clone, Default)]
pub struct YandexConfig {
    pub api_token: Secret<String>,
    pub campaign_id: String,
    pub business_id: String,
    pub base_url: String,
    /// Base URL for public product pages, used to build deep links in
    /// notifications.
    pub market_url: String,
}

/// Credentials and endpoints for the Ozon-style marketplace API.
#[derive(Debug, Clone, Default)]
pub struct OzonConfig {
    pub api_key: Secret<String>,
    pub client_id: String,
    pub base_url: String,
    pub market_url: String,
}

impl YandexConfig {
    pub fn new(api_token: &str, campaign_id: &str, business_id: &str, base_url: &str) -> Self {
        Self {
            api_token: Secret::new(api_token.to_string()),
            campaign_id: campaign_id.to_string(),
            business_id: business_id.to_string(),
            base_url: base_url.to_string(),
            market_url: DEFAULT_YANDEX_MARKET_URL.to_string(),
        }
    }

    /// Loads the Yandex configuration from environment variables. Returns
    /// `None` (with a log entry naming the gap) when any required credential
    /// is missing, so the caller can leave the platform disabled.
    pub fn try_from_env() -> Option<Self> {
        let api_token = require_var("YANDEX_API_TOKEN")?;
        let campaign_id = require_var("YANDEX_CAMPAIGN_ID")?;
        let business_id = require_var("YANDEX_BUSINESS_ID")?;
        let base_url =
            std::env::var("YANDEX_API_URL").unwrap_or_else(|_| DEFAULT_YANDEX_API_URL.to_string());
        let market_url =
            std::env::var("YANDEX_MARKET_URL").unwrap_or_else(|_| DEFAULT_YANDEX_MARKET_URL.to_string());
        Some(Self {
            api_token: Secret::new(api_token),
            campaign_id,
            business_id,
            base_url,
            market_url,
        })
    }
}

impl OzonConfig {
    pub fn new(api_key: &str, client_id: &str, base_url: &str) -> Self {
        Self {
            api_key: Secret::new(api_key.to_string()),
            client_id: client_id.to_string(),
            base_url: base_url.to_string(),
            market_url: DEFAULT_OZON_MARKET_URL.to_string(),
        }
    }

    /// Loads the Ozon configuration from environment variables, or `None` when
    /// a required credential is missing.
    pub fn try_from_env() -> Option<Self> {
        let api_key = require_var("OZON_API_KEY")?;
        let client_id = require_var("OZON_CLIENT_ID")?;
        let base_url = std::env::var("OZON_API_URL").unwrap_or_else(|_| DEFAULT_OZON_API_URL.to_string());
        let market_url =
            std::env::var("OZON_MARKET_URL").unwrap_or_else(|_| DEFAULT_OZON_MARKET_URL.to_string());
        Some(Self { api_key: Secret::new(api_key), client_id, base_url, market_url })
    }
}

fn require_var(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => Some(v),
        _ => {
            warn!("🪛️ {name} is not set. The platform that requires it will stay disabled.");
            None
        },
    }
}
