use std::{env, time::Duration};

use chrono_tz::Tz;
use log::*;
use marketplace_tools::{OzonConfig, YandexConfig};
use sb_common::Secret;

use crate::{errors::BotError, i18n::Locale};

const DEFAULT_DATABASE_URL: &str = "sqlite://shipbot.db";
const DEFAULT_GIFT_THRESHOLD: f64 = 300.0;
const DEFAULT_SUMMARY_HOUR: u32 = 9;
const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Moscow;
const DEFAULT_NEW_ORDER_PERIOD: Duration = Duration::from_secs(300);
const DEFAULT_OVERDUE_PERIOD: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram_token: Secret<String>,
    pub chat_id: i64,
    pub database_url: String,
    /// Orders below this total get a "no gift" notice in the notification.
    pub gift_threshold: f64,
    pub locale: Locale,
    /// Local wall-clock hour at which the daily summary is sent.
    pub summary_hour: u32,
    pub timezone: Tz,
    pub new_order_period: Duration,
    pub overdue_period: Duration,
    pub yandex: Option<YandexConfig>,
    pub ozon: Option<OzonConfig>,
}

impl BotConfig {
    /// Builds the configuration from environment variables. Missing required
    /// values (the chat credentials) and out-of-range numbers are fatal;
    /// everything else falls back to a default with a log entry.
    pub fn from_env() -> Result<Self, BotError> {
        let telegram_token = env::var("TELEGRAM_TOKEN")
            .map(Secret::new)
            .map_err(|_| BotError::ConfigurationError("TELEGRAM_TOKEN is not set".to_string()))?;
        let chat_id = env::var("CHAT_ID")
            .map_err(|_| BotError::ConfigurationError("CHAT_ID is not set".to_string()))?
            .parse::<i64>()
            .map_err(|e| BotError::ConfigurationError(format!("CHAT_ID is not a valid chat id. {e}")))?;
        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| {
            info!("🪛️ DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let gift_threshold = parse_var("GIFT_THRESHOLD", DEFAULT_GIFT_THRESHOLD);
        if gift_threshold < 0.0 {
            return Err(BotError::ConfigurationError("GIFT_THRESHOLD must be non-negative".to_string()));
        }
        let locale = env::var("LOCALE")
            .ok()
            .and_then(|s| {
                s.parse::<Locale>()
                    .map_err(|e| warn!("🪛️ {e}. Falling back to the default locale."))
                    .ok()
            })
            .unwrap_or_default();
        let summary_hour = parse_var("SUMMARY_HOUR", DEFAULT_SUMMARY_HOUR);
        if summary_hour > 23 {
            return Err(BotError::ConfigurationError("SUMMARY_HOUR must be between 0 and 23".to_string()));
        }
        let timezone = env::var("SUMMARY_TIMEZONE")
            .ok()
            .and_then(|s| {
                s.parse::<Tz>()
                    .map_err(|e| warn!("🪛️ Invalid SUMMARY_TIMEZONE: {e}. Using {DEFAULT_TIMEZONE}."))
                    .ok()
            })
            .unwrap_or(DEFAULT_TIMEZONE);
        let new_order_period = Duration::from_secs(parse_var("NEW_ORDER_PERIOD_SECS", 300));
        let overdue_period = Duration::from_secs(parse_var("OVERDUE_PERIOD_SECS", 3600));

        let yandex = if flag_var("YANDEX_ENABLED") {
            let config = YandexConfig::try_from_env();
            if config.is_none() {
                warn!("🪛️ YANDEX_ENABLED is set but the Yandex credentials are incomplete. Disabling the platform.");
            }
            config
        } else {
            None
        };
        let ozon = if flag_var("OZON_ENABLED") {
            let config = OzonConfig::try_from_env();
            if config.is_none() {
                warn!("🪛️ OZON_ENABLED is set but the Ozon credentials are incomplete. Disabling the platform.");
            }
            config
        } else {
            None
        };

        Ok(Self {
            telegram_token,
            chat_id,
            database_url,
            gift_threshold,
            locale,
            summary_hour,
            timezone,
            new_order_period,
            overdue_period,
            yandex,
            ozon,
        })
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            telegram_token: Secret::default(),
            chat_id: 0,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            gift_threshold: DEFAULT_GIFT_THRESHOLD,
            locale: Locale::default(),
            summary_hour: DEFAULT_SUMMARY_HOUR,
            timezone: DEFAULT_TIMEZONE,
            new_order_period: DEFAULT_NEW_ORDER_PERIOD,
            overdue_period: DEFAULT_OVERDUE_PERIOD,
            yandex: None,
            ozon: None,
        }
    }
}

fn parse_var<T: std::str::FromStr + std::fmt::Display + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(s) => s.parse::<T>().unwrap_or_else(|_| {
            warn!("🪛️ {s} is not a valid value for {name}. Using the default, {default}.");
            default
        }),
        Err(_) => default,
    }
}

fn flag_var(name: &str) -> bool {
    env::var(name).map(|s| s == "1" || s.eq_ignore_ascii_case("true")).unwrap_or(false)
}
