use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context};

use crate::execution::risk_manager::RiskLimits;
use crate::execution::scan_loop::ScanLoopConfig;
use crate::services::notifier::DEFAULT_TELEGRAM_API_URL;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Bearer token for `/api/*`. `None` disables auth (dev mode).
    pub api_token: Option<String>,

    // Exchange credentials: optional, only presence is checked
    pub exchange_api_key: Option<String>,
    pub exchange_api_secret: Option<String>,

    // Strategy / risk
    pub max_daily_losses: u32,
    pub scan_interval_secs: u64,
    pub idle_interval_secs: u64,

    // Notifications
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub telegram_api_url: String,
    pub notifications_enabled: bool,
    pub alert_timeout_secs: u64,
    pub alert_queue_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5001,
            api_token: None,
            exchange_api_key: None,
            exchange_api_secret: None,
            max_daily_losses: 3,
            scan_interval_secs: 15,
            idle_interval_secs: 5,
            telegram_bot_token: None,
            telegram_chat_id: None,
            telegram_api_url: DEFAULT_TELEGRAM_API_URL.into(),
            notifications_enabled: true,
            alert_timeout_secs: 5,
            alert_queue_capacity: 64,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key/value source. Missing keys take their defaults,
    /// empty values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let config = Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or(&get, "PORT", defaults.port)?,
            api_token: get("API_TOKEN"),

            exchange_api_key: get("API_KEY"),
            exchange_api_secret: get("API_SECRET"),

            max_daily_losses: parse_or(&get, "MAX_DAILY_LOSSES", defaults.max_daily_losses)?,
            scan_interval_secs: parse_or(&get, "SCAN_INTERVAL_SECS", defaults.scan_interval_secs)?,
            idle_interval_secs: parse_or(&get, "IDLE_INTERVAL_SECS", defaults.idle_interval_secs)?,

            telegram_bot_token: get("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: get("TELEGRAM_CHAT_ID"),
            telegram_api_url: get("TELEGRAM_API_URL").unwrap_or(defaults.telegram_api_url),
            notifications_enabled: parse_or(
                &get,
                "NOTIFICATIONS_ENABLED",
                defaults.notifications_enabled,
            )?,
            alert_timeout_secs: parse_or(&get, "ALERT_TIMEOUT_SECS", defaults.alert_timeout_secs)?,
            alert_queue_capacity: parse_or(
                &get,
                "ALERT_QUEUE_CAPACITY",
                defaults.alert_queue_capacity,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.max_daily_losses == 0 {
            bail!("MAX_DAILY_LOSSES must be at least 1");
        }
        if self.scan_interval_secs == 0 || self.idle_interval_secs == 0 {
            bail!("SCAN_INTERVAL_SECS and IDLE_INTERVAL_SECS must be positive");
        }
        if self.alert_timeout_secs == 0 {
            bail!("ALERT_TIMEOUT_SECS must be positive");
        }
        if self.alert_queue_capacity == 0 {
            bail!("ALERT_QUEUE_CAPACITY must be positive");
        }
        Ok(())
    }

    /// Bot token and chat id, when notifications are on and both are set.
    pub fn telegram_credentials(&self) -> Option<(&str, &str)> {
        if !self.notifications_enabled {
            return None;
        }
        match (&self.telegram_bot_token, &self.telegram_chat_id) {
            (Some(token), Some(chat_id)) => Some((token, chat_id)),
            _ => None,
        }
    }

    /// Returns true if both exchange API credentials are configured.
    pub fn has_exchange_auth(&self) -> bool {
        self.exchange_api_key.is_some() && self.exchange_api_secret.is_some()
    }

    pub fn risk_limits(&self) -> RiskLimits {
        RiskLimits {
            max_daily_losses: self.max_daily_losses,
        }
    }

    pub fn scan_loop(&self) -> ScanLoopConfig {
        ScanLoopConfig {
            scan_interval: Duration::from_secs(self.scan_interval_secs),
            idle_interval: Duration::from_secs(self.idle_interval_secs),
            risk_limits: self.risk_limits(),
        }
    }

    pub fn alert_timeout(&self) -> Duration {
        Duration::from_secs(self.alert_timeout_secs)
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}
