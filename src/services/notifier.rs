use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use serde_json::json;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::execution::risk_manager::RiskViolation;

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("alert endpoint returned {0}")]
    Status(reqwest::StatusCode),

    #[error("alert delivery timed out after {0:?}")]
    TimedOut(Duration),

    #[error("{0}")]
    Transport(String),
}

/// Anything that can push a text message to a human.
#[async_trait]
pub trait AlertTransport: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), AlertError>;
}

/// Telegram Bot API transport.
#[derive(Debug, Clone)]
pub struct TelegramTransport {
    http: reqwest::Client,
    api_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramTransport {
    pub fn new(api_url: String, bot_token: String, chat_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url,
            bot_token,
            chat_id,
        }
    }
}

#[async_trait]
impl AlertTransport for TelegramTransport {
    async fn send(&self, message: &str) -> Result<(), AlertError> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.api_url.trim_end_matches('/'),
            self.bot_token
        );

        let body = json!({
            "chat_id": self.chat_id,
            "text": message,
        });

        let resp = self.http.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(AlertError::Status(resp.status()));
        }
        Ok(())
    }
}

/// Used when no Telegram credentials are configured: alerts only hit the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl AlertTransport for LogTransport {
    async fn send(&self, message: &str) -> Result<(), AlertError> {
        tracing::info!(alert = %message, "Alert (no transport configured)");
        Ok(())
    }
}

/// Fire-and-forget alert queue. `notify` never waits on delivery; a single
/// background worker drains the queue and sends each message at most once.
#[derive(Debug, Clone)]
pub struct AlertDispatcher {
    tx: mpsc::Sender<String>,
}

impl AlertDispatcher {
    /// Spawn the delivery worker on the current tokio runtime.
    pub fn spawn(transport: Arc<dyn AlertTransport>, capacity: usize, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        tokio::spawn(run_alert_worker(rx, transport, timeout));
        Self { tx }
    }

    /// Queue an alert. Drops it with a warning if the queue is full or the
    /// worker is gone.
    pub fn notify(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(alert = %message, "Queueing alert");

        match self.tx.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(message)) => {
                counter!("alerts_dropped_total").increment(1);
                tracing::warn!(alert = %message, "Alert queue full, dropping alert");
            }
            Err(TrySendError::Closed(message)) => {
                counter!("alerts_dropped_total").increment(1);
                tracing::warn!(alert = %message, "Alert worker stopped, dropping alert");
            }
        }
    }
}

/// Single delivery attempt bounded by `timeout`.
pub async fn deliver(
    transport: &dyn AlertTransport,
    message: &str,
    timeout: Duration,
) -> Result<(), AlertError> {
    match tokio::time::timeout(timeout, transport.send(message)).await {
        Ok(result) => result,
        Err(_) => Err(AlertError::TimedOut(timeout)),
    }
}

async fn run_alert_worker(
    mut rx: mpsc::Receiver<String>,
    transport: Arc<dyn AlertTransport>,
    timeout: Duration,
) {
    tracing::debug!("Alert worker started");

    while let Some(message) = rx.recv().await {
        match deliver(transport.as_ref(), &message, timeout).await {
            Ok(()) => {
                counter!("alerts_sent_total").increment(1);
            }
            Err(e) => {
                counter!("alerts_failed_total").increment(1);
                tracing::warn!(error = %e, alert = %message, "Could not send alert");
            }
        }
    }

    tracing::debug!("Alert channel closed, worker exiting");
}

pub fn format_activated() -> String {
    "✅ Bot has been ACTIVATED remotely.".into()
}

pub fn format_deactivated() -> String {
    "🛑 Bot has been DEACTIVATED remotely.".into()
}

/// Format the circuit breaker alert.
pub fn format_circuit_breaker(violation: &RiskViolation) -> String {
    format!("⚠️ Circuit breaker tripped: {violation}. Bot has been PAUSED.")
}
