use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use rust_decimal::Decimal;
use tower::ServiceExt;

use stratus::config::AppConfig;
use stratus::execution::strategy::{Strategy, StrategyError};
use stratus::models::{BotState, TradeDecision};
use stratus::services::notifier::{AlertError, AlertTransport};
use stratus::AppState;

/// Config for tests: short timeouts, no auth unless a token is given.
#[allow(dead_code)]
pub fn test_config(api_token: Option<&str>) -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        api_token: api_token.map(str::to_string),
        max_daily_losses: 3,
        alert_timeout_secs: 1,
        ..AppConfig::default()
    }
}

#[allow(dead_code)]
pub fn build_state(config: AppConfig, transport: Arc<dyn AlertTransport>) -> AppState {
    AppState::new(config, transport, stratus::metrics::detached_handle())
}

/// Records every alert it is asked to deliver.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl RecordingTransport {
    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Poll until `count` alerts have arrived or a second has passed.
    pub async fn wait_for(&self, count: usize) -> Vec<String> {
        for _ in 0..100 {
            if self.sent.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.messages()
    }
}

#[async_trait]
impl AlertTransport for RecordingTransport {
    async fn send(&self, message: &str) -> Result<(), AlertError> {
        self.sent.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

/// Endpoint that is always down.
#[allow(dead_code)]
#[derive(Default)]
pub struct FailingTransport {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl AlertTransport for FailingTransport {
    async fn send(&self, _message: &str) -> Result<(), AlertError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AlertError::Transport("connection refused".into()))
    }
}

/// What a scripted strategy does on one call.
#[allow(dead_code)]
pub enum Step {
    Decide(Vec<TradeDecision>),
    Fail,
    Panic,
    Hang,
}

/// Strategy that replays a fixed script, then returns no decisions.
#[allow(dead_code)]
#[derive(Default)]
pub struct ScriptedStrategy {
    steps: Mutex<VecDeque<Step>>,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedStrategy {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Strategy for ScriptedStrategy {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn scan(&self, _snapshot: &BotState) -> Result<Vec<TradeDecision>, StrategyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            None => Ok(Vec::new()),
            Some(Step::Decide(decisions)) => Ok(decisions),
            Some(Step::Fail) => Err(StrategyError::MarketData("exchange unreachable".into())),
            Some(Step::Panic) => panic!("strategy bug"),
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
        }
    }
}

#[allow(dead_code)]
pub fn losing_close(trade_id: uuid::Uuid) -> TradeDecision {
    TradeDecision::Close {
        trade_id,
        exit_price: Decimal::from(90),
    }
}

/// Send a request through the router and decode the JSON body.
#[allow(dead_code)]
pub async fn call(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }

    let resp = app
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}
