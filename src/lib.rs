pub mod api;
pub mod config;
pub mod control;
pub mod errors;
pub mod execution;
pub mod metrics;
pub mod models;
pub mod services;
pub mod store;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::control::BotController;
use crate::models::BotState;
use crate::services::notifier::{AlertDispatcher, AlertTransport};
use crate::store::StateStore;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: StateStore,
    pub alerts: AlertDispatcher,
    pub controller: BotController,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}

impl AppState {
    /// Fresh paused state, alert worker spawned on the current runtime.
    pub fn new(
        config: AppConfig,
        transport: Arc<dyn AlertTransport>,
        metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    ) -> Self {
        let store = StateStore::new(BotState::default());
        let alerts = AlertDispatcher::spawn(
            transport,
            config.alert_queue_capacity,
            config.alert_timeout(),
        );
        let controller = BotController::new(store.clone(), alerts.clone(), config.risk_limits());

        Self {
            config,
            store,
            alerts,
            controller,
            metrics_handle,
        }
    }
}
