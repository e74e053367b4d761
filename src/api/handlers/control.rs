use axum::extract::State;
use axum::Json;

use crate::control::{ControlAck, StatusReport};
use crate::AppState;

/// GET /api/status: Current bot state plus the configured loss limit.
pub async fn status(State(state): State<AppState>) -> Json<StatusReport> {
    Json(state.controller.status())
}

/// POST /api/control/start: Resume scanning. No-op when already running.
pub async fn start(State(state): State<AppState>) -> Json<ControlAck> {
    Json(state.controller.start())
}

/// POST /api/control/stop: Pause scanning. No-op when already paused.
pub async fn stop(State(state): State<AppState>) -> Json<ControlAck> {
    Json(state.controller.stop())
}
