use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.store.read_snapshot();
    Json(json!({
        "status": "healthy",
        "is_running": snapshot.is_running(),
    }))
}

/// Fallback for unknown routes.
pub async fn not_found(uri: axum::http::Uri) -> crate::errors::AppError {
    crate::errors::AppError::NotFound(uri.path().to_string())
}
