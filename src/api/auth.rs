use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::errors::AppError;
use crate::AppState;

/// Bearer-token authentication middleware.
///
/// If `API_TOKEN` is configured, every request must carry
/// `Authorization: Bearer <token>` matching that value.
/// If it is unset, authentication is disabled (dev mode).
pub async fn require_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(expected) = state.config.api_token.as_deref() else {
        return next.run(req).await;
    };

    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());

    let verdict = match auth_header.and_then(|value| value.strip_prefix("Bearer ")) {
        Some(token) if token == expected => Ok(()),
        Some(_) => Err("invalid token"),
        None => Err("missing or invalid Authorization header"),
    };

    match verdict {
        Ok(()) => next.run(req).await,
        Err(reason) => {
            tracing::warn!(reason, path = %req.uri().path(), "Rejected unauthenticated request");
            AppError::Unauthorized(reason).into_response()
        }
    }
}
