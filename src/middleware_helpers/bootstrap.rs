use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::AppState;

/// Runs the bootstrap sequence before the first request is handled.
///
/// Once bootstrap is done this only reads an atomic flag. If bootstrap fails
/// the request is answered with 503 and the next request retries.
pub async fn bootstrap_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.bootstrap.is_done() {
        if let Err(e) = state.bootstrap.trigger().await {
            error!(category = e.category(), "Bootstrap before request failed: {}", e);
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "bootstrap_failed",
                    "category": e.category(),
                })),
            )
                .into_response();
        }
    }

    next.run(request).await
}
