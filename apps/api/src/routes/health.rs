use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::state::AppState;

/// GET /health
/// Reports service version and whether the document store answers.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let (status, storage) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "ok".to_string()),
        Err(e) => {
            warn!("Health check: storage ping failed: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
    };

    (
        status,
        Json(json!({
            "status": if status.is_success() { "ok" } else { "degraded" },
            "version": env!("CARGO_PKG_VERSION"),
            "service": "aider-api",
            "storage": storage,
            "similarity_threshold": state.store.config().similarity_threshold,
        })),
    )
}
