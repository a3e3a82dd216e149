use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

/// Health check endpoint
///
/// Returns the health status of the server and the key-value store.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let store_status = match state.users.store().ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::error!("Store health check failed: {:?}", e);
            "disconnected"
        }
    };

    Json(json!({
        "status": if store_status == "connected" { "healthy" } else { "unhealthy" },
        "store": store_status,
        "backend": state.config.store_backend.to_string(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
