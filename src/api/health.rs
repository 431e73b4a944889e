use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::api::AppState;

/// `GET /health`
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let mut status = json!({
        "status": "healthy",
        "service": "nostr-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now(),
    });

    status["database"] = match state.store.count().await {
        Ok(events) => json!({ "status": "healthy", "events": events }),
        Err(e) => {
            tracing::warn!("Health check could not reach the database: {}", e);
            json!({ "status": "error" })
        }
    };

    Json(status)
}
