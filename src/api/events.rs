//! Publishing endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::nostr::BroadcastResult;

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub tags: Value,
}

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: BroadcastResult,
}

/// `POST /event`: build a text note from `content` and `tags`, sign it and
/// broadcast it to every relay.
pub async fn publish_event(
    State(state): State<AppState>,
    payload: Result<Json<PublishRequest>, JsonRejection>,
) -> Result<Json<PublishResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let content = note_content(&request.content)
        .ok_or_else(|| ApiError::BadRequest("Content is required".to_string()))?;

    let draft = state.broadcaster.builder().build(&content, &request.tags);
    let result = state.broadcaster.publish(draft).await.map_err(|e| {
        if e.is_client_error() {
            ApiError::BadRequest(e.to_string())
        } else {
            ApiError::internal("Failed to publish event", e, state.production)
        }
    })?;

    Ok(Json(PublishResponse {
        success: true,
        result,
    }))
}

/// Text of a note body. Missing, empty, `false` and `0` count as absent.
fn note_content(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}
