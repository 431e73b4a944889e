use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::AppState;
use crate::nostr::RelayStatusEntry;

#[derive(Debug, Serialize)]
pub struct RelaysResponse {
    pub success: bool,
    pub relays: Vec<RelayStatusEntry>,
}

/// `GET /relays`: last known status of every configured relay.
pub async fn list_relays(State(state): State<AppState>) -> Json<RelaysResponse> {
    Json(RelaysResponse {
        success: true,
        relays: state.broadcaster.tracker().list(),
    })
}
