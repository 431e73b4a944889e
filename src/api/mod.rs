//! HTTP surface of the gateway.
//!
//! - `POST /event` - build, sign and broadcast a text note
//! - `GET /feed` - stored events, newest first (`limit`, `before`)
//! - `GET /event/:id` - one stored event
//! - `GET /event/:id/references` - stored events that reference `:id`
//! - `GET /relays` - per-relay connectivity
//! - `GET /health` - liveness and database status

pub mod error;
pub mod events;
pub mod feed;
pub mod health;
pub mod relays;

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::database::EventStore;
use crate::nostr::EventBroadcaster;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub broadcaster: EventBroadcaster,
    pub store: EventStore,
    /// Hides error details from responses.
    pub production: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/event", post(events::publish_event))
        .route("/event/:id", get(feed::get_event))
        .route("/event/:id/references", get(feed::get_references))
        .route("/feed", get(feed::get_feed))
        .route("/relays", get(relays::list_relays))
        .route("/health", get(health::health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .into_inner(),
        )
        .with_state(state)
}
