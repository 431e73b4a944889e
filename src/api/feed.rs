//! Read endpoints over the event store.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::nostr::Event;

pub const DEFAULT_FEED_LIMIT: u32 = 20;
pub const MAX_FEED_LIMIT: u32 = 500;

#[derive(Debug, Default, Deserialize)]
pub struct FeedParams {
    pub limit: Option<u32>,
    /// Only events with `created_at` strictly below this timestamp.
    pub before: Option<i64>,
}

impl FeedParams {
    fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_FEED_LIMIT).min(MAX_FEED_LIMIT)
    }
}

fn params(query: Result<Query<FeedParams>, QueryRejection>) -> Result<FeedParams, ApiError> {
    query
        .map(|Query(params)| params)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// `GET /feed`
pub async fn get_feed(
    State(state): State<AppState>,
    query: Result<Query<FeedParams>, QueryRejection>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let params = params(query)?;
    let events = state
        .store
        .get_feed(params.limit(), params.before)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch feed", e, state.production))?;
    Ok(Json(events))
}

/// `GET /event/:id`
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    state
        .store
        .get_by_id(&id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch event", e, state.production))?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))
}

/// `GET /event/:id/references`: events whose `e` tags point at `id`.
pub async fn get_references(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<FeedParams>, QueryRejection>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let params = params(query)?;
    let events = state
        .store
        .get_referencing_event(&id, params.limit())
        .await
        .map_err(|e| ApiError::internal("Failed to fetch references", e, state.production))?;
    Ok(Json(events))
}
