//! Health, reset, search and notification endpoints.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use huddle_core::model::{Message, Notification};
use huddle_core::{auth, notifications, user};

use crate::api::{bearer_token, empty, AppState, Empty};
use crate::error::ApiError;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub query_str: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub messages: Vec<Message>,
}

#[derive(Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Reset the workspace to its initial state and drop every pending deferred
/// task. Test support.
pub async fn clear(State(state): State<AppState>) -> Result<Json<Empty>, ApiError> {
    state.scheduler.clear_all().await;
    let guard = state.store.lock().await;
    guard.clear()?;
    Ok(empty())
}

pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    let messages = user::search(&ws, uid, &query.query_str)?;
    Ok(Json(SearchResponse { messages }))
}

pub async fn notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<NotificationsResponse>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    Ok(Json(NotificationsResponse {
        notifications: notifications::notifications_get(&ws, uid),
    }))
}
