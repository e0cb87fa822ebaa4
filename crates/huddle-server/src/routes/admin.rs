//! Admin moderation endpoints.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use huddle_core::auth;

use crate::api::{bearer_token, empty, now, AppState, Empty};
use crate::error::ApiError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveQuery {
    pub u_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequest {
    pub u_id: i64,
    pub permission_id: i64,
}

pub async fn remove_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RemoveQuery>,
) -> Result<Json<Empty>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    huddle_core::admin::remove_user(&mut ws, uid, query.u_id, now())?;
    guard.save(&ws)?;
    Ok(empty())
}

pub async fn change_permission(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PermissionRequest>,
) -> Result<Json<Empty>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    huddle_core::admin::change_permission(&mut ws, uid, req.u_id, req.permission_id)?;
    guard.save(&ws)?;
    Ok(empty())
}
