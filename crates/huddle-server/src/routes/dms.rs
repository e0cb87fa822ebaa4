//! Dm endpoints.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use huddle_core::membership::{self, DmDetails, DmSummary};
use huddle_core::message::{self, Paginated};
use huddle_core::auth;

use crate::api::{bearer_token, empty, now, AppState, Empty};
use crate::error::ApiError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub u_ids: Vec<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    pub dm_id: i64,
}

#[derive(Serialize)]
pub struct ListResponse {
    pub dms: Vec<DmSummary>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DmQuery {
    pub dm_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesQuery {
    pub dm_id: i64,
    pub start: i64,
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateRequest>,
) -> Result<Json<CreateResponse>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    let dm_id = membership::dm_create(&mut ws, uid, &req.u_ids, now())?;
    guard.save(&ws)?;
    Ok(Json(CreateResponse { dm_id }))
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListResponse>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    Ok(Json(ListResponse {
        dms: membership::dm_list(&ws, uid),
    }))
}

pub async fn details(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DmQuery>,
) -> Result<Json<DmDetails>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    Ok(Json(membership::dm_details(&ws, uid, query.dm_id)?))
}

pub async fn leave(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<DmQuery>,
) -> Result<Json<Empty>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    membership::dm_leave(&mut ws, uid, req.dm_id, now())?;
    guard.save(&ws)?;
    Ok(empty())
}

pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DmQuery>,
) -> Result<Json<Empty>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    membership::dm_remove(&mut ws, uid, query.dm_id, now())?;
    guard.save(&ws)?;
    Ok(empty())
}

pub async fn messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Paginated>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    Ok(Json(message::dm_messages(&ws, uid, query.dm_id, query.start)?))
}
