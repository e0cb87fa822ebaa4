//! Channel endpoints.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use huddle_core::membership::{self, ChannelDetails, ChannelSummary};
use huddle_core::message::{self, Paginated};
use huddle_core::auth;

use crate::api::{bearer_token, empty, now, AppState, Empty};
use crate::error::ApiError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub name: String,
    pub is_public: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    pub channel_id: i64,
}

#[derive(Serialize)]
pub struct ListResponse {
    pub channels: Vec<ChannelSummary>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelQuery {
    pub channel_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelUserRequest {
    pub channel_id: i64,
    pub u_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesQuery {
    pub channel_id: i64,
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
    let channel_id = membership::channels_create(&mut ws, uid, &req.name, req.is_public, now())?;
    guard.save(&ws)?;
    Ok(Json(CreateResponse { channel_id }))
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
        channels: membership::channels_list(&ws, uid),
    }))
}

pub async fn list_all(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListResponse>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let ws = guard.load()?;
    auth::resolve_token(&ws, &token)?;
    Ok(Json(ListResponse {
        channels: membership::channels_list_all(&ws),
    }))
}

pub async fn details(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ChannelQuery>,
) -> Result<Json<ChannelDetails>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    Ok(Json(membership::channel_details(&ws, uid, query.channel_id)?))
}

pub async fn join(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChannelQuery>,
) -> Result<Json<Empty>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    membership::channel_join(&mut ws, uid, req.channel_id, now())?;
    guard.save(&ws)?;
    Ok(empty())
}

pub async fn invite(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChannelUserRequest>,
) -> Result<Json<Empty>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    membership::channel_invite(&mut ws, uid, req.channel_id, req.u_id, now())?;
    guard.save(&ws)?;
    Ok(empty())
}

pub async fn leave(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChannelQuery>,
) -> Result<Json<Empty>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    membership::channel_leave(&mut ws, uid, req.channel_id, now())?;
    guard.save(&ws)?;
    Ok(empty())
}

pub async fn add_owner(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChannelUserRequest>,
) -> Result<Json<Empty>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    membership::channel_add_owner(&mut ws, uid, req.channel_id, req.u_id)?;
    guard.save(&ws)?;
    Ok(empty())
}

pub async fn remove_owner(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChannelUserRequest>,
) -> Result<Json<Empty>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    membership::channel_remove_owner(&mut ws, uid, req.channel_id, req.u_id)?;
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
    Ok(Json(message::channel_messages(
        &ws,
        uid,
        query.channel_id,
        query.start,
    )?))
}
