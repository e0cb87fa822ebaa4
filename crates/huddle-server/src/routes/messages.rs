//! Message endpoints.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use huddle_core::auth;
use huddle_core::message;

use crate::api::{bearer_token, empty, now, AppState, Empty};
use crate::error::ApiError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub channel_id: i64,
    pub message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendDmRequest {
    pub dm_id: i64,
    pub message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub message_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    pub message_id: i64,
    pub message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageQuery {
    pub message_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub og_message_id: i64,
    pub message: String,
    pub channel_id: i64,
    pub dm_id: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub share_message_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactRequest {
    pub message_id: i64,
    pub react_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendLaterRequest {
    pub channel_id: i64,
    pub message: String,
    pub time_sent: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendLaterDmRequest {
    pub dm_id: i64,
    pub message: String,
    pub time_sent: i64,
}

pub async fn send(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SendRequest>,
) -> Result<Json<SendResponse>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    let message_id = message::channel_send(&mut ws, uid, req.channel_id, &req.message, now())?;
    guard.save(&ws)?;
    Ok(Json(SendResponse { message_id }))
}

pub async fn send_dm(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SendDmRequest>,
) -> Result<Json<SendResponse>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    let message_id = message::dm_send(&mut ws, uid, req.dm_id, &req.message, now())?;
    guard.save(&ws)?;
    Ok(Json(SendResponse { message_id }))
}

pub async fn edit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<EditRequest>,
) -> Result<Json<Empty>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    message::edit(&mut ws, uid, req.message_id, &req.message, now())?;
    guard.save(&ws)?;
    Ok(empty())
}

pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MessageQuery>,
) -> Result<Json<Empty>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    message::remove(&mut ws, uid, query.message_id, now())?;
    guard.save(&ws)?;
    Ok(empty())
}

pub async fn share(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ShareRequest>,
) -> Result<Json<ShareResponse>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    let share_message_id = message::share(
        &mut ws,
        uid,
        req.og_message_id,
        &req.message,
        req.channel_id,
        req.dm_id,
        now(),
    )?;
    guard.save(&ws)?;
    Ok(Json(ShareResponse { share_message_id }))
}

pub async fn react(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ReactRequest>,
) -> Result<Json<Empty>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    message::react(&mut ws, uid, req.message_id, req.react_id)?;
    guard.save(&ws)?;
    Ok(empty())
}

pub async fn unreact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ReactRequest>,
) -> Result<Json<Empty>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    message::unreact(&mut ws, uid, req.message_id, req.react_id)?;
    guard.save(&ws)?;
    Ok(empty())
}

pub async fn pin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<MessageQuery>,
) -> Result<Json<Empty>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    message::pin(&mut ws, uid, req.message_id)?;
    guard.save(&ws)?;
    Ok(empty())
}

pub async fn unpin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<MessageQuery>,
) -> Result<Json<Empty>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    message::unpin(&mut ws, uid, req.message_id)?;
    guard.save(&ws)?;
    Ok(empty())
}

/// Validate and mint now; the record is created when the timer fires.
pub async fn send_later(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SendLaterRequest>,
) -> Result<Json<SendResponse>, ApiError> {
    let token = bearer_token(&headers)?;
    let pending = {
        let guard = state.store.lock().await;
        let mut ws = guard.load()?;
        let uid = auth::resolve_token(&ws, &token)?;
        let pending = message::channel_send_later(
            &mut ws,
            uid,
            req.channel_id,
            &req.message,
            req.time_sent,
            now(),
        )?;
        guard.save(&ws)?;
        pending
    };
    let message_id = pending.message_id;
    state.scheduler.schedule_send(pending).await;
    Ok(Json(SendResponse { message_id }))
}

pub async fn send_later_dm(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SendLaterDmRequest>,
) -> Result<Json<SendResponse>, ApiError> {
    let token = bearer_token(&headers)?;
    let pending = {
        let guard = state.store.lock().await;
        let mut ws = guard.load()?;
        let uid = auth::resolve_token(&ws, &token)?;
        let pending = message::dm_send_later(
            &mut ws,
            uid,
            req.dm_id,
            &req.message,
            req.time_sent,
            now(),
        )?;
        guard.save(&ws)?;
        pending
    };
    let message_id = pending.message_id;
    state.scheduler.schedule_send(pending).await;
    Ok(Json(SendResponse { message_id }))
}
