//! Standup endpoints.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use huddle_core::auth;
use huddle_core::standup::{self, StandupStarted, StandupStatus};

use crate::api::{bearer_token, empty, now, AppState, Empty};
use crate::error::ApiError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub channel_id: i64,
    pub length: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveQuery {
    pub channel_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub channel_id: i64,
    pub message: String,
}

pub async fn start(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<StartRequest>,
) -> Result<Json<StandupStarted>, ApiError> {
    let token = bearer_token(&headers)?;
    let started = {
        let guard = state.store.lock().await;
        let mut ws = guard.load()?;
        let uid = auth::resolve_token(&ws, &token)?;
        let started = standup::standup_start(&mut ws, uid, req.channel_id, req.length, now())?;
        guard.save(&ws)?;
        started
    };
    state
        .scheduler
        .schedule_standup_finish(req.channel_id, started.time_finish)
        .await;
    Ok(Json(started))
}

pub async fn active(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ActiveQuery>,
) -> Result<Json<StandupStatus>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    Ok(Json(standup::standup_active(&ws, uid, query.channel_id)?))
}

pub async fn send(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SendRequest>,
) -> Result<Json<Empty>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    standup::standup_send(&mut ws, uid, req.channel_id, &req.message)?;
    guard.save(&ws)?;
    Ok(empty())
}
