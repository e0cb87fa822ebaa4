//! Session endpoints.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use huddle_core::auth::{self, AuthSession};

use crate::api::{bearer_token, empty, now, AppState, Empty};
use crate::error::ApiError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name_first: String,
    pub name_last: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthSession>, ApiError> {
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let session = auth::register(
        &mut ws,
        &req.email,
        &req.password,
        &req.name_first,
        &req.name_last,
        now(),
    )?;
    guard.save(&ws)?;
    Ok(Json(session))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthSession>, ApiError> {
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let session = auth::login(&mut ws, &req.email, &req.password)?;
    guard.save(&ws)?;
    Ok(Json(session))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Empty>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    auth::logout(&mut ws, &token)?;
    guard.save(&ws)?;
    Ok(empty())
}
