//! Profile and directory endpoints.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use huddle_core::user::{self, Profile};
use huddle_core::auth;

use crate::api::{bearer_token, empty, AppState, Empty};
use crate::error::ApiError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileQuery {
    pub u_id: i64,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub user: Profile,
}

#[derive(Serialize)]
pub struct UsersAllResponse {
    pub users: Vec<Profile>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetNameRequest {
    pub name_first: String,
    pub name_last: String,
}

#[derive(Deserialize)]
pub struct SetEmailRequest {
    pub email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetHandleRequest {
    pub handle_str: String,
}

pub async fn profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ProfileQuery>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let ws = guard.load()?;
    auth::resolve_token(&ws, &token)?;
    let user = user::user_profile(&ws, query.u_id)?;
    Ok(Json(ProfileResponse { user }))
}

pub async fn all(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UsersAllResponse>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let ws = guard.load()?;
    auth::resolve_token(&ws, &token)?;
    Ok(Json(UsersAllResponse {
        users: user::users_all(&ws),
    }))
}

pub async fn set_name(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SetNameRequest>,
) -> Result<Json<Empty>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    user::set_name(&mut ws, uid, &req.name_first, &req.name_last)?;
    guard.save(&ws)?;
    Ok(empty())
}

pub async fn set_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SetEmailRequest>,
) -> Result<Json<Empty>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    user::set_email(&mut ws, uid, &req.email)?;
    guard.save(&ws)?;
    Ok(empty())
}

pub async fn set_handle(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SetHandleRequest>,
) -> Result<Json<Empty>, ApiError> {
    let token = bearer_token(&headers)?;
    let guard = state.store.lock().await;
    let mut ws = guard.load()?;
    let uid = auth::resolve_token(&ws, &token)?;
    user::set_handle(&mut ws, uid, &req.handle_str)?;
    guard.save(&ws)?;
    Ok(empty())
}
