//! HTTP surface: router construction and the shared handler plumbing.
//!
//! Every handler follows the same shape: parse the request, take the single
//! workspace lock, resolve the session, call one engine operation, persist
//! the mutated snapshot, map the result. The lock is held for the whole
//! operation, which gives the single-threaded request processing the engine
//! assumes.

use std::sync::Arc;

use axum::http::{HeaderMap, Method};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use huddle_store::SnapshotStore;

use crate::error::ApiError;
use crate::routes;
use crate::scheduler::Scheduler;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<SnapshotStore>>,
    pub scheduler: Scheduler,
}

impl AppState {
    pub fn new(store: SnapshotStore) -> Self {
        let store = Arc::new(Mutex::new(store));
        let scheduler = Scheduler::new(store.clone());
        Self { store, scheduler }
    }
}

/// Current unix time in seconds.
pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Pull the session token out of the `Authorization: Bearer` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::MissingToken)?;
    let token = auth.strip_prefix("Bearer ").unwrap_or(auth).trim();
    if token.is_empty() {
        return Err(ApiError::MissingToken);
    }
    Ok(token.to_string())
}

/// The empty success body most mutations return.
#[derive(Serialize)]
pub(crate) struct Empty {}

pub(crate) fn empty() -> Json<Empty> {
    Json(Empty {})
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::misc::health_check))
        .route("/clear", delete(routes::misc::clear))
        // -- sessions --
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        // -- users --
        .route("/user/profile", get(routes::users::profile))
        .route("/user/profile/setname", put(routes::users::set_name))
        .route("/user/profile/setemail", put(routes::users::set_email))
        .route("/user/profile/sethandle", put(routes::users::set_handle))
        .route("/users/all", get(routes::users::all))
        .route("/search", get(routes::misc::search))
        .route("/notifications", get(routes::misc::notifications))
        // -- channels --
        .route("/channels/create", post(routes::channels::create))
        .route("/channels/list", get(routes::channels::list))
        .route("/channels/listall", get(routes::channels::list_all))
        .route("/channel/details", get(routes::channels::details))
        .route("/channel/join", post(routes::channels::join))
        .route("/channel/invite", post(routes::channels::invite))
        .route("/channel/leave", post(routes::channels::leave))
        .route("/channel/addowner", post(routes::channels::add_owner))
        .route("/channel/removeowner", post(routes::channels::remove_owner))
        .route("/channel/messages", get(routes::channels::messages))
        // -- messages --
        .route("/message/send", post(routes::messages::send))
        .route("/message/senddm", post(routes::messages::send_dm))
        .route("/message/edit", put(routes::messages::edit))
        .route("/message/remove", delete(routes::messages::remove))
        .route("/message/share", post(routes::messages::share))
        .route("/message/react", post(routes::messages::react))
        .route("/message/unreact", post(routes::messages::unreact))
        .route("/message/pin", post(routes::messages::pin))
        .route("/message/unpin", post(routes::messages::unpin))
        .route("/message/sendlater", post(routes::messages::send_later))
        .route("/message/sendlaterdm", post(routes::messages::send_later_dm))
        // -- dms --
        .route("/dm/create", post(routes::dms::create))
        .route("/dm/list", get(routes::dms::list))
        .route("/dm/details", get(routes::dms::details))
        .route("/dm/leave", post(routes::dms::leave))
        .route("/dm/remove", delete(routes::dms::remove))
        .route("/dm/messages", get(routes::dms::messages))
        // -- standups --
        .route("/standup/start", post(routes::standups::start))
        .route("/standup/active", get(routes::standups::active))
        .route("/standup/send", post(routes::standups::send))
        // -- admin --
        .route("/admin/user/remove", delete(routes::admin::remove_user))
        .route(
            "/admin/userpermission/change",
            post(routes::admin::change_permission),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
