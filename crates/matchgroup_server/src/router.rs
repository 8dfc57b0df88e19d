//! Router construction for the match-group server.

use std::sync::Arc;

use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Extension, Router,
};
use matchgroup_core::{
    ports::{SessionStore, UserStore},
    service::MatchGroupService,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::session::session_auth;

/// Build the full axum router with all routes and middleware.
pub fn build_router(
    service: Arc<MatchGroupService>,
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserStore>,
) -> Router {
    // Everything under /api/v1 goes through the session guard; the guard
    // itself bypasses POST /api/v1/session.
    let api = Router::new()
        .route("/api/v1/session", post(handlers::session::login))
        .route(
            "/api/v1/match-groups",
            post(handlers::match_groups::create),
        )
        .route(
            "/api/v1/match-groups/:match_group_id",
            get(handlers::match_groups::get),
        )
        .layer(axum_mw::from_fn(session_auth))
        .layer(Extension(sessions))
        .layer(Extension(users));

    // Public routes (no auth)
    let public = Router::new().route("/health", get(handlers::health::health));

    public
        .merge(api)
        .layer(Extension(service))
        .layer(TraceLayer::new_for_http())
}
