//! matchgroup_server — standalone REST server for the match-group feature.
//!
//! Reads config from env vars:
//!   DATABASE_URL — Postgres connection string (required)
//!   BIND_ADDR    — listen address (default: 0.0.0.0:4000)

use std::sync::Arc;

use matchgroup_core::{
    ports::{SessionStore, UserStore},
    service::MatchGroupService,
};
use matchgroup_postgres::PgStores;
use matchgroup_server::router::build_router;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,matchgroup_server=debug".into()),
        )
        .init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:4000".into());

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .expect("failed to connect to database");
    tracing::info!("Connected to database");

    let stores = PgStores::new(pool);
    let sessions: Arc<dyn SessionStore> = Arc::new(stores.sessions);
    let users: Arc<dyn UserStore> = Arc::new(stores.users);
    let service = Arc::new(MatchGroupService::new(
        Arc::clone(&users),
        Arc::new(stores.match_groups),
    ));

    let app = build_router(service, sessions, users);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind to {bind_addr}: {e}"));
    tracing::info!("matchgroup_server listening on {bind_addr}");

    axum::serve(listener, app).await.expect("server error");
}
