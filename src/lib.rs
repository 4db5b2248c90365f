//! Tradepost console library.
//!
//! Server-rendered web console for the Tradepost products/orders gateway.
//! The binary in `main.rs` wires configuration, error tracking, and the
//! listener around [`app`]; integration tests drive the same router
//! directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod filters;
pub mod gateway;
pub mod idp;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;

use axum::{Router, routing::get};
use tower_http::services::ServeDir;

use state::AppState;

/// Build the console application router.
///
/// Includes the session layer and static file serving; the Sentry tower
/// layers are added by the binary so tests stay free of them.
#[must_use]
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new("static"))
        .layer(session_layer)
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
