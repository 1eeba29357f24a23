//! Route handlers for the webhook server.

pub mod health;
pub mod webhook;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(webhook::receive).options(webhook::preflight))
        .route("/webhook", post(webhook::receive).options(webhook::preflight))
        .route("/health", get(health::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
