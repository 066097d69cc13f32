//! HTTP router setup.

use crate::handlers;
use crate::middleware::{inject_request_id, relay_key_auth};
use crate::state::AppState;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the application router.
///
/// Relay routes sit behind the relay-key check; `/`, `/health` and
/// `/metrics` are open. Every response carries `x-request-id`.
pub fn create(state: Arc<AppState>) -> Router {
    let relay_routes = Router::new()
        .route("/api/send-eskey", post(handlers::send_eskey))
        .route("/trustline", post(handlers::trustline))
        .route("/claim", post(handlers::claim))
        .route_layer(from_fn_with_state(state.clone(), relay_key_auth));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .merge(relay_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(from_fn(inject_request_id))
        .with_state(state)
}
