use crate::churn::ChurnCoordinator;
use crate::config::ServerConfig;
use crate::room::RoomRegistry;
use crate::signaling::{SignalingRelay, availability_handler, ws_handler};
use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builds the coordinator and its tables from the configuration.
pub fn build_coordinator(config: &ServerConfig) -> ChurnCoordinator {
    let relay = SignalingRelay::new();
    let registry = RoomRegistry::new(config.registry_settings(), Arc::new(relay.clone()));
    ChurnCoordinator::new(registry, relay)
}

pub fn router(coordinator: ChurnCoordinator) -> Router {
    // browser clients are served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/websocket", get(ws_handler))
        .route("/initiate", get(availability_handler))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(coordinator)
}

async fn health() -> &'static str {
    "ok"
}
