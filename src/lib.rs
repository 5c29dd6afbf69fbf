// Public API for integration tests and potential library usage

pub mod arbiter;
pub mod config;
pub mod error;
pub mod game;
pub mod orchestrator;
pub mod protocol;
pub mod relay;
pub mod rng;
pub mod state;
pub mod types;
pub mod ws;

pub use game::{apply_host_action, apply_participant_action, derive_view, DerivedView};

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the HTTP router: WebSocket endpoint plus a health probe
pub fn app(state: Arc<state::AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(|| async { "ok" }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
