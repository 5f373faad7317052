// crates/robogate-server/src/lib.rs
// ============================================================================
// Crate: robogate-server
// Description: HTTP/JSON + WebSocket surface over the runtime crate's
//              control loop, registry, and Decision API facade (§6).
// ============================================================================

//! # robogate-server
//!
//! Wires an [`AppState`] — the registry, Decision API facade, and the sim/
//! store/hub collaborators it shares with the control loop — behind an
//! `axum` router. This crate owns no concrete simulator, storage, or hub
//! implementation itself: the caller (`robogate-cli`) constructs those and
//! hands this crate only trait objects, matching the storage-agnostic seam
//! [`robogate_runtime::control_loop::run_control_loop`] is written against.

pub mod errors;
pub mod handlers;
pub mod missions;
pub mod state;
pub mod ws;

use std::net::SocketAddr;

use axum::Router;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;

pub use state::AppState;

/// Builds the complete route table over `state` (§6's endpoint list).
///
/// CORS is left fully open: this process sits behind an operator-trusted
/// network boundary, not behind a browser-facing auth layer of its own.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/missions", post(handlers::create_mission).get(handlers::list_missions))
        .route(
            "/missions/{id}",
            get(handlers::get_mission).patch(handlers::update_mission).delete(handlers::delete_mission),
        )
        .route("/missions/{id}/start", post(handlers::start_mission))
        .route("/missions/{id}/pause", post(handlers::pause_mission))
        .route("/missions/{id}/resume", post(handlers::resume_mission))
        .route("/runs/{id}", get(handlers::get_run))
        .route("/runs/{id}/events", get(handlers::list_events))
        .route("/runs/{id}/stop", post(handlers::stop_run))
        .route("/runs/{id}/path_preview", get(handlers::path_preview))
        .route("/sim/world", get(handlers::get_world))
        .route("/sim/scenario", post(handlers::trigger_scenario))
        .route("/policies", get(handlers::list_policies))
        .route("/policies/test", post(handlers::policy_test))
        .route("/plan/generate", post(handlers::plan_generate))
        .route("/plan/execute", post(handlers::plan_execute))
        .route("/agent/propose", post(handlers::agent_propose))
        .route("/ws/runs/{run_id}", get(ws::run_ws))
        .layer(cors)
        .with_state(state)
}

/// Serves `router` on `addr` until the process is killed.
///
/// # Errors
///
/// Returns an [`std::io::Error`] if `addr` cannot be bound.
pub async fn serve(router: Router, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "robogate-server listening");
    axum::serve(listener, router).await
}
