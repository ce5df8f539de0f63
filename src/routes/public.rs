use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public API Router
///
/// Reachable without a session. None of these routes pass through the web proxy gate:
/// an app client must be able to ask about its session while signed out.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /api/auth/get-session
        // The session provider endpoint polled by app clients. Returns `null` when signed out.
        .route("/api/auth/get-session", get(handlers::get_session))
        // GET /api/gate?path=...
        // Server-side evaluation of the app route map for the caller's session.
        .route("/api/gate", get(handlers::check_gate))
}
