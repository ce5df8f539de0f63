use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Protected API Router
///
/// Every handler here takes `AuthUser`, and the router is additionally wrapped in the
/// session-required middleware in `create_router`.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        // GET /api/me
        // The signed-in user's profile.
        .route("/api/me", get(handlers::get_me))
}
