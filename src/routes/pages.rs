use crate::{AppState, proxy};
use axum::{Router, middleware};
use tower_http::services::ServeDir;

/// Page Router
///
/// Serves the built web app from `static_dir`. Every request first goes through the
/// web proxy gate, which may answer with a redirect instead. Mounted as the fallback
/// of the main router, so any path not claimed by an API route lands here.
pub fn page_routes(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .fallback_service(ServeDir::new(static_dir))
        .layer(middleware::from_fn_with_state(state, proxy::access_gate))
}
