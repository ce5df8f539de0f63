use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    AppState,
    auth::resolve_session,
    gate::{AuthStatus, decide_path},
};

/// access_gate
///
/// Web-side Access Gate. Runs in front of every page request: the session is resolved
/// on the server (so it is never `Unknown` here), the path is classified with the web
/// route map, and a redirect decision becomes a `307 Temporary Redirect` to the target
/// root. Paths the map does not gate pass straight through.
pub async fn access_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let routes = &state.config.web_routes;
    let path = request.uri().path().to_string();

    if routes.group_of(&path).is_none() {
        return next.run(request).await;
    }

    let session = resolve_session(request.headers(), &state.repo, &state.config).await;
    let auth_status = if session.is_some() {
        AuthStatus::Authenticated
    } else {
        AuthStatus::Unauthenticated
    };

    let (_, decision) = decide_path(auth_status, &path, routes);
    match decision.target(routes) {
        Some(target) => {
            tracing::debug!(from = %path, to = %target, ?decision, "web gate redirect");
            Redirect::temporary(target).into_response()
        }
        None => next.run(request).await,
    }
}
