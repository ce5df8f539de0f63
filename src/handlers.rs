use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    AppState,
    auth::{AuthUser, MaybeUser},
    gate::{AuthStatus, decide_path},
    models::{GateQuery, GateResponse, ResolvedSession, SessionUser},
    route::RouteGroup,
};

// --- Handlers ---

/// get_session
///
/// [Public Route] Returns the caller's session, or JSON `null` when there is none.
/// App clients poll this to feed their session provider.
#[utoipa::path(
    get,
    path = "/api/auth/get-session",
    responses((status = 200, description = "Current session or null", body = ResolvedSession))
)]
pub async fn get_session(MaybeUser(session): MaybeUser) -> Json<Option<ResolvedSession>> {
    Json(session)
}

/// check_gate
///
/// [Public Route] Evaluates the Access Gate for the caller's session against an app
/// route, using the app route map. The server always knows the session, so the
/// answer is never `pending`.
#[utoipa::path(
    get,
    path = "/api/gate",
    params(GateQuery),
    responses((status = 200, description = "Gate decision", body = GateResponse))
)]
pub async fn check_gate(
    MaybeUser(session): MaybeUser,
    State(state): State<AppState>,
    Query(query): Query<GateQuery>,
) -> Json<GateResponse> {
    let routes = &state.config.app_routes;
    let auth_status = if session.is_some() {
        AuthStatus::Authenticated
    } else {
        AuthStatus::Unauthenticated
    };

    let (group, decision) = decide_path(auth_status, &query.path, routes);

    Json(GateResponse {
        auth_status,
        // The app map has no ungated paths.
        route_group: group.unwrap_or(RouteGroup::Public),
        decision,
        target: decision.target(routes).map(str::to_string),
    })
}

/// get_me
///
/// [Authenticated Route] The signed-in user's profile.
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Profile", body = SessionUser),
        (status = 401, description = "No session")
    )
)]
pub async fn get_me(AuthUser { user, .. }: AuthUser) -> Json<SessionUser> {
    Json(user)
}
