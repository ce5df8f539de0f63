use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// The Access Gate and its collaborators.
pub mod error;
pub mod gate;
pub mod navigator;
pub mod remote;
pub mod route;
pub mod session;

// Server side: session resolution, web proxy, HTTP surface.
pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod proxy;
pub mod repository;
pub mod routes;

use auth::AuthUser;
use routes::{pages, protected, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{GateError, NavigationError};
pub use gate::{AccessGate, AuthStatus, Decision, NavigationState, decide};
pub use repository::{PostgresRepository, RepositoryState};
pub use route::{RouteGroup, RouteMap};

/// ApiDoc
///
/// OpenAPI document for the JSON API, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::get_session, handlers::check_gate, handlers::get_me),
    components(
        schemas(
            models::SessionUser, models::ResolvedSession, models::GateResponse,
            gate::AuthStatus, gate::Decision, route::RouteGroup,
        )
    ),
    tags(
        (name = "route-gate", description = "Session-gated route access")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, cheaply clonable state handed to every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    /// Session store lookups.
    pub repo: RepositoryState,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// require_session
///
/// Route layer for the protected API: extracting `AuthUser` rejects with 401 before
/// the handler runs.
async fn require_session(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the API routers, the gated page fallback, and the observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let pages = pages::page_routes(state.clone());

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            protected::protected_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), require_session)),
        )
        .with_state(state)
        // Everything else is a page request and goes through the web gate.
        .fallback_service(pages);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one HTTP request, tagged with its `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
