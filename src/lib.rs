use axum::{Router, extract::FromRef, http::HeaderName};
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

// Core gateway components.
pub mod auth;
pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod upstream;

// Route classification tables and the locally served API.
pub mod routes;
use routes::api;

// --- Public Re-exports ---

pub use config::AppConfig;
pub use gate::{AccessGate, GateDecision, GateOutcome, GateState};
pub use upstream::{HttpUpstream, MockUpstream, UpstreamState};

/// ApiDoc
///
/// OpenAPI document for the endpoints the gateway serves itself, published at
/// `/api/openapi.json` with a Swagger UI at `/api/docs`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::health, handlers::get_session),
    components(schemas(models::SessionResponse, auth::UserType, auth::Role)),
    tags(
        (name = "infirmary-gateway", description = "Infirmary access gateway API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Implements the **Unified State Pattern**: one cheap-to-clone container with
/// the gate, the upstream forwarder and the immutable configuration, shared by
/// every request.
#[derive(Clone)]
pub struct AppState {
    /// Access gate holding the credential verifier.
    pub gate: GateState,
    /// Forwarder to the UI rendering layer.
    pub upstream: UpstreamState,
    /// Configuration: loaded once at startup.
    pub config: AppConfig,
}

impl AppState {
    /// Builds the gate from the configured secret and bundles it with the
    /// given upstream.
    pub fn new(config: AppConfig, upstream: UpstreamState) -> Self {
        let verifier = auth::CredentialVerifier::new(&config.jwt_secret);
        Self {
            gate: std::sync::Arc::new(AccessGate::new(verifier)),
            upstream,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for GateState {
    fn from_ref(app_state: &AppState) -> GateState {
        app_state.gate.clone()
    }
}

impl FromRef<AppState> for UpstreamState {
    fn from_ref(app_state: &AppState) -> UpstreamState {
        app_state.upstream.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the gateway: local API and docs, the upstream fallback for every
/// other path, the access gate in front of all of it, and the observability
/// layers outermost.
pub fn create_router(state: AppState) -> Router {
    let gated = Router::new()
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .merge(api::api_routes())
        // Page navigations without a local handler go to the UI renderer.
        .fallback(upstream::forward)
        // Wraps routes and fallback alike; ungated paths are skipped inside.
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::access_gate,
        ))
        .with_state(state);

    with_observability(gated)
}

/// Outermost layers: a request id is minted (or kept) before tracing so the
/// span can carry it, and echoed back on the response.
fn with_observability(router: Router) -> Router {
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(navigation_span)
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(tower_http::LatencyUnit::Millis),
        );

    let correlation = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(
            request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::new(request_id_header));

    router.layer(correlation).layer(
        CorsLayer::new()
            .allow_methods(Any)
            .allow_origin(Any)
            .allow_headers(Any),
    )
}

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Span for one navigation. Path and query are recorded separately so gate
/// logs can be filtered by route without parsing the URI.
fn navigation_span(request: &axum::http::Request<axum::body::Body>) -> Span {
    let uri = request.uri();
    let req_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "navigation",
        method = %request.method(),
        path = uri.path(),
        query = uri.query().unwrap_or_default(),
        gated = routes::table::is_gated(uri.path()),
        req_id,
    )
}
