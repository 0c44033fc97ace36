use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Local API Router
///
/// Endpoints the gateway answers itself. They live under `/api`, which the
/// access gate never runs for, so each handler is responsible for its own
/// authentication (see the `Session` extractor).
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // GET /api/health
        .route("/api/health", get(handlers::health))
        // GET /api/session
        // Decoded identity for the current access token cookie; 401 without one.
        .route("/api/session", get(handlers::get_session))
}
