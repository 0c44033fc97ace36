use axum::Json;

use crate::{auth::Session, models::SessionResponse};

/// health
///
/// Liveness check for load balancers. Served locally, never forwarded.
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Gateway is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

/// get_session
///
/// Returns the identity decoded from the caller's access token cookie.
/// The `Session` extractor answers 401 when the cookie is absent or invalid.
#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Current session", body = SessionResponse),
        (status = 401, description = "Missing or invalid access token")
    )
)]
pub async fn get_session(session: Session) -> Json<SessionResponse> {
    Json(SessionResponse::from(session))
}
