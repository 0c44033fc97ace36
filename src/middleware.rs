use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    AppState,
    auth::{Claims, credential_from_headers},
    gate::GateDecision,
    routes::table::{canonical_path, has_ambiguous_separator, is_gated},
    upstream::IDENTITY_HEADERS,
};

/// access_gate
///
/// Runs the access gate for every gated path and turns its decision into HTTP:
/// `Allow` passes the request on (with the verified identity attached), a
/// redirect becomes a `307` and, when the credential is unusable, a cookie
/// that expires it immediately.
///
/// Only canonical paths are classified. Anything else is first redirected to
/// its canonical form, so the path the gate judged is the path the renderer
/// serves. Ungated paths (API routes, static assets) then go straight through.
pub async fn access_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    // Never trust identity headers coming from the client.
    for name in IDENTITY_HEADERS {
        request.headers_mut().remove(name);
    }

    let path = request.uri().path().to_string();
    if has_ambiguous_separator(&path) {
        tracing::debug!(path, "rejecting path with encoded separator");
        return StatusCode::BAD_REQUEST.into_response();
    }

    let canonical = canonical_path(&path);
    if canonical != path {
        let location = match request.uri().query() {
            Some(query) => format!("{canonical}?{query}"),
            None => canonical,
        };
        tracing::debug!(path, location, "redirecting to canonical path");
        return Redirect::temporary(&location).into_response();
    }

    if !is_gated(&path) {
        return next.run(request).await;
    }

    let credential = credential_from_headers(request.headers(), &state.config.cookie_name);
    let outcome = state.gate.evaluate(&path, credential.as_deref());

    match outcome.decision {
        GateDecision::Allow => {
            if let Some(claims) = &outcome.claims {
                attach_identity(&mut request, claims);
            }
            next.run(request).await
        }
        GateDecision::RedirectTo(location) => {
            tracing::debug!(
                path,
                location,
                reason = ?outcome.reason,
                "redirecting navigation"
            );
            let mut response = Redirect::temporary(&location).into_response();
            if outcome.clear_credential {
                let cookie = expired_cookie(
                    &state.config.cookie_name,
                    state.config.cookie_domain.as_deref(),
                );
                if let Ok(cookie) = HeaderValue::from_str(&cookie) {
                    response.headers_mut().append(header::SET_COOKIE, cookie);
                }
            }
            response
        }
    }
}

fn attach_identity(request: &mut Request, claims: &Claims) {
    let headers = request.headers_mut();
    let values = [
        claims.user_id.as_str(),
        claims.session_id.as_str(),
        claims.user_type.as_str(),
    ];
    for (name, value) in IDENTITY_HEADERS.into_iter().zip(values) {
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(name, value);
        }
    }
}

/// A `Set-Cookie` value that deletes the credential cookie. Path and domain
/// must match the ones it was set with.
pub fn expired_cookie(cookie_name: &str, domain: Option<&str>) -> String {
    let mut cookie =
        format!("{cookie_name}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT");
    if let Some(domain) = domain {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }
    cookie
}
