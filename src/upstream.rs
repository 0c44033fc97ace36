use async_trait::async_trait;
use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Largest request body the gateway will buffer and forward.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Identity headers the gateway sets on forwarded requests. Client-supplied
/// copies are always removed first.
pub const IDENTITY_HEADERS: [&str; 3] = ["x-user-id", "x-session-id", "x-user-type"];

// Connection-scoped headers that must not be relayed across the proxy hop.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// UpstreamError
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream base url `{0}`")]
    InvalidBaseUrl(String),

    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("upstream request failed: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("request body exceeds {MAX_BODY_BYTES} bytes")]
    BodyTooLarge,
}

impl IntoResponse for UpstreamError {
    fn into_response(self) -> Response {
        let status = match self {
            UpstreamError::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_GATEWAY,
        };
        (status, status.canonical_reason().unwrap_or_default()).into_response()
    }
}

/// UpstreamService
///
/// Contract for handing an allowed request to the UI rendering layer. Lets the
/// router run against the real HTTP forwarder in production and an in-memory
/// mock in tests.
#[async_trait]
pub trait UpstreamService: Send + Sync {
    async fn forward(&self, request: Request) -> Result<Response, UpstreamError>;
}

pub type UpstreamState = Arc<dyn UpstreamService>;

/// HttpUpstream
///
/// Relays requests to the UI renderer over HTTP. Redirects are not followed,
/// so any redirect the renderer issues reaches the browser unchanged.
#[derive(Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUpstream {
    pub fn new(base_url: &str) -> Result<Self, UpstreamError> {
        reqwest::Url::parse(base_url)
            .map_err(|_| UpstreamError::InvalidBaseUrl(base_url.to_string()))?;

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(UpstreamError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl UpstreamService for HttpUpstream {
    async fn forward(&self, request: Request) -> Result<Response, UpstreamError> {
        let (parts, body) = request.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = format!("{}{}", self.base_url, path_and_query);

        let body = to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|_| UpstreamError::BodyTooLarge)?;

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);
        headers.remove(header::CONTENT_LENGTH);

        let upstream_response = self
            .client
            .request(parts.method, url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(UpstreamError::Unreachable)?;

        let status = upstream_response.status();
        let mut response_headers = upstream_response.headers().clone();
        strip_hop_by_hop(&mut response_headers);
        response_headers.remove(header::CONTENT_LENGTH);

        let bytes = upstream_response
            .bytes()
            .await
            .map_err(UpstreamError::Unreachable)?;

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        response.headers_mut().extend(response_headers);
        Ok(response)
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// MockUpstream
///
/// Records the path of every forwarded request along with the identity headers
/// it carried, and answers `200 upstream:<path>`.
#[derive(Default)]
pub struct MockUpstream {
    received: Mutex<Vec<ForwardedRequest>>,
}

/// A request as observed by [`MockUpstream`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedRequest {
    pub path: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub user_type: Option<String>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<ForwardedRequest> {
        self.received
            .lock()
            .map(|received| received.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl UpstreamService for MockUpstream {
    async fn forward(&self, request: Request) -> Result<Response, UpstreamError> {
        let header_value = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        let forwarded = ForwardedRequest {
            path: request.uri().path().to_string(),
            user_id: header_value("x-user-id"),
            session_id: header_value("x-session-id"),
            user_type: header_value("x-user-type"),
        };
        let body = format!("upstream:{}", forwarded.path);

        if let Ok(mut received) = self.received.lock() {
            received.push(forwarded);
        }

        Ok((StatusCode::OK, body).into_response())
    }
}

/// forward
///
/// Router fallback: everything without a local handler goes to the upstream.
pub async fn forward(State(upstream): State<UpstreamState>, request: Request) -> Response {
    let path = request.uri().path().to_string();
    match upstream.forward(request).await {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(path, error = %err, "upstream forwarding failed");
            err.into_response()
        }
    }
}
