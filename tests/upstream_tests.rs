use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use infirmary_gateway::{
    AppConfig, AppState, UpstreamState, create_router,
    upstream::{HttpUpstream, UpstreamError, UpstreamService},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceExt;

/// Spawns a stand-in UI renderer and returns its base URL.
async fn spawn_renderer() -> String {
    let renderer = Router::new()
        .route(
            "/users/home",
            get(|headers: HeaderMap| async move {
                let user = headers
                    .get("x-user-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("anonymous")
                    .to_string();
                let host = headers
                    .get(header::HOST)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                ([("x-rendered-by", "renderer")], format!("home:{user}:{host}"))
            }),
        )
        .route("/dashboard", get(|| async { "privileged dashboard" }))
        .route("/old", get(|| async { Redirect::permanent("/new") }))
        .route("/echo", post(|body: String| async move { body.to_uppercase() }))
        .route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, "nope").into_response() }),
        );

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, renderer).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_forwards_path_headers_and_response() {
    let base = spawn_renderer().await;
    let upstream = HttpUpstream::new(&base).unwrap();

    let request = Request::builder()
        .uri("/users/home?tab=visits")
        .header(header::HOST, "gateway.example")
        .header("x-user-id", "u-7")
        .body(Body::empty())
        .unwrap();

    let response = upstream.forward(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-rendered-by").unwrap(),
        "renderer"
    );
    let text = body_text(response).await;
    assert!(text.starts_with("home:u-7:127.0.0.1:"), "{text}");
}

#[tokio::test]
async fn test_forwards_request_body() {
    let base = spawn_renderer().await;
    let upstream = HttpUpstream::new(&format!("{base}/")).unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/echo")
        .body(Body::from("fever"))
        .unwrap();

    let response = upstream.forward(request).await.unwrap();
    assert_eq!(body_text(response).await, "FEVER");
}

#[tokio::test]
async fn test_upstream_redirects_and_errors_pass_through() {
    let base = spawn_renderer().await;
    let upstream = HttpUpstream::new(&base).unwrap();

    let request = Request::builder().uri("/old").body(Body::empty()).unwrap();
    let response = upstream.forward(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/new");

    let request = Request::builder().uri("/missing").body(Body::empty()).unwrap();
    let response = upstream.forward(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    // Grab a free port, then release it so nothing is listening there.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let upstream = HttpUpstream::new(&format!("http://127.0.0.1:{port}")).unwrap();
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();

    let err = upstream.forward(request).await.unwrap_err();
    assert!(matches!(err, UpstreamError::Unreachable(_)));
    assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
}

#[test]
fn test_invalid_base_url_is_rejected() {
    let result = HttpUpstream::new("not a url");
    assert!(matches!(result, Err(UpstreamError::InvalidBaseUrl(_))));
}

#[test]
fn test_body_too_large_maps_to_413() {
    let response = UpstreamError::BodyTooLarge.into_response();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_dot_segments_cannot_reach_a_privileged_page() {
    let base = spawn_renderer().await;
    let upstream = Arc::new(HttpUpstream::new(&base).unwrap()) as UpstreamState;
    let app = create_router(AppState::new(AppConfig::default(), upstream));

    for path in ["/dashboard", "/api/../dashboard", "/sign-in/../dashboard", "//dashboard"] {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
        let text = body_text(response).await;
        assert!(!text.contains("privileged dashboard"), "{path}");
    }
}
