use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    routing::post,
};
use axum_helpers::{RouterOptions, create_router};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(paths())]
struct EmptyDoc;

fn app(options: RouterOptions) -> Router {
    let routes = Router::new()
        .route("/echo", post(|body: String| async move { body }))
        .route(
            "/slow",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
    create_router::<EmptyDoc>(routes, &options).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let response = app(RouterOptions::default())
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], "ROUTE_NOT_FOUND");
}

#[tokio::test]
async fn test_wrong_method_returns_405() {
    let response = app(RouterOptions::default())
        .oneshot(Request::builder().uri("/echo").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_declared_oversized_body_is_rejected_before_handler() {
    let options = RouterOptions {
        body_limit_bytes: 16,
        ..RouterOptions::default()
    };
    let payload = "x".repeat(64);

    let response = app(options)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .header("content-length", payload.len())
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json_body(response).await["error"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn test_small_body_passes_through() {
    let response = app(RouterOptions::default())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .body(Body::from("hi"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
}

#[tokio::test]
async fn test_deadline_bounds_slow_handlers() {
    let options = RouterOptions {
        request_timeout: Duration::from_millis(50),
        ..RouterOptions::default()
    };

    let response = app(options)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/slow")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json_body(response).await["error"], "REQUEST_TIMEOUT");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let response = app(RouterOptions::default())
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(json_body(response).await["openapi"].is_string());
}
