use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tally_ingestor_core::{
    ShutdownCoordinator, ShutdownState,
    test_utils::{RecordingBlobStore, new_test_ingestor},
};
use tally_ingestor_http::{
    ErrorResponse, FlushResponse, HttpIngestor, IngestResponse, StatusResponse,
};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

struct TestServer {
    router: Router,
    store: Arc<RecordingBlobStore>,
    shutdown: ShutdownCoordinator,
    ingestor: tally_ingestor_core::EventIngestor,
}

fn create_server(max_batch_size: usize) -> TestServer {
    let (ingestor, store) = new_test_ingestor(max_batch_size);
    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    let router = HttpIngestor::new(ingestor.clone(), shutdown.clone()).into_router();

    TestServer {
        router,
        store,
        shutdown,
        ingestor,
    }
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .expect("request");

    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = serde_json::from_slice(&bytes).expect("json body");

    (status, value)
}

fn parse<T: DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).expect("response shape")
}

async fn post_event(router: &Router, event: Value) -> (StatusCode, Value) {
    send(router, Method::POST, "/v1/events", Some(event)).await
}

#[tokio::test]
async fn test_ingest_below_threshold() {
    let server = create_server(3);

    let (status, body) = post_event(&server.router, json!({ "name": "A" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "batchSize": 1, "flushed": null }));
}

#[tokio::test]
async fn test_third_event_triggers_flush() {
    let server = create_server(3);

    post_event(&server.router, json!({ "name": "A" })).await;
    post_event(&server.router, json!({ "name": "B" })).await;
    let (status, body) = post_event(&server.router, json!({ "name": "C" })).await;

    assert_eq!(status, StatusCode::OK);
    let response: IngestResponse = parse(body);
    assert_eq!(response.batch_size, 0);
    let flushed = response.flushed.expect("flush result");
    assert!(flushed.success);
    assert_eq!(flushed.count, 3);
    let key = flushed.key.expect("key");
    assert!(key.starts_with("events/batch-") && key.ends_with(".ndjson"));
    assert_eq!(server.store.puts()[0].key, key);
}

#[tokio::test]
async fn test_missing_name_is_rejected() {
    let server = create_server(3);

    let (status, body) = post_event(&server.router, json!({ "page": "/home" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = parse(body);
    assert!(error.error.contains("name"));
    assert_eq!(server.ingestor.buffer().size(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let server = create_server(3);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/events")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .expect("request");
    let response = server.router.clone().oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let error: ErrorResponse = serde_json::from_slice(&bytes).expect("error body");
    assert!(error.error.starts_with("invalid JSON body"));
}

#[tokio::test]
async fn test_manual_flush_of_empty_buffer() {
    let server = create_server(3);

    let (status, body) = send(&server.router, Method::POST, "/v1/flush", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "success": true, "flushed": 0, "filename": null, "bucket": null })
    );
    assert_eq!(server.store.attempts(), 0);
}

#[tokio::test]
async fn test_manual_flush_uploads_buffer() {
    let server = create_server(10);
    post_event(&server.router, json!({ "name": "A" })).await;
    post_event(&server.router, json!({ "name": "B" })).await;

    let (status, body) = send(&server.router, Method::POST, "/v1/flush", None).await;

    assert_eq!(status, StatusCode::OK);
    let response: FlushResponse = parse(body);
    assert_eq!(response.flushed, 2);
    assert_eq!(response.bucket.as_deref(), Some("test-bucket"));
    assert_eq!(
        response.filename.as_deref(),
        server.store.puts().first().map(|p| p.key.as_str())
    );
}

#[tokio::test]
async fn test_failed_manual_flush_keeps_events() {
    let server = create_server(3);
    post_event(&server.router, json!({ "name": "A" })).await;
    post_event(&server.router, json!({ "name": "B" })).await;
    server.store.set_failing(true);

    let (status, body) = send(&server.router, Method::POST, "/v1/flush", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorResponse = parse(body);
    assert!(error.error.contains("failed to persist 2 events"));

    let (status, body) = send(&server.router, Method::GET, "/v1/status", None).await;
    assert_eq!(status, StatusCode::OK);
    let response: StatusResponse = parse(body);
    assert_eq!(response.batch_size, 2);
}

#[tokio::test]
async fn test_failed_threshold_flush_reports_error() {
    let server = create_server(2);
    server.store.set_failing(true);
    post_event(&server.router, json!({ "name": "A" })).await;

    let (status, _) = post_event(&server.router, json!({ "name": "B" })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(server.ingestor.buffer().size(), 2);
}

#[tokio::test]
async fn test_status() {
    let server = create_server(25);
    post_event(&server.router, json!({ "name": "A" })).await;

    let (status, body) = send(&server.router, Method::GET, "/v1/status", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "batchSize": 1,
            "maxBatchSize": 25,
            "provider": "memory",
            "bucket": "test-bucket",
            "region": "test-region",
            "state": "running"
        })
    );
}

#[tokio::test]
async fn test_shutdown_rejects_requests_and_flushes_once() {
    let server = create_server(10);
    post_event(&server.router, json!({ "name": "A" })).await;
    post_event(&server.router, json!({ "name": "B" })).await;

    server.shutdown.trigger();

    let (status, body) = post_event(&server.router, json!({ "name": "C" })).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let error: ErrorResponse = parse(body);
    assert_eq!(error.error, "ingestor is shutting down");
    let (status, body) = send(&server.router, Method::POST, "/v1/flush", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let error: ErrorResponse = parse(body);
    assert_eq!(error.error, "ingestor is shutting down");

    let (_, body) = send(&server.router, Method::GET, "/v1/status", None).await;
    let response: StatusResponse = parse(body);
    assert_eq!(response.state, "draining");
    assert_eq!(response.batch_size, 2);

    let result = server
        .shutdown
        .finish(server.ingestor.flusher())
        .await
        .expect("final flush");

    assert_eq!(result.count, 2);
    assert_eq!(server.store.attempts(), 1);
    let names: Vec<_> = server
        .store
        .records(0)
        .iter()
        .map(|r| r["name"].clone())
        .collect();
    assert_eq!(names, vec![json!("A"), json!("B")]);
    assert_eq!(server.shutdown.state(), ShutdownState::Stopped);
}
