// Integration tests: HTTP trigger router driven through tower::ServiceExt
#![cfg(feature = "server")]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use firestore_sync::{
    server, Platform, Record, RecordSink, Result, Snapshot, SnapshotSource, SyncError,
    SyncExecutor,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

struct FixedSource(Option<Value>);

#[async_trait]
impl SnapshotSource for FixedSource {
    async fn fetch_snapshot(&self) -> Result<Option<Snapshot>> {
        match &self.0 {
            Some(body) => Ok(Snapshot::from_json(body.clone())),
            None => Err(SyncError::source_fetch("Realtime Database error: status 500")),
        }
    }
}

#[derive(Default)]
struct CountingSink {
    fail_for: Option<&'static str>,
    writes: Mutex<Vec<String>>,
}

#[async_trait]
impl RecordSink for CountingSink {
    async fn persist_record(&self, record: &Record) -> Result<()> {
        self.writes.lock().unwrap().push(record.variable.clone());
        if self.fail_for == Some(record.variable.as_str()) {
            return Err(SyncError::destination_write(
                &record.variable,
                "Firestore API error: 500 - internal",
            ));
        }
        Ok(())
    }
}

fn app(snapshot: Option<Value>, sink: Arc<CountingSink>, platform: Platform) -> Router {
    let executor = SyncExecutor::new(
        Arc::new(FixedSource(snapshot)),
        sink,
        vec!["A".to_string(), "B".to_string(), "C".to_string()],
    );
    server::router(Arc::new(executor), platform)
}

async fn send(app: Router, method: Method, uri: &str) -> (StatusCode, header::HeaderMap, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::USER_AGENT, "cron-job.org")
        .body(Body::empty())
        .unwrap();
    send_request(app, request).await
}

async fn send_request(
    app: Router,
    request: Request<Body>,
) -> (StatusCode, header::HeaderMap, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body.to_vec())
}

fn json_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn test_get_runs_pass_with_partial_failure() {
    let sink = Arc::new(CountingSink {
        fail_for: Some("C"),
        ..CountingSink::default()
    });
    let app = app(Some(json!({"A": 1, "B": null, "C": 3})), sink.clone(), Platform::Webhook);

    let (status, headers, body) = send(app, Method::GET, "/api/webhook").await;
    let body = json_body(&body);

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Synced 1/3 variables");
    assert_eq!(body["results"][0], json!({"variable": "A", "success": true, "value": 1.0}));
    assert_eq!(body["results"][1], json!({"variable": "B", "success": false, "reason": "missing"}));
    assert_eq!(body["results"][2]["success"], false);
    assert_eq!(body["platform"], "webhook");
    assert_eq!(body["endpoint"], "/api/webhook");
    assert_eq!(body["userAgent"], "cron-job.org");
    assert_eq!(
        headers.get(header::CACHE_CONTROL).unwrap(),
        "no-cache, no-store, must-revalidate"
    );
    assert_eq!(headers.get("x-robots-tag").unwrap(), "noindex");
    assert_eq!(*sink.writes.lock().unwrap(), vec!["A", "C"]);
}

#[tokio::test]
async fn test_post_is_accepted() {
    let sink = Arc::new(CountingSink::default());
    let app = app(Some(json!({"A": 1, "B": 2, "C": 3})), sink, Platform::Netlify);

    let (status, _, body) = send(app, Method::POST, "/.netlify/functions/sync").await;
    let body = json_body(&body);

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["successCount"], 3);
    assert_eq!(body["platform"], "netlify");
}

#[tokio::test]
async fn test_fetch_failure_returns_500() {
    let sink = Arc::new(CountingSink::default());
    let app = app(None, sink.clone(), Platform::Vercel);

    let (status, _, body) = send(app, Method::GET, "/api/sync").await;
    let body = json_body(&body);

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["status"], "fetch_failed");
    assert!(body["error"].as_str().unwrap().contains("status 500"));
    assert_eq!(body["results"], json!([]));
    assert!(sink.writes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_no_data_returns_200() {
    let sink = Arc::new(CountingSink::default());
    let app = app(Some(Value::Null), sink, Platform::Webhook);

    let (status, _, body) = send(app, Method::GET, "/api/sync").await;
    let body = json_body(&body);

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "no data found");
}

#[tokio::test]
async fn test_options_short_circuits() {
    let sink = Arc::new(CountingSink::default());
    let app = app(Some(json!({"A": 1})), sink.clone(), Platform::Webhook);

    let (status, _, body) = send(app, Method::OPTIONS, "/api/webhook").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert!(sink.writes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_other_methods_are_rejected() {
    let sink = Arc::new(CountingSink::default());
    let app = app(Some(json!({"A": 1})), sink.clone(), Platform::Webhook);

    let (status, headers, body) = send(app, Method::DELETE, "/api/webhook").await;
    let body = json_body(&body);

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(headers.get(header::ALLOW).unwrap(), "GET, POST");
    assert_eq!(
        body,
        json!({"success": false, "message": "Method not allowed", "allowedMethods": ["GET", "POST"]})
    );
    assert!(sink.writes.lock().unwrap().is_empty());
}

fn assert_cors_headers(headers: &header::HeaderMap) {
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
        "GET, POST, OPTIONS"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
        "Content-Type, Authorization"
    );
}

#[tokio::test]
async fn test_cors_headers_on_regular_responses() {
    for method in [Method::GET, Method::POST, Method::DELETE] {
        let sink = Arc::new(CountingSink::default());
        let app = app(Some(json!({"A": 1})), sink, Platform::Webhook);
        let request = Request::builder()
            .method(method)
            .uri("/api/sync")
            .header(header::ORIGIN, "https://dashboard.example.com")
            .body(Body::empty())
            .unwrap();

        let (_, headers, _) = send_request(app, request).await;

        assert_cors_headers(&headers);
    }
}

#[tokio::test]
async fn test_cors_preflight() {
    let sink = Arc::new(CountingSink::default());
    let app = app(Some(json!({"A": 1})), sink.clone(), Platform::Webhook);
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/sync")
        .header(header::ORIGIN, "https://dashboard.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();

    let (status, headers, body) = send_request(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert_cors_headers(&headers);
    assert!(sink.writes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_scalar_root_returns_200_with_every_variable_missing() {
    let sink = Arc::new(CountingSink::default());
    let app = app(Some(json!(5)), sink.clone(), Platform::Webhook);

    let (status, _, body) = send(app, Method::GET, "/api/sync").await;
    let body = json_body(&body);

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["message"], "Synced 0/3 variables");
    assert_eq!(body["results"][2], json!({"variable": "C", "success": false, "reason": "missing"}));
    assert!(sink.writes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_falsy_root_returns_no_data() {
    for root in [json!(0), json!(""), json!(false)] {
        let sink = Arc::new(CountingSink::default());
        let app = app(Some(root), sink, Platform::Webhook);

        let (status, _, body) = send(app, Method::GET, "/api/sync").await;
        let body = json_body(&body);

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "no_data");
    }
}

#[tokio::test]
async fn test_health_check() {
    let sink = Arc::new(CountingSink::default());
    let app = app(None, sink, Platform::Webhook);

    let (status, _, body) = send(app, Method::GET, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["status"], "OK");
}
