// Firestore Sync - HTTP Trigger
//
// Thin translation between HTTP and the sync executor. The three deployed
// endpoints share one handler; the platform only changes the envelope.

use crate::config::Platform;
use crate::sync::{PassStatus, SyncExecutor, SyncReport};
use axum::{
    extract::State,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ALLOW, AUTHORIZATION,
            CACHE_CONTROL, CONTENT_TYPE, USER_AGENT,
        },
        HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri,
    },
    response::{IntoResponse, Json, Response},
    routing::{any, get},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

/// Endpoints that run a sync pass.
pub const SYNC_ENDPOINTS: [&str; 3] = ["/api/sync", "/api/webhook", "/.netlify/functions/sync"];

/// Methods that trigger a pass (OPTIONS is answered without one).
pub const ALLOWED_METHODS: [&str; 2] = ["GET", "POST"];

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    executor: Arc<SyncExecutor>,
    platform: Platform,
}

/// Sync report plus transport metadata.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncResponse {
    #[serde(flatten)]
    report: SyncReport,
    platform: &'static str,
    endpoint: String,
    user_agent: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MethodNotAllowed {
    success: bool,
    message: &'static str,
    allowed_methods: [&'static str; 2],
}

#[derive(Serialize)]
struct HealthResponse {
    success: bool,
    status: &'static str,
    version: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/health - Liveness probe
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        success: true,
        status: "OK",
        version: crate::VERSION,
    })
}

/// ANY /api/sync, /api/webhook, /.netlify/functions/sync - Run one sync pass
async fn trigger_sync(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    if method != Method::GET && method != Method::POST {
        info!(%method, "Method not allowed");
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(ALLOW, HeaderValue::from_static("GET, POST"))],
            Json(MethodNotAllowed {
                success: false,
                message: "Method not allowed",
                allowed_methods: ALLOWED_METHODS,
            }),
        )
            .into_response();
    }

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    info!(%method, endpoint = uri.path(), %user_agent, "Sync triggered");

    let report = state.executor.run_sync_pass().await;
    let status = match report.status {
        PassStatus::FetchFailed => StatusCode::INTERNAL_SERVER_ERROR,
        PassStatus::Completed | PassStatus::NoData => StatusCode::OK,
    };
    info!(success = report.success, status = status.as_u16(), "Sync request finished");

    (
        status,
        Json(SyncResponse {
            report,
            platform: state.platform.as_str(),
            endpoint: uri.path().to_string(),
            user_agent,
        }),
    )
        .into_response()
}

// ============================================================================
// Router
// ============================================================================

/// Build the trigger router with CORS and cache headers applied to every route.
///
/// `CorsLayer` answers preflights; the allow-methods and allow-headers values
/// are also set on regular responses.
pub fn router(executor: Arc<SyncExecutor>, platform: Platform) -> Router {
    let state = AppState { executor, platform };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    let mut app = Router::new().route("/api/health", get(health_check));
    for endpoint in SYNC_ENDPOINTS {
        app = app.route(endpoint, any(trigger_sync));
    }

    app.with_state(state)
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type, Authorization"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-robots-tag"),
            HeaderValue::from_static("noindex"),
        ))
}
