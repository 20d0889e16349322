//! HTTP surface
//!
//! Three routes: account resolution, liveness-backed health, and Prometheus
//! exposition. Resolution always answers 200 with the resolved account,
//! `unavailable` included, because fail-open versus fail-closed is the
//! consuming pipeline's policy decision, not this gateway's.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use duo_resolve::StatusResolver;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use crate::metrics::{record_ping, record_preauth};

/// Shared application state accessible from all handlers
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<StatusResolver>,
    pub prometheus: PrometheusHandle,
    pub started_at: Instant,
    pub requests_total: Arc<AtomicU64>,
}

/// Build the axum router with all routes and shared state.
///
/// The concurrency limit layer enforces the configured cap on simultaneous
/// in-flight requests.
pub fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/v1/preauth/{username}", get(preauth_handler))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

/// JSON error response: {"error":{"message":"...","request_id":"req_..."}}
fn error_response(status: StatusCode, message: &str, request_id: &str) -> Response {
    let body = serde_json::json!({
        "error": {
            "message": message,
            "request_id": request_id,
        }
    });
    (
        status,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response()
}

fn new_request_id() -> String {
    format!("req_{}", uuid::Uuid::new_v4().as_simple())
}

/// Resolve the account status for one username.
pub async fn preauth_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Response {
    let request_id = new_request_id();
    let start = Instant::now();
    state.requests_total.fetch_add(1, Ordering::Relaxed);

    let username = username.trim();
    if username.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "username must not be empty",
            &request_id,
        );
    }

    let account = state.resolver.resolve(username).await;
    let status = account.status.label();
    record_preauth(status, start.elapsed().as_secs_f64());
    info!(
        request_id,
        username,
        status,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "pre-authentication resolved"
    );

    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        serde_json::to_string(&account).unwrap_or_else(|_| "{}".to_string()),
    )
        .into_response()
}

/// Health endpoint: 200 when the provider answers the liveness probe, 503
/// degraded otherwise, with uptime and cache statistics either way.
pub async fn health_handler(State(state): State<AppState>) -> Response {
    let reachable = state.resolver.ping().await;
    record_ping(reachable);

    let uptime = state.started_at.elapsed().as_secs();
    let requests = state.requests_total.load(Ordering::Relaxed);
    let cached = state.resolver.cache().entry_count();

    let (status_code, status_label) = if reachable {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let body = serde_json::json!({
        "status": status_label,
        "provider_reachable": reachable,
        "uptime_seconds": uptime,
        "requests_served": requests,
        "cached_accounts": cached,
    });

    (
        status_code,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response()
}

/// Prometheus metrics endpoint, text exposition format.
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}
