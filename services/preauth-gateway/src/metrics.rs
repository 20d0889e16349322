//! Prometheus metrics exposition
//!
//! Gateway-level metrics:
//!
//! - `preauth_requests_total` (counter): label `status` (resolved account status)
//! - `preauth_request_duration_seconds` (histogram): label `status`
//! - `preauth_ping_total` (counter): label `result`
//!
//! The resolution crate additionally emits `preauth_cache_hits_total`,
//! `preauth_cache_misses_total`, and `preauth_provider_unavailable_total`.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
///
/// Configures `preauth_request_duration_seconds` with explicit buckets so it
/// renders as a histogram (with `_bucket` lines for `histogram_quantile()`
/// queries) rather than the default summary. The range covers a cache hit
/// (sub-millisecond) through a slow provider round-trip at the transport
/// timeout ceiling.
pub fn install_recorder() -> PrometheusHandle {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            metrics_exporter_prometheus::Matcher::Full(
                "preauth_request_duration_seconds".to_string(),
            ),
            &[
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
            ],
        )
        .expect("failed to set histogram buckets")
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

/// Record a completed resolution request with the resolved status as label.
pub fn record_preauth(status: &str, duration_secs: f64) {
    metrics::counter!("preauth_requests_total", "status" => status.to_string()).increment(1);
    metrics::histogram!("preauth_request_duration_seconds", "status" => status.to_string())
        .record(duration_secs);
}

/// Record the outcome of a liveness probe.
pub fn record_ping(reachable: bool) {
    let result = if reachable { "ok" } else { "unreachable" };
    metrics::counter!("preauth_ping_total", "result" => result).increment(1);
}
