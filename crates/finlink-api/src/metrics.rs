//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "finlink_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "finlink_http_request_duration_seconds";

    // WebSocket metrics
    pub const WS_CONNECTIONS_TOTAL: &str = "finlink_ws_connections_total";
    pub const WS_CONNECTIONS_ACTIVE: &str = "finlink_ws_connections_active";
    pub const WS_EVENTS_SENT: &str = "finlink_ws_events_sent_total";

    // Dispatcher metrics
    pub const NOTIFICATIONS_DISPATCHED_TOTAL: &str = "finlink_notifications_dispatched_total";
    pub const WEBHOOK_CALLS_TOTAL: &str = "finlink_webhook_calls_total";
    pub const EMAILS_TOTAL: &str = "finlink_emails_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "finlink_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record WebSocket connection.
pub fn record_ws_connection(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::WS_CONNECTIONS_TOTAL, &labels).increment(1);
}

/// Update active WebSocket connections gauge.
pub fn set_ws_active_connections(count: i64) {
    gauge!(names::WS_CONNECTIONS_ACTIVE).set(count as f64);
}

/// Record an event forwarded over a websocket.
pub fn record_ws_event_sent(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::WS_EVENTS_SENT, &labels).increment(1);
}

/// Record a dispatched notification by event tag.
pub fn record_notification_dispatched(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::NOTIFICATIONS_DISPATCHED_TOTAL, &labels).increment(1);
}

/// Record a webhook call outcome.
pub fn record_webhook_call(hook: &str, ok: bool) {
    let labels = [
        ("hook", hook.to_string()),
        ("outcome", if ok { "ok" } else { "failed" }.to_string()),
    ];
    counter!(names::WEBHOOK_CALLS_TOTAL, &labels).increment(1);
}

/// Record an email send outcome by delivery status.
pub fn record_email(kind: &str, status: &str) {
    let labels = [
        ("kind", kind.to_string()),
        ("status", status.to_string()),
    ];
    counter!(names::EMAILS_TOTAL, &labels).increment(1);
}

/// Record a rate limit hit.
pub fn record_rate_limit_hit(path: &str) {
    let labels = [("path", sanitize_path(path))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Collapse ids out of paths to keep label cardinality bounded.
fn sanitize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.len() >= 16 || segment.chars().any(|c| c.is_ascii_digit()) {
                if segment.is_empty() || segment.chars().all(|c| c.is_ascii_alphabetic()) {
                    segment.to_string()
                } else {
                    ":id".to_string()
                }
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// HTTP metrics middleware.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}
