//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::functions::{create_admin_user, dispatch_notification, send_email};
use crate::handlers::geocode::search as geocode_search;
use crate::handlers::health::{health, ready};
use crate::handlers::messages;
use crate::handlers::notifications;
use crate::handlers::verification;
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;
use crate::ws::{ws_notifications, ws_thread};

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let notification_routes = Router::new()
        .route("/notifications", get(notifications::list))
        .route("/notifications/:id/read", post(notifications::mark_read))
        .route("/notifications/read-all", post(notifications::mark_all_read));

    let message_routes = Router::new()
        .route("/threads/:thread_id/messages", get(messages::list))
        .route("/threads/:thread_id/messages", post(messages::send));

    let misc_routes = Router::new()
        .route("/verification", get(verification::get))
        .route("/geocode", get(geocode_search));

    let rate_limiter = std::sync::Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(notification_routes)
        .merge(message_routes)
        .merge(misc_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter.clone(),
            rate_limit_middleware,
        ));

    // The function endpoints are unauthenticated service entry points;
    // they share the per-IP limiter with the session API.
    let function_routes = Router::new()
        .route("/functions/create-admin-user", post(create_admin_user))
        .route("/functions/notifications", post(dispatch_notification))
        .route("/functions/send-email", post(send_email))
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    let ws_routes = Router::new()
        .route("/ws/notifications", get(ws_notifications))
        .route("/ws/threads/:thread_id", get(ws_thread));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(function_routes)
        .merge(ws_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
