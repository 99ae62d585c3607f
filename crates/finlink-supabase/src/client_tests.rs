//! Tests for the Supabase client and repos.

use std::time::Duration;

use serde_json::json;
use serial_test::serial;
use wiremock::matchers::{body_partial_json, header, headers, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use finlink_models::{Notification, NotificationPayload, ProfileId};

use crate::auth_admin::AuthAdminClient;
use crate::client::{SupabaseClient, SupabaseConfig};
use crate::error::SupabaseError;
use crate::repos::{NotificationRepo, UserRoleRepo};
use crate::retry::RetryConfig;

// =============================================================================
// Test Helpers
// =============================================================================

fn test_config(base_url: &str) -> SupabaseConfig {
    SupabaseConfig {
        url: base_url.trim_end_matches('/').to_string(),
        service_role_key: "service-key".to_string(),
        timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        retry: RetryConfig {
            max_retries: 2,
            base_delay_ms: 1,
            max_delay_ms: 5,
        },
    }
}

fn test_client(server: &MockServer) -> SupabaseClient {
    SupabaseClient::new(test_config(&server.uri())).unwrap()
}

// =============================================================================
// Error Type Tests
// =============================================================================

#[test]
fn test_error_from_http_status_429() {
    let err = SupabaseError::from_http_status_with_retry(429, "rate limited", Some(1500));
    assert!(matches!(err, SupabaseError::RateLimited(1500)));
    assert!(err.is_retryable());
}

#[test]
fn test_error_from_http_status_500() {
    let err = SupabaseError::from_http_status(500, "internal error");
    assert!(matches!(err, SupabaseError::ServerError(500, _)));
    assert!(err.is_retryable());
}

#[test]
fn test_error_from_http_status_401() {
    let err = SupabaseError::from_http_status(401, "bad key");
    assert!(matches!(err, SupabaseError::AuthError(_)));
    assert!(!err.is_retryable());
}

#[test]
fn test_error_from_http_status_404() {
    let err = SupabaseError::from_http_status(404, "not found");
    assert!(matches!(err, SupabaseError::NotFound(_)));
    assert!(!err.is_retryable());
}

#[test]
fn test_error_from_http_status_409_and_422_are_conflicts() {
    assert!(matches!(
        SupabaseError::from_http_status(409, "dup"),
        SupabaseError::Conflict(_)
    ));
    assert!(matches!(
        SupabaseError::from_http_status(422, "registered"),
        SupabaseError::Conflict(_)
    ));
}

#[test]
fn test_error_http_status_getter() {
    assert_eq!(SupabaseError::RateLimited(1000).http_status(), Some(429));
    assert_eq!(
        SupabaseError::ServerError(502, "bad gateway".into()).http_status(),
        Some(502)
    );
    assert_eq!(
        SupabaseError::NotFound("row".into()).http_status(),
        Some(404)
    );
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
#[serial]
fn test_config_requires_url() {
    std::env::remove_var("SUPABASE_URL");
    std::env::remove_var("SUPABASE_SERVICE_ROLE_KEY");
    assert!(matches!(
        SupabaseConfig::from_env(),
        Err(SupabaseError::AuthError(_))
    ));
}

#[test]
#[serial]
fn test_config_from_env_trims_trailing_slash() {
    std::env::set_var("SUPABASE_URL", "https://proj.supabase.co/");
    std::env::set_var("SUPABASE_SERVICE_ROLE_KEY", "key");
    let config = SupabaseConfig::from_env().unwrap();
    assert_eq!(config.url, "https://proj.supabase.co");
    std::env::remove_var("SUPABASE_URL");
    std::env::remove_var("SUPABASE_SERVICE_ROLE_KEY");
}

// =============================================================================
// Client Tests (wiremock)
// =============================================================================

#[tokio::test]
async fn test_select_sends_auth_headers_and_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/notifications"))
        .and(header("apikey", "service-key"))
        .and(header("authorization", "Bearer service-key"))
        .and(query_param("recipient_profile_id", "eq.p1"))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let repo = NotificationRepo::new(test_client(&server));
    let rows = repo.list_recent(&ProfileId::from_string("p1")).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_insert_returns_representation() {
    let server = MockServer::start().await;
    let notification = Notification::for_recipient(
        ProfileId::from_string("p1"),
        NotificationPayload::NewMessage {
            connection_request_id: finlink_models::ConnectionRequestId::from_string("c1"),
            sender_name: "Alice".to_string(),
        },
    );

    Mock::given(method("POST"))
        .and(path("/rest/v1/notifications"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(json!({
            "type": "new_message",
            "title": "New Message",
            "recipient_profile_id": "p1",
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([serde_json::to_value(&notification).unwrap()])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let repo = NotificationRepo::new(test_client(&server));
    let inserted = repo.insert(&notification).await.unwrap();
    assert_eq!(inserted.id, notification.id);
    assert_eq!(inserted.title, "New Message");
}

#[tokio::test]
async fn test_update_mark_all_read_filters_unread_only() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/notifications"))
        .and(query_param("recipient_profile_id", "eq.p1"))
        .and(query_param("is_read", "eq.false"))
        .and(body_partial_json(json!({ "is_read": true })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let repo = NotificationRepo::new(test_client(&server));
    repo.mark_all_read(&ProfileId::from_string("p1")).await.unwrap();
}

#[tokio::test]
async fn test_server_error_is_retried_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/notifications"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let repo = NotificationRepo::new(test_client(&server));
    let rows = repo.list_recent(&ProfileId::from_string("p1")).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_grant_role_ignores_duplicates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/user_roles"))
        // wiremock splits comma-separated header values, so the two
        // Prefer directives must be matched as a multi-valued header.
        .and(headers(
            "prefer",
            vec!["resolution=ignore-duplicates", "return=representation"],
        ))
        // Duplicate grant: PostgREST returns an empty set.
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let repo = UserRoleRepo::new(test_client(&server));
    repo.grant("auth-1", "admin").await.unwrap();
}

// =============================================================================
// GoTrue Admin Tests
// =============================================================================

#[tokio::test]
async fn test_create_or_find_user_creates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/admin/users"))
        .and(body_partial_json(json!({
            "email": "admin@example.com",
            "email_confirm": true,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "auth-9",
            "email": "admin@example.com",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let admin = AuthAdminClient::new(test_client(&server));
    let user = admin
        .create_or_find_user("admin@example.com", "hunter22")
        .await
        .unwrap();
    assert_eq!(user.id, "auth-9");
}

#[tokio::test]
async fn test_create_or_find_user_resolves_conflict_to_existing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/admin/users"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({
                "msg": "A user with this email address has already been registered"
            })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [
                { "id": "auth-1", "email": "other@example.com" },
                { "id": "auth-2", "email": "Admin@Example.com" },
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let admin = AuthAdminClient::new(test_client(&server));
    let user = admin
        .create_or_find_user("admin@example.com", "hunter22")
        .await
        .unwrap();
    assert_eq!(user.id, "auth-2");
}

#[tokio::test]
async fn test_create_or_find_user_scans_past_first_page() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/admin/users"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({
                "msg": "A user with this email address has already been registered"
            })),
        )
        .expect(1)
        .mount(&server)
        .await;

    // A full first page without the address forces a second fetch.
    let page_one: Vec<_> = (0..200)
        .map(|i| json!({ "id": format!("auth-{i}"), "email": format!("user{i}@example.com") }))
        .collect();
    Mock::given(method("GET"))
        .and(path("/auth/v1/admin/users"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "users": page_one })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/admin/users"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{ "id": "auth-far", "email": "admin@example.com" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let admin = AuthAdminClient::new(test_client(&server));
    let user = admin
        .create_or_find_user("admin@example.com", "hunter22")
        .await
        .unwrap();
    assert_eq!(user.id, "auth-far");
}
