//! API configuration.

use std::time::Duration;

/// Fixed outbound webhook URLs, one per automation hook. Unset means the
/// hook is disabled; a failed call is logged and otherwise ignored.
#[derive(Debug, Clone, Default)]
pub struct WebhookUrls {
    pub user_onboarded: Option<String>,
    pub connection: Option<String>,
    pub payment: Option<String>,
    pub review: Option<String>,
}

impl WebhookUrls {
    fn from_env() -> Self {
        Self {
            user_onboarded: std::env::var("WEBHOOK_USER_ONBOARDED_URL").ok(),
            connection: std::env::var("WEBHOOK_CONNECTION_URL").ok(),
            payment: std::env::var("WEBHOOK_PAYMENT_URL").ok(),
            review: std::env::var("WEBHOOK_REVIEW_URL").ok(),
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second
    pub rate_limit_rps: u32,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Outbound webhook URLs
    pub webhooks: WebhookUrls,
    /// Transactional email API key; absent means log-only mode
    pub email_api_key: Option<String>,
    /// From address for outbound email
    pub email_from: String,
    /// Transactional email API endpoint
    pub email_api_url: String,
    /// Geocoding search API base URL
    pub geocode_base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            request_timeout: Duration::from_secs(30),
            max_body_size: 1024 * 1024, // 1MB; everything here is small JSON
            environment: "development".to_string(),
            webhooks: WebhookUrls::default(),
            email_api_key: None,
            email_from: "Finlink <no-reply@finlink.app>".to_string(),
            email_api_url: "https://api.resend.com/emails".to_string(),
            geocode_base_url: "https://nominatim.openstreetmap.org".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rate_limit_rps),
            request_timeout: Duration::from_secs(
                std::env::var("REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            webhooks: WebhookUrls::from_env(),
            email_api_key: std::env::var("EMAIL_API_KEY").ok().filter(|k| !k.is_empty()),
            email_from: std::env::var("EMAIL_FROM").unwrap_or(defaults.email_from),
            email_api_url: std::env::var("EMAIL_API_URL").unwrap_or(defaults.email_api_url),
            geocode_base_url: std::env::var("GEOCODE_BASE_URL").unwrap_or(defaults.geocode_base_url),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}
