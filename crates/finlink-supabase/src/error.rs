//! Supabase error types.

use thiserror::Error;

/// Result type for Supabase operations.
pub type SupabaseResult<T> = Result<T, SupabaseError>;

/// Errors that can occur talking to PostgREST or GoTrue.
#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Row not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited, retry after {0}ms")]
    RateLimited(u64),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SupabaseError {
    pub fn auth_error(msg: impl Into<String>) -> Self {
        Self::AuthError(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map an HTTP status to an error. `retry_after_ms` comes from the
    /// Retry-After header when the status is 429.
    pub fn from_http_status(status: u16, detail: impl Into<String>) -> Self {
        Self::from_http_status_with_retry(status, detail, None)
    }

    pub fn from_http_status_with_retry(
        status: u16,
        detail: impl Into<String>,
        retry_after_ms: Option<u64>,
    ) -> Self {
        let detail = detail.into();
        match status {
            401 => Self::AuthError(detail),
            403 => Self::PermissionDenied(detail),
            404 => Self::NotFound(detail),
            409 | 422 => Self::Conflict(detail),
            429 => Self::RateLimited(retry_after_ms.unwrap_or(1000)),
            s if s >= 500 => Self::ServerError(s, detail),
            _ => Self::RequestFailed(detail),
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SupabaseError::Network(_)
                | SupabaseError::RateLimited(_)
                | SupabaseError::ServerError(_, _)
        )
    }

    /// HTTP status this error maps back to, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            SupabaseError::AuthError(_) => Some(401),
            SupabaseError::PermissionDenied(_) => Some(403),
            SupabaseError::NotFound(_) => Some(404),
            SupabaseError::Conflict(_) => Some(409),
            SupabaseError::RateLimited(_) => Some(429),
            SupabaseError::ServerError(s, _) => Some(*s),
            _ => None,
        }
    }

    /// Delay hint from a 429 response.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            SupabaseError::RateLimited(ms) => Some(*ms),
            _ => None,
        }
    }
}
