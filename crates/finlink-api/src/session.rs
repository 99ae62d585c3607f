//! Supabase JWT authentication and session resolution.
//!
//! Tokens are HMAC-signed with the project's shared JWT secret, so
//! verification is local. The resolved `Session` carries the caller's
//! profile and is passed explicitly to services; nothing here is process
//! global.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use finlink_models::Profile;

use crate::error::ApiError;
use crate::state::AppState;

/// Audience GoTrue stamps on user access tokens.
const SUPABASE_AUDIENCE: &str = "authenticated";

/// Decoded Supabase access-token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseClaims {
    /// Auth account id
    pub sub: String,
    /// Email (if available)
    pub email: Option<String>,
    /// Audience
    pub aud: String,
    /// Postgres role (usually "authenticated")
    #[serde(default)]
    pub role: Option<String>,
    /// Expiration
    pub exp: i64,
}

/// Authenticated auth account extracted from the request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
}

impl From<SupabaseClaims> for AuthUser {
    fn from(claims: SupabaseClaims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
        }
    }
}

/// Verifies Supabase access tokens.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Build from the shared JWT secret.
    pub fn new(jwt_secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[SUPABASE_AUDIENCE]);

        Self {
            key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Build from the `SUPABASE_JWT_SECRET` environment variable.
    pub fn from_env() -> Result<Self, ApiError> {
        let secret = std::env::var("SUPABASE_JWT_SECRET")
            .map_err(|_| ApiError::internal("SUPABASE_JWT_SECRET must be set"))?;
        Ok(Self::new(&secret))
    }

    /// Verify an access token.
    pub fn verify_token(&self, token: &str) -> Result<SupabaseClaims, ApiError> {
        let token_data = decode::<SupabaseClaims>(token, &self.key, &self.validation)
            .map_err(|e| ApiError::unauthorized(format!("Token validation failed: {}", e)))?;
        Ok(token_data.claims)
    }
}

/// An authenticated caller with their resolved profile.
#[derive(Debug, Clone)]
pub struct Session {
    pub auth: AuthUser,
    pub profile: Profile,
}

impl Session {
    /// Resolve the profile for an authenticated account.
    pub async fn resolve(state: &AppState, auth: AuthUser) -> Result<Self, ApiError> {
        let profile = state
            .profiles
            .find_by_user(&auth.user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("No profile for this account"))?;
        Ok(Self { auth, profile })
    }
}

/// Axum extractor for the raw authenticated account.
#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header format"))?;

        let claims = state.verifier.verify_token(token)?;

        Ok(AuthUser::from(claims))
    }
}

/// Axum extractor for a full session (token plus profile lookup).
#[axum::async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        Session::resolve(state, auth).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn make_token(secret: &str, claims: &SupabaseClaims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims() -> SupabaseClaims {
        SupabaseClaims {
            sub: "auth-1".to_string(),
            email: Some("a@example.com".to_string()),
            aud: SUPABASE_AUDIENCE.to_string(),
            role: Some("authenticated".to_string()),
            exp: (chrono::Utc::now().timestamp()) + 3600,
        }
    }

    #[test]
    fn test_valid_token_round_trip() {
        let verifier = TokenVerifier::new("secret");
        let token = make_token("secret", &claims());
        let decoded = verifier.verify_token(&token).unwrap();
        assert_eq!(decoded.sub, "auth-1");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let verifier = TokenVerifier::new("secret");
        let token = make_token("other-secret", &claims());
        assert!(verifier.verify_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = TokenVerifier::new("secret");
        let mut expired = claims();
        expired.exp = chrono::Utc::now().timestamp() - 600;
        let token = make_token("secret", &expired);
        assert!(verifier.verify_token(&token).is_err());
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let verifier = TokenVerifier::new("secret");
        let mut anon = claims();
        anon.aud = "anon".to_string();
        let token = make_token("secret", &anon);
        assert!(verifier.verify_token(&token).is_err());
    }
}
