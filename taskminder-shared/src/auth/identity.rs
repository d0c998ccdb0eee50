/// Identity resolver: request credentials → current user
///
/// Resolution steps:
///
/// ```text
/// access_token cookie ─┐
///                      ├─> TokenService::decode_access ─> sub ─> users lookup ─> UserProfile
/// Bearer header ───────┘
/// ```
///
/// Every failure is an authentication failure (401 at the HTTP boundary).
/// A token naming a user that no longer exists is `UserNotFound`, which is
/// also a 401 so unauthenticated callers learn nothing about which user IDs
/// exist.
///
/// Refreshing is a separate, explicit step: the refresh token is validated
/// the same way and only a new access token is minted. The refresh token is
/// neither rotated nor invalidated.

use axum::http::HeaderMap;
use sqlx::PgPool;

use super::credentials;
use super::jwt::{JwtError, TokenService};
use crate::models::user::{User, UserProfile};

/// Authentication failure kinds
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No cookie and no bearer header
    #[error("Not authenticated")]
    Unauthenticated,

    /// Token signature was valid but it has expired
    #[error("Token has expired")]
    TokenExpired,

    /// Bad signature, bad format, wrong token type or missing subject
    #[error("Invalid token: {0}")]
    TokenInvalid(String),

    /// Token subject does not match any user
    #[error("User not found")]
    UserNotFound,

    /// Signing a new token failed
    #[error("Failed to issue token: {0}")]
    Issue(String),

    /// User lookup failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::TokenExpired => AuthError::TokenExpired,
            JwtError::TokenInvalid(msg) => AuthError::TokenInvalid(msg),
            JwtError::Encode(msg) => AuthError::Issue(msg),
        }
    }
}

/// Maps tokens to users
///
/// Borrows the pool and token service; construct one per request.
pub struct IdentityResolver<'a> {
    db: &'a PgPool,
    tokens: &'a TokenService,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(db: &'a PgPool, tokens: &'a TokenService) -> Self {
        Self { db, tokens }
    }

    /// Resolves the current user from request headers
    pub async fn resolve(&self, headers: &HeaderMap) -> Result<UserProfile, AuthError> {
        let token = credentials::access_token(headers).ok_or(AuthError::Unauthenticated)?;
        self.resolve_token(&token).await
    }

    /// Resolves the current user from a raw access token
    pub async fn resolve_token(&self, token: &str) -> Result<UserProfile, AuthError> {
        let claims = self.tokens.decode_access(token)?;
        let user = self.load_subject(claims.sub).await?;

        Ok(UserProfile::from(user))
    }

    /// Exchanges a refresh token for a new access token
    ///
    /// Fails with `UserNotFound` if the subject was removed after the refresh
    /// token was issued.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self.tokens.decode_refresh(refresh_token)?;
        let user = self.load_subject(claims.sub).await?;

        tracing::debug!(user_id = %user.id, "Issuing access token from refresh token");
        Ok(self.tokens.issue_access(&user.id)?)
    }

    async fn load_subject(&self, sub: Option<String>) -> Result<User, AuthError> {
        let user_id = sub
            .filter(|sub| !sub.is_empty())
            .ok_or_else(|| AuthError::TokenInvalid("Token has no subject".to_string()))?;

        User::find_by_id(self.db, &user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}
