/// Token service: JWT issuance and validation
///
/// Access and refresh tokens share one claim shape and are signed with the
/// same server secret using HS256. They differ only in lifetime and in the
/// `token_type` claim, which keeps a refresh token from being accepted where
/// an access token is expected (and the other way round).
///
/// # Lifetimes
///
/// - **Access Token**: 15 minutes by default
/// - **Refresh Token**: 7 days by default
///
/// There is no revocation list. A correctly signed, unexpired token is
/// honoured regardless of server-side changes such as a password change.
///
/// # Example
///
/// ```
/// use taskminder_shared::auth::jwt::{TokenConfig, TokenService};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = TokenService::new(TokenConfig::new("a-secret-that-is-at-least-32-bytes!!"));
///
/// let access = tokens.issue_access("user-1")?;
/// let claims = tokens.decode_access(&access)?;
/// assert_eq!(claims.sub.as_deref(), Some("user-1"));
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Issuer claim stamped on and required from every token
pub const ISSUER: &str = "taskminder";

/// Default access token lifetime in minutes
pub const DEFAULT_ACCESS_TTL_MINUTES: i64 = 15;

/// Default refresh token lifetime in days
pub const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    Encode(String),

    /// Signature was valid but `exp` has passed
    #[error("Token has expired")]
    TokenExpired,

    /// Bad signature, malformed token, wrong issuer or wrong token type
    #[error("Invalid token: {0}")]
    TokenInvalid(String),
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived token authorizing API calls
    Access,

    /// Long-lived token used only to mint new access tokens
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims
///
/// `sub` is optional on the wire so that a token without a subject decodes
/// and can be rejected by the identity resolver as invalid, rather than
/// failing somewhere inside deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Issuer - always [`ISSUER`]
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Access or refresh
    pub token_type: TokenType,
}

impl Claims {
    /// Creates claims for `subject` expiring `expires_in` from now
    ///
    /// A negative duration yields an already expired token.
    pub fn new(subject: impl Into<String>, token_type: TokenType, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: Some(subject.into()),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            token_type,
        }
    }
}

/// Signs claims into a compact JWT using HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::Encode(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT and extracts its claims
///
/// Checks signature, issuer and expiry with zero leeway. Signature is checked
/// first, so an expired token with a bad signature is `TokenInvalid`.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss"]);
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        _ => JwtError::TokenInvalid(e.to_string()),
    })?;

    Ok(token_data.claims)
}

/// Token lifetimes and signing secret
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// HS256 signing secret (at least 32 bytes in production)
    pub secret: String,

    /// Access token lifetime
    pub access_ttl: Duration,

    /// Refresh token lifetime
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    /// Config with the default 15 minute / 7 day lifetimes
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_ttl: Duration::minutes(DEFAULT_ACCESS_TTL_MINUTES),
            refresh_ttl: Duration::days(DEFAULT_REFRESH_TTL_DAYS),
        }
    }
}

/// Issues and decodes access/refresh tokens for one signing secret
///
/// Built once from configuration and shared (behind an `Arc` or a reference)
/// by every component that handles tokens.
#[derive(Debug, Clone)]
pub struct TokenService {
    config: TokenConfig,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    /// Access token lifetime, used for cookie `Max-Age`
    pub fn access_ttl(&self) -> Duration {
        self.config.access_ttl
    }

    /// Refresh token lifetime, used for cookie `Max-Age`
    pub fn refresh_ttl(&self) -> Duration {
        self.config.refresh_ttl
    }

    /// Issues an access token for `subject`
    pub fn issue_access(&self, subject: &str) -> Result<String, JwtError> {
        self.issue(subject, TokenType::Access, self.config.access_ttl)
    }

    /// Issues a refresh token for `subject`
    pub fn issue_refresh(&self, subject: &str) -> Result<String, JwtError> {
        self.issue(subject, TokenType::Refresh, self.config.refresh_ttl)
    }

    /// Issues a token with an explicit lifetime
    pub fn issue(
        &self,
        subject: &str,
        token_type: TokenType,
        ttl: Duration,
    ) -> Result<String, JwtError> {
        let claims = Claims::new(subject, token_type, ttl);
        create_token(&claims, &self.config.secret)
    }

    /// Decodes any token signed with this service's secret
    pub fn decode(&self, token: &str) -> Result<Claims, JwtError> {
        validate_token(token, &self.config.secret)
    }

    /// Decodes a token and requires it to be an access token
    pub fn decode_access(&self, token: &str) -> Result<Claims, JwtError> {
        self.decode_as(token, TokenType::Access)
    }

    /// Decodes a token and requires it to be a refresh token
    pub fn decode_refresh(&self, token: &str) -> Result<Claims, JwtError> {
        self.decode_as(token, TokenType::Refresh)
    }

    fn decode_as(&self, token: &str, expected: TokenType) -> Result<Claims, JwtError> {
        let claims = self.decode(token)?;

        if claims.token_type != expected {
            return Err(JwtError::TokenInvalid(format!(
                "Expected {} token, got {} token",
                expected.as_str(),
                claims.token_type.as_str()
            )));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn service() -> TokenService {
        TokenService::new(TokenConfig::new(SECRET))
    }

    #[test]
    fn test_default_lifetimes() {
        let config = TokenConfig::new(SECRET);
        assert_eq!(config.access_ttl, Duration::minutes(15));
        assert_eq!(config.refresh_ttl, Duration::days(7));
    }

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new("user-1", TokenType::Access, Duration::minutes(15));

        assert_eq!(claims.sub.as_deref(), Some("user-1"));
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_access_token_roundtrip() {
        let tokens = service();
        let token = tokens.issue_access("user-42").unwrap();

        let claims = tokens.decode(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("user-42"));
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn test_refresh_token_lifetime() {
        let tokens = service();
        let token = tokens.issue_refresh("user-42").unwrap();

        let claims = tokens.decode_refresh(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_expired_token_is_expired_not_invalid() {
        let tokens = service();
        let token = tokens
            .issue("user-1", TokenType::Access, Duration::seconds(-1))
            .unwrap();

        let result = tokens.decode(&token);
        assert!(matches!(result, Err(JwtError::TokenExpired)));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = create_token(
            &Claims::new("user-1", TokenType::Access, Duration::minutes(5)),
            "some-other-secret-that-is-long-enough",
        )
        .unwrap();

        let result = service().decode(&token);
        assert!(matches!(result, Err(JwtError::TokenInvalid(_))));
    }

    #[test]
    fn test_expired_token_with_wrong_secret_is_invalid() {
        let token = create_token(
            &Claims::new("user-1", TokenType::Access, Duration::hours(-1)),
            "some-other-secret-that-is-long-enough",
        )
        .unwrap();

        assert!(matches!(service().decode(&token), Err(JwtError::TokenInvalid(_))));
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        let tokens = service();
        assert!(matches!(tokens.decode("not-a-jwt"), Err(JwtError::TokenInvalid(_))));
        assert!(matches!(tokens.decode(""), Err(JwtError::TokenInvalid(_))));
    }

    #[test]
    fn test_token_without_subject_still_decodes() {
        let mut claims = Claims::new("ignored", TokenType::Access, Duration::minutes(5));
        claims.sub = None;
        let token = create_token(&claims, SECRET).unwrap();

        let decoded = service().decode_access(&token).unwrap();
        assert!(decoded.sub.is_none());
    }

    #[test]
    fn test_token_type_is_enforced() {
        let tokens = service();
        let access = tokens.issue_access("user-1").unwrap();
        let refresh = tokens.issue_refresh("user-1").unwrap();

        assert!(tokens.decode_access(&access).is_ok());
        assert!(tokens.decode_refresh(&refresh).is_ok());
        assert!(matches!(tokens.decode_access(&refresh), Err(JwtError::TokenInvalid(_))));
        assert!(matches!(tokens.decode_refresh(&access), Err(JwtError::TokenInvalid(_))));
    }
}
