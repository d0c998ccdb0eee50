/// Authentication building blocks
///
/// # Modules
///
/// - [`password`]: credential store (Argon2id hashing and verification)
/// - [`jwt`]: token service (HS256 access and refresh tokens)
/// - [`credentials`]: cookie / bearer token extraction from request headers
/// - [`identity`]: identity resolver (token → current user) and refresh
///
/// # Example
///
/// ```
/// use taskminder_shared::auth::password::{hash_password, verify_password};
/// use taskminder_shared::auth::jwt::{TokenConfig, TokenService};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("pw1")?;
/// assert!(verify_password("pw1", &hash)?);
///
/// let tokens = TokenService::new(TokenConfig::new("a-secret-that-is-at-least-32-bytes!!"));
/// let token = tokens.issue_access("user-id")?;
/// assert_eq!(tokens.decode(&token)?.sub.as_deref(), Some("user-id"));
/// # Ok(())
/// # }
/// ```

pub mod credentials;
pub mod identity;
pub mod jwt;
pub mod password;
