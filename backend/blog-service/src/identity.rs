/// Caller identity for blog-service
///
/// Bearer tokens are resolved to a `Caller` by an `IdentityProvider`. The
/// production provider validates RS256 access tokens issued by the identity
/// service; tests plug in a static table instead.
use crypto_core::JwtKeys;
use thiserror::Error;
use uuid::Uuid;

use crate::models::User;

/// Authenticated user behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
    pub username: String,
}

impl Caller {
    pub fn as_user(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

impl From<User> for Caller {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Invalid Authorization scheme")]
    InvalidScheme,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token validation is not configured")]
    NotConfigured,
}

pub trait IdentityProvider: Send + Sync {
    /// Resolve a raw bearer token (without the `Bearer ` prefix).
    fn resolve(&self, token: &str) -> Result<Caller, IdentityError>;
}

/// Validates access tokens against the identity service's public key.
#[derive(Debug, Clone)]
pub struct JwtIdentityProvider {
    keys: Option<JwtKeys>,
}

impl JwtIdentityProvider {
    pub fn new(keys: JwtKeys) -> Self {
        Self { keys: Some(keys) }
    }

    /// Provider that rejects every token. Anonymous reads still work.
    pub fn disabled() -> Self {
        Self { keys: None }
    }
}

impl IdentityProvider for JwtIdentityProvider {
    fn resolve(&self, token: &str) -> Result<Caller, IdentityError> {
        let keys = self.keys.as_ref().ok_or(IdentityError::NotConfigured)?;

        let claims = keys.validate_access_token(token).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            IdentityError::InvalidToken
        })?;
        let id = claims.user_id().map_err(|_| IdentityError::InvalidToken)?;

        Ok(Caller {
            id,
            username: claims.username,
        })
    }
}

/// Split `Authorization` header value into its bearer token.
pub fn bearer_token(header: &str) -> Result<&str, IdentityError> {
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(IdentityError::InvalidScheme)?
        .trim();
    if token.is_empty() {
        return Err(IdentityError::InvalidToken);
    }
    Ok(token)
}
