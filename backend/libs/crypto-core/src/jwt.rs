/// RS256 JWT helpers shared by blog platform services
///
/// Tokens are issued by the identity provider and validated here. Only RS256
/// is accepted so a leaked public key can never be used as an HMAC secret.
///
/// ## Usage
///
/// ```rust,no_run
/// use crypto_core::jwt::{self, JwtKeys};
///
/// let public_key = jwt::load_validation_key().expect("JWT public key required");
/// let keys = JwtKeys::validation_only(&public_key).expect("valid RSA public key");
/// let claims = keys.validate_access_token("eyJ...").expect("valid token");
/// println!("caller = {}", claims.username);
/// ```
use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ACCESS_TOKEN_EXPIRY_HOURS: i64 = 1;

const JWT_ALGORITHM: Algorithm = Algorithm::RS256;

const ACCESS_TOKEN_TYPE: &str = "access";

/// Claims carried by an access token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token type: "access" or "refresh"
    pub token_type: String,
    pub username: String,
}

impl Claims {
    /// Parse the subject as a user id.
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|e| anyhow!("Invalid user ID format in token: {e}"))
    }
}

/// Key material for one service.
///
/// Validating services hold only the public key. The encoding key is present
/// for the identity provider and for tests.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Option<EncodingKey>,
    decoding: DecodingKey,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("encoding", &self.encoding.as_ref().map(|_| "[REDACTED]"))
            .field("decoding", &"[REDACTED]")
            .finish()
    }
}

impl JwtKeys {
    /// Build a key pair from PEM-formatted RSA keys.
    pub fn from_pem(private_key_pem: &str, public_key_pem: &str) -> Result<Self> {
        let encoding = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| anyhow!("Failed to parse RSA private key: {e}"))?;
        let mut keys = Self::validation_only(public_key_pem)?;
        keys.encoding = Some(encoding);
        Ok(keys)
    }

    /// Build validation-only keys from a PEM-formatted RSA public key.
    pub fn validation_only(public_key_pem: &str) -> Result<Self> {
        let decoding = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| anyhow!("Failed to parse RSA public key: {e}"))?;
        Ok(Self {
            encoding: None,
            decoding,
        })
    }

    /// Issue an access token. Fails on validation-only keys.
    pub fn issue_access_token(&self, user_id: Uuid, username: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(ACCESS_TOKEN_EXPIRY_HOURS)).timestamp(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            username: username.to_string(),
        };
        self.encode_claims(&claims)
    }

    pub fn encode_claims(&self, claims: &Claims) -> Result<String> {
        let encoding = self
            .encoding
            .as_ref()
            .ok_or_else(|| anyhow!("Signing key not configured"))?;
        encode(&Header::new(JWT_ALGORITHM), claims, encoding)
            .map_err(|e| anyhow!("Failed to generate access token: {e}"))
    }

    /// Validate signature, expiry and token type, returning the claims.
    ///
    /// Refresh tokens are rejected: they are only accepted by the identity
    /// provider's refresh endpoint.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| anyhow!("Token validation failed: {e}"))?;

        if data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(anyhow!(
                "Unexpected token type '{}'",
                data.claims.token_type
            ));
        }
        if data.claims.username.trim().is_empty() {
            return Err(anyhow!("Token carries an empty username"));
        }

        Ok(data.claims)
    }
}

/// Read the RS256 public key from `JWT_PUBLIC_KEY_PEM` or the file named by
/// `JWT_PUBLIC_KEY_FILE`.
pub fn load_validation_key() -> Result<String> {
    if let Ok(pem) = std::env::var("JWT_PUBLIC_KEY_PEM") {
        if !pem.trim().is_empty() {
            return Ok(pem);
        }
    }

    let path = std::env::var("JWT_PUBLIC_KEY_FILE")
        .map_err(|_| anyhow!("Neither JWT_PUBLIC_KEY_PEM nor JWT_PUBLIC_KEY_FILE is set"))?;
    tracing::debug!(%path, "loading JWT public key from file");
    std::fs::read_to_string(&path).map_err(|e| anyhow!("Failed to read {path}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    // FOR TESTING ONLY
    const TEST_PRIVATE_KEY: &str = include_str!("../tests/fixtures/test_private.pem");
    const TEST_PUBLIC_KEY: &str = include_str!("../tests/fixtures/test_public.pem");

    fn test_keys() -> JwtKeys {
        JwtKeys::from_pem(TEST_PRIVATE_KEY, TEST_PUBLIC_KEY).expect("test keys parse")
    }

    #[test]
    fn issued_token_validates() {
        let keys = test_keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue_access_token(user_id, "alice").unwrap();

        assert_eq!(token.matches('.').count(), 2);

        let claims = keys.validate_access_token(&token).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn validation_only_keys_cannot_issue() {
        let keys = JwtKeys::validation_only(TEST_PUBLIC_KEY).unwrap();
        assert!(keys.issue_access_token(Uuid::new_v4(), "alice").is_err());
    }

    #[test]
    fn validation_only_keys_accept_issued_token() {
        let token = test_keys()
            .issue_access_token(Uuid::new_v4(), "alice")
            .unwrap();
        let keys = JwtKeys::validation_only(TEST_PUBLIC_KEY).unwrap();
        assert!(keys.validate_access_token(&token).is_ok());
    }

    #[test]
    fn garbage_token_rejected() {
        assert!(test_keys().validate_access_token("invalid.token.here").is_err());
    }

    #[test]
    fn tampered_token_rejected() {
        let keys = test_keys();
        let token = keys.issue_access_token(Uuid::new_v4(), "alice").unwrap();
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        parts[2] = parts[2].chars().rev().collect();
        assert!(keys.validate_access_token(&parts.join(".")).is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let keys = test_keys();
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            iat: (now - Duration::hours(3)).timestamp(),
            exp: (now - Duration::hours(2)).timestamp(),
            token_type: "access".into(),
            username: "alice".into(),
        };
        let token = keys.encode_claims(&claims).unwrap();
        assert!(keys.validate_access_token(&token).is_err());
    }

    #[test]
    fn refresh_token_rejected() {
        let keys = test_keys();
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(30)).timestamp(),
            token_type: "refresh".into(),
            username: "alice".into(),
        };
        let token = keys.encode_claims(&claims).unwrap();
        assert!(keys.validate_access_token(&token).is_err());
    }

    #[test]
    fn malformed_subject_is_reported() {
        let claims = Claims {
            sub: "not-a-uuid".into(),
            iat: 0,
            exp: 0,
            token_type: "access".into(),
            username: "alice".into(),
        };
        assert!(claims.user_id().is_err());
    }
}
