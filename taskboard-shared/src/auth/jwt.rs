/// JWT token generation and validation
///
/// Sessions are stateless HS256 tokens. Register and login issue a pair: a
/// short-lived access token sent as `Authorization: Bearer <token>` on every
/// call, and a longer-lived refresh token that can only be exchanged for a
/// new access token.
///
/// # Claims
///
/// - `sub`: user ID
/// - `iss`: always `"taskboard"`
/// - `iat` / `nbf` / `exp`: issue, not-before and expiry (Unix seconds)
/// - `jti`: random token ID, so two tokens issued within the same second differ
/// - `token_type`: `access` or `refresh`
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::jwt::{issue_token_pair, validate_access_token, TokenSettings};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = TokenSettings::new("a-secret-that-is-at-least-32-bytes-long");
/// let user_id = Uuid::new_v4();
///
/// let pair = issue_token_pair(user_id, &settings)?;
/// let claims = validate_access_token(&pair.access, &settings.secret)?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Value of the `iss` claim
pub const ISSUER: &str = "taskboard";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token issuer")]
    InvalidIssuer,

    /// Access token presented where a refresh token is required, or the
    /// other way around
    #[error("Expected {expected} token, got {actual} token")]
    WrongType {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
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

/// Signing secret and lifetimes used to issue tokens
#[derive(Debug, Clone)]
pub struct TokenSettings {
    /// HS256 secret (at least 32 bytes in production)
    pub secret: String,

    /// Lifetime of access tokens
    pub access_ttl: Duration,

    /// Lifetime of refresh tokens
    pub refresh_ttl: Duration,
}

impl TokenSettings {
    /// Settings with default lifetimes: 5 minutes access, 1 day refresh
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_ttl: Duration::minutes(5),
            refresh_ttl: Duration::days(1),
        }
    }

    pub fn ttl(&self, token_type: TokenType) -> Duration {
        match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        }
    }
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: Uuid,

    pub iss: String,

    pub iat: i64,

    pub exp: i64,

    pub nbf: i64,

    pub jti: Uuid,

    pub token_type: TokenType,
}

impl Claims {
    /// Creates claims expiring `expires_in` from now
    ///
    /// Fails when the expiry falls outside the representable date range.
    pub fn new(
        user_id: Uuid,
        token_type: TokenType,
        expires_in: Duration,
    ) -> Result<Self, JwtError> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(expires_in).ok_or_else(|| {
            JwtError::CreateError(format!("Token lifetime out of range: {}", expires_in))
        })?;

        Ok(Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            nbf: now.timestamp(),
            jti: Uuid::new_v4(),
            token_type,
        })
    }
}

/// Access + refresh token pair returned by register and login
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub refresh: String,
    pub access: String,
}

/// Signs claims with HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies signature, issuer, `exp` and `nbf`, and returns the claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(e.to_string()),
    })?;

    Ok(token_data.claims)
}

fn validate_typed(token: &str, secret: &str, expected: TokenType) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != expected {
        return Err(JwtError::WrongType {
            expected: expected.as_str(),
            actual: claims.token_type.as_str(),
        });
    }

    Ok(claims)
}

/// Validates a token and requires it to be an access token
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    validate_typed(token, secret, TokenType::Access)
}

/// Validates a token and requires it to be a refresh token
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    validate_typed(token, secret, TokenType::Refresh)
}

/// Issues a fresh access + refresh pair for a user
pub fn issue_token_pair(user_id: Uuid, settings: &TokenSettings) -> Result<TokenPair, JwtError> {
    let refresh_ttl = settings.ttl(TokenType::Refresh);
    let access_ttl = settings.ttl(TokenType::Access);
    let refresh_claims = Claims::new(user_id, TokenType::Refresh, refresh_ttl)?;
    let access_claims = Claims::new(user_id, TokenType::Access, access_ttl)?;

    Ok(TokenPair {
        refresh: create_token(&refresh_claims, &settings.secret)?,
        access: create_token(&access_claims, &settings.secret)?,
    })
}

/// Exchanges a valid refresh token for a new access token
///
/// Returns the new token and the claims of the refresh token it was derived
/// from, so callers can re-check the subject.
pub fn refresh_access_token(
    refresh_token: &str,
    settings: &TokenSettings,
) -> Result<(String, Claims), JwtError> {
    let refresh_claims = validate_refresh_token(refresh_token, &settings.secret)?;

    let access_claims = Claims::new(
        refresh_claims.sub,
        TokenType::Access,
        settings.ttl(TokenType::Access),
    )?;
    let access = create_token(&access_claims, &settings.secret)?;

    Ok((access, refresh_claims))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_default_lifetimes() {
        let settings = TokenSettings::new(SECRET);
        assert_eq!(settings.ttl(TokenType::Access), Duration::minutes(5));
        assert_eq!(settings.ttl(TokenType::Refresh), Duration::days(1));
    }

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, TokenType::Access, Duration::minutes(5)).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp - claims.iat, 300);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        let forever = Duration::seconds(i64::MAX / 1000);
        let result = Claims::new(Uuid::new_v4(), TokenType::Access, forever);
        assert!(matches!(result, Err(JwtError::CreateError(_))));

        let settings = TokenSettings {
            access_ttl: forever,
            ..TokenSettings::new(SECRET)
        };
        assert!(matches!(
            issue_token_pair(Uuid::new_v4(), &settings),
            Err(JwtError::CreateError(_))
        ));
    }

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, TokenType::Access, Duration::minutes(5)).unwrap();
        let token = create_token(&claims, SECRET).expect("Should create token");

        let validated = validate_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.jti, claims.jti);
        assert_eq!(validated.token_type, TokenType::Access);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = Claims::new(Uuid::new_v4(), TokenType::Access, Duration::minutes(5)).unwrap();
        let token = create_token(&claims, SECRET).unwrap();

        assert!(validate_token(&token, "some-other-secret-of-enough-length!!").is_err());
    }

    #[test]
    fn test_validate_garbage_token() {
        let result = validate_token("not.a.jwt", SECRET);
        assert!(matches!(result, Err(JwtError::ValidationError(_))));
    }

    #[test]
    fn test_validate_expired_token() {
        // Well past the default 60s leeway
        let claims =
            Claims::new(Uuid::new_v4(), TokenType::Access, Duration::seconds(-3600)).unwrap();
        assert!(claims.exp < Utc::now().timestamp());

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_access_and_refresh_are_not_interchangeable() {
        let pair = issue_token_pair(Uuid::new_v4(), &TokenSettings::new(SECRET)).unwrap();

        assert!(validate_access_token(&pair.access, SECRET).is_ok());
        assert!(validate_refresh_token(&pair.refresh, SECRET).is_ok());

        assert!(matches!(
            validate_access_token(&pair.refresh, SECRET),
            Err(JwtError::WrongType { expected: "access", actual: "refresh" })
        ));
        assert!(matches!(
            validate_refresh_token(&pair.access, SECRET),
            Err(JwtError::WrongType { expected: "refresh", actual: "access" })
        ));
    }

    #[test]
    fn test_token_pairs_are_unique() {
        let settings = TokenSettings::new(SECRET);
        let user_id = Uuid::new_v4();

        let first = issue_token_pair(user_id, &settings).unwrap();
        let second = issue_token_pair(user_id, &settings).unwrap();

        assert_ne!(first.access, second.access);
        assert_ne!(first.refresh, second.refresh);
    }

    #[test]
    fn test_refresh_access_token() {
        let settings = TokenSettings::new(SECRET);
        let user_id = Uuid::new_v4();
        let pair = issue_token_pair(user_id, &settings).unwrap();

        let (access, refresh_claims) = refresh_access_token(&pair.refresh, &settings).unwrap();
        assert_eq!(refresh_claims.sub, user_id);

        let validated = validate_access_token(&access, SECRET).unwrap();
        assert_eq!(validated.sub, user_id);
    }

    #[test]
    fn test_refresh_with_access_token_fails() {
        let settings = TokenSettings::new(SECRET);
        let pair = issue_token_pair(Uuid::new_v4(), &settings).unwrap();

        assert!(refresh_access_token(&pair.access, &settings).is_err());
    }
}
