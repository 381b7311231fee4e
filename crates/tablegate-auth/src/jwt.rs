//! JWT token generation and validation.
//!
//! Bearer tokens are signed with HS256 using the configured signing secret.
//! Every token carries subject = client id, the configured default scope,
//! the issuer, and a fixed expiry window measured from issuance.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError { message: String },

    /// Failed to decode a token.
    #[error("Failed to decode token: {message}")]
    DecodingError { message: String },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,
}

impl JwtError {
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

/// Claims carried by every issued bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessTokenClaims {
    /// Issuer (gateway base URL).
    pub iss: String,

    /// Subject (client id).
    pub sub: String,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// JWT ID.
    pub jti: String,

    /// Space-separated scopes.
    pub scope: String,
}

/// Signs and validates bearer tokens with a shared HS256 secret.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl_secs: u64,
    default_scope: String,
}

impl JwtService {
    pub fn new(secret: &str, issuer: String, ttl_secs: u64, default_scope: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            ttl_secs,
            default_scope,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issues a signed token for a client, returning the token and its
    /// remaining lifetime in seconds.
    pub fn issue(&self, client_id: &str) -> Result<(String, u64), JwtError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = AccessTokenClaims {
            iss: self.issuer.clone(),
            sub: client_id.to_string(),
            exp: now + self.ttl_secs as i64,
            iat: now,
            jti: Uuid::new_v4().to_string(),
            scope: self.default_scope.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::encoding_error(e.to_string()))?;
        Ok((token, self.ttl_secs))
    }

    /// Decodes and validates a token issued by this service.
    pub fn decode(&self, token: &str) -> Result<AccessTokenClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);

        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.issuer)
            .field("ttl_secs", &self.ttl_secs)
            .field("secret", &"<redacted>")
            .finish()
    }
}
