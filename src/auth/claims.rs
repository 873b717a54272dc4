/// JWT Claims structures
///
/// Payloads for the two token kinds (RFC 7519 registered claims plus
/// the fields this service needs). Access tokens are self-contained;
/// refresh tokens additionally reference their persisted record id.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TokenCodecError;

/// Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Username, for log correlation downstream
    pub username: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    pub fn new(user_id: Uuid, username: String, expiry_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            username,
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer,
        }
    }

    /// Extract the user ID from the claims.
    ///
    /// A signed token whose subject does not parse is treated the same
    /// as a tampered one.
    pub fn user_id(&self) -> Result<Uuid, TokenCodecError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenCodecError::InvalidSignatureOrExpiry)
    }
}

/// Claims for refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Persisted token record ID
    pub jti: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl RefreshClaims {
    pub fn new(user_id: Uuid, token_id: Uuid, expiry_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            jti: token_id.to_string(),
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer,
        }
    }

    pub fn user_id(&self) -> Result<Uuid, TokenCodecError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenCodecError::InvalidSignatureOrExpiry)
    }

    /// Extract the persisted record ID the token references.
    pub fn token_id(&self) -> Result<Uuid, TokenCodecError> {
        Uuid::parse_str(&self.jti).map_err(|_| TokenCodecError::InvalidSignatureOrExpiry)
    }
}
