/// JWT Token Generation and Validation
///
/// Signed-token codec for both token kinds. Access tokens are
/// self-contained; refresh tokens carry the id of their persisted
/// record in the `jti` claim. Validation enforces signature, expiry,
/// and issuer.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, RefreshClaims};
use crate::configuration::JwtSettings;
use crate::error::TokenCodecError;

/// Generate a new access token for a user
///
/// # Errors
/// Returns error if token signing fails
pub fn generate_access_token(
    user_id: &Uuid,
    username: &str,
    config: &JwtSettings,
) -> Result<String, TokenCodecError> {
    let claims = Claims::new(
        *user_id,
        username.to_string(),
        config.access_token_expiry,
        config.issuer.clone(),
    );

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| TokenCodecError::SigningFailed(e.to_string()))
}

/// Validate and extract claims from an access token
///
/// # Errors
/// Returns error if the token is invalid, expired, or tampered with.
/// The error does not say which.
pub fn validate_access_token(token: &str, config: &JwtSettings) -> Result<Claims, TokenCodecError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("access token validation error: {}", e);
        TokenCodecError::InvalidSignatureOrExpiry
    })
}

/// Generate a new refresh token referencing a persisted record
///
/// # Errors
/// Returns error if token signing fails
pub fn generate_refresh_token(
    user_id: &Uuid,
    token_id: &Uuid,
    config: &JwtSettings,
) -> Result<String, TokenCodecError> {
    let claims = RefreshClaims::new(
        *user_id,
        *token_id,
        config.refresh_token_expiry,
        config.issuer.clone(),
    );

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| TokenCodecError::SigningFailed(e.to_string()))
}

/// Validate and extract claims from a refresh token
///
/// # Errors
/// Returns error if the token is invalid, expired, or tampered with.
/// The error does not say which.
pub fn validate_refresh_token(
    token: &str,
    config: &JwtSettings,
) -> Result<RefreshClaims, TokenCodecError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);

    decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("refresh token validation error: {}", e);
        TokenCodecError::InvalidSignatureOrExpiry
    })
}
