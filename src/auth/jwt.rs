//! Signed token issuance and verification.
//!
//! Access and refresh tokens use independent signing secrets; leaking one
//! cannot be used to forge the other. Verification checks signature, expiry
//! and issuer, and collapses every failure into `AuthError::InvalidToken`.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::auth::claims::{AccessClaims, RefreshClaims};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Mints a short-lived access token for the given account.
pub fn issue_access_token(site_id: &Uuid, config: &JwtSettings) -> Result<String, AppError> {
    let claims = AccessClaims::new(*site_id, config.access_token_expiry, config.issuer.clone());

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.access_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Access token generation failed: {}", e)))
}

/// Mints a long-lived refresh token. Carries no account identity; the
/// session protocol pairs it with store membership.
pub fn issue_refresh_token(config: &JwtSettings) -> Result<String, AppError> {
    let claims = RefreshClaims::new(config.refresh_token_expiry, config.issuer.clone());

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.refresh_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Refresh token generation failed: {}", e)))
}

/// Validates an access token and extracts its claims.
pub fn verify_access_token(token: &str, config: &JwtSettings) -> Result<AccessClaims, AuthError> {
    decode_with_secret(token, &config.access_secret, &config.issuer)
}

/// Validates a refresh token signature and expiry.
pub fn verify_refresh_token(token: &str, config: &JwtSettings) -> Result<RefreshClaims, AuthError> {
    decode_with_secret(token, &config.refresh_secret, &config.issuer)
}

fn decode_with_secret<C: DeserializeOwned>(
    token: &str,
    secret: &str,
    issuer: &str,
) -> Result<C, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[issuer]);
    validation.set_required_spec_claims(&["exp", "iss"]);

    decode::<C>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("Token validation error: {}", e);
        AuthError::InvalidToken
    })
}
