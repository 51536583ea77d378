//! Token claim payloads (RFC 7519 subset).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

/// Claims carried by access tokens. The subject is the site account id, so
/// verification needs no store lookup.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Subject (site account id as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

impl AccessClaims {
    pub fn new(site_id: Uuid, expiry_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: site_id.to_string(),
            iat: now,
            exp: now + expiry_seconds,
            iss: issuer,
        }
    }

    /// Extracts the account id from the subject claim.
    pub fn site_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidToken)
    }

    pub fn is_expired(&self) -> bool {
        self.exp < chrono::Utc::now().timestamp()
    }
}

/// Claims carried by refresh tokens: expiry only, no account identity.
/// Validity additionally requires membership in the account's stored
/// refresh-token set, so revocation works by store mutation alone.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

impl RefreshClaims {
    pub fn new(expiry_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            iat: now,
            exp: now + expiry_seconds,
            iss: issuer,
        }
    }
}
