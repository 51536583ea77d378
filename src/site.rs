//! The singleton site account record and its verification/reset sub-states.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// Fields accepted by site bootstrap. Optional profile fields fall back to
/// their documented defaults during validation.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteInit {
    pub site_name: String,
    pub site_description: Option<String>,
    pub email: String,
    pub password: String,
    pub currency: Option<String>,
    pub timezone: Option<String>,
    pub date_format: Option<String>,
    pub time_format: Option<String>,
    pub week_starts_on: Option<String>,
}

/// An issued, not-yet-confirmed verification code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVerification {
    pub otp: String,
    pub otp_expires_at: DateTime<Utc>,
    /// Set on the first *resend*; the initial send leaves it empty.
    pub last_resend_at: Option<DateTime<Utc>>,
    pub resend_attempts: u32,
}

/// Email verification state. A pending code and its expiry always travel
/// together, so "otp present iff expiry present" holds by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationState {
    Pending(PendingVerification),
    Verified,
}

impl VerificationState {
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationState::Verified)
    }
}

/// A one-time password-reset credential, present only between a reset
/// request and its consumption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl ResetToken {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// The site account. At most one instance ever exists.
#[derive(Debug, Clone)]
pub struct Site {
    pub id: Uuid,
    pub site_name: String,
    pub site_description: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub currency: String,
    pub timezone: String,
    pub date_format: String,
    pub time_format: String,
    pub week_starts_on: String,
    pub verification: VerificationState,
    pub reset_token: Option<ResetToken>,
    /// SHA-256 digests of outstanding refresh tokens. Append-only.
    pub refresh_tokens: Vec<String>,
    /// Optimistic-concurrency token, bumped by every store update.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
