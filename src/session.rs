//! Site bootstrap and the session protocol: login, refresh, access guard.

use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::auth::jwt::{
    issue_access_token, issue_refresh_token, verify_access_token, verify_refresh_token,
};
use crate::auth::password::{hash_password, verify_password};
use crate::configuration::{JwtSettings, OtpSettings};
use crate::email_client::Mailer;
use crate::error::{AppError, AuthError, SiteError, StoreError};
use crate::otp::{generate_otp, verification_email};
use crate::site::{PendingVerification, Site, SiteInit, VerificationState};
use crate::store::SiteStore;
use crate::validators::validate_site_init;

/// Token pair handed to the caller on login. The caller owns transport
/// (cookies, headers); only the refresh token's digest is persisted.
#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Digest used for refresh tokens at rest; plaintext tokens are never stored.
pub(crate) fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Creates the singleton site account in pending-verification state and
/// delivers the first verification code.
///
/// The first send bypasses the resend backoff: `last_resend_at` starts empty
/// and `resend_attempts` at zero.
pub async fn init_site(
    store: &dyn SiteStore,
    mailer: &dyn Mailer,
    settings: &OtpSettings,
    init: SiteInit,
) -> Result<(), AppError> {
    if store.find_site().await?.is_some() {
        return Err(SiteError::AlreadyInitialized.into());
    }

    let profile = validate_site_init(&init)?;
    let password_hash = hash_password(&init.password)?;

    let otp = generate_otp();
    let now = Utc::now();
    let site = Site {
        id: Uuid::new_v4(),
        site_name: profile.site_name,
        site_description: profile.site_description,
        email: profile.email,
        password_hash,
        currency: profile.currency,
        timezone: profile.timezone,
        date_format: profile.date_format,
        time_format: profile.time_format,
        week_starts_on: profile.week_starts_on,
        verification: VerificationState::Pending(PendingVerification {
            otp: otp.clone(),
            otp_expires_at: now + Duration::minutes(settings.otp_validity_minutes),
            last_resend_at: None,
            resend_attempts: 0,
        }),
        reset_token: None,
        refresh_tokens: Vec::new(),
        version: 1,
        created_at: now,
        updated_at: now,
    };

    match store.create(&site).await {
        Ok(()) => {}
        // Lost an init race: someone else created the account first.
        Err(StoreError::Conflict) => return Err(SiteError::AlreadyInitialized.into()),
        Err(e) => return Err(e.into()),
    }

    let (subject, body) = verification_email(&site.site_name, &otp, settings.otp_validity_minutes);
    mailer.send(&site.email, &subject, &body).await?;

    tracing::info!(site_id = %site.id, "Site initialized");
    Ok(())
}

/// Authenticates the administrator and mints a token pair, persisting the
/// refresh token's digest.
pub async fn login(
    store: &dyn SiteStore,
    jwt: &JwtSettings,
    email: &str,
    password: &str,
) -> Result<TokenPair, AppError> {
    loop {
        let mut site = store
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &site.password_hash)? {
            return Err(AuthError::InvalidCredentials.into());
        }

        let access_token = issue_access_token(&site.id, jwt)?;
        let refresh_token = issue_refresh_token(jwt)?;
        site.refresh_tokens.push(hash_refresh_token(&refresh_token));

        match store.update(&site).await {
            Ok(saved) => {
                tracing::info!(site_id = %saved.id, "Administrator logged in");
                return Ok(TokenPair {
                    access_token,
                    refresh_token,
                });
            }
            Err(StoreError::Conflict) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Exchanges a refresh token for a new access token. The refresh token is
/// not rotated; it stays valid until it expires or is revoked by store
/// mutation.
pub async fn refresh(
    store: &dyn SiteStore,
    jwt: &JwtSettings,
    refresh_token: Option<&str>,
) -> Result<String, AppError> {
    let token = refresh_token
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)?;

    let site = store
        .find_by_refresh_token(&hash_refresh_token(token))
        .await?
        .ok_or(SiteError::AccountNotFound)?;

    verify_refresh_token(token, jwt)?;

    let access_token = issue_access_token(&site.id, jwt)?;
    tracing::info!(site_id = %site.id, "Access token refreshed");
    Ok(access_token)
}

/// The access guard: yields the authenticated account id or fails with
/// `MissingToken`/`InvalidToken`. Pure; requires no store lookup.
pub fn require_access(token: Option<&str>, jwt: &JwtSettings) -> Result<Uuid, AuthError> {
    let token = token.filter(|t| !t.is_empty()).ok_or(AuthError::MissingToken)?;
    let claims = verify_access_token(token, jwt)?;
    claims.site_id()
}
