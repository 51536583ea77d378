//! Self-service password reset.
//!
//! A reset request stores a high-entropy one-time token with a short expiry
//! and emails a link carrying it. Consuming the token validates the raw
//! replacement password against the policy, replaces the hash, and clears
//! the token unconditionally.

use chrono::{Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

use crate::auth::password::{hash_password, validate_password};
use crate::configuration::OtpSettings;
use crate::email_client::Mailer;
use crate::error::{AppError, SiteError, StoreError};
use crate::site::ResetToken;
use crate::store::SiteStore;

const RESET_TOKEN_LENGTH: usize = 64;

/// Generates a cryptographically random reset token.
pub fn generate_reset_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

pub(crate) fn reset_email(site_name: &str, reset_link: &str, validity_minutes: i64) -> (String, String) {
    let subject = format!("{} password reset", site_name);
    let body = format!(
        "<p>A password reset was requested for your administrator account.</p>\
         <p><a href=\"{}\">Reset your password</a></p>\
         <p>The link expires in {} minutes. If you did not request this, you \
         can ignore this email.</p>",
        reset_link, validity_minutes
    );
    (subject, body)
}

/// Issues a reset token for the account and emails the reset link. The
/// current password stays valid until the token is consumed.
pub async fn request_reset(
    store: &dyn SiteStore,
    mailer: &dyn Mailer,
    settings: &OtpSettings,
    base_url: &str,
    email: &str,
) -> Result<(), AppError> {
    let (site, token) = loop {
        let mut site = store
            .find_by_email(email)
            .await?
            .ok_or(SiteError::AccountNotFound)?;

        let token = generate_reset_token();
        site.reset_token = Some(ResetToken {
            token: token.clone(),
            expires_at: Utc::now() + Duration::minutes(settings.reset_token_validity_minutes),
        });

        match store.update(&site).await {
            Ok(saved) => break (saved, token),
            Err(StoreError::Conflict) => continue,
            Err(e) => return Err(e.into()),
        }
    };

    let reset_link = format!("{}/reset-password?token={}", base_url, token);
    let (subject, body) = reset_email(
        &site.site_name,
        &reset_link,
        settings.reset_token_validity_minutes,
    );
    mailer.send(&site.email, &subject, &body).await?;

    tracing::info!(site_id = %site.id, "Password reset email sent");
    Ok(())
}

/// Consumes a reset token and replaces the password hash.
///
/// The replacement password is validated raw, before hashing; only the
/// password changes, so no other field validation runs on save.
pub async fn reset_password(
    store: &dyn SiteStore,
    token: &str,
    new_password: &str,
) -> Result<(), AppError> {
    loop {
        let mut site = store
            .find_site()
            .await?
            .ok_or(SiteError::ResetTokenInvalidOrExpired)?;

        let matches = site
            .reset_token
            .as_ref()
            .map(|reset| reset.token == token && !reset.is_expired())
            .unwrap_or(false);
        if !matches {
            return Err(SiteError::ResetTokenInvalidOrExpired.into());
        }

        validate_password(new_password)?;

        site.password_hash = hash_password(new_password)?;
        site.reset_token = None;

        match store.update(&site).await {
            Ok(saved) => {
                tracing::info!(site_id = %saved.id, "Password reset completed");
                return Ok(());
            }
            Err(StoreError::Conflict) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}
