//! One-time passcode issuance, resend backoff, and verification.
//!
//! The verification state machine per account is
//! `Pending { otp, expiry, last_resend_at, resend_attempts } -> Verified`,
//! terminal for this flow. Resends are gated by an exponential backoff:
//! `min(2^resend_attempts * 2, 30)` minutes since the last send. Writes go
//! through the store's version check; a concurrent writer forces a re-read,
//! so the backoff is re-evaluated at write time and racing resends cannot
//! both go through.

use chrono::{Duration, Utc};
use rand::Rng;

use crate::configuration::OtpSettings;
use crate::email_client::Mailer;
use crate::error::{AppError, SiteError, StoreError};
use crate::site::{PendingVerification, VerificationState};
use crate::store::SiteStore;

const OTP_DIGITS: usize = 6;
const RESEND_BASE_MINUTES: u32 = 2;
const RESEND_CAP_MINUTES: u32 = 30;

/// Generates a random numeric verification code.
pub fn generate_otp() -> String {
    let mut rng = rand::thread_rng();
    (0..OTP_DIGITS)
        .map(|_| char::from(b'0' + rng.gen_range(0..10)))
        .collect()
}

/// Minimum wait between resends, given the number of resends so far.
pub fn resend_interval(resend_attempts: u32) -> Duration {
    let minutes = 2u32
        .saturating_pow(resend_attempts)
        .saturating_mul(RESEND_BASE_MINUTES)
        .min(RESEND_CAP_MINUTES);
    Duration::minutes(i64::from(minutes))
}

pub(crate) fn verification_email(site_name: &str, otp: &str, validity_minutes: i64) -> (String, String) {
    let subject = format!("{} email verification", site_name);
    let body = format!(
        "<p>Your verification code is <strong>{}</strong>.</p>\
         <p>The code expires in {} minutes.</p>",
        otp, validity_minutes
    );
    (subject, body)
}

/// Issues a fresh verification code for the account, honoring the resend
/// backoff, and emails it.
///
/// The backoff interval is computed from `resend_attempts` *before* the
/// increment, so the first resend after initial issuance always waits the
/// base interval out, however old the initial send is.
pub async fn request_otp(
    store: &dyn SiteStore,
    mailer: &dyn Mailer,
    settings: &OtpSettings,
    email: &str,
) -> Result<(), AppError> {
    let (site, otp) = loop {
        let mut site = store
            .find_by_email(email)
            .await?
            .ok_or(SiteError::AccountNotFound)?;

        let pending = match &site.verification {
            VerificationState::Verified => return Err(SiteError::AlreadyVerified.into()),
            VerificationState::Pending(pending) => pending.clone(),
        };

        let now = Utc::now();
        if let Some(last_resend_at) = pending.last_resend_at {
            let interval = resend_interval(pending.resend_attempts);
            let elapsed = now - last_resend_at;
            if elapsed < interval {
                return Err(SiteError::TooSoon(interval - elapsed).into());
            }
        }

        let otp = generate_otp();
        // The initial send does not count as a resend.
        let resend_attempts = if pending.last_resend_at.is_some() {
            pending.resend_attempts + 1
        } else {
            pending.resend_attempts
        };

        site.verification = VerificationState::Pending(PendingVerification {
            otp: otp.clone(),
            otp_expires_at: now + Duration::minutes(settings.otp_validity_minutes),
            last_resend_at: Some(now),
            resend_attempts,
        });

        match store.update(&site).await {
            Ok(saved) => break (saved, otp),
            Err(StoreError::Conflict) => continue,
            Err(e) => return Err(e.into()),
        }
    };

    let (subject, body) = verification_email(&site.site_name, &otp, settings.otp_validity_minutes);
    mailer.send(&site.email, &subject, &body).await?;

    tracing::info!(site_id = %site.id, "Verification code sent");
    Ok(())
}

/// Confirms the emailed code, transitioning the account to `Verified`.
/// Failure leaves the stored state untouched.
pub async fn verify_otp(store: &dyn SiteStore, email: &str, code: &str) -> Result<(), AppError> {
    loop {
        let mut site = store
            .find_by_email(email)
            .await?
            .ok_or(SiteError::AccountNotFound)?;

        let pending = match &site.verification {
            VerificationState::Verified => return Err(SiteError::AlreadyVerified.into()),
            VerificationState::Pending(pending) => pending.clone(),
        };

        if pending.otp != code || Utc::now() > pending.otp_expires_at {
            return Err(SiteError::OtpInvalidOrExpired.into());
        }

        // The Verified variant clears the code, expiry, resend timestamp and
        // attempt counter in one step.
        site.verification = VerificationState::Verified;

        match store.update(&site).await {
            Ok(saved) => {
                tracing::info!(site_id = %saved.id, "Email verified");
                return Ok(());
            }
            Err(StoreError::Conflict) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}
