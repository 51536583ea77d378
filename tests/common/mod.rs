//! Shared fixtures: an in-memory store, a capturing fake mailer, and
//! bootstrap helpers used across the integration suites.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use sitegate::configuration::{JwtSettings, OtpSettings};
use sitegate::email_client::Mailer;
use sitegate::error::EmailError;
use sitegate::session;
use sitegate::site::{Site, SiteInit, VerificationState};
use sitegate::store::{InMemorySiteStore, SiteStore};

pub const ADMIN_EMAIL: &str = "admin@x.com";
pub const ADMIN_PASSWORD: &str = "Correct1!";

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mailer double that records every delivery and can be switched to fail.
#[derive(Default)]
pub struct FakeMailer {
    sent: Mutex<Vec<SentEmail>>,
    failing: AtomicBool,
}

impl FakeMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_deliveries(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn last_email(&self) -> Option<SentEmail> {
        self.sent.lock().await.last().cloned()
    }
}

#[async_trait::async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), EmailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EmailError::DeliveryFailed("delivery disabled".to_string()));
        }

        self.sent.lock().await.push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: html_body.to_string(),
        });
        Ok(())
    }
}

pub fn test_jwt_settings() -> JwtSettings {
    JwtSettings {
        access_secret: "access-test-secret-at-least-32-chars!!".to_string(),
        refresh_secret: "refresh-test-secret-at-least-32-chars!".to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 604800,
        issuer: "sitegate-test".to_string(),
    }
}

pub fn test_otp_settings() -> OtpSettings {
    OtpSettings {
        otp_validity_minutes: 10,
        reset_token_validity_minutes: 10,
    }
}

pub fn valid_init() -> SiteInit {
    SiteInit {
        site_name: "My Site".to_string(),
        site_description: Some("A little corner of the internet".to_string()),
        email: ADMIN_EMAIL.to_string(),
        password: ADMIN_PASSWORD.to_string(),
        currency: None,
        timezone: None,
        date_format: None,
        time_format: None,
        week_starts_on: None,
    }
}

/// Initializes the site and returns the stored record.
pub async fn bootstrap(store: &InMemorySiteStore, mailer: &FakeMailer) -> Site {
    session::init_site(store, mailer, &test_otp_settings(), valid_init())
        .await
        .expect("site bootstrap failed");

    store
        .find_site()
        .await
        .expect("store failure")
        .expect("site missing after bootstrap")
}

/// The currently pending verification code.
pub async fn stored_otp(store: &InMemorySiteStore) -> String {
    let site = store.find_site().await.unwrap().expect("site missing");
    match &site.verification {
        VerificationState::Pending(pending) => pending.otp.clone(),
        VerificationState::Verified => panic!("site is already verified"),
    }
}

pub async fn stored_resend_attempts(store: &InMemorySiteStore) -> u32 {
    let site = store.find_site().await.unwrap().expect("site missing");
    match &site.verification {
        VerificationState::Pending(pending) => pending.resend_attempts,
        VerificationState::Verified => panic!("site is already verified"),
    }
}

/// Rewrites the pending verification state, e.g. to move the last resend
/// into the past or pre-set the attempt counter.
pub async fn set_resend_state(
    store: &InMemorySiteStore,
    resend_attempts: u32,
    last_resend_minutes_ago: Option<i64>,
) {
    let mut site = store.find_site().await.unwrap().expect("site missing");
    match &mut site.verification {
        VerificationState::Pending(pending) => {
            pending.resend_attempts = resend_attempts;
            pending.last_resend_at =
                last_resend_minutes_ago.map(|minutes| Utc::now() - Duration::minutes(minutes));
        }
        VerificationState::Verified => panic!("site is already verified"),
    }
    store.update(&site).await.unwrap();
}

/// Moves the pending code's expiry into the past.
pub async fn expire_otp(store: &InMemorySiteStore) {
    let mut site = store.find_site().await.unwrap().expect("site missing");
    match &mut site.verification {
        VerificationState::Pending(pending) => {
            pending.otp_expires_at = Utc::now() - Duration::seconds(1);
        }
        VerificationState::Verified => panic!("site is already verified"),
    }
    store.update(&site).await.unwrap();
}

/// The currently stored reset token, if any.
pub async fn stored_reset_token(store: &InMemorySiteStore) -> Option<String> {
    let site = store.find_site().await.unwrap().expect("site missing");
    site.reset_token.map(|reset| reset.token)
}

/// Moves the stored reset token's expiry into the past.
pub async fn expire_reset_token(store: &InMemorySiteStore) {
    let mut site = store.find_site().await.unwrap().expect("site missing");
    let reset = site.reset_token.as_mut().expect("no reset token stored");
    reset.expires_at = Utc::now() - Duration::seconds(1);
    store.update(&site).await.unwrap();
}
