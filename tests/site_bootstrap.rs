//! Site bootstrap: singleton creation, validation, and first-send delivery.

mod common;

use common::*;
use sitegate::error::{AppError, SiteError};
use sitegate::session;
use sitegate::site::VerificationState;
use sitegate::store::{InMemorySiteStore, SiteStore};
use sitegate::validators::{
    DEFAULT_CURRENCY, DEFAULT_DATE_FORMAT, DEFAULT_TIMEZONE, DEFAULT_TIME_FORMAT,
    DEFAULT_WEEK_STARTS_ON,
};

#[tokio::test]
async fn init_creates_a_pending_account_and_sends_the_code() {
    let store = InMemorySiteStore::new();
    let mailer = FakeMailer::new();

    let site = bootstrap(&store, &mailer).await;

    assert_eq!(site.email, ADMIN_EMAIL);
    let pending = match &site.verification {
        VerificationState::Pending(pending) => pending,
        VerificationState::Verified => panic!("fresh site must be unverified"),
    };
    assert!(pending.last_resend_at.is_none());
    assert_eq!(pending.resend_attempts, 0);

    // The first code went out to the owning address and contains the code.
    assert_eq!(mailer.sent_count().await, 1);
    let email = mailer.last_email().await.unwrap();
    assert_eq!(email.to, ADMIN_EMAIL);
    assert!(email.body.contains(&pending.otp));
}

#[tokio::test]
async fn second_init_is_rejected_and_the_store_is_unchanged() {
    let store = InMemorySiteStore::new();
    let mailer = FakeMailer::new();
    let original = bootstrap(&store, &mailer).await;

    let mut second = valid_init();
    second.site_name = "Another Site".to_string();
    second.email = "other@example.com".to_string();

    let err = session::init_site(&store, &mailer, &test_otp_settings(), second)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Site(SiteError::AlreadyInitialized)
    ));

    let stored = store.find_site().await.unwrap().unwrap();
    assert_eq!(stored.id, original.id);
    assert_eq!(stored.email, original.email);
    assert_eq!(stored.version, original.version);
    assert_eq!(mailer.sent_count().await, 1);
}

#[tokio::test]
async fn init_collects_every_validation_failure() {
    let store = InMemorySiteStore::new();
    let mailer = FakeMailer::new();

    let mut init = valid_init();
    init.site_name = "ab".to_string();
    init.email = "not-an-email".to_string();
    init.password = "weak".to_string();
    init.currency = Some("dollars".to_string());

    let err = session::init_site(&store, &mailer, &test_otp_settings(), init)
        .await
        .unwrap_err();

    let violations = match err {
        AppError::Validation(violations) => violations,
        other => panic!("expected validation failure, got {:?}", other),
    };
    let fields: Vec<&str> = violations.iter().map(|v| v.field()).collect();
    assert!(fields.contains(&"site_name"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
    assert!(fields.contains(&"currency"));

    // Nothing was persisted and nothing was sent.
    assert!(store.find_site().await.unwrap().is_none());
    assert_eq!(mailer.sent_count().await, 0);
}

#[tokio::test]
async fn init_applies_profile_defaults() {
    let store = InMemorySiteStore::new();
    let mailer = FakeMailer::new();

    let site = bootstrap(&store, &mailer).await;

    assert_eq!(site.currency, DEFAULT_CURRENCY);
    assert_eq!(site.timezone, DEFAULT_TIMEZONE);
    assert_eq!(site.date_format, DEFAULT_DATE_FORMAT);
    assert_eq!(site.time_format, DEFAULT_TIME_FORMAT);
    assert_eq!(site.week_starts_on, DEFAULT_WEEK_STARTS_ON);
}

#[tokio::test]
async fn first_send_delivery_failure_is_surfaced() {
    let store = InMemorySiteStore::new();
    let mailer = FakeMailer::new();
    mailer.fail_deliveries();

    let err = session::init_site(&store, &mailer, &test_otp_settings(), valid_init())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Email(_)));

    // The account was persisted before delivery was attempted; the failure
    // is reported, not hidden.
    assert!(store.find_site().await.unwrap().is_some());
}
