//! Postgres-backed `SiteStore`.
//!
//! The singleton record lives in one row; refresh-token digests are kept in a
//! `text[]` column so the whole account updates atomically under the version
//! check. A unique index over a constant enforces the single-row invariant at
//! the schema level as well.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::site::{PendingVerification, ResetToken, Site, VerificationState};
use crate::store::SiteStore;

pub struct PgSiteStore {
    pool: PgPool,
}

impl PgSiteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SiteRow {
    id: Uuid,
    site_name: String,
    site_description: Option<String>,
    email: String,
    password_hash: String,
    currency: String,
    timezone: String,
    date_format: String,
    time_format: String,
    week_starts_on: String,
    otp: Option<String>,
    otp_expires_at: Option<DateTime<Utc>>,
    last_resend_at: Option<DateTime<Utc>>,
    resend_attempts: i32,
    reset_token: Option<String>,
    reset_token_expires_at: Option<DateTime<Utc>>,
    refresh_tokens: Vec<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SiteRow {
    fn into_site(self) -> Result<Site, StoreError> {
        let verification = match (self.otp, self.otp_expires_at) {
            (Some(otp), Some(otp_expires_at)) => {
                VerificationState::Pending(PendingVerification {
                    otp,
                    otp_expires_at,
                    last_resend_at: self.last_resend_at,
                    resend_attempts: self.resend_attempts.max(0) as u32,
                })
            }
            (None, None) => VerificationState::Verified,
            _ => {
                return Err(StoreError::Unavailable(
                    "corrupt verification state: otp and expiry must travel together"
                        .to_string(),
                ))
            }
        };

        let reset_token = match (self.reset_token, self.reset_token_expires_at) {
            (Some(token), Some(expires_at)) => Some(ResetToken { token, expires_at }),
            (None, None) => None,
            _ => {
                return Err(StoreError::Unavailable(
                    "corrupt reset state: token and expiry must travel together".to_string(),
                ))
            }
        };

        Ok(Site {
            id: self.id,
            site_name: self.site_name,
            site_description: self.site_description,
            email: self.email,
            password_hash: self.password_hash,
            currency: self.currency,
            timezone: self.timezone,
            date_format: self.date_format,
            time_format: self.time_format,
            week_starts_on: self.week_starts_on,
            verification,
            reset_token,
            refresh_tokens: self.refresh_tokens,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Flattens the verification state back into nullable columns.
fn verification_columns(
    site: &Site,
) -> (Option<&str>, Option<DateTime<Utc>>, Option<DateTime<Utc>>, i32) {
    match &site.verification {
        VerificationState::Pending(pending) => (
            Some(pending.otp.as_str()),
            Some(pending.otp_expires_at),
            pending.last_resend_at,
            pending.resend_attempts as i32,
        ),
        VerificationState::Verified => (None, None, None, 0),
    }
}

fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[async_trait::async_trait]
impl SiteStore for PgSiteStore {
    async fn find_site(&self) -> Result<Option<Site>, StoreError> {
        sqlx::query_as::<_, SiteRow>("SELECT * FROM site LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?
            .map(SiteRow::into_site)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Site>, StoreError> {
        sqlx::query_as::<_, SiteRow>("SELECT * FROM site WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?
            .map(SiteRow::into_site)
            .transpose()
    }

    async fn find_by_refresh_token(
        &self,
        token_digest: &str,
    ) -> Result<Option<Site>, StoreError> {
        sqlx::query_as::<_, SiteRow>("SELECT * FROM site WHERE $1 = ANY(refresh_tokens)")
            .bind(token_digest)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?
            .map(SiteRow::into_site)
            .transpose()
    }

    async fn create(&self, site: &Site) -> Result<(), StoreError> {
        let (otp, otp_expires_at, last_resend_at, resend_attempts) = verification_columns(site);
        let (reset_token, reset_token_expires_at) = match &site.reset_token {
            Some(reset) => (Some(reset.token.as_str()), Some(reset.expires_at)),
            None => (None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO site (
                id, site_name, site_description, email, password_hash,
                currency, timezone, date_format, time_format, week_starts_on,
                otp, otp_expires_at, last_resend_at, resend_attempts,
                reset_token, reset_token_expires_at, refresh_tokens,
                version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            "#,
        )
        .bind(site.id)
        .bind(&site.site_name)
        .bind(&site.site_description)
        .bind(&site.email)
        .bind(&site.password_hash)
        .bind(&site.currency)
        .bind(&site.timezone)
        .bind(&site.date_format)
        .bind(&site.time_format)
        .bind(&site.week_starts_on)
        .bind(otp)
        .bind(otp_expires_at)
        .bind(last_resend_at)
        .bind(resend_attempts)
        .bind(reset_token)
        .bind(reset_token_expires_at)
        .bind(&site.refresh_tokens)
        .bind(site.version)
        .bind(site.created_at)
        .bind(site.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let message = e.to_string();
            if message.contains("duplicate key") || message.contains("unique constraint") {
                StoreError::Conflict
            } else {
                StoreError::Unavailable(message)
            }
        })?;

        Ok(())
    }

    async fn update(&self, site: &Site) -> Result<Site, StoreError> {
        let (otp, otp_expires_at, last_resend_at, resend_attempts) = verification_columns(site);
        let (reset_token, reset_token_expires_at) = match &site.reset_token {
            Some(reset) => (Some(reset.token.as_str()), Some(reset.expires_at)),
            None => (None, None),
        };

        let row = sqlx::query_as::<_, SiteRow>(
            r#"
            UPDATE site
            SET password_hash = $3,
                otp = $4,
                otp_expires_at = $5,
                last_resend_at = $6,
                resend_attempts = $7,
                reset_token = $8,
                reset_token_expires_at = $9,
                refresh_tokens = $10,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(site.id)
        .bind(site.version)
        .bind(&site.password_hash)
        .bind(otp)
        .bind(otp_expires_at)
        .bind(last_resend_at)
        .bind(resend_attempts)
        .bind(reset_token)
        .bind(reset_token_expires_at)
        .bind(&site.refresh_tokens)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        match row {
            Some(row) => row.into_site(),
            // No row matched id+version: a concurrent writer got there first.
            None => Err(StoreError::Conflict),
        }
    }
}
