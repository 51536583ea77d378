//! In-memory `SiteStore`, used by the test suites and local development.

use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::site::Site;
use crate::store::SiteStore;

#[derive(Default)]
pub struct InMemorySiteStore {
    inner: RwLock<Option<Site>>,
}

impl InMemorySiteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SiteStore for InMemorySiteStore {
    async fn find_site(&self) -> Result<Option<Site>, StoreError> {
        Ok(self.inner.read().await.clone())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Site>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .as_ref()
            .filter(|site| site.email == email)
            .cloned())
    }

    async fn find_by_refresh_token(
        &self,
        token_digest: &str,
    ) -> Result<Option<Site>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .as_ref()
            .filter(|site| site.refresh_tokens.iter().any(|t| t == token_digest))
            .cloned())
    }

    async fn create(&self, site: &Site) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;

        if guard.is_some() {
            return Err(StoreError::Conflict);
        }

        *guard = Some(site.clone());
        Ok(())
    }

    async fn update(&self, site: &Site) -> Result<Site, StoreError> {
        let mut guard = self.inner.write().await;

        match guard.as_mut() {
            Some(current) if current.id == site.id => {
                if current.version != site.version {
                    return Err(StoreError::Conflict);
                }

                let mut updated = site.clone();
                updated.version += 1;
                updated.updated_at = Utc::now();
                *current = updated.clone();
                Ok(updated)
            }
            _ => Err(StoreError::Unavailable("site record not found".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{PendingVerification, VerificationState};
    use chrono::Duration;
    use uuid::Uuid;

    fn sample_site() -> Site {
        let now = Utc::now();
        Site {
            id: Uuid::new_v4(),
            site_name: "My Site".to_string(),
            site_description: None,
            email: "admin@example.com".to_string(),
            password_hash: "$2b$12$fakefakefakefakefakefake".to_string(),
            currency: "USD".to_string(),
            timezone: "America/New_York".to_string(),
            date_format: "MMMM DD, YYYY".to_string(),
            time_format: "h:mm A".to_string(),
            week_starts_on: "Monday".to_string(),
            verification: VerificationState::Pending(PendingVerification {
                otp: "123456".to_string(),
                otp_expires_at: now + Duration::minutes(10),
                last_resend_at: None,
                resend_attempts: 0,
            }),
            reset_token: None,
            refresh_tokens: Vec::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn create_rejects_a_second_record() {
        let store = InMemorySiteStore::new();
        store.create(&sample_site()).await.unwrap();

        assert!(matches!(
            store.create(&sample_site()).await,
            Err(StoreError::Conflict)
        ));
    }

    #[tokio::test]
    async fn update_bumps_version_and_rejects_stale_writers() {
        let store = InMemorySiteStore::new();
        let site = sample_site();
        store.create(&site).await.unwrap();

        let updated = store.update(&site).await.unwrap();
        assert_eq!(updated.version, site.version + 1);

        // The original copy is now stale.
        assert!(matches!(
            store.update(&site).await,
            Err(StoreError::Conflict)
        ));
        assert!(store.update(&updated).await.is_ok());
    }

    #[tokio::test]
    async fn refresh_token_lookup_matches_digests() {
        let store = InMemorySiteStore::new();
        let mut site = sample_site();
        site.refresh_tokens.push("digest-1".to_string());
        store.create(&site).await.unwrap();

        assert!(store
            .find_by_refresh_token("digest-1")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_by_refresh_token("digest-2")
            .await
            .unwrap()
            .is_none());
    }
}
