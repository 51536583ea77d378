//! Persistence abstraction over the singleton site record.

pub mod memory;
pub mod postgres;

pub use memory::InMemorySiteStore;
pub use postgres::PgSiteStore;

use crate::error::StoreError;
use crate::site::Site;

/// Keyed store over the single site account.
///
/// `update` is conditional on the record's `version` and fails with
/// `StoreError::Conflict` when the caller's copy is stale; protocol
/// operations re-read and re-check their preconditions before retrying.
#[async_trait::async_trait]
pub trait SiteStore: Send + Sync {
    /// The singleton record, if the site has been initialized.
    async fn find_site(&self) -> Result<Option<Site>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Site>, StoreError>;

    /// Looks the account up by a refresh-token digest.
    async fn find_by_refresh_token(&self, token_digest: &str)
        -> Result<Option<Site>, StoreError>;

    /// Inserts the record. Fails with `Conflict` when one already exists.
    async fn create(&self, site: &Site) -> Result<(), StoreError>;

    /// Version-checked write of the full record. Returns the stored copy
    /// with its bumped version.
    async fn update(&self, site: &Site) -> Result<Site, StoreError>;
}
