//! Storage for affiliate accounts, catalog products, sales and team memberships.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use storefront_affiliates::{AffiliateAccount, AffiliateSale, AffiliateScope, AffiliationSnapshot, Product};
use storefront_auth::TeamMembership;
use storefront_core::{AffiliateId, DomainError, ExternalId, SellerId, UserId};

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend failure: {0}")]
    Backend(String),

    #[error("stored record is inconsistent: {0}")]
    Corrupt(#[from] DomainError),

    #[error("duplicate record: {0}")]
    Duplicate(String),
}

/// Affiliate accounts and the data the affiliated products listing reads.
///
/// Every scoped read applies [`AffiliateScope`] the same way
/// [`AffiliateScope::matches`] does.
#[async_trait]
pub trait AffiliateRepository: Send + Sync {
    /// Accounts matching `scope`, plus the products and sales they reference.
    async fn snapshot(&self, scope: &AffiliateScope) -> Result<AffiliationSnapshot, StoreError>;

    /// A single account matching `scope` with the given public id.
    async fn find_by_external_id(
        &self,
        scope: &AffiliateScope,
        external_id: &ExternalId,
    ) -> Result<Option<AffiliateAccount>, StoreError>;

    /// Soft-delete an alive account. Returns `false` if it was not alive
    /// (already removed or unknown).
    async fn mark_removed(&self, id: AffiliateId, at: DateTime<Utc>) -> Result<bool, StoreError>;

    async fn insert_account(&self, account: &AffiliateAccount) -> Result<(), StoreError>;

    async fn insert_product(&self, product: &Product) -> Result<(), StoreError>;

    async fn record_sale(&self, sale: &AffiliateSale) -> Result<(), StoreError>;
}

/// Team memberships per seller.
#[async_trait]
pub trait TeamDirectory: Send + Sync {
    /// Memberships `user` holds on `seller`'s team.
    async fn memberships(&self, user: UserId, seller: SellerId) -> Result<Vec<TeamMembership>, StoreError>;

    async fn add_membership(&self, membership: &TeamMembership) -> Result<(), StoreError>;
}
