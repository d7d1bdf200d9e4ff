use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use storefront_affiliates::{AffiliateAccount, AffiliateSale, AffiliateScope, AffiliationSnapshot, Product};
use storefront_auth::TeamMembership;
use storefront_core::{AffiliateId, ExternalId, ProductId, SellerId, UserId};

use super::{AffiliateRepository, StoreError, TeamDirectory};

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<AffiliateId, AffiliateAccount>,
    products: HashMap<ProductId, Product>,
    sales: Vec<AffiliateSale>,
    memberships: Vec<TeamMembership>,
}

/// In-memory store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl AffiliateRepository for InMemoryStore {
    async fn snapshot(&self, scope: &AffiliateScope) -> Result<AffiliationSnapshot, StoreError> {
        let tables = self.read()?;

        let mut accounts: Vec<AffiliateAccount> = tables
            .accounts
            .values()
            .filter(|a| scope.matches(a))
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.external_id().cmp(b.external_id()));

        let account_ids: HashSet<AffiliateId> = accounts.iter().map(|a| a.id_typed()).collect();
        let sales: Vec<AffiliateSale> = tables
            .sales
            .iter()
            .filter(|s| account_ids.contains(&s.account))
            .copied()
            .collect();

        let mut product_ids: HashSet<ProductId> = sales.iter().map(|s| s.product).collect();
        for account in &accounts {
            product_ids.extend(account.products().iter().map(|p| p.product));
        }
        let products = product_ids
            .iter()
            .filter_map(|id| tables.products.get(id).cloned())
            .collect();

        Ok(AffiliationSnapshot { accounts, products, sales })
    }

    async fn find_by_external_id(
        &self,
        scope: &AffiliateScope,
        external_id: &ExternalId,
    ) -> Result<Option<AffiliateAccount>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .accounts
            .values()
            .find(|a| a.external_id() == external_id && scope.matches(a))
            .cloned())
    }

    async fn mark_removed(&self, id: AffiliateId, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        match tables.accounts.get_mut(&id) {
            Some(account) if account.is_alive() => {
                account.mark_removed(at)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_account(&self, account: &AffiliateAccount) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let clash = tables.accounts.contains_key(&account.id_typed())
            || tables.accounts.values().any(|a| a.external_id() == account.external_id());
        if clash {
            return Err(StoreError::Duplicate(format!("affiliate account {}", account.external_id())));
        }
        tables.accounts.insert(account.id_typed(), account.clone());
        Ok(())
    }

    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables.products.contains_key(&product.id) {
            return Err(StoreError::Duplicate(format!("product {}", product.id)));
        }
        tables.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn record_sale(&self, sale: &AffiliateSale) -> Result<(), StoreError> {
        self.write()?.sales.push(*sale);
        Ok(())
    }
}

#[async_trait]
impl TeamDirectory for InMemoryStore {
    async fn memberships(&self, user: UserId, seller: SellerId) -> Result<Vec<TeamMembership>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .memberships
            .iter()
            .filter(|m| m.user == user && m.seller == seller)
            .cloned()
            .collect())
    }

    async fn add_membership(&self, membership: &TeamMembership) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        tables
            .memberships
            .retain(|m| !(m.user == membership.user && m.seller == membership.seller));
        tables.memberships.push(membership.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_affiliates::AffiliateProduct;
    use storefront_auth::TeamRole;

    #[tokio::test]
    async fn snapshot_applies_scope_and_collects_related_rows() {
        let store = InMemoryStore::new();
        let creator = SellerId::new();
        let holder = UserId::new();

        let product = Product::new(creator, "Book", "book", 1_000).unwrap();
        let unrelated = Product::new(creator, "Other", "other", 1_000).unwrap();
        store.insert_product(&product).await.unwrap();
        store.insert_product(&unrelated).await.unwrap();

        let mine = AffiliateAccount::direct(
            holder,
            creator,
            vec![AffiliateProduct::new(product.id, 1_000).unwrap()],
        );
        let theirs = AffiliateAccount::direct(
            UserId::new(),
            creator,
            vec![AffiliateProduct::new(unrelated.id, 1_000).unwrap()],
        );
        store.insert_account(&mine).await.unwrap();
        store.insert_account(&theirs).await.unwrap();
        store
            .record_sale(&AffiliateSale { account: mine.id_typed(), product: product.id, credit_cents: 50 })
            .await
            .unwrap();
        store
            .record_sale(&AffiliateSale { account: theirs.id_typed(), product: unrelated.id, credit_cents: 70 })
            .await
            .unwrap();

        let snapshot = store.snapshot(&AffiliateScope::held_by(holder).alive()).await.unwrap();
        assert_eq!(snapshot.accounts.len(), 1);
        assert_eq!(snapshot.products, vec![product]);
        assert_eq!(snapshot.sales.len(), 1);
        assert_eq!(snapshot.sales[0].credit_cents, 50);
    }

    #[tokio::test]
    async fn mark_removed_only_transitions_alive_accounts() {
        let store = InMemoryStore::new();
        let account = AffiliateAccount::direct(UserId::new(), SellerId::new(), vec![]);
        store.insert_account(&account).await.unwrap();

        assert!(store.mark_removed(account.id_typed(), Utc::now()).await.unwrap());
        assert!(!store.mark_removed(account.id_typed(), Utc::now()).await.unwrap());
        assert!(!store.mark_removed(AffiliateId::new(), Utc::now()).await.unwrap());

        let alive_scope = AffiliateScope::held_by(account.affiliate_user()).alive();
        let found = store.find_by_external_id(&alive_scope, account.external_id()).await.unwrap();
        assert!(found.is_none());

        let any_scope = AffiliateScope::held_by(account.affiliate_user());
        let found = store.find_by_external_id(&any_scope, account.external_id()).await.unwrap();
        assert!(!found.unwrap().is_alive());
    }

    #[tokio::test]
    async fn duplicate_account_is_rejected() {
        let store = InMemoryStore::new();
        let account = AffiliateAccount::global(UserId::new());
        store.insert_account(&account).await.unwrap();
        assert!(matches!(store.insert_account(&account).await, Err(StoreError::Duplicate(_))));
    }

    #[tokio::test]
    async fn membership_is_replaced_per_user_and_seller() {
        let store = InMemoryStore::new();
        let (user, seller) = (UserId::new(), SellerId::new());
        store
            .add_membership(&TeamMembership { user, seller, role: TeamRole::Support })
            .await
            .unwrap();
        store
            .add_membership(&TeamMembership { user, seller, role: TeamRole::Admin })
            .await
            .unwrap();

        let found = store.memberships(user, seller).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].role, TeamRole::Admin);
        assert!(store.memberships(user, SellerId::new()).await.unwrap().is_empty());
    }
}
