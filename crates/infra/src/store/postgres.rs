//! Postgres-backed store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | Database (unique violation, `23505`) | `Duplicate` |
//! | Anything else | `Backend` |
//!
//! Rows that fail domain validation on the way out surface as `Corrupt`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::instrument;
use uuid::Uuid;

use storefront_affiliates::{
    AffiliateAccount, AffiliateKind, AffiliateProduct, AffiliateSale, AffiliateScope,
    AffiliationSnapshot, Lifecycle, Product,
};
use storefront_auth::{TeamMembership, TeamRole};
use storefront_core::{AffiliateId, ExternalId, ProductId, SellerId, UserId};

use super::{AffiliateRepository, StoreError, TeamDirectory};

const SCHEMA: &str = include_str!("../../migrations/0001_affiliates.sql");

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                StoreError::Duplicate(db.message().to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&*self.pool).await?;
        Ok(())
    }

    async fn load_accounts(&self, scope: &AffiliateScope, external_id: Option<&ExternalId>) -> Result<Vec<AffiliateAccount>, StoreError> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT id, external_id, affiliate_user_id, seller_id, kind, deleted_at FROM affiliate_accounts WHERE TRUE",
        );
        if let Some(user) = scope.affiliate_user {
            qb.push(" AND affiliate_user_id = ").push_bind(*user.as_uuid());
        }
        if let Some(seller) = scope.seller {
            qb.push(" AND seller_id = ").push_bind(*seller.as_uuid());
        }
        if let Some(kind) = scope.kind {
            qb.push(" AND kind = ").push_bind(kind.as_str());
        }
        if scope.alive_only {
            qb.push(" AND deleted_at IS NULL");
        }
        if let Some(external_id) = external_id {
            qb.push(" AND external_id = ").push_bind(external_id.as_str().to_string());
        }
        qb.push(" ORDER BY external_id");

        let rows = qb.build().fetch_all(&*self.pool).await?;
        let ids: Vec<Uuid> = rows
            .iter()
            .map(|r| r.try_get::<Uuid, _>("id"))
            .collect::<Result<_, _>>()?;

        let mut links: HashMap<Uuid, Vec<AffiliateProduct>> = HashMap::new();
        let link_rows = sqlx::query(
            r#"
            SELECT account_id, product_id, fee_basis_points
            FROM affiliate_account_products
            WHERE account_id = ANY($1)
            ORDER BY account_id, product_id
            "#,
        )
        .bind(&ids)
        .fetch_all(&*self.pool)
        .await?;
        for row in link_rows {
            let account_id: Uuid = row.try_get("account_id")?;
            let product_id: Uuid = row.try_get("product_id")?;
            let fee: i32 = row.try_get("fee_basis_points")?;
            let fee = u32::try_from(fee).map_err(|_| StoreError::Backend(format!("negative fee {fee}")))?;
            links
                .entry(account_id)
                .or_default()
                .push(AffiliateProduct::new(ProductId::from_uuid(product_id), fee)?);
        }

        rows.iter()
            .map(|row| account_from_row(row, &mut links))
            .collect()
    }
}

fn account_from_row(row: &PgRow, links: &mut HashMap<Uuid, Vec<AffiliateProduct>>) -> Result<AffiliateAccount, StoreError> {
    let id: Uuid = row.try_get("id")?;
    let external_id: String = row.try_get("external_id")?;
    let affiliate_user: Uuid = row.try_get("affiliate_user_id")?;
    let seller: Option<Uuid> = row.try_get("seller_id")?;
    let kind: String = row.try_get("kind")?;
    let deleted_at: Option<DateTime<Utc>> = row.try_get("deleted_at")?;

    Ok(AffiliateAccount::rehydrate(
        AffiliateId::from_uuid(id),
        ExternalId::parse(&external_id)?,
        UserId::from_uuid(affiliate_user),
        seller.map(SellerId::from_uuid),
        kind.parse::<AffiliateKind>()?,
        links.remove(&id).unwrap_or_default(),
        Lifecycle::from_deleted_at(deleted_at),
    )?)
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    let price: i64 = row.try_get("price_cents")?;
    Ok(Product {
        id: ProductId::from_uuid(row.try_get("id")?),
        seller: SellerId::from_uuid(row.try_get("seller_id")?),
        name: row.try_get("name")?,
        permalink: row.try_get("permalink")?,
        price_cents: u64::try_from(price).map_err(|_| StoreError::Backend(format!("negative price {price}")))?,
    })
}

fn cents_to_db(cents: u64) -> Result<i64, StoreError> {
    i64::try_from(cents).map_err(|_| StoreError::Backend(format!("amount {cents} out of range")))
}

#[async_trait]
impl AffiliateRepository for PostgresStore {
    #[instrument(skip(self))]
    async fn snapshot(&self, scope: &AffiliateScope) -> Result<AffiliationSnapshot, StoreError> {
        let accounts = self.load_accounts(scope, None).await?;
        let ids: Vec<Uuid> = accounts.iter().map(|a| *a.id_typed().as_uuid()).collect();

        let sales = sqlx::query(
            "SELECT account_id, product_id, credit_cents FROM affiliate_sales WHERE account_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(&*self.pool)
        .await?
        .iter()
        .map(|row| -> Result<AffiliateSale, StoreError> {
            let credit: i64 = row.try_get("credit_cents")?;
            Ok(AffiliateSale {
                account: AffiliateId::from_uuid(row.try_get("account_id")?),
                product: ProductId::from_uuid(row.try_get("product_id")?),
                credit_cents: u64::try_from(credit)
                    .map_err(|_| StoreError::Backend(format!("negative credit {credit}")))?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

        let mut product_ids: Vec<Uuid> = sales.iter().map(|s| *s.product.as_uuid()).collect();
        for account in &accounts {
            product_ids.extend(account.products().iter().map(|p| *p.product.as_uuid()));
        }
        product_ids.sort();
        product_ids.dedup();

        let products = sqlx::query(
            "SELECT id, seller_id, name, permalink, price_cents FROM products WHERE id = ANY($1)",
        )
        .bind(&product_ids)
        .fetch_all(&*self.pool)
        .await?
        .iter()
        .map(product_from_row)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(AffiliationSnapshot { accounts, products, sales })
    }

    #[instrument(skip(self))]
    async fn find_by_external_id(
        &self,
        scope: &AffiliateScope,
        external_id: &ExternalId,
    ) -> Result<Option<AffiliateAccount>, StoreError> {
        Ok(self.load_accounts(scope, Some(external_id)).await?.into_iter().next())
    }

    #[instrument(skip(self))]
    async fn mark_removed(&self, id: AffiliateId, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE affiliate_accounts SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id.as_uuid())
        .bind(at)
        .execute(&*self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert_account(&self, account: &AffiliateAccount) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO affiliate_accounts (id, external_id, affiliate_user_id, seller_id, kind, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(account.id_typed().as_uuid())
        .bind(account.external_id().as_str())
        .bind(account.affiliate_user().as_uuid())
        .bind(account.seller().map(|s| *s.as_uuid()))
        .bind(account.kind().as_str())
        .bind(account.lifecycle().deleted_at())
        .execute(&mut *tx)
        .await?;

        for link in account.products() {
            sqlx::query(
                "INSERT INTO affiliate_account_products (account_id, product_id, fee_basis_points) VALUES ($1, $2, $3)",
            )
            .bind(account.id_typed().as_uuid())
            .bind(link.product.as_uuid())
            .bind(i32::try_from(link.fee_basis_points).map_err(|_| StoreError::Backend("fee out of range".to_string()))?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO products (id, seller_id, name, permalink, price_cents) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(product.id.as_uuid())
        .bind(product.seller.as_uuid())
        .bind(&product.name)
        .bind(&product.permalink)
        .bind(cents_to_db(product.price_cents)?)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn record_sale(&self, sale: &AffiliateSale) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO affiliate_sales (account_id, product_id, credit_cents) VALUES ($1, $2, $3)")
            .bind(sale.account.as_uuid())
            .bind(sale.product.as_uuid())
            .bind(cents_to_db(sale.credit_cents)?)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TeamDirectory for PostgresStore {
    async fn memberships(&self, user: UserId, seller: SellerId) -> Result<Vec<TeamMembership>, StoreError> {
        let rows = sqlx::query("SELECT role FROM team_memberships WHERE user_id = $1 AND seller_id = $2")
            .bind(user.as_uuid())
            .bind(seller.as_uuid())
            .fetch_all(&*self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<TeamMembership, StoreError> {
                let role: String = row.try_get("role")?;
                Ok(TeamMembership { user, seller, role: role.parse::<TeamRole>()? })
            })
            .collect()
    }

    async fn add_membership(&self, membership: &TeamMembership) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO team_memberships (user_id, seller_id, role) VALUES ($1, $2, $3)
            ON CONFLICT (user_id, seller_id) DO UPDATE SET role = EXCLUDED.role
            "#,
        )
        .bind(membership.user.as_uuid())
        .bind(membership.seller.as_uuid())
        .bind(membership.role.as_str())
        .execute(&*self.pool)
        .await?;
        Ok(())
    }
}
