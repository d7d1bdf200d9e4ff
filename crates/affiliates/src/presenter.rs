//! Affiliated products listing: one row per (affiliate account, product).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use storefront_core::{AffiliateId, DomainResult, ExternalId, ProductId, SellerId};

use crate::account::{AffiliateAccount, AffiliateKind, AffiliateScope, GLOBAL_AFFILIATE_FEE_BASIS_POINTS};
use crate::pagination::{DEFAULT_PER_PAGE, PageRequest, Pagination};
use crate::product::{AffiliateSale, Product};
use crate::sort::{Sort, SortKey};

/// Everything the presenter reads, as loaded by a repository.
#[derive(Debug, Clone, Default)]
pub struct AffiliationSnapshot {
    pub accounts: Vec<AffiliateAccount>,
    pub products: Vec<Product>,
    pub sales: Vec<AffiliateSale>,
}

/// One row of the affiliated products table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffiliatedProduct {
    pub product_id: ProductId,
    pub product_name: String,
    pub url: String,
    pub fee_percentage: f64,
    pub revenue: u64,
    pub humanized_revenue: String,
    pub sales_count: u64,
    pub affiliate_type: String,
    pub affiliate_id: ExternalId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AffiliateStats {
    pub total_revenue: u64,
    pub total_sales: u64,
    pub total_products: u64,
    pub total_affiliated_creators: u64,
}

/// Page props for the affiliated products page (HTML and JSON variants).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffiliatedProductsPage {
    pub affiliated_products: Vec<AffiliatedProduct>,
    pub pagination: Pagination,
    pub stats: AffiliateStats,
}

/// Builds the affiliated products page for a seller acting as an affiliate.
#[derive(Debug, Clone)]
pub struct AffiliatedProductsPresenter {
    seller: SellerId,
    query: Option<String>,
    page: Option<u32>,
    sort: Sort,
    per_page: u32,
    base_url: String,
}

impl AffiliatedProductsPresenter {
    pub fn new(seller: SellerId) -> Self {
        Self {
            seller,
            query: None,
            page: None,
            sort: Sort::default(),
            per_page: DEFAULT_PER_PAGE,
            base_url: String::new(),
        }
    }

    pub fn query(mut self, query: Option<String>) -> Self {
        self.query = query
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());
        self
    }

    pub fn page(mut self, page: Option<u32>) -> Self {
        self.page = page;
        self
    }

    pub fn sort(mut self, sort: Option<Sort>) -> Self {
        self.sort = sort.unwrap_or_default();
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Accounts this presenter lists: alive ones held by the seller's own user.
    pub fn scope(&self) -> AffiliateScope {
        AffiliateScope::held_by(self.seller.owner()).alive()
    }

    pub fn page_props(&self, snapshot: &AffiliationSnapshot) -> DomainResult<AffiliatedProductsPage> {
        let request = PageRequest::new(self.page, self.per_page)?;

        let mut rows = self.rows(snapshot);
        if let Some(query) = &self.query {
            rows.retain(|r| r.product.name.to_lowercase().contains(query.as_str()));
        }

        let stats = stats(&rows);
        rows.sort_by(|a, b| {
            self.sort
                .direction
                .apply(a.compare(b, self.sort.key))
                .then_with(|| a.product.name.to_lowercase().cmp(&b.product.name.to_lowercase()))
                .then_with(|| a.account.external_id().cmp(b.account.external_id()))
        });

        let pagination = Pagination::derive(request, rows.len());
        let affiliated_products = rows[request.bounds(rows.len())]
            .iter()
            .map(|r| r.to_row(&self.base_url))
            .collect();

        Ok(AffiliatedProductsPage { affiliated_products, pagination, stats })
    }

    fn rows<'a>(&self, snapshot: &'a AffiliationSnapshot) -> Vec<Row<'a>> {
        let scope = self.scope();
        let products: HashMap<ProductId, &Product> =
            snapshot.products.iter().map(|p| (p.id, p)).collect();

        let mut totals: HashMap<(AffiliateId, ProductId), (u64, u64)> = HashMap::new();
        for sale in &snapshot.sales {
            let entry = totals.entry((sale.account, sale.product)).or_default();
            entry.0 += 1;
            entry.1 += sale.credit_cents;
        }

        let mut rows = Vec::new();
        for account in snapshot.accounts.iter().filter(|a| scope.matches(a)) {
            let covered: Vec<(ProductId, u32)> = match account.kind() {
                AffiliateKind::Direct => account
                    .products()
                    .iter()
                    .map(|p| (p.product, p.fee_basis_points))
                    .collect(),
                AffiliateKind::Global => {
                    let mut sold: Vec<ProductId> = totals
                        .keys()
                        .filter(|(a, _)| *a == account.id_typed())
                        .map(|(_, p)| *p)
                        .collect();
                    sold.sort();
                    sold.into_iter()
                        .map(|p| (p, GLOBAL_AFFILIATE_FEE_BASIS_POINTS))
                        .collect()
                }
            };

            for (product_id, fee_basis_points) in covered {
                let Some(product) = products.get(&product_id) else {
                    tracing::debug!(%product_id, "affiliate product missing from catalog");
                    continue;
                };
                let (sales_count, revenue) = totals
                    .get(&(account.id_typed(), product_id))
                    .copied()
                    .unwrap_or_default();
                rows.push(Row { account, product, fee_basis_points, sales_count, revenue });
            }
        }
        rows
    }
}

struct Row<'a> {
    account: &'a AffiliateAccount,
    product: &'a Product,
    fee_basis_points: u32,
    sales_count: u64,
    revenue: u64,
}

impl Row<'_> {
    fn compare(&self, other: &Self, key: SortKey) -> core::cmp::Ordering {
        match key {
            SortKey::ProductName => self
                .product
                .name
                .to_lowercase()
                .cmp(&other.product.name.to_lowercase()),
            SortKey::Revenue => self.revenue.cmp(&other.revenue),
            SortKey::SalesCount => self.sales_count.cmp(&other.sales_count),
            SortKey::Commission => self.fee_basis_points.cmp(&other.fee_basis_points),
        }
    }

    fn to_row(&self, base_url: &str) -> AffiliatedProduct {
        AffiliatedProduct {
            product_id: self.product.id,
            product_name: self.product.name.clone(),
            url: self.product.url(base_url),
            fee_percentage: f64::from(self.fee_basis_points) / 100.0,
            revenue: self.revenue,
            humanized_revenue: humanize_cents(self.revenue),
            sales_count: self.sales_count,
            affiliate_type: self.account.kind().type_label().to_string(),
            affiliate_id: self.account.external_id().clone(),
        }
    }
}

fn stats(rows: &[Row<'_>]) -> AffiliateStats {
    let products: HashSet<ProductId> = rows.iter().map(|r| r.product.id).collect();
    let creators: HashSet<SellerId> = rows.iter().map(|r| r.product.seller).collect();
    AffiliateStats {
        total_revenue: rows.iter().map(|r| r.revenue).sum(),
        total_sales: rows.iter().map(|r| r.sales_count).sum(),
        total_products: products.len() as u64,
        total_affiliated_creators: creators.len() as u64,
    }
}

/// `123456` -> `"$1,234.56"`.
pub fn humanize_cents(cents: u64) -> String {
    let dollars = (cents / 100).to_string();
    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, ch) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${grouped}.{:02}", cents % 100)
}
