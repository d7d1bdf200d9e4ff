use serde::{Deserialize, Serialize};

use storefront_core::{AffiliateId, DomainError, DomainResult, Entity, ProductId, SellerId};

/// Catalog entry an affiliate can earn on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub seller: SellerId,
    pub name: String,
    pub permalink: String,
    pub price_cents: u64,
}

impl Product {
    pub fn new(
        seller: SellerId,
        name: impl Into<String>,
        permalink: impl Into<String>,
        price_cents: u64,
    ) -> DomainResult<Self> {
        let name = name.into();
        let permalink = permalink.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if permalink.is_empty() || !permalink.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(DomainError::validation(format!("invalid permalink '{permalink}'")));
        }
        Ok(Self { id: ProductId::new(), seller, name, permalink, price_cents })
    }

    /// Public product page under `base_url`.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}/l/{}", base_url.trim_end_matches('/'), self.permalink)
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// One purchase credited to an affiliate account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliateSale {
    pub account: AffiliateId,
    pub product: ProductId,
    pub credit_cents: u64,
}
