//! `storefront-affiliates`: affiliate accounts, the affiliated products
//! listing, and its authorization policy.
//!
//! Pure domain code: storage and delivery live in `storefront-infra`.

pub mod account;
pub mod pagination;
pub mod policy;
pub mod presenter;
pub mod product;
pub mod sort;

pub use account::{AffiliateAccount, AffiliateKind, AffiliateProduct, AffiliateScope, Lifecycle};
pub use pagination::{PageRequest, Pagination};
pub use policy::AffiliatedPolicy;
pub use presenter::{
    AffiliateStats, AffiliatedProduct, AffiliatedProductsPage, AffiliatedProductsPresenter,
    AffiliationSnapshot,
};
pub use product::{AffiliateSale, Product};
pub use sort::{Direction, Sort, SortKey};
