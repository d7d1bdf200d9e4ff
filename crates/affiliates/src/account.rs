use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_auth::{DenialKind, OwnedResource};
use storefront_core::{AffiliateId, DomainError, DomainResult, Entity, ExternalId, ProductId, SellerId, UserId, ValueObject};

/// Commission rate paid to global affiliates, in basis points.
pub const GLOBAL_AFFILIATE_FEE_BASIS_POINTS: u32 = 1_000;

/// Highest commission a seller may offer a direct affiliate (90%).
pub const MAX_FEE_BASIS_POINTS: u32 = 9_000;

// ─────────────────────────────────────────────────────────────────────────────
// Kind + lifecycle
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffiliateKind {
    /// Scoped to exactly one seller.
    Direct,
    /// Not tied to a seller; earns on any product sold through it.
    Global,
}

impl AffiliateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AffiliateKind::Direct => "direct",
            AffiliateKind::Global => "global",
        }
    }

    /// Row label used by the affiliated products listing.
    pub fn type_label(&self) -> &'static str {
        match self {
            AffiliateKind::Direct => "direct_affiliate",
            AffiliateKind::Global => "global_affiliate",
        }
    }
}

impl core::str::FromStr for AffiliateKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(AffiliateKind::Direct),
            "global" => Ok(AffiliateKind::Global),
            other => Err(DomainError::validation(format!("unknown affiliate kind '{other}'"))),
        }
    }
}

/// Soft-delete state. Removed accounts are kept but invisible to alive scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Lifecycle {
    Alive,
    Removed { at: DateTime<Utc> },
}

impl Lifecycle {
    pub fn from_deleted_at(deleted_at: Option<DateTime<Utc>>) -> Self {
        match deleted_at {
            Some(at) => Lifecycle::Removed { at },
            None => Lifecycle::Alive,
        }
    }

    pub fn is_alive(&self) -> bool {
        matches!(self, Lifecycle::Alive)
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Lifecycle::Alive => None,
            Lifecycle::Removed { at } => Some(*at),
        }
    }
}

/// A product covered by an affiliate account, with its commission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliateProduct {
    pub product: ProductId,
    pub fee_basis_points: u32,
}

impl ValueObject for AffiliateProduct {}

impl AffiliateProduct {
    pub fn new(product: ProductId, fee_basis_points: u32) -> DomainResult<Self> {
        if fee_basis_points == 0 || fee_basis_points > MAX_FEE_BASIS_POINTS {
            return Err(DomainError::validation(format!(
                "affiliate fee must be between 1 and {MAX_FEE_BASIS_POINTS} basis points"
            )));
        }
        Ok(Self { product, fee_basis_points })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Account
// ─────────────────────────────────────────────────────────────────────────────

/// An affiliate relationship held by `affiliate_user`.
///
/// # Invariants
/// - `kind` never changes after construction.
/// - Direct accounts have a seller; global accounts have none.
/// - Removal is one-way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffiliateAccount {
    id: AffiliateId,
    external_id: ExternalId,
    affiliate_user: UserId,
    seller: Option<SellerId>,
    kind: AffiliateKind,
    products: Vec<AffiliateProduct>,
    lifecycle: Lifecycle,
}

impl AffiliateAccount {
    /// New alive direct affiliate of `seller`.
    pub fn direct(affiliate_user: UserId, seller: SellerId, products: Vec<AffiliateProduct>) -> Self {
        Self {
            id: AffiliateId::new(),
            external_id: ExternalId::generate(),
            affiliate_user,
            seller: Some(seller),
            kind: AffiliateKind::Direct,
            products,
            lifecycle: Lifecycle::Alive,
        }
    }

    /// New alive global affiliate account.
    pub fn global(affiliate_user: UserId) -> Self {
        Self {
            id: AffiliateId::new(),
            external_id: ExternalId::generate(),
            affiliate_user,
            seller: None,
            kind: AffiliateKind::Global,
            products: Vec::new(),
            lifecycle: Lifecycle::Alive,
        }
    }

    /// Rebuild an account from storage, enforcing the kind/seller pairing.
    pub fn rehydrate(
        id: AffiliateId,
        external_id: ExternalId,
        affiliate_user: UserId,
        seller: Option<SellerId>,
        kind: AffiliateKind,
        products: Vec<AffiliateProduct>,
        lifecycle: Lifecycle,
    ) -> DomainResult<Self> {
        match (kind, seller) {
            (AffiliateKind::Direct, None) => {
                return Err(DomainError::invariant("direct affiliate without a seller"));
            }
            (AffiliateKind::Global, Some(_)) => {
                return Err(DomainError::invariant("global affiliate scoped to a seller"));
            }
            _ => {}
        }
        Ok(Self { id, external_id, affiliate_user, seller, kind, products, lifecycle })
    }

    /// Soft-delete this account.
    pub fn mark_removed(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if !self.lifecycle.is_alive() {
            return Err(DomainError::conflict(format!(
                "affiliate account {} is already removed",
                self.external_id
            )));
        }
        self.lifecycle = Lifecycle::Removed { at };
        Ok(())
    }

    pub fn id_typed(&self) -> AffiliateId {
        self.id
    }

    pub fn external_id(&self) -> &ExternalId {
        &self.external_id
    }

    pub fn affiliate_user(&self) -> UserId {
        self.affiliate_user
    }

    pub fn seller(&self) -> Option<SellerId> {
        self.seller
    }

    pub fn kind(&self) -> AffiliateKind {
        self.kind
    }

    pub fn products(&self) -> &[AffiliateProduct] {
        &self.products
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_alive(&self) -> bool {
        self.lifecycle.is_alive()
    }
}

impl Entity for AffiliateAccount {
    type Id = AffiliateId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl OwnedResource for AffiliateAccount {
    fn owner(&self) -> UserId {
        self.affiliate_user
    }

    fn self_service_blocker(&self) -> Option<DenialKind> {
        if self.kind != AffiliateKind::Direct {
            return Some(DenialKind::NotDirect);
        }
        if !self.is_alive() {
            return Some(DenialKind::AlreadyRemoved);
        }
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scope
// ─────────────────────────────────────────────────────────────────────────────

/// Filter predicate over affiliate accounts.
///
/// Any storage layer applies the same rules: in memory via [`AffiliateScope::matches`],
/// in SQL by translating each populated field to a `WHERE` clause.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffiliateScope {
    pub affiliate_user: Option<UserId>,
    pub seller: Option<SellerId>,
    pub kind: Option<AffiliateKind>,
    pub alive_only: bool,
}

impl AffiliateScope {
    /// Accounts held by `user` (as the affiliate).
    pub fn held_by(user: UserId) -> Self {
        Self { affiliate_user: Some(user), ..Self::default() }
    }

    pub fn of_seller(mut self, seller: SellerId) -> Self {
        self.seller = Some(seller);
        self
    }

    pub fn direct(mut self) -> Self {
        self.kind = Some(AffiliateKind::Direct);
        self
    }

    pub fn alive(mut self) -> Self {
        self.alive_only = true;
        self
    }

    pub fn matches(&self, account: &AffiliateAccount) -> bool {
        self.affiliate_user.is_none_or(|u| u == account.affiliate_user)
            && self.seller.is_none_or(|s| Some(s) == account.seller)
            && self.kind.is_none_or(|k| k == account.kind)
            && (!self.alive_only || account.is_alive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn fee(bp: u32) -> AffiliateProduct {
        AffiliateProduct::new(ProductId::new(), bp).unwrap()
    }

    #[test]
    fn fee_must_be_within_bounds() {
        assert!(AffiliateProduct::new(ProductId::new(), 0).is_err());
        assert!(AffiliateProduct::new(ProductId::new(), MAX_FEE_BASIS_POINTS + 1).is_err());
        assert!(AffiliateProduct::new(ProductId::new(), MAX_FEE_BASIS_POINTS).is_ok());
    }

    #[test]
    fn removal_is_one_way() {
        let mut account = AffiliateAccount::direct(UserId::new(), SellerId::new(), vec![fee(2500)]);
        let at = Utc::now();
        account.mark_removed(at).unwrap();

        assert_eq!(account.lifecycle(), Lifecycle::Removed { at });
        assert_eq!(account.lifecycle().deleted_at(), Some(at));

        let err = account.mark_removed(at + Duration::minutes(1)).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(account.lifecycle().deleted_at(), Some(at));
    }

    #[test]
    fn rehydrate_rejects_mismatched_kind_and_seller() {
        let direct_without_seller = AffiliateAccount::rehydrate(
            AffiliateId::new(),
            ExternalId::generate(),
            UserId::new(),
            None,
            AffiliateKind::Direct,
            vec![],
            Lifecycle::Alive,
        );
        assert!(matches!(direct_without_seller, Err(DomainError::InvariantViolation(_))));

        let global_with_seller = AffiliateAccount::rehydrate(
            AffiliateId::new(),
            ExternalId::generate(),
            UserId::new(),
            Some(SellerId::new()),
            AffiliateKind::Global,
            vec![],
            Lifecycle::Alive,
        );
        assert!(matches!(global_with_seller, Err(DomainError::InvariantViolation(_))));
    }

    #[test]
    fn scope_filters_by_holder_kind_and_lifecycle() {
        let user = UserId::new();
        let seller = SellerId::new();
        let alive = AffiliateAccount::direct(user, seller, vec![]);
        let mut removed = AffiliateAccount::direct(user, seller, vec![]);
        removed.mark_removed(Utc::now()).unwrap();
        let global = AffiliateAccount::global(user);
        let someone_else = AffiliateAccount::direct(UserId::new(), seller, vec![]);

        let scope = AffiliateScope::held_by(user).direct().alive();
        assert!(scope.matches(&alive));
        assert!(!scope.matches(&removed));
        assert!(!scope.matches(&global));
        assert!(!scope.matches(&someone_else));

        let everything_held = AffiliateScope::held_by(user);
        assert!(everything_held.matches(&removed));
        assert!(everything_held.matches(&global));

        let other_seller = AffiliateScope::held_by(user).of_seller(SellerId::new());
        assert!(!other_seller.matches(&alive));
    }

    #[test]
    fn lifecycle_maps_from_nullable_timestamp() {
        assert_eq!(Lifecycle::from_deleted_at(None), Lifecycle::Alive);
        let at = Utc::now();
        assert_eq!(Lifecycle::from_deleted_at(Some(at)), Lifecycle::Removed { at });
    }
}
