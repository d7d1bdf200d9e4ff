use serde::{Deserialize, Serialize};

use storefront_core::{SellerId, UserId};

use crate::TeamRole;

/// A user's standing on a seller's team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMembership {
    pub user: UserId,
    pub seller: SellerId,
    pub role: TeamRole,
}

/// An authenticated user acting within one seller's scope.
///
/// Built once per request; the role is resolved at construction so the
/// policy never touches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerContext {
    user: UserId,
    seller: SellerId,
    role: Option<TeamRole>,
}

impl SellerContext {
    pub fn new(user: UserId, seller: SellerId, role: Option<TeamRole>) -> Self {
        Self { user, seller, role }
    }

    /// Resolve the actor's role for `seller` from its team memberships.
    ///
    /// The seller's own user is the owner regardless of memberships.
    /// Memberships for other sellers or other users are ignored.
    pub fn resolve(user: UserId, seller: SellerId, memberships: &[TeamMembership]) -> Self {
        let role = if seller.owner() == user {
            Some(TeamRole::Owner)
        } else {
            memberships
                .iter()
                .find(|m| m.user == user && m.seller == seller)
                .map(|m| m.role)
        };
        Self::new(user, seller, role)
    }

    pub fn user(&self) -> UserId {
        self.user
    }

    pub fn seller(&self) -> SellerId {
        self.seller
    }

    pub fn role(&self) -> Option<TeamRole> {
        self.role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seller_user_resolves_to_owner() {
        let seller = SellerId::new();
        let ctx = SellerContext::resolve(seller.owner(), seller, &[]);
        assert_eq!(ctx.role(), Some(TeamRole::Owner));
    }

    #[test]
    fn membership_role_is_scoped_to_seller_and_user() {
        let seller = SellerId::new();
        let other_seller = SellerId::new();
        let user = UserId::new();
        let memberships = vec![
            TeamMembership { user, seller: other_seller, role: TeamRole::Admin },
            TeamMembership { user: UserId::new(), seller, role: TeamRole::Admin },
            TeamMembership { user, seller, role: TeamRole::Marketing },
        ];

        let ctx = SellerContext::resolve(user, seller, &memberships);
        assert_eq!(ctx.role(), Some(TeamRole::Marketing));

        let outsider = SellerContext::resolve(UserId::new(), seller, &memberships);
        assert_eq!(outsider.role(), None);
    }
}
