use serde::Serialize;
use thiserror::Error;

use storefront_core::UserId;

use crate::{Action, PermissionTable, SellerContext};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: '{action}' denied ({reason})")]
    Forbidden { action: Action, reason: DenialKind },
}

/// A resource that supports owner-only self-service actions.
///
/// `owner` is the single user allowed to act on it; `self_service_blocker`
/// reports a resource state that rules the action out for everyone
/// (including the owner).
pub trait OwnedResource {
    fn owner(&self) -> UserId;

    fn self_service_blocker(&self) -> Option<DenialKind>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Decisions
// ─────────────────────────────────────────────────────────────────────────────

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// The actor has no role on the seller's team.
    NoMembership,
    /// The actor's role is not granted the action.
    RoleLacksAction,
    /// The action needs a resource and none was given.
    MissingResource,
    /// The affiliate account is not a direct affiliate.
    NotDirect,
    /// The resource was already soft-deleted.
    AlreadyRemoved,
    /// The actor is not the affiliate user on the account.
    NotAffiliateUser,
}

impl DenialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialKind::NoMembership => "no_membership",
            DenialKind::RoleLacksAction => "role_lacks_action",
            DenialKind::MissingResource => "missing_resource",
            DenialKind::NotDirect => "not_direct",
            DenialKind::AlreadyRemoved => "already_removed",
            DenialKind::NotAffiliateUser => "not_affiliate_user",
        }
    }
}

impl core::fmt::Display for DenialKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a policy check, with the first failed condition when denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub action: Action,
    pub denial: Option<DenialKind>,
}

impl Decision {
    pub fn grant(action: Action) -> Self {
        Self { action, denial: None }
    }

    pub fn deny(action: Action, reason: DenialKind) -> Self {
        Self { action, denial: Some(reason) }
    }

    pub fn granted(&self) -> bool {
        self.denial.is_none()
    }

    /// Convert into a `Result` for use at a request boundary.
    pub fn into_result(self) -> Result<(), AuthzError> {
        match self.denial {
            None => Ok(()),
            Some(reason) => Err(AuthzError::Forbidden { action: self.action, reason }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Checks
// ─────────────────────────────────────────────────────────────────────────────

/// Check a role-gated action against a permission table.
///
/// - No IO
/// - No panics
pub fn check_team_role(actor: &SellerContext, action: Action, table: &PermissionTable) -> Decision {
    match actor.role() {
        None => Decision::deny(action, DenialKind::NoMembership),
        Some(role) if table.allows(role, action) => Decision::grant(action),
        Some(_) => Decision::deny(action, DenialKind::RoleLacksAction),
    }
}

/// Check an owner-only self-service action.
///
/// Conditions are checked in order: resource present, resource eligible,
/// actor is the owner. The actor's team role does not matter.
pub fn check_self_service<R: OwnedResource>(
    actor: &SellerContext,
    action: Action,
    resource: Option<&R>,
) -> Decision {
    let Some(resource) = resource else {
        return Decision::deny(action, DenialKind::MissingResource);
    };
    if let Some(blocker) = resource.self_service_blocker() {
        return Decision::deny(action, blocker);
    }
    if resource.owner() != actor.user() {
        return Decision::deny(action, DenialKind::NotAffiliateUser);
    }
    Decision::grant(action)
}
