//! Who may list and remove affiliated products.
//!
//! Listing is a broad read for the whole seller team. Removal is
//! self-service: only the affiliate user may detach a direct, alive account.

use storefront_auth::{
    Action, AuthzError, Decision, Gate, PermissionTable, SellerContext, check_self_service,
    check_team_role,
};

use crate::account::AffiliateAccount;

#[derive(Debug, Clone)]
pub struct AffiliatedPolicy {
    table: PermissionTable,
}

impl Default for AffiliatedPolicy {
    fn default() -> Self {
        Self::new(PermissionTable::new().grant_all_roles(&[Action::Index]))
    }
}

impl AffiliatedPolicy {
    pub fn new(table: PermissionTable) -> Self {
        Self { table }
    }

    pub fn gate(action: Action) -> Gate {
        match action {
            Action::Index => Gate::TeamRole,
            Action::Destroy => Gate::SelfService,
        }
    }

    /// Decide and report the first failed condition.
    pub fn explain(
        &self,
        actor: &SellerContext,
        action: Action,
        resource: Option<&AffiliateAccount>,
    ) -> Decision {
        match Self::gate(action) {
            Gate::TeamRole => check_team_role(actor, action, &self.table),
            Gate::SelfService => check_self_service(actor, action, resource),
        }
    }

    pub fn permitted(
        &self,
        actor: &SellerContext,
        action: Action,
        resource: Option<&AffiliateAccount>,
    ) -> bool {
        self.explain(actor, action, resource).granted()
    }

    /// Same decision as [`Self::permitted`], as a `Result`, logging denials.
    pub fn authorize(
        &self,
        actor: &SellerContext,
        action: Action,
        resource: Option<&AffiliateAccount>,
    ) -> Result<(), AuthzError> {
        let decision = self.explain(actor, action, resource);
        if let Some(reason) = decision.denial {
            tracing::debug!(
                user = %actor.user(),
                seller = %actor.seller(),
                %action,
                %reason,
                allowed_roles = ?self.table.roles_allowing(action),
                "affiliated policy denied"
            );
        }
        decision.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use storefront_auth::{DenialKind, TeamMembership, TeamRole};
    use storefront_core::{SellerId, UserId};

    struct Team {
        seller: SellerId,
        accountant: UserId,
        admin: UserId,
        marketing: UserId,
        support: UserId,
        memberships: Vec<TeamMembership>,
    }

    fn team() -> Team {
        let seller = SellerId::new();
        let (accountant, admin, marketing, support) =
            (UserId::new(), UserId::new(), UserId::new(), UserId::new());
        let memberships = [
            (accountant, TeamRole::Accountant),
            (admin, TeamRole::Admin),
            (marketing, TeamRole::Marketing),
            (support, TeamRole::Support),
        ]
        .into_iter()
        .map(|(user, role)| TeamMembership { user, seller, role })
        .collect();
        Team { seller, accountant, admin, marketing, support, memberships }
    }

    impl Team {
        fn ctx(&self, user: UserId) -> SellerContext {
            SellerContext::resolve(user, self.seller, &self.memberships)
        }
    }

    #[test]
    fn index_is_granted_to_every_team_role() {
        let t = team();
        let policy = AffiliatedPolicy::default();
        for user in [t.seller.owner(), t.accountant, t.admin, t.marketing, t.support] {
            assert!(policy.permitted(&t.ctx(user), Action::Index, None));
        }
    }

    #[test]
    fn index_is_denied_without_membership() {
        let t = team();
        let policy = AffiliatedPolicy::default();
        let outsider = t.ctx(UserId::new());
        assert!(!policy.permitted(&outsider, Action::Index, None));
        assert_eq!(
            policy.explain(&outsider, Action::Index, None).denial,
            Some(DenialKind::NoMembership)
        );
    }

    #[test]
    fn destroy_is_granted_when_all_conditions_are_met() {
        let t = team();
        let direct = AffiliateAccount::direct(t.admin, t.seller, vec![]);
        let policy = AffiliatedPolicy::default();
        assert!(policy.permitted(&t.ctx(t.admin), Action::Destroy, Some(&direct)));
    }

    #[test]
    fn destroy_is_denied_when_user_is_not_the_affiliate_user() {
        let t = team();
        let different = AffiliateAccount::direct(t.accountant, t.seller, vec![]);
        let decision = AffiliatedPolicy::default().explain(&t.ctx(t.admin), Action::Destroy, Some(&different));
        assert_eq!(decision.denial, Some(DenialKind::NotAffiliateUser));
    }

    #[test]
    fn destroy_is_denied_for_global_affiliate() {
        let t = team();
        let global = AffiliateAccount::global(t.admin);
        let decision = AffiliatedPolicy::default().explain(&t.ctx(t.admin), Action::Destroy, Some(&global));
        assert_eq!(decision.denial, Some(DenialKind::NotDirect));
    }

    #[test]
    fn destroy_is_denied_without_a_record() {
        let t = team();
        assert!(!AffiliatedPolicy::default().permitted(&t.ctx(t.admin), Action::Destroy, None));
    }

    #[test]
    fn destroy_is_denied_for_soft_deleted_affiliate() {
        let t = team();
        let mut removed = AffiliateAccount::direct(t.admin, t.seller, vec![]);
        removed.mark_removed(Utc::now() - Duration::hours(1)).unwrap();
        let decision = AffiliatedPolicy::default().explain(&t.ctx(t.admin), Action::Destroy, Some(&removed));
        assert_eq!(decision.denial, Some(DenialKind::AlreadyRemoved));
    }

    #[test]
    fn second_destroy_after_removal_is_denied() {
        let t = team();
        let actor = t.ctx(t.admin);
        let policy = AffiliatedPolicy::default();
        let mut account = AffiliateAccount::direct(t.admin, t.seller, vec![]);

        policy.authorize(&actor, Action::Destroy, Some(&account)).unwrap();
        account.mark_removed(Utc::now()).unwrap();

        let err = policy.authorize(&actor, Action::Destroy, Some(&account)).unwrap_err();
        assert_eq!(
            err,
            AuthzError::Forbidden { action: Action::Destroy, reason: DenialKind::AlreadyRemoved }
        );
    }

    #[test]
    fn narrower_table_is_a_data_change() {
        let t = team();
        let policy = AffiliatedPolicy::new(PermissionTable::new().grant(TeamRole::Owner, [Action::Index]));
        assert!(policy.permitted(&t.ctx(t.seller.owner()), Action::Index, None));
        assert_eq!(
            policy.explain(&t.ctx(t.support), Action::Index, None).denial,
            Some(DenialKind::RoleLacksAction)
        );
    }
}
