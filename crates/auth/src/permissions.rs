use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::TeamRole;

/// An action a seller context may attempt on a resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Index,
    Destroy,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Index => "index",
            Action::Destroy => "destroy",
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an action is gated.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Gate {
    /// Granted by the actor's team role through a [`PermissionTable`].
    TeamRole,
    /// Granted only to the user that owns the resource (see [`crate::OwnedResource`]).
    SelfService,
}

/// Role → allowed actions.
///
/// Adding a role or widening one is a data change here, not new branching
/// in a policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionTable {
    grants: HashMap<TeamRole, BTreeSet<Action>>,
}

impl PermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `actions` to `role` (additive).
    pub fn grant(mut self, role: TeamRole, actions: impl IntoIterator<Item = Action>) -> Self {
        self.grants.entry(role).or_default().extend(actions);
        self
    }

    /// Grant `actions` to every known role.
    pub fn grant_all_roles(mut self, actions: &[Action]) -> Self {
        for role in TeamRole::ALL {
            self = self.grant(role, actions.iter().copied());
        }
        self
    }

    pub fn allows(&self, role: TeamRole, action: Action) -> bool {
        self.grants
            .get(&role)
            .is_some_and(|actions| actions.contains(&action))
    }

    /// Roles that would be granted `action` (sorted), for explanations.
    pub fn roles_allowing(&self, action: Action) -> Vec<TeamRole> {
        let mut roles: Vec<TeamRole> = self
            .grants
            .iter()
            .filter(|(_, actions)| actions.contains(&action))
            .map(|(role, _)| *role)
            .collect();
        roles.sort();
        roles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grants_are_per_role_and_additive() {
        let table = PermissionTable::new()
            .grant(TeamRole::Owner, [Action::Index])
            .grant(TeamRole::Owner, [Action::Destroy])
            .grant(TeamRole::Support, [Action::Index]);

        assert!(table.allows(TeamRole::Owner, Action::Index));
        assert!(table.allows(TeamRole::Owner, Action::Destroy));
        assert!(table.allows(TeamRole::Support, Action::Index));
        assert!(!table.allows(TeamRole::Support, Action::Destroy));
        assert!(!table.allows(TeamRole::Admin, Action::Index));
    }

    #[test]
    fn grant_all_roles_covers_every_role() {
        let table = PermissionTable::new().grant_all_roles(&[Action::Index]);
        assert_eq!(table.roles_allowing(Action::Index), TeamRole::ALL.to_vec());
        assert!(table.roles_allowing(Action::Destroy).is_empty());
    }
}
