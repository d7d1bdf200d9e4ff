use core::str::FromStr;

use serde::{Deserialize, Serialize};

use storefront_core::DomainError;

/// Role a user holds on a seller's team.
///
/// The seller's own user account is always the `Owner`; every other role is
/// granted through a [`crate::TeamMembership`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    Owner,
    Accountant,
    Admin,
    Marketing,
    Support,
}

impl TeamRole {
    pub const ALL: [TeamRole; 5] = [
        TeamRole::Owner,
        TeamRole::Accountant,
        TeamRole::Admin,
        TeamRole::Marketing,
        TeamRole::Support,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TeamRole::Owner => "owner",
            TeamRole::Accountant => "accountant",
            TeamRole::Admin => "admin",
            TeamRole::Marketing => "marketing",
            TeamRole::Support => "support",
        }
    }
}

impl core::fmt::Display for TeamRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeamRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TeamRole::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown team role '{s}'")))
    }
}
