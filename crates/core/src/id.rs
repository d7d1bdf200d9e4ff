//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a user (actor identity).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

/// Identifier of a seller account.
///
/// A seller is itself a user account: the seller's own user shares the same
/// UUID (see [`SellerId::owner`]). Team members act for a seller with a
/// different [`UserId`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SellerId(Uuid);

/// Internal identifier of an affiliate account.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AffiliateId(Uuid);

/// Internal identifier of a product.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(Uuid);

macro_rules! impl_uuid_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(UserId, "UserId");
impl_uuid_newtype!(SellerId, "SellerId");
impl_uuid_newtype!(AffiliateId, "AffiliateId");
impl_uuid_newtype!(ProductId, "ProductId");

impl SellerId {
    /// The user account that owns this seller.
    pub fn owner(&self) -> UserId {
        UserId(self.0)
    }
}

impl From<UserId> for SellerId {
    fn from(value: UserId) -> Self {
        Self(value.0)
    }
}

const EXTERNAL_ID_MAX_LEN: usize = 64;

/// Public, URL-safe identifier exposed in routes instead of internal UUIDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExternalId(String);

impl ExternalId {
    /// Generate a fresh external id.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DomainError::invalid_id("ExternalId: empty"));
        }
        if s.len() > EXTERNAL_ID_MAX_LEN {
            return Err(DomainError::invalid_id("ExternalId: too long"));
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '=') {
            return Err(DomainError::invalid_id(format!("ExternalId: invalid character in '{s}'")));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ExternalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ExternalId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ExternalId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ExternalId> for String {
    fn from(value: ExternalId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seller_owner_shares_uuid() {
        let seller = SellerId::new();
        assert_eq!(seller.owner().as_uuid(), seller.as_uuid());
        assert_eq!(SellerId::from(seller.owner()), seller);
    }

    #[test]
    fn uuid_ids_parse_and_reject_garbage() {
        let id = AffiliateId::new();
        let parsed: AffiliateId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);

        let err = "not-a-uuid".parse::<AffiliateId>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(_)));
    }

    #[test]
    fn external_id_validation() {
        assert!(ExternalId::parse("  ").is_err());
        assert!(ExternalId::parse("abc/def").is_err());
        assert!(ExternalId::parse(&"a".repeat(65)).is_err());
        assert_eq!(ExternalId::parse("Ab3_x-9==").unwrap().as_str(), "Ab3_x-9==");
    }

    #[test]
    fn generated_external_ids_are_valid_and_distinct() {
        let a = ExternalId::generate();
        let b = ExternalId::generate();
        assert_ne!(a, b);
        assert!(ExternalId::parse(a.as_str()).is_ok());
    }

    #[test]
    fn external_id_deserialization_validates() {
        let ok: ExternalId = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(ok.as_str(), "abc123");
        assert!(serde_json::from_str::<ExternalId>("\"a b\"").is_err());
    }
}
