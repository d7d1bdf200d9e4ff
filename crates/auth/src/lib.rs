//! `storefront-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod context;
pub mod jwt;
pub mod permissions;
pub mod roles;

pub use authorize::{
    AuthzError, Decision, DenialKind, OwnedResource, check_self_service, check_team_role,
};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use context::{SellerContext, TeamMembership};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use permissions::{Action, Gate, PermissionTable};
pub use roles::TeamRole;
