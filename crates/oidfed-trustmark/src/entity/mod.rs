//! Federation entities: statements, trust anchors, and entity configurations.

pub mod anchor;
pub mod federation;
pub mod statement;

pub use anchor::{TrustAnchor, TrustAnchors};
pub use federation::{FederationEntity, DEFAULT_ENTITY_CONFIGURATION_LIFETIME};
pub use statement::{AllowedTrustMarkIssuers, EntityStatement, TrustMarkOwnerSpec, TrustMarkOwners};
