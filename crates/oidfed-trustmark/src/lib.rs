//! oidfed-trustmark: trust mark and delegation verification for federations.
//!
//! Issues, parses, and verifies trust marks: signed, typed assertions an
//! issuer makes about a subject. Verification runs either under a trust
//! anchor's policy (issuer allow-lists, declared owners, key discovery
//! through a resolver) or against keys the caller already trusts. Types with
//! a declared owner additionally require a delegation from that owner
//! embedded in every mark.

pub mod config;
pub mod entity;
pub mod error;
pub mod jose;
pub mod resolve;
pub mod time;
pub mod trustmark;

// Re-export primary types
pub use error::{FederationError, Result};
pub use jose::{Ed25519KeyPair, Ed25519Signer, Jwk, KeySet, SignedStatement, Signer};
pub use resolve::{resolve_issuer_keys, MetadataResolver, ResolveRequest, ResolveResponse, StaticResolver};

// Re-export entity types
pub use entity::{EntityStatement, FederationEntity, TrustAnchor, TrustAnchors, TrustMarkOwnerSpec};

// Re-export trust mark types
pub use trustmark::{
    DelegationJwt, OwnedTrustMark, TrustMark, TrustMarkInfo, TrustMarkInfos, TrustMarkIssuer,
    TrustMarkOwner, TrustMarkSpec,
};

// Re-export configuration
pub use config::{EntityConfig, IssuerConfig, OwnerConfig};
