//! Trust marks, their delegations, and the entities that issue them.
//!
//! The trustmark module provides:
//! - Trust mark and delegation claims with federation and external verification
//! - Published trust mark infos and batch verification
//! - Issuers and owners with per-type issuance registries
//! - A write-once lazy parse cache shared by the parsed views

pub mod delegation;
pub mod info;
pub mod issuer;
pub mod lazy;
pub mod mark;
pub mod owner;
pub mod registry;

pub use delegation::DelegationJwt;
pub use info::{TrustMarkInfo, TrustMarkInfos};
pub use issuer::{TrustMarkIssuer, TrustMarkSpec};
pub use lazy::{LazyParse, ParseState};
pub use mark::{TrustMark, TRUST_MARK_CLAIMS};
pub use owner::{OwnedTrustMark, TrustMarkOwner};
pub use registry::{SpecRegistry, TypedSpec};
