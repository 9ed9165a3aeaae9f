//! Signed statement primitives.
//!
//! This module provides:
//! - Ed25519 key pairs with derived key ids
//! - JWK / JWK set handling
//! - Compact JWS parsing, type checking, and verification
//! - The injectable `Signer` capability

pub mod jwks;
pub mod jws;
pub mod keys;
pub mod signer;

pub use jwks::{Jwk, KeySet};
pub use jws::{sign_compact, JwsHeader, SignedStatement};
pub use keys::{key_id, Ed25519KeyPair};
pub use signer::{sign_claims, Ed25519Signer, Signer};

/// JWS algorithm name for Ed25519.
pub const ALG_EDDSA: &str = "EdDSA";

/// `typ` of a trust mark.
pub const JWT_TYPE_TRUST_MARK: &str = "trust-mark+jwt";

/// `typ` of a trust mark delegation.
pub const JWT_TYPE_TRUST_MARK_DELEGATION: &str = "trust-mark-delegation+jwt";

/// `typ` of an entity statement or entity configuration.
pub const JWT_TYPE_ENTITY_STATEMENT: &str = "entity-statement+jwt";
