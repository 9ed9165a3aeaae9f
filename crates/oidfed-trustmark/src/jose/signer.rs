//! Injectable signing capability.
//!
//! Issuers, owners, and federation entities hold an `Arc<dyn Signer>` rather
//! than key material, so tests can substitute deterministic signers.

use serde::Serialize;

use crate::error::{FederationError, Result};

use super::jwks::KeySet;
use super::jws::sign_compact;
use super::keys::Ed25519KeyPair;

/// Produces compact signed statements.
pub trait Signer: Send + Sync {
    /// Sign `payload` as a compact JWS declaring type `typ`.
    fn sign(&self, typ: &str, payload: &[u8]) -> Result<String>;

    /// Public keys able to verify what this signer produces.
    fn key_set(&self) -> KeySet;
}

/// Serialize `claims` to JSON and sign them.
pub fn sign_claims<T: Serialize + ?Sized>(
    signer: &dyn Signer,
    typ: &str,
    claims: &T,
) -> Result<String> {
    let payload =
        serde_json::to_vec(claims).map_err(|e| FederationError::Serialization(e.to_string()))?;
    signer.sign(typ, &payload)
}

/// `Signer` backed by a single Ed25519 key.
pub struct Ed25519Signer {
    key_pair: Ed25519KeyPair,
}

impl Ed25519Signer {
    /// Wrap an existing key pair.
    pub fn new(key_pair: Ed25519KeyPair) -> Self {
        Self { key_pair }
    }

    /// Create a signer with a freshly generated key.
    pub fn generate() -> Self {
        Self::new(Ed25519KeyPair::generate())
    }

    /// The key id used in produced headers.
    pub fn kid(&self) -> &str {
        self.key_pair.kid()
    }
}

impl Signer for Ed25519Signer {
    fn sign(&self, typ: &str, payload: &[u8]) -> Result<String> {
        sign_compact(
            self.key_pair.signing_key(),
            Some(self.key_pair.kid()),
            typ,
            payload,
        )
    }

    fn key_set(&self) -> KeySet {
        self.key_pair.key_set()
    }
}
