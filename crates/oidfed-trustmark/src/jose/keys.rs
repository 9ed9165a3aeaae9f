//! Ed25519 key pairs and key identifiers.
//!
//! Every signing key is published as an OKP JWK whose `kid` is derived from
//! the public key, so verifiers can select the right key from a set.

use ed25519_dalek::{SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};

use crate::error::{FederationError, Result};

use super::jwks::{Jwk, KeySet};

/// Compute the key id for a verifying key.
///
/// Format: base58 of the first 16 bytes of SHA-256(public_key).
pub fn key_id(key: &VerifyingKey) -> String {
    let hash = Sha256::digest(key.as_bytes());
    bs58::encode(&hash[..16]).into_string()
}

/// An Ed25519 key pair used to sign federation statements.
///
/// The secret half is an ed25519-dalek `SigningKey`, which zeroizes itself
/// on drop.
pub struct Ed25519KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    kid: String,
}

impl Ed25519KeyPair {
    /// Generate a new random Ed25519 key pair.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut rand::thread_rng()))
    }

    /// Reconstruct a key pair from raw signing key bytes.
    pub fn from_signing_key_bytes(bytes: &[u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(bytes))
    }

    /// Reconstruct a key pair from a byte slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| FederationError::InvalidKey("signing key must be 32 bytes".into()))?;
        Ok(Self::from_signing_key_bytes(&arr))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        let kid = key_id(&verifying_key);
        Self {
            signing_key,
            verifying_key,
            kid,
        }
    }

    /// Reconstruct a verifying key from raw bytes.
    pub fn verifying_key_from_bytes(bytes: &[u8; 32]) -> Result<VerifyingKey> {
        VerifyingKey::from_bytes(bytes)
            .map_err(|e| FederationError::InvalidKey(format!("invalid verifying key: {e}")))
    }

    /// Return a reference to the signing key.
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Return the verifying (public) key.
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Return the key id.
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Return the signing key bytes. Caller must zeroize after use.
    pub fn signing_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Return the public half as a JWK.
    pub fn public_jwk(&self) -> Jwk {
        Jwk::from_verifying_key(&self.verifying_key, Some(self.kid.clone()))
    }

    /// Return a key set containing only this key's public half.
    pub fn key_set(&self) -> KeySet {
        KeySet::new(vec![self.public_jwk()])
    }
}
