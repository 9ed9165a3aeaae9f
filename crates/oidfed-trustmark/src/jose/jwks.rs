//! JSON Web Keys and key sets.
//!
//! Only Ed25519 OKP keys can verify signatures here. Keys of other types are
//! kept (and serialized back unchanged) but never selected for verification.

use base64::Engine;
use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};

use crate::error::{FederationError, Result};

use super::keys::Ed25519KeyPair;

const KTY_OKP: &str = "OKP";
const CRV_ED25519: &str = "Ed25519";

/// A single JSON Web Key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// Members this crate does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Jwk {
    /// Build an Ed25519 signing JWK from a verifying key.
    pub fn from_verifying_key(key: &VerifyingKey, kid: Option<String>) -> Self {
        Self {
            kty: KTY_OKP.into(),
            crv: Some(CRV_ED25519.into()),
            x: Some(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(key.as_bytes())),
            kid,
            alg: Some(super::ALG_EDDSA.into()),
            key_use: Some("sig".into()),
            extra: serde_json::Map::new(),
        }
    }

    /// True if this key is an Ed25519 key usable for signature checks.
    pub fn is_ed25519(&self) -> bool {
        self.kty == KTY_OKP && self.crv.as_deref() == Some(CRV_ED25519)
    }

    /// Decode the Ed25519 verifying key.
    pub fn verifying_key(&self) -> Result<VerifyingKey> {
        if !self.is_ed25519() {
            return Err(FederationError::InvalidKey(format!(
                "unsupported key type '{}'",
                self.kty
            )));
        }
        let x = self
            .x
            .as_deref()
            .ok_or_else(|| FederationError::InvalidKey("OKP key without 'x'".into()))?;
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(x)
            .map_err(|e| FederationError::InvalidKey(format!("invalid base64url 'x': {e}")))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| FederationError::InvalidKey("Ed25519 key must be 32 bytes".into()))?;
        Ed25519KeyPair::verifying_key_from_bytes(&arr)
    }
}

/// A JWK set: `{"keys": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeySet {
    #[serde(default)]
    pub keys: Vec<Jwk>,
}

impl KeySet {
    /// Create a key set from a list of keys.
    pub fn new(keys: Vec<Jwk>) -> Self {
        Self { keys }
    }

    /// Number of keys in the set.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True if the set has no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Add a key to the set.
    pub fn push(&mut self, key: Jwk) {
        self.keys.push(key);
    }

    /// Find a key by `kid`.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }

    /// Iterate over the keys.
    pub fn iter(&self) -> impl Iterator<Item = &Jwk> {
        self.keys.iter()
    }

    /// Append every key of `other`.
    pub fn extend(&mut self, other: KeySet) {
        self.keys.extend(other.keys);
    }
}

impl From<Vec<Jwk>> for KeySet {
    fn from(keys: Vec<Jwk>) -> Self {
        Self::new(keys)
    }
}
