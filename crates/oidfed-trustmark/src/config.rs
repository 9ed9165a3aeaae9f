//! File-backed configuration: issuer and owner setups, and signing key files.
//!
//! Key file format (JSON):
//! ```json
//! {
//!     "version": 1,
//!     "kid": "<base58 key id>",
//!     "secret_key": "<base64 32-byte Ed25519 seed>"
//! }
//! ```
//!
//! Issuer and owner configurations are plain JSON documents naming the
//! entity and listing the trust mark types it issues or owns.

use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::entity::{AllowedTrustMarkIssuers, FederationEntity, TrustMarkOwners};
use crate::error::{FederationError, Result};
use crate::jose::{Ed25519KeyPair, Signer};
use crate::trustmark::{OwnedTrustMark, TrustMarkIssuer, TrustMarkOwner, TrustMarkSpec};

const KEY_FILE_VERSION: u32 = 1;

/// Trust mark issuer setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuerConfig {
    pub entity_id: String,
    #[serde(default)]
    pub trust_marks: Vec<TrustMarkSpec>,
}

impl IssuerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        load_json(path)
    }

    pub fn into_issuer(self, signer: Arc<dyn Signer>) -> TrustMarkIssuer {
        TrustMarkIssuer::new(self.entity_id, signer, self.trust_marks)
    }
}

/// Trust mark owner setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerConfig {
    pub entity_id: String,
    #[serde(default)]
    pub owned_trust_marks: Vec<OwnedTrustMark>,
}

impl OwnerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        load_json(path)
    }

    pub fn into_owner(self, signer: Arc<dyn Signer>) -> TrustMarkOwner {
        TrustMarkOwner::new(self.entity_id, signer, self.owned_trust_marks)
    }
}

/// Federation entity setup, e.g. a trust anchor and its trust mark policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityConfig {
    pub entity_id: String,
    #[serde(default)]
    pub authority_hints: Vec<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    /// Entity configuration lifetime in seconds; 0 uses the default.
    #[serde(default)]
    pub lifetime: u64,
    #[serde(default)]
    pub trust_mark_issuers: AllowedTrustMarkIssuers,
    #[serde(default)]
    pub trust_mark_owners: TrustMarkOwners,
}

impl EntityConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        load_json(path)
    }

    pub fn into_entity(self, signer: Arc<dyn Signer>) -> FederationEntity {
        let mut entity = FederationEntity::new(self.entity_id, signer);
        entity.authority_hints = self.authority_hints;
        entity.metadata = self.metadata;
        entity.configuration_lifetime = self.lifetime;
        entity.trust_mark_issuers = self.trust_mark_issuers;
        entity.trust_mark_owners = self.trust_mark_owners;
        entity
    }
}

/// Read and deserialize a JSON document.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| FederationError::Config(format!("{}: {e}", path.display())))
}

/// On-disk signing key.
#[derive(Serialize, Deserialize)]
struct KeyFile {
    version: u32,
    kid: String,
    secret_key: String,
}

/// Write a signing key to `path`.
///
/// The write goes through a sibling temp file and a rename, so readers never
/// see a partial key file.
pub fn save_key_file(key_pair: &Ed25519KeyPair, path: &Path) -> Result<()> {
    let mut secret = key_pair.signing_key_bytes();
    let mut file = KeyFile {
        version: KEY_FILE_VERSION,
        kid: key_pair.kid().to_string(),
        secret_key: base64::engine::general_purpose::STANDARD.encode(secret),
    };
    secret.zeroize();

    let json = serde_json::to_string_pretty(&file)
        .map_err(|e| FederationError::Serialization(e.to_string()));
    file.secret_key.zeroize();
    let mut json = json?;
    let written = write_atomic(path, json.as_bytes());
    json.zeroize();
    written
}

/// Load a signing key written by [`save_key_file`].
pub fn load_key_file(path: &Path) -> Result<Ed25519KeyPair> {
    let mut file: KeyFile = load_json(path)?;
    if file.version != KEY_FILE_VERSION {
        return Err(FederationError::Config(format!(
            "unsupported key file version {}",
            file.version
        )));
    }

    let decoded = base64::engine::general_purpose::STANDARD.decode(&file.secret_key);
    file.secret_key.zeroize();
    let mut secret =
        decoded.map_err(|e| FederationError::InvalidKey(format!("invalid secret key base64: {e}")))?;
    let key_pair = Ed25519KeyPair::from_slice(&secret);
    secret.zeroize();
    let key_pair = key_pair?;

    if key_pair.kid() != file.kid {
        return Err(FederationError::InvalidKey(format!(
            "key file kid '{}' does not match key '{}'",
            file.kid,
            key_pair.kid()
        )));
    }
    Ok(key_pair)
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, data)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
