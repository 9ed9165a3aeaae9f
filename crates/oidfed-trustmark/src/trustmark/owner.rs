//! Trust mark owners and the delegations they sign.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::entity::TrustMarkOwnerSpec;
use crate::error::{FederationError, Result};
use crate::jose::{sign_claims, KeySet, Signer, JWT_TYPE_TRUST_MARK_DELEGATION};

use super::delegation::DelegationJwt;
use super::registry::{SpecRegistry, TypedSpec};

const DELEGATION_CLAIMS: &[&str] = &["iss", "sub", "trust_mark_type", "iat", "exp", "ref"];

/// A trust mark type this owner delegates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedTrustMark {
    pub trust_mark_type: String,
    /// Delegation lifetime in seconds; 0 means no expiry.
    #[serde(default)]
    pub delegation_lifetime: u64,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl OwnedTrustMark {
    pub fn new(trust_mark_type: impl Into<String>, delegation_lifetime: u64) -> Self {
        Self {
            trust_mark_type: trust_mark_type.into(),
            delegation_lifetime,
            reference: None,
            extra: serde_json::Map::new(),
        }
    }
}

impl TypedSpec for OwnedTrustMark {
    fn trust_mark_type(&self) -> &str {
        &self.trust_mark_type
    }
}

/// An entity that owns trust mark types and delegates their issuance.
pub struct TrustMarkOwner {
    pub entity_id: String,
    signer: Arc<dyn Signer>,
    owned: SpecRegistry<OwnedTrustMark>,
}

impl TrustMarkOwner {
    pub fn new(
        entity_id: impl Into<String>,
        signer: Arc<dyn Signer>,
        owned: impl IntoIterator<Item = OwnedTrustMark>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            signer,
            owned: owned.into_iter().collect(),
        }
    }

    pub fn add_trust_mark(&mut self, owned: OwnedTrustMark) -> Option<OwnedTrustMark> {
        self.owned.insert(owned)
    }

    pub fn trust_mark_types(&self) -> Vec<String> {
        self.owned.types()
    }

    pub fn jwks(&self) -> KeySet {
        self.signer.key_set()
    }

    /// This owner as a trust anchor would list it under `trust_mark_owners`.
    pub fn owner_spec(&self) -> TrustMarkOwnerSpec {
        TrustMarkOwnerSpec::new(&self.entity_id, self.signer.key_set())
    }

    /// Sign a delegation allowing `issuer` to issue `trust_mark_type`.
    pub fn issue_delegation(
        &self,
        trust_mark_type: &str,
        issuer: &str,
        lifetime: Option<Duration>,
    ) -> Result<String> {
        self.issue_delegation_at(trust_mark_type, issuer, lifetime, crate::time::now_unix())
    }

    /// `issue_delegation` with an explicit issuance time.
    pub fn issue_delegation_at(
        &self,
        trust_mark_type: &str,
        issuer: &str,
        lifetime: Option<Duration>,
        now: i64,
    ) -> Result<String> {
        let owned = self
            .owned
            .get(trust_mark_type)
            .ok_or_else(|| FederationError::UnknownTrustMarkType(trust_mark_type.to_string()))?;

        let mut delegation = DelegationJwt::new(&self.entity_id, issuer, &owned.trust_mark_type, now);
        delegation.reference = owned.reference.clone();
        delegation.extra = owned
            .extra
            .iter()
            .filter(|(name, _)| !DELEGATION_CLAIMS.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        let lifetime = lifetime.map_or(owned.delegation_lifetime, |d| d.as_secs());
        if lifetime != 0 {
            delegation.expires_at = Some(crate::time::expiry_after(now, lifetime)?);
        }

        let jwt = sign_claims(self.signer.as_ref(), JWT_TYPE_TRUST_MARK_DELEGATION, &delegation)?;
        log::info!(
            "{} delegated {} to {issuer}",
            self.entity_id,
            owned.trust_mark_type
        );
        Ok(jwt)
    }
}
