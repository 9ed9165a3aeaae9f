//! Federation entities and the entity configurations they publish.

use std::sync::Arc;

use crate::error::Result;
use crate::jose::{sign_claims, KeySet, Signer, JWT_TYPE_ENTITY_STATEMENT};
use crate::trustmark::TrustMarkInfo;

use super::statement::{AllowedTrustMarkIssuers, EntityStatement, TrustMarkOwners};

/// Entity configuration lifetime used when none is configured (seconds).
pub const DEFAULT_ENTITY_CONFIGURATION_LIFETIME: u64 = 86_400;

/// An entity taking part in a federation.
///
/// Holds everything needed to publish its entity configuration: keys come
/// from the injected signer, trust marks are published as given.
pub struct FederationEntity {
    pub entity_id: String,
    pub authority_hints: Vec<String>,
    pub metadata: Option<serde_json::Value>,
    pub configuration_lifetime: u64,
    pub trust_marks: Vec<TrustMarkInfo>,
    pub trust_mark_issuers: AllowedTrustMarkIssuers,
    pub trust_mark_owners: TrustMarkOwners,
    pub extra: serde_json::Map<String, serde_json::Value>,
    signer: Arc<dyn Signer>,
}

impl FederationEntity {
    /// A new entity with no policy, trust marks, or metadata.
    pub fn new(entity_id: impl Into<String>, signer: Arc<dyn Signer>) -> Self {
        Self {
            entity_id: entity_id.into(),
            authority_hints: Vec::new(),
            metadata: None,
            configuration_lifetime: DEFAULT_ENTITY_CONFIGURATION_LIFETIME,
            trust_marks: Vec::new(),
            trust_mark_issuers: AllowedTrustMarkIssuers::new(),
            trust_mark_owners: TrustMarkOwners::new(),
            extra: serde_json::Map::new(),
            signer,
        }
    }

    /// The keys this entity signs with.
    pub fn jwks(&self) -> KeySet {
        self.signer.key_set()
    }

    /// Build the (unsigned) entity configuration as of now.
    pub fn entity_configuration_payload(&self) -> Result<EntityStatement> {
        self.entity_configuration_payload_at(crate::time::now_unix())
    }

    /// Build the (unsigned) entity configuration as of `now`.
    pub fn entity_configuration_payload_at(&self, now: i64) -> Result<EntityStatement> {
        let lifetime = if self.configuration_lifetime == 0 {
            DEFAULT_ENTITY_CONFIGURATION_LIFETIME
        } else {
            self.configuration_lifetime
        };
        let mut payload = EntityStatement::new(&self.entity_id, &self.entity_id, now);
        payload.expires_at = Some(crate::time::expiry_after(now, lifetime)?);
        payload.jwks = self.jwks();
        payload.authority_hints = self.authority_hints.clone();
        payload.metadata = self.metadata.clone();
        payload.trust_marks = self.trust_marks.clone();
        payload.trust_mark_issuers = self.trust_mark_issuers.clone();
        payload.trust_mark_owners = self.trust_mark_owners.clone();
        payload.extra = self.extra.clone();
        Ok(payload)
    }

    /// Sign and return the entity configuration.
    pub fn entity_configuration_jwt(&self) -> Result<String> {
        self.sign_entity_statement(&self.entity_configuration_payload()?)
    }

    /// Sign an arbitrary entity statement, e.g. one about a subordinate.
    pub fn sign_entity_statement(&self, payload: &EntityStatement) -> Result<String> {
        sign_claims(self.signer.as_ref(), JWT_TYPE_ENTITY_STATEMENT, payload)
    }
}
