//! Trust mark delegations: an owner authorizing an issuer for one type.
//!
//! A delegation is the owner saying "entity `sub` may issue trust marks of
//! type `trust_mark_type` on my behalf". It travels embedded in each trust
//! mark the delegated issuer produces.

use serde::{Deserialize, Serialize};

use crate::entity::EntityStatement;
use crate::error::{FederationError, Result};
use crate::jose::{KeySet, SignedStatement, JWT_TYPE_TRUST_MARK_DELEGATION};

/// A parsed trust mark delegation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationJwt {
    /// The trust mark owner.
    #[serde(rename = "iss")]
    pub issuer: String,
    /// The delegated trust mark issuer.
    #[serde(rename = "sub")]
    pub subject: String,
    pub trust_mark_type: String,
    #[serde(rename = "iat")]
    pub issued_at: i64,
    #[serde(rename = "exp", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
    #[serde(skip)]
    statement: Option<SignedStatement>,
}

impl DelegationJwt {
    /// An unsigned delegation with only the required claims.
    pub fn new(
        owner: impl Into<String>,
        issuer: impl Into<String>,
        trust_mark_type: impl Into<String>,
        issued_at: i64,
    ) -> Self {
        Self {
            issuer: owner.into(),
            subject: issuer.into(),
            trust_mark_type: trust_mark_type.into(),
            issued_at,
            expires_at: None,
            reference: None,
            extra: serde_json::Map::new(),
            statement: None,
        }
    }

    /// Parse a signed delegation. The signature is not checked.
    pub fn parse(raw: &str) -> Result<Self> {
        let statement = SignedStatement::parse_typed(raw, JWT_TYPE_TRUST_MARK_DELEGATION)?;
        let mut delegation: Self = statement.decode_payload()?;
        delegation.statement = Some(statement);
        Ok(delegation)
    }

    /// The signed form this delegation was parsed from.
    pub fn signed_statement(&self) -> Option<&SignedStatement> {
        self.statement.as_ref()
    }

    fn verify_signature(&self, keys: &KeySet) -> Result<()> {
        let statement = self.statement.as_ref().ok_or_else(|| {
            FederationError::SignatureInvalid(
                "delegation was not parsed from a signed token".into(),
            )
        })?;
        statement.verify_with_key_set(keys)
    }

    /// Verify against the owner the trust anchor declares for this type.
    pub fn verify_federation(&self, anchor: &EntityStatement) -> Result<()> {
        self.verify_federation_at(anchor, crate::time::now_unix())
    }

    /// `verify_federation` at a given time.
    pub fn verify_federation_at(&self, anchor: &EntityStatement, now: i64) -> Result<()> {
        crate::time::verify_time_at(self.issued_at, self.expires_at, now)?;
        let owner = anchor
            .owner(&self.trust_mark_type)
            .ok_or_else(|| FederationError::UnknownOwner(self.trust_mark_type.clone()))?;
        self.verify_signature(&owner.jwks)
    }

    /// Verify directly against the owner's keys.
    pub fn verify_external(&self, owner_keys: &KeySet) -> Result<()> {
        self.verify_external_at(owner_keys, crate::time::now_unix())
    }

    /// `verify_external` at a given time.
    pub fn verify_external_at(&self, owner_keys: &KeySet, now: i64) -> Result<()> {
        crate::time::verify_time_at(self.issued_at, self.expires_at, now)?;
        self.verify_signature(owner_keys)
    }
}
