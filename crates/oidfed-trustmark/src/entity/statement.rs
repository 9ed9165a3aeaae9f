//! Entity statements and entity configurations.
//!
//! A trust anchor's entity configuration is the policy input for trust mark
//! verification: it carries the anchor's keys, the allowed issuers per trust
//! mark type, and the owner of each delegated trust mark type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::jose::{KeySet, SignedStatement, JWT_TYPE_ENTITY_STATEMENT};
use crate::trustmark::TrustMarkInfo;

/// Trust mark type → entity ids allowed to issue it.
pub type AllowedTrustMarkIssuers = BTreeMap<String, Vec<String>>;

/// Trust mark type → owner of that type.
pub type TrustMarkOwners = BTreeMap<String, TrustMarkOwnerSpec>;

/// The owner of a trust mark type as published by a trust anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustMarkOwnerSpec {
    /// Owner entity id.
    #[serde(rename = "sub")]
    pub id: String,
    /// Keys the owner signs delegations with.
    pub jwks: KeySet,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TrustMarkOwnerSpec {
    pub fn new(id: impl Into<String>, jwks: KeySet) -> Self {
        Self {
            id: id.into(),
            jwks,
            extra: serde_json::Map::new(),
        }
    }
}

/// Payload of an entity statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityStatement {
    #[serde(rename = "iss")]
    pub issuer: String,
    #[serde(rename = "sub")]
    pub subject: String,
    #[serde(rename = "iat")]
    pub issued_at: i64,
    #[serde(rename = "exp", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "KeySet::is_empty")]
    pub jwks: KeySet,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authority_hints: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trust_marks: Vec<TrustMarkInfo>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub trust_mark_issuers: AllowedTrustMarkIssuers,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub trust_mark_owners: TrustMarkOwners,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
    #[serde(skip)]
    statement: Option<SignedStatement>,
}

impl EntityStatement {
    /// A bare statement with no keys or policy.
    pub fn new(issuer: impl Into<String>, subject: impl Into<String>, issued_at: i64) -> Self {
        Self {
            issuer: issuer.into(),
            subject: subject.into(),
            issued_at,
            expires_at: None,
            jwks: KeySet::default(),
            authority_hints: Vec::new(),
            metadata: None,
            trust_marks: Vec::new(),
            trust_mark_issuers: AllowedTrustMarkIssuers::new(),
            trust_mark_owners: TrustMarkOwners::new(),
            extra: serde_json::Map::new(),
            statement: None,
        }
    }

    /// Parse a signed entity statement. The signature is not checked.
    pub fn parse(raw: &str) -> Result<Self> {
        let statement = SignedStatement::parse_typed(raw, JWT_TYPE_ENTITY_STATEMENT)?;
        let mut payload: Self = statement.decode_payload()?;
        payload.statement = Some(statement);
        Ok(payload)
    }

    /// True if this statement was issued by its own subject.
    pub fn is_entity_configuration(&self) -> bool {
        self.issuer == self.subject
    }

    /// The signed form this statement was parsed from.
    pub fn signed_statement(&self) -> Option<&SignedStatement> {
        self.statement.as_ref()
    }

    /// Verify time window and signature against `keys`.
    pub fn verify(&self, keys: &KeySet) -> Result<()> {
        crate::time::verify_time(self.issued_at, self.expires_at)?;
        match &self.statement {
            Some(statement) => statement.verify_with_key_set(keys),
            None => Err(crate::error::FederationError::SignatureInvalid(
                "entity statement was not parsed from a signed token".into(),
            )),
        }
    }

    /// Verify an entity configuration against the keys it publishes itself.
    pub fn verify_self_signed(&self) -> Result<()> {
        self.verify(&self.jwks)
    }

    /// Allowed issuers for a type, if the statement restricts it.
    pub fn allowed_issuers(&self, trust_mark_type: &str) -> Option<&[String]> {
        self.trust_mark_issuers
            .get(trust_mark_type)
            .map(Vec::as_slice)
    }

    /// Owner of a type, if the statement declares one.
    pub fn owner(&self, trust_mark_type: &str) -> Option<&TrustMarkOwnerSpec> {
        self.trust_mark_owners.get(trust_mark_type)
    }
}
