//! Trust marks: signed, typed assertions about a subject.
//!
//! Verification order is fixed: issuer allow-list, issuer keys, time window,
//! issuer signature, then (only when the type has an owner) the embedded
//! delegation: its presence, its linkage to this mark, and finally the
//! owner's signature on it. The first failing step rejects the mark.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityStatement, TrustMarkOwnerSpec};
use crate::error::{FederationError, Result};
use crate::jose::{KeySet, SignedStatement, JWT_TYPE_TRUST_MARK};
use crate::resolve::{resolve_issuer_keys, MetadataResolver};

use super::delegation::DelegationJwt;
use super::lazy::LazyParse;

/// Claim names with a fixed meaning in a trust mark payload.
pub const TRUST_MARK_CLAIMS: &[&str] = &[
    "iss",
    "sub",
    "trust_mark_type",
    "iat",
    "exp",
    "logo_uri",
    "ref",
    "delegation",
];

/// A trust mark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustMark {
    #[serde(rename = "iss")]
    pub issuer: String,
    #[serde(rename = "sub")]
    pub subject: String,
    pub trust_mark_type: String,
    #[serde(rename = "iat")]
    pub issued_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    #[serde(rename = "exp", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Raw delegation token, if the issuer acts for an owner.
    #[serde(rename = "delegation", default, skip_serializing_if = "Option::is_none")]
    pub delegation_jwt: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
    #[serde(skip)]
    statement: Option<SignedStatement>,
    #[serde(skip)]
    delegation: LazyParse<DelegationJwt>,
}

impl TrustMark {
    /// An unsigned trust mark with only the required claims.
    pub fn new(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        trust_mark_type: impl Into<String>,
        issued_at: i64,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            subject: subject.into(),
            trust_mark_type: trust_mark_type.into(),
            issued_at,
            logo_uri: None,
            expires_at: None,
            reference: None,
            delegation_jwt: None,
            extra: serde_json::Map::new(),
            statement: None,
            delegation: LazyParse::new(),
        }
    }

    /// Parse a signed trust mark. The signature is not checked.
    pub fn parse(raw: &str) -> Result<Self> {
        let statement = SignedStatement::parse_typed(raw, JWT_TYPE_TRUST_MARK)?;
        let mut mark: Self = statement.decode_payload()?;
        mark.statement = Some(statement);
        Ok(mark)
    }

    /// The signed form this mark was parsed from.
    pub fn signed_statement(&self) -> Option<&SignedStatement> {
        self.statement.as_ref()
    }

    /// The embedded delegation, parsed on first use.
    ///
    /// `Ok(None)` when the mark carries no delegation. A failed parse is
    /// reported but not remembered, so a later call parses again. The cached
    /// value is keyed by the raw token: replacing `delegation_jwt` causes the
    /// next call to parse the new token.
    pub fn delegation(&self) -> Result<Option<Arc<DelegationJwt>>> {
        let raw = match self.delegation_jwt.as_deref() {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(None),
        };
        self.delegation
            .get_or_try_parse_where(
                |cached| cached.signed_statement().map(SignedStatement::raw) == Some(raw),
                || DelegationJwt::parse(raw),
            )
            .map(Some)
    }

    /// Verify under a trust anchor's policy.
    pub fn verify_federation(
        &self,
        anchor: &EntityStatement,
        resolver: &dyn MetadataResolver,
    ) -> Result<()> {
        self.verify_federation_at(anchor, resolver, crate::time::now_unix())
    }

    /// `verify_federation` at a given time.
    pub fn verify_federation_at(
        &self,
        anchor: &EntityStatement,
        resolver: &dyn MetadataResolver,
        now: i64,
    ) -> Result<()> {
        if let Some(allowed) = anchor.allowed_issuers(&self.trust_mark_type) {
            if !allowed.iter().any(|id| id == &self.issuer) {
                log::debug!(
                    "trust mark {} rejected: issuer {} not allowed by {}",
                    self.trust_mark_type,
                    self.issuer,
                    anchor.subject
                );
                return Err(FederationError::IssuerNotAllowed {
                    issuer: self.issuer.clone(),
                    trust_mark_type: self.trust_mark_type.clone(),
                });
            }
        }

        let keys = resolve_issuer_keys(&self.issuer, anchor, resolver)?;
        self.verify_external_at(&keys, anchor.owner(&self.trust_mark_type), now)
    }

    /// Verify against known issuer keys and, if given, the type's owner.
    pub fn verify_external(
        &self,
        issuer_keys: &KeySet,
        owner: Option<&TrustMarkOwnerSpec>,
    ) -> Result<()> {
        self.verify_external_at(issuer_keys, owner, crate::time::now_unix())
    }

    /// `verify_external` at a given time.
    pub fn verify_external_at(
        &self,
        issuer_keys: &KeySet,
        owner: Option<&TrustMarkOwnerSpec>,
        now: i64,
    ) -> Result<()> {
        crate::time::verify_time_at(self.issued_at, self.expires_at, now)?;

        let statement = self.statement.as_ref().ok_or_else(|| {
            FederationError::SignatureInvalid("trust mark was not parsed from a signed token".into())
        })?;
        statement.verify_with_key_set(issuer_keys)?;

        let Some(owner) = owner else {
            return Ok(());
        };

        let delegation = self
            .delegation()?
            .ok_or_else(|| FederationError::NoDelegation {
                issuer: self.issuer.clone(),
                trust_mark_type: self.trust_mark_type.clone(),
            })?;
        if delegation.trust_mark_type != self.trust_mark_type {
            return Err(FederationError::DelegationTypeMismatch {
                expected: self.trust_mark_type.clone(),
                found: delegation.trust_mark_type.clone(),
            });
        }
        if delegation.subject != self.issuer {
            return Err(FederationError::DelegationSubjectMismatch {
                expected: self.issuer.clone(),
                found: delegation.subject.clone(),
            });
        }
        if delegation.issuer != owner.id {
            return Err(FederationError::DelegationIssuerMismatch {
                expected: owner.id.clone(),
                found: delegation.issuer.clone(),
            });
        }
        delegation.verify_external_at(&owner.jwks, now)
    }
}
