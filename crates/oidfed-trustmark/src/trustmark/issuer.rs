//! Trust mark issuers: entities that sign trust marks for configured types.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FederationError, Result};
use crate::jose::{sign_claims, KeySet, Signer, JWT_TYPE_TRUST_MARK};

use super::delegation::DelegationJwt;
use super::info::TrustMarkInfo;
use super::mark::{TrustMark, TRUST_MARK_CLAIMS};
use super::registry::{SpecRegistry, TypedSpec};

/// How an issuer issues one trust mark type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustMarkSpec {
    pub trust_mark_type: String,
    /// Default lifetime in seconds; 0 issues marks without expiry.
    #[serde(default)]
    pub lifetime: u64,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    /// Also copy `extra` into the published trust mark info.
    #[serde(default)]
    pub include_extra_claims_in_info: bool,
    /// Delegation from the type's owner, embedded into every mark.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegation_jwt: Option<String>,
    /// Additional claims signed into every mark of this type.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TrustMarkSpec {
    pub fn new(trust_mark_type: impl Into<String>, lifetime: u64) -> Self {
        Self {
            trust_mark_type: trust_mark_type.into(),
            lifetime,
            reference: None,
            logo_uri: None,
            include_extra_claims_in_info: false,
            delegation_jwt: None,
            extra: serde_json::Map::new(),
        }
    }
}

impl TypedSpec for TrustMarkSpec {
    fn trust_mark_type(&self) -> &str {
        &self.trust_mark_type
    }
}

/// An entity issuing trust marks.
pub struct TrustMarkIssuer {
    pub entity_id: String,
    signer: Arc<dyn Signer>,
    trust_marks: SpecRegistry<TrustMarkSpec>,
}

impl TrustMarkIssuer {
    pub fn new(
        entity_id: impl Into<String>,
        signer: Arc<dyn Signer>,
        specs: impl IntoIterator<Item = TrustMarkSpec>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            signer,
            trust_marks: specs.into_iter().collect(),
        }
    }

    /// Register or replace the spec for a type; returns the replaced spec.
    pub fn add_trust_mark(&mut self, spec: TrustMarkSpec) -> Option<TrustMarkSpec> {
        self.trust_marks.insert(spec)
    }

    /// Types this issuer can issue, sorted.
    pub fn trust_mark_types(&self) -> Vec<String> {
        self.trust_marks.types()
    }

    pub fn spec(&self, trust_mark_type: &str) -> Option<&TrustMarkSpec> {
        self.trust_marks.get(trust_mark_type)
    }

    /// Keys verifiers need for this issuer's marks.
    pub fn jwks(&self) -> KeySet {
        self.signer.key_set()
    }

    /// Issue a trust mark for `subject`.
    ///
    /// `lifetime` overrides the spec's default; a zero lifetime issues a
    /// mark without expiry.
    pub fn issue_trust_mark(
        &self,
        trust_mark_type: &str,
        subject: &str,
        lifetime: Option<Duration>,
    ) -> Result<TrustMarkInfo> {
        self.issue_trust_mark_at(trust_mark_type, subject, lifetime, crate::time::now_unix())
    }

    /// `issue_trust_mark` with an explicit issuance time.
    pub fn issue_trust_mark_at(
        &self,
        trust_mark_type: &str,
        subject: &str,
        lifetime: Option<Duration>,
        now: i64,
    ) -> Result<TrustMarkInfo> {
        let spec = self
            .trust_marks
            .get(trust_mark_type)
            .ok_or_else(|| FederationError::UnknownTrustMarkType(trust_mark_type.to_string()))?;

        if let Some(raw) = spec.delegation_jwt.as_deref().filter(|raw| !raw.is_empty()) {
            warn_if_stale(trust_mark_type, raw, now);
        }

        let mut extra = spec.extra.clone();
        extra.retain(|name, _| {
            let reserved = TRUST_MARK_CLAIMS.contains(&name.as_str());
            if reserved {
                log::warn!("ignoring extra claim '{name}' on {trust_mark_type}: registered claim name");
            }
            !reserved
        });

        let mut mark = TrustMark::new(&self.entity_id, subject, &spec.trust_mark_type, now);
        mark.logo_uri = spec.logo_uri.clone();
        mark.reference = spec.reference.clone();
        mark.delegation_jwt = spec.delegation_jwt.clone();
        mark.extra = extra.clone();
        let lifetime = lifetime.map_or(spec.lifetime, |d| d.as_secs());
        if lifetime != 0 {
            mark.expires_at = Some(crate::time::expiry_after(now, lifetime)?);
        }

        let jwt = sign_claims(self.signer.as_ref(), JWT_TYPE_TRUST_MARK, &mark)?;
        log::debug!(
            "{} issued {} to {subject}",
            self.entity_id,
            spec.trust_mark_type
        );

        let info = TrustMarkInfo::new(&spec.trust_mark_type, jwt);
        Ok(if spec.include_extra_claims_in_info {
            info.with_extra(extra)
        } else {
            info
        })
    }
}

fn warn_if_stale(trust_mark_type: &str, raw: &str, now: i64) {
    match DelegationJwt::parse(raw) {
        Ok(delegation) => {
            if let Err(e) =
                crate::time::verify_time_at(delegation.issued_at, delegation.expires_at, now)
            {
                log::warn!("embedded delegation for {trust_mark_type} is not currently valid: {e}");
            }
        }
        Err(e) => log::warn!("embedded delegation for {trust_mark_type} does not parse: {e}"),
    }
}
