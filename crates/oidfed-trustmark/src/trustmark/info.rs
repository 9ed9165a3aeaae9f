//! Trust mark infos: the envelope a trust mark is published in.
//!
//! An entity configuration lists its trust marks as
//! `{"trust_mark_type": ..., "trust_mark": "<jwt>", ...}`. The parsed mark is
//! derived from the raw token on first access and cached; the raw token is
//! the only authoritative part.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityStatement, TrustMarkOwnerSpec};
use crate::error::{FederationError, Result};
use crate::jose::KeySet;
use crate::resolve::MetadataResolver;

use super::lazy::LazyParse;
use super::mark::TrustMark;

/// A published trust mark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustMarkInfo {
    trust_mark_type: String,
    #[serde(rename = "trust_mark")]
    trust_mark_jwt: String,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
    #[serde(skip)]
    parsed: LazyParse<TrustMark>,
}

impl TrustMarkInfo {
    /// Wrap a raw trust mark token.
    pub fn new(trust_mark_type: impl Into<String>, trust_mark_jwt: impl Into<String>) -> Self {
        Self {
            trust_mark_type: trust_mark_type.into(),
            trust_mark_jwt: trust_mark_jwt.into(),
            extra: serde_json::Map::new(),
            parsed: LazyParse::new(),
        }
    }

    /// Attach envelope-level extra claims.
    pub fn with_extra(mut self, extra: serde_json::Map<String, serde_json::Value>) -> Self {
        self.extra = extra;
        self
    }

    pub fn trust_mark_type(&self) -> &str {
        &self.trust_mark_type
    }

    /// The raw signed trust mark.
    pub fn trust_mark_jwt(&self) -> &str {
        &self.trust_mark_jwt
    }

    pub fn extra(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.extra
    }

    /// The parsed trust mark. Parsed once; later calls return the same value.
    pub fn trust_mark(&self) -> Result<Arc<TrustMark>> {
        self.parsed
            .get_or_try_parse(|| TrustMark::parse(&self.trust_mark_jwt))
    }

    /// How many times the raw token has been parsed.
    pub fn parse_count(&self) -> usize {
        self.parsed.attempts()
    }

    fn checked_trust_mark(&self) -> Result<Arc<TrustMark>> {
        let mark = self.trust_mark()?;
        if mark.trust_mark_type != self.trust_mark_type {
            return Err(FederationError::TrustMarkTypeMismatch {
                claimed: self.trust_mark_type.clone(),
                actual: mark.trust_mark_type.clone(),
            });
        }
        Ok(mark)
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
        self.checked_trust_mark()?
            .verify_federation_at(anchor, resolver, now)
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
        self.checked_trust_mark()?
            .verify_external_at(issuer_keys, owner, now)
    }
}

/// An ordered list of trust mark infos.
///
/// Batch verification keeps the valid entries and drops the rest; one bad
/// mark never fails the whole list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrustMarkInfos(pub Vec<TrustMarkInfo>);

impl TrustMarkInfos {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrustMarkInfo> {
        self.0.iter()
    }

    fn retain_verified<F>(&self, verify: F) -> TrustMarkInfos
    where
        F: Fn(&TrustMarkInfo) -> Result<()>,
    {
        let verified = self
            .0
            .iter()
            .filter(|&info| match verify(info) {
                Ok(()) => true,
                Err(e) => {
                    log::debug!("dropping trust mark {}: {e}", info.trust_mark_type);
                    false
                }
            })
            .cloned()
            .collect();
        TrustMarkInfos(verified)
    }

    /// The entries valid under `anchor`.
    pub fn verified_federation(
        &self,
        anchor: &EntityStatement,
        resolver: &dyn MetadataResolver,
    ) -> TrustMarkInfos {
        let now = crate::time::now_unix();
        self.retain_verified(|info| info.verify_federation_at(anchor, resolver, now))
    }

    /// The entries valid under `anchor`, verifying up to `max_parallel`
    /// entries at once. Order is preserved.
    pub fn verified_federation_concurrent(
        &self,
        anchor: &EntityStatement,
        resolver: &dyn MetadataResolver,
        max_parallel: usize,
    ) -> TrustMarkInfos {
        let now = crate::time::now_unix();
        let chunk_size = max_parallel.max(1);
        let mut verified = Vec::with_capacity(self.0.len());

        for chunk in self.0.chunks(chunk_size) {
            let outcomes: Vec<bool> = std::thread::scope(|scope| {
                let handles: Vec<_> = chunk
                    .iter()
                    .map(|info| {
                        scope.spawn(move || info.verify_federation_at(anchor, resolver, now))
                    })
                    .collect();
                handles
                    .into_iter()
                    .zip(chunk)
                    .map(|(handle, info)| match handle.join() {
                        Ok(Ok(())) => true,
                        Ok(Err(e)) => {
                            log::debug!("dropping trust mark {}: {e}", info.trust_mark_type);
                            false
                        }
                        Err(_) => {
                            log::warn!("verification of trust mark {} panicked", info.trust_mark_type);
                            false
                        }
                    })
                    .collect()
            });
            verified.extend(
                chunk
                    .iter()
                    .zip(outcomes)
                    .filter(|(_, ok)| *ok)
                    .map(|(info, _)| info.clone()),
            );
        }
        TrustMarkInfos(verified)
    }

    /// The entries valid for the given issuer keys and optional owner.
    pub fn verified_external(
        &self,
        issuer_keys: &KeySet,
        owner: Option<&TrustMarkOwnerSpec>,
    ) -> TrustMarkInfos {
        let now = crate::time::now_unix();
        self.retain_verified(|info| info.verify_external_at(issuer_keys, owner, now))
    }

    /// The first entry matching `matcher`.
    pub fn find<F>(&self, matcher: F) -> Option<&TrustMarkInfo>
    where
        F: Fn(&TrustMarkInfo) -> bool,
    {
        self.0.iter().find(|&info| matcher(info))
    }

    /// The first entry of the given type.
    pub fn find_by_type(&self, trust_mark_type: &str) -> Option<&TrustMarkInfo> {
        self.find(|info| info.trust_mark_type == trust_mark_type)
    }
}

impl From<Vec<TrustMarkInfo>> for TrustMarkInfos {
    fn from(infos: Vec<TrustMarkInfo>) -> Self {
        Self(infos)
    }
}

impl IntoIterator for TrustMarkInfos {
    type Item = TrustMarkInfo;
    type IntoIter = std::vec::IntoIter<TrustMarkInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
