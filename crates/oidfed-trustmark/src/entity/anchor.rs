//! Trust anchors configured out-of-band.

use serde::{Deserialize, Serialize};

use crate::error::{FederationError, Result};
use crate::jose::KeySet;

use super::statement::EntityStatement;

/// A trust anchor: an entity id and, optionally, its pinned keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustAnchor {
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "KeySet::is_empty")]
    pub jwks: KeySet,
}

impl TrustAnchor {
    pub fn new(entity_id: impl Into<String>, jwks: KeySet) -> Self {
        Self {
            entity_id: entity_id.into(),
            jwks,
        }
    }

    /// Accept `configuration` as this anchor's entity configuration.
    ///
    /// It must be self-issued by the anchor. With pinned keys the signature is
    /// checked against them, otherwise against the keys it publishes.
    pub fn accept(&self, configuration: &EntityStatement) -> Result<()> {
        if !configuration.is_entity_configuration() || configuration.subject != self.entity_id {
            return Err(FederationError::UntrustedAnchor(format!(
                "statement from '{}' about '{}' is not the configuration of '{}'",
                configuration.issuer, configuration.subject, self.entity_id
            )));
        }
        if self.jwks.is_empty() {
            configuration.verify_self_signed()
        } else {
            configuration.verify(&self.jwks)
        }
    }
}

/// An ordered list of trust anchors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrustAnchors(pub Vec<TrustAnchor>);

impl TrustAnchors {
    /// Anchors for the given ids, without pinned keys.
    pub fn from_entity_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            ids.into_iter()
                .map(|id| TrustAnchor::new(id, KeySet::default()))
                .collect(),
        )
    }

    /// The anchors' entity ids, in order.
    pub fn entity_ids(&self) -> Vec<String> {
        self.0.iter().map(|a| a.entity_id.clone()).collect()
    }

    /// Find an anchor by entity id.
    pub fn get(&self, entity_id: &str) -> Option<&TrustAnchor> {
        self.0.iter().find(|a| a.entity_id == entity_id)
    }

    /// Accept an entity configuration from one of these anchors.
    pub fn accept(&self, configuration: &EntityStatement) -> Result<&TrustAnchor> {
        let anchor = self
            .get(&configuration.subject)
            .ok_or_else(|| FederationError::UntrustedAnchor(configuration.subject.clone()))?;
        anchor.accept(configuration)?;
        Ok(anchor)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
