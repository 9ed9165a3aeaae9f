//! Issuer key discovery and the resolver collaborator contract.
//!
//! Trust chain building and metadata policy live outside this crate. The
//! verification engine only needs two things from them: a resolved trust
//! chain for a subject under a trust anchor, and a subject's own entity
//! configuration.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use crate::entity::{EntityStatement, TrustAnchors};
use crate::error::{FederationError, Result};
use crate::jose::KeySet;

/// Request to resolve a subject under one or more trust anchors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveRequest {
    #[serde(rename = "sub")]
    pub subject: String,
    #[serde(rename = "trust_anchor")]
    pub trust_anchors: Vec<String>,
    #[serde(rename = "entity_type", default, skip_serializing_if = "Vec::is_empty")]
    pub entity_types: Vec<String>,
}

impl ResolveRequest {
    pub fn new(subject: impl Into<String>, trust_anchors: &TrustAnchors) -> Self {
        Self {
            subject: subject.into(),
            trust_anchors: trust_anchors.entity_ids(),
            entity_types: Vec::new(),
        }
    }
}

/// Outcome of a resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolveResponse {
    /// Raw signed statements, leaf first.
    #[serde(default)]
    pub trust_chain: Vec<String>,
    /// Resolved metadata, opaque to this crate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Trust chain / metadata resolution collaborator.
pub trait MetadataResolver: Send + Sync {
    /// Resolve `request.subject` under `request.trust_anchors`.
    fn resolve(&self, request: &ResolveRequest) -> Result<ResolveResponse>;

    /// Fetch a subject's own entity configuration.
    fn entity_configuration(&self, subject: &str) -> Result<EntityStatement>;
}

fn resolution_failed(context: &str, err: FederationError) -> FederationError {
    match err {
        FederationError::ResolutionFailed(msg) => {
            FederationError::ResolutionFailed(format!("{context}: {msg}"))
        }
        other => FederationError::ResolutionFailed(format!("{context}: {other}")),
    }
}

/// Find the key set that verifies statements signed by `issuer`.
///
/// The anchor's own keys are used when the anchor is the issuer. Otherwise
/// the resolver is asked for a trust chain; its first hop (the issuer's
/// entity configuration) supplies the keys, falling back to fetching the
/// entity configuration directly when the chain is empty.
pub fn resolve_issuer_keys(
    issuer: &str,
    anchor: &EntityStatement,
    resolver: &dyn MetadataResolver,
) -> Result<KeySet> {
    if issuer == anchor.subject {
        if anchor.jwks.is_empty() {
            return Err(FederationError::NoKeysFound(issuer.to_string()));
        }
        return Ok(anchor.jwks.clone());
    }

    let anchors = TrustAnchors::from_entity_ids([anchor.subject.as_str()]);
    let request = ResolveRequest::new(issuer, &anchors);
    let response = resolver
        .resolve(&request)
        .map_err(|e| resolution_failed("resolving trust mark issuer", e))?;

    let statement = match response.trust_chain.first() {
        Some(raw) => EntityStatement::parse(raw)
            .map_err(|e| resolution_failed("parsing trust mark issuer entity statement", e))?,
        None => resolver
            .entity_configuration(issuer)
            .map_err(|e| resolution_failed("fetching trust mark issuer configuration", e))?,
    };

    if statement.jwks.is_empty() {
        return Err(FederationError::NoKeysFound(issuer.to_string()));
    }
    log::debug!(
        "resolved {} key(s) for trust mark issuer {issuer}",
        statement.jwks.len()
    );
    Ok(statement.jwks)
}

/// In-memory resolver over pre-fetched entity configurations and chains.
///
/// Useful offline and in tests; counts calls so callers can observe
/// whether resolution happened at all.
#[derive(Debug, Default)]
pub struct StaticResolver {
    configurations: HashMap<String, String>,
    chains: HashMap<String, Vec<String>>,
    resolve_calls: AtomicUsize,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subject's raw entity configuration.
    pub fn add_entity_configuration(&mut self, subject: impl Into<String>, raw: impl Into<String>) {
        self.configurations.insert(subject.into(), raw.into());
    }

    /// Register the parsed form of a raw entity configuration under its subject.
    pub fn add_raw_entity_configuration(&mut self, raw: &str) -> Result<String> {
        let statement = EntityStatement::parse(raw)?;
        let subject = statement.subject.clone();
        self.configurations.insert(subject.clone(), raw.to_string());
        Ok(subject)
    }

    /// Register a resolved trust chain (leaf first) for a subject.
    pub fn add_trust_chain(&mut self, subject: impl Into<String>, chain: Vec<String>) {
        self.chains.insert(subject.into(), chain);
    }

    /// Number of `resolve` calls served so far.
    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::Relaxed)
    }
}

impl MetadataResolver for StaticResolver {
    fn resolve(&self, request: &ResolveRequest) -> Result<ResolveResponse> {
        self.resolve_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(chain) = self.chains.get(&request.subject) {
            return Ok(ResolveResponse {
                trust_chain: chain.clone(),
                metadata: None,
            });
        }
        if self.configurations.contains_key(&request.subject) {
            return Ok(ResolveResponse::default());
        }
        Err(FederationError::ResolutionFailed(format!(
            "no trust chain for '{}'",
            request.subject
        )))
    }

    fn entity_configuration(&self, subject: &str) -> Result<EntityStatement> {
        let raw = self.configurations.get(subject).ok_or_else(|| {
            FederationError::ResolutionFailed(format!("no entity configuration for '{subject}'"))
        })?;
        EntityStatement::parse(raw)
    }
}
