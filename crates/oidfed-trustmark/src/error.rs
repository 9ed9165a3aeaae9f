//! Error types for oidfed-trustmark.
//!
//! Every verification step fails fast with a variant that names the step.
//! Private key material is never included in error messages.

/// Errors raised while parsing, issuing, or verifying federation statements.
#[derive(Debug, thiserror::Error)]
pub enum FederationError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Token type mismatch: expected '{expected}', found '{found}'")]
    TypeMismatch { expected: String, found: String },

    #[error("Signature verification failed: {0}")]
    SignatureInvalid(String),

    #[error("Statement not yet valid: issued at {issued_at}, now {now}")]
    NotYetValid { issued_at: i64, now: i64 },

    #[error("Statement expired at {expires_at}, now {now}")]
    Expired { expires_at: i64, now: i64 },

    #[error("Lifetime of {lifetime}s from {now} overflows the expiry time")]
    LifetimeOverflow { lifetime: u64, now: i64 },

    #[error("Trust mark issuer '{issuer}' is not allowed by the trust anchor for '{trust_mark_type}'")]
    IssuerNotAllowed {
        issuer: String,
        trust_mark_type: String,
    },

    #[error("Not a configured trust anchor: {0}")]
    UntrustedAnchor(String),

    #[error("Unknown trust mark owner for '{0}'")]
    UnknownOwner(String),

    #[error("Unknown trust mark type '{0}'")]
    UnknownTrustMarkType(String),

    #[error("Trust mark '{trust_mark_type}' from '{issuer}' carries no delegation")]
    NoDelegation {
        issuer: String,
        trust_mark_type: String,
    },

    #[error("Delegation is for trust mark type '{found}', expected '{expected}'")]
    DelegationTypeMismatch { expected: String, found: String },

    #[error("Delegation subject '{found}' is not the trust mark issuer '{expected}'")]
    DelegationSubjectMismatch { expected: String, found: String },

    #[error("Delegation issued by '{found}', expected trust mark owner '{expected}'")]
    DelegationIssuerMismatch { expected: String, found: String },

    #[error("Trust mark info claims type '{claimed}' but the trust mark is '{actual}'")]
    TrustMarkTypeMismatch { claimed: String, actual: String },

    #[error("No keys found for entity '{0}'")]
    NoKeysFound(String),

    #[error("Resolution failed: {0}")]
    ResolutionFailed(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FederationError {
    /// True for failures of the resolution collaborator (network, chain
    /// building). These may be retried; signature and policy rejections may not.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(self, Self::ResolutionFailed(_))
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, FederationError>;
