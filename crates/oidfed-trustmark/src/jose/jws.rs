//! Compact JWS parsing, signing, and verification.
//!
//! Format: `base64url(header).base64url(payload).base64url(signature)`,
//! unpadded. The header `typ` is the statement's declared type and must be
//! checked before the payload is trusted or decoded.

use base64::Engine;
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{FederationError, Result};

use super::jwks::KeySet;
use super::ALG_EDDSA;

/// Protected header of a compact JWS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwsHeader {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

/// A parsed, not yet verified, signed statement.
#[derive(Debug, Clone)]
pub struct SignedStatement {
    raw: String,
    header: JwsHeader,
    payload: Vec<u8>,
    signature: Vec<u8>,
    signing_input_len: usize,
}

fn b64_decode(part: &str, what: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(part)
        .map_err(|e| FederationError::Parse(format!("invalid base64url {what}: {e}")))
}

fn b64_encode(data: &[u8]) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(data)
}

impl SignedStatement {
    /// Parse a compact JWS.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let parts: Vec<&str> = raw.split('.').collect();
        if parts.len() != 3 {
            return Err(FederationError::Parse(format!(
                "expected 3 JWS segments, got {}",
                parts.len()
            )));
        }

        let header_bytes = b64_decode(parts[0], "header")?;
        let header: JwsHeader = serde_json::from_slice(&header_bytes)
            .map_err(|e| FederationError::Parse(format!("invalid JWS header: {e}")))?;
        let payload = b64_decode(parts[1], "payload")?;
        let signature = b64_decode(parts[2], "signature")?;

        Ok(Self {
            raw: raw.to_string(),
            header,
            payload,
            signature,
            signing_input_len: parts[0].len() + 1 + parts[1].len(),
        })
    }

    /// Parse a compact JWS and require the declared type `typ`.
    pub fn parse_typed(raw: &str, typ: &str) -> Result<Self> {
        let statement = Self::parse(raw)?;
        statement.expect_type(typ)?;
        Ok(statement)
    }

    /// The token exactly as parsed.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The protected header.
    pub fn header(&self) -> &JwsHeader {
        &self.header
    }

    /// The declared statement type, if any.
    pub fn typ(&self) -> Option<&str> {
        self.header.typ.as_deref()
    }

    /// The raw (unverified) payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Fail with `TypeMismatch` unless the header declares `expected`.
    pub fn expect_type(&self, expected: &str) -> Result<()> {
        match self.typ() {
            Some(typ) if typ == expected => Ok(()),
            other => Err(FederationError::TypeMismatch {
                expected: expected.to_string(),
                found: other.unwrap_or("").to_string(),
            }),
        }
    }

    /// Decode the payload as JSON.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.payload)
            .map_err(|e| FederationError::Parse(format!("invalid payload: {e}")))
    }

    fn signing_input(&self) -> &[u8] {
        &self.raw.as_bytes()[..self.signing_input_len]
    }

    /// Verify the signature against a key set.
    ///
    /// When the header names a `kid`, only keys with that id are tried.
    pub fn verify_with_key_set(&self, keys: &KeySet) -> Result<()> {
        if self.header.alg != ALG_EDDSA {
            return Err(FederationError::SignatureInvalid(format!(
                "unsupported algorithm '{}'",
                self.header.alg
            )));
        }
        let sig_array: [u8; 64] = self.signature.as_slice().try_into().map_err(|_| {
            FederationError::SignatureInvalid("signature must be 64 bytes".into())
        })?;
        let signature = Signature::from_bytes(&sig_array);

        let candidates: Vec<_> = keys
            .iter()
            .filter(|k| k.is_ed25519())
            .filter(|k| match &self.header.kid {
                Some(kid) => k.kid.as_deref() == Some(kid.as_str()),
                None => true,
            })
            .collect();
        if candidates.is_empty() {
            return Err(FederationError::SignatureInvalid(match &self.header.kid {
                Some(kid) => format!("no usable key with kid '{kid}'"),
                None => "no usable key in key set".into(),
            }));
        }

        for jwk in candidates {
            let Ok(key) = jwk.verifying_key() else {
                continue;
            };
            if key.verify(self.signing_input(), &signature).is_ok() {
                return Ok(());
            }
        }
        Err(FederationError::SignatureInvalid(
            "no key in the set verifies the signature".into(),
        ))
    }
}

/// Sign `payload` as a compact JWS with declared type `typ`.
pub fn sign_compact(
    signing_key: &SigningKey,
    kid: Option<&str>,
    typ: &str,
    payload: &[u8],
) -> Result<String> {
    let header = JwsHeader {
        alg: ALG_EDDSA.into(),
        typ: Some(typ.into()),
        kid: kid.map(str::to_string),
    };
    let header_json =
        serde_json::to_vec(&header).map_err(|e| FederationError::Serialization(e.to_string()))?;
    let signing_input = format!("{}.{}", b64_encode(&header_json), b64_encode(payload));
    let signature = signing_key.sign(signing_input.as_bytes());
    Ok(format!("{signing_input}.{}", b64_encode(&signature.to_bytes())))
}
