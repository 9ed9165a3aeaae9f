//! Time utilities for oidfed-trustmark.
//!
//! All timestamps are JWT NumericDate values: whole seconds since the Unix
//! epoch (i64).

use crate::error::{FederationError, Result};

/// Return the current time as seconds since Unix epoch.
pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Convert Unix seconds to an RFC 3339 string.
pub fn unix_to_rfc3339(secs: i64) -> String {
    let dt = chrono::DateTime::from_timestamp(secs, 0).unwrap_or(chrono::DateTime::UNIX_EPOCH);
    dt.to_rfc3339()
}

/// The `exp` value for a statement issued at `now` living `lifetime` seconds.
pub fn expiry_after(now: i64, lifetime: u64) -> Result<i64> {
    i64::try_from(lifetime)
        .ok()
        .and_then(|secs| now.checked_add(secs))
        .ok_or(FederationError::LifetimeOverflow { lifetime, now })
}

/// Check an issued-at / expires-at window against the current time.
pub fn verify_time(issued_at: i64, expires_at: Option<i64>) -> Result<()> {
    verify_time_at(issued_at, expires_at, now_unix())
}

/// Check an issued-at / expires-at window against `now`.
///
/// Both bounds are inclusive and no clock-skew leeway is applied.
pub fn verify_time_at(issued_at: i64, expires_at: Option<i64>, now: i64) -> Result<()> {
    if issued_at > now {
        return Err(FederationError::NotYetValid { issued_at, now });
    }
    if let Some(expires_at) = expires_at {
        if expires_at < now {
            return Err(FederationError::Expired { expires_at, now });
        }
    }
    Ok(())
}
