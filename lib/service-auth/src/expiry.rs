use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: Option<f64>,
}

/// Read the `exp` claim from a JWT without verifying its signature.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut parts = token.split('.');
    let (_header, payload) = (parts.next()?, parts.next()?);
    parts.next()?;

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claim: ExpiryClaim = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claim.exp? as i64, 0)
}

/// Whether the token is expired at `now`. Tokens that can't be decoded count as expired.
pub fn is_expired_at(token: &str, now: DateTime<Utc>) -> bool {
    match token_expiry(token) {
        Some(expiry) => expiry <= now,
        None => {
            tracing::debug!("Unable to decode token expiry, treating token as expired");
            true
        }
    }
}

pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, Utc::now())
}

#[cfg(test)]
pub(crate) fn unsigned_token(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"client-1","exp":{}}}"#, exp));
    format!("{}.{}.c2lnbmF0dXJl", header, payload)
}
