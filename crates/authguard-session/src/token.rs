//! Reading the `exp` claim out of a compact `header.payload.signature` token.
//!
//! The signature is never checked here. Expiry scheduling only needs to know
//! when the token the caller already holds stops working.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde_json::{Map, Value};
use tracing::debug;

use crate::clock::now_millis;
use crate::error::TokenError;

const TOKEN_SEGMENTS: usize = 3;

const LENIENT_PADDING: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// base64url per RFC 7519; padding accepted but not required.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT_PADDING);

/// Some issuers emit the standard alphabet.
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT_PADDING);

/// Decode the claims object from the token's second segment.
///
/// # Errors
/// Returns `TokenError` for a wrong segment count, bad base64, bad JSON, or a
/// payload that is not a JSON object.
pub fn decode_payload(token: &str) -> Result<Map<String, Value>, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != TOKEN_SEGMENTS {
        return Err(TokenError::SegmentCount {
            got: segments.len(),
        });
    }

    let bytes = URL_SAFE_LENIENT
        .decode(segments[1])
        .or_else(|_| STANDARD_LENIENT.decode(segments[1]))
        .map_err(|e| TokenError::Base64(e.to_string()))?;

    match serde_json::from_slice(&bytes)? {
        Value::Object(claims) => Ok(claims),
        _ => Err(TokenError::NotAnObject),
    }
}

/// Expiry instant in epoch milliseconds, from the `exp` claim (epoch seconds).
///
/// A missing, zero, negative or non-numeric `exp` is not usable.
pub fn expiry_millis(claims: &Map<String, Value>) -> Result<i64, TokenError> {
    let exp = claims
        .get("exp")
        .and_then(Value::as_f64)
        .filter(|exp| exp.is_finite() && *exp > 0.0)
        .ok_or(TokenError::MissingExpiry)?;
    // float-to-int casts saturate
    Ok((exp * 1000.0) as i64)
}

/// Decode `token` and return its expiry in epoch milliseconds.
pub fn token_expiry_millis(token: &str) -> Result<i64, TokenError> {
    expiry_millis(&decode_payload(token)?)
}

/// Milliseconds until `token` expires, measured against `now_ms`.
/// Zero when expired, absent, or undecodable.
pub fn ms_until_expiration_at(token: Option<&str>, now_ms: i64) -> u64 {
    let Some(token) = token else {
        return 0;
    };
    match token_expiry_millis(token) {
        Ok(exp_ms) => u64::try_from(exp_ms.saturating_sub(now_ms)).unwrap_or(0),
        Err(err) => {
            debug!(error = %err, "Session token has no usable expiry");
            0
        }
    }
}

/// Milliseconds until `token` expires, by the system clock.
pub fn ms_until_expiration_from_token(token: Option<&str>) -> u64 {
    ms_until_expiration_at(token, now_millis())
}
