//! Parse-then-sanitize entry points for untrusted JSON text.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::SanitizeError;
use crate::sanitize::{sanitize_report, SanitizeOptions};

/// Parse untrusted JSON and sanitize the result.
///
/// Returns `None` for malformed JSON, for documents whose root is not an
/// object or array, and for input nested too deeply. Never panics.
///
/// ```
/// use authguard_sanitize::parse_untrusted_json;
///
/// let data = parse_untrusted_json(r#"{"__proto__": {"isAdmin": true}, "name": "John"}"#).unwrap();
/// assert_eq!(data["name"], "John");
/// assert!(data.get("__proto__").is_none());
/// ```
pub fn parse_untrusted_json(text: &str) -> Option<Value> {
    match try_parse_untrusted_json(text) {
        Ok(value) => Some(value),
        Err(SanitizeError::InvalidJson(err)) => {
            warn!(error = %err, "[Security] JSON parse error");
            None
        }
        Err(SanitizeError::TooDeep { max_depth }) => {
            warn!(max_depth, "[Security] Rejected untrusted input nested too deeply");
            None
        }
        Err(_) => None,
    }
}

/// Like [`parse_untrusted_json`], but reports why nothing came back.
///
/// Blocked keys are still logged as they are removed.
pub fn try_parse_untrusted_json(text: &str) -> Result<Value, SanitizeError> {
    let parsed: Value = serde_json::from_str(text)?;
    let report = sanitize_report(&parsed, &SanitizeOptions::default())?;
    Ok(report.value)
}

/// Parse, sanitize, then deserialize into `T`.
///
/// `T` only ever sees the sanitized tree, so a `#[serde(flatten)]` catch-all
/// map on `T` cannot capture a dangerous key.
pub fn parse_untrusted_json_as<T: DeserializeOwned>(text: &str) -> Option<T> {
    let value = parse_untrusted_json(text)?;
    match serde_json::from_value(value) {
        Ok(typed) => Some(typed),
        Err(err) => {
            let err = SanitizeError::Deserialize(err.to_string());
            warn!(error = %err, "[Security] Untrusted JSON rejected");
            None
        }
    }
}
