//! Prototype-pollution-safe handling of untrusted JSON.
//!
//! Request bodies and callback payloads arriving from outside the trust
//! boundary go through [`parse_untrusted_json`] (or [`sanitize`] when already
//! parsed). Every `__proto__`, `constructor` and `prototype` key is removed at
//! every depth before the data is stored or handed to code that merges it
//! onto trusted objects.
//!
//! [`is_safe`] is a silent pre-check for callers that want to reject rather
//! than clean.

mod container;
mod error;
mod keys;
mod parse;
mod sanitize;

pub use container::{create_container, has_own_key};
pub use error::SanitizeError;
pub use keys::{is_dangerous_key, DANGEROUS_KEYS};
pub use parse::{parse_untrusted_json, parse_untrusted_json_as, try_parse_untrusted_json};
pub use sanitize::{
    is_safe, is_safe_with, sanitize, sanitize_report, sanitize_with, SanitizeOptions,
    SanitizeReport, DEFAULT_MAX_DEPTH,
};
