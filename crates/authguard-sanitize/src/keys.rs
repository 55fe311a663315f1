//! The closed set of keys that can reach an object's prototype chain.

/// Keys that must never be copied from untrusted input onto a trusted object.
pub const DANGEROUS_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// Whether `key` is one of [`DANGEROUS_KEYS`]. Matching is exact and
/// case-sensitive, the same way a JavaScript property lookup resolves it.
pub fn is_dangerous_key(key: &str) -> bool {
    DANGEROUS_KEYS.contains(&key)
}
