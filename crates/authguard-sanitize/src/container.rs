//! Containers for accumulating trusted keys.
//!
//! `serde_json::Map` resolves only keys that were inserted into it; there is
//! no inherited member to fall back to. These helpers name that guarantee
//! at call sites that used to need a prototype-less object.

use serde_json::{Map, Value};

/// A fresh, empty mapping with no fallback lookup.
pub fn create_container() -> Map<String, Value> {
    Map::new()
}

/// Whether `key` was set directly on `container`.
pub fn has_own_key(container: &Map<String, Value>, key: &str) -> bool {
    container.contains_key(key)
}
