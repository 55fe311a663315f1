//! Recursive removal of dangerous keys from untrusted JSON trees.
//! Walks mappings and sequences, copying everything except dangerous keys.

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::SanitizeError;
use crate::keys::is_dangerous_key;

// ============================================================================
// Options
// ============================================================================

/// Deepest container nesting accepted by default. The root container sits
/// at depth 0.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Options controlling sanitization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeOptions {
    /// Containers nested deeper than this reject the whole input.
    pub max_depth: usize,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Result of [`sanitize_report`]: the cleaned value plus where keys were cut.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizeReport {
    pub value: Value,
    /// Path of every blocked key, in traversal order (e.g. `$.user.__proto__`).
    pub blocked: Vec<String>,
}

// ============================================================================
// Public API
// ============================================================================

/// Sanitize untrusted data with default options.
///
/// Returns `None` when there is nothing to sanitize (the input is a scalar
/// or null) or the input exceeds [`DEFAULT_MAX_DEPTH`]. Otherwise returns a
/// copy with every dangerous key removed at every depth. Scalars nested
/// inside containers pass through unchanged.
pub fn sanitize(value: &Value) -> Option<Value> {
    sanitize_with(value, &SanitizeOptions::default())
}

/// Sanitize untrusted data with explicit options. See [`sanitize`].
pub fn sanitize_with(value: &Value, opts: &SanitizeOptions) -> Option<Value> {
    match sanitize_report(value, opts) {
        Ok(report) => Some(report.value),
        Err(SanitizeError::TooDeep { max_depth }) => {
            warn!(max_depth, "[Security] Rejected untrusted input nested too deeply");
            None
        }
        Err(_) => None,
    }
}

/// Sanitize and report the path of every blocked key.
///
/// # Errors
/// `NotAContainer` for scalar or null input, `TooDeep` when a container is
/// nested deeper than `opts.max_depth`.
pub fn sanitize_report(
    value: &Value,
    opts: &SanitizeOptions,
) -> Result<SanitizeReport, SanitizeError> {
    if !is_container(value) {
        return Err(SanitizeError::NotAContainer);
    }

    let mut walker = Walker {
        max_depth: opts.max_depth,
        path: String::from("$"),
        blocked: Vec::new(),
    };
    let value = walker.node(value, 0)?;

    Ok(SanitizeReport {
        value,
        blocked: walker.blocked,
    })
}

/// Whether `value` is free of dangerous keys at every depth.
///
/// Read-only and silent. Scalars and null are always safe. This informs a
/// reject-or-proceed decision; data that will be retained should still go
/// through [`sanitize`].
pub fn is_safe(value: &Value) -> bool {
    is_safe_with(value, &SanitizeOptions::default())
}

/// [`is_safe`] with explicit options. Input nested beyond `opts.max_depth`
/// is reported unsafe.
pub fn is_safe_with(value: &Value, opts: &SanitizeOptions) -> bool {
    is_safe_inner(value, opts.max_depth, 0)
}

// ============================================================================
// Core Implementation
// ============================================================================

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

struct Walker {
    max_depth: usize,
    /// Path of the node being visited; pushed and truncated around recursion.
    path: String,
    blocked: Vec<String>,
}

impl Walker {
    fn node(&mut self, value: &Value, depth: usize) -> Result<Value, SanitizeError> {
        match value {
            Value::Object(map) => {
                self.check_depth(depth)?;
                self.object(map, depth).map(Value::Object)
            }
            Value::Array(items) => {
                self.check_depth(depth)?;
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let mark = self.path.len();
                    self.path.push_str(&format!("[{i}]"));
                    out.push(self.node(item, depth + 1)?);
                    self.path.truncate(mark);
                }
                Ok(Value::Array(out))
            }
            scalar => Ok(scalar.clone()),
        }
    }

    fn object(
        &mut self,
        map: &Map<String, Value>,
        depth: usize,
    ) -> Result<Map<String, Value>, SanitizeError> {
        let mut safe = Map::new();

        for (key, child) in map {
            let mark = self.path.len();
            push_key_segment(&mut self.path, key);

            if is_dangerous_key(key) {
                warn!(
                    key = %key,
                    path = %self.path,
                    "[Security] Blocked prototype pollution attempt"
                );
                self.blocked.push(self.path.clone());
            } else {
                let cleaned = self.node(child, depth + 1)?;
                safe.insert(key.clone(), cleaned);
            }

            self.path.truncate(mark);
        }

        Ok(safe)
    }

    fn check_depth(&self, depth: usize) -> Result<(), SanitizeError> {
        if depth > self.max_depth {
            return Err(SanitizeError::TooDeep {
                max_depth: self.max_depth,
            });
        }
        Ok(())
    }
}

fn is_safe_inner(value: &Value, max_depth: usize, depth: usize) -> bool {
    match value {
        Value::Object(map) => {
            depth <= max_depth
                && map.iter().all(|(key, child)| {
                    !is_dangerous_key(key) && is_safe_inner(child, max_depth, depth + 1)
                })
        }
        Value::Array(items) => {
            depth <= max_depth && items.iter().all(|v| is_safe_inner(v, max_depth, depth + 1))
        }
        _ => true,
    }
}

/// Append `.key` for identifier-like keys, `["key"]` otherwise.
fn push_key_segment(path: &mut String, key: &str) {
    let plain = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if plain {
        path.push('.');
        path.push_str(key);
    } else {
        path.push('[');
        path.push_str(&Value::String(key.to_string()).to_string());
        path.push(']');
    }
}
