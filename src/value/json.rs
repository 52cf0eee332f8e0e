//! Canonical JSON rendering of resolved options.
//!
//! Output is compact, with mapping keys in sorted byte order, so identical
//! inputs always produce identical strings.

use super::ConfigValue;

/// Renders `value` as canonical JSON.
pub fn to_canonical_json(value: &ConfigValue) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

/// Parses JSON text into a [`ConfigValue`].
pub fn from_json_str(text: &str) -> Result<ConfigValue, serde_json::Error> {
    serde_json::from_str(text)
}

/// Re-renders arbitrary JSON text in canonical form.
pub fn canonicalize(text: &str) -> Result<String, serde_json::Error> {
    to_canonical_json(&from_json_str(text)?)
}
