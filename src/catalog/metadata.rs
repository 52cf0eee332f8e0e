//! Per-feature metadata, read from a `_metadata.<ext>` file inside the
//! feature's directory.
//!
//! ```yaml
//! # feature_A/_metadata.yaml
//! aliases: [a, feature-a]
//! imports: [base_defaults]
//! conditions:
//!   jsonPointer: /region
//!   equals: eu-west
//! ```

use serde::Deserialize;

use super::conditions::Condition;
use crate::value::ConfigValue;

/// File stem reserved for feature metadata.
pub const METADATA_STEM: &str = "_metadata";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeatureMetadata {
    /// Other names the feature may be requested by, matched without regard to case.
    pub aliases: Vec<String>,
    /// Canonical names of features applied before this one, in order.
    pub imports: Vec<String>,
    /// When constraints are given, the feature only applies if these hold.
    pub conditions: Option<Condition>,
}

impl FeatureMetadata {
    pub fn from_value(value: ConfigValue) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value() {
        let metadata = FeatureMetadata::from_value(
            json!({
                "aliases": ["a"],
                "imports": ["base", "extra"],
                "conditions": {"jsonPointer": "/env", "equals": "prod"}
            })
            .into(),
        )
        .unwrap();
        assert_eq!(metadata.aliases, vec!["a"]);
        assert_eq!(metadata.imports, vec!["base", "extra"]);
        assert!(metadata.conditions.is_some());
    }

    #[test]
    fn test_every_field_is_optional() {
        let metadata = FeatureMetadata::from_value(ConfigValue::empty_mapping()).unwrap();
        assert_eq!(metadata, FeatureMetadata::default());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let err = FeatureMetadata::from_value(json!({"import": ["base"]}).into()).unwrap_err();
        assert!(err.to_string().contains("unknown field"), "{err}");
    }
}
