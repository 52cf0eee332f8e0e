use thiserror::Error;

use crate::value::merge::KeyPath;

/// Why a single options query failed. The provider stays usable.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResolveError {
    #[error("config key '{0}' was not found")]
    KeyNotFound(String),

    #[error("feature '{feature}' is not defined for config key '{key}'")]
    UnknownFeature { key: String, feature: String },

    #[error("feature '{0}' is not defined")]
    UndefinedFeature(String),

    #[error("feature '{feature}' puts a {overlay} where config key '{key}' has a {base} at '{path}'")]
    TypeConflict {
        key: String,
        feature: String,
        path: KeyPath,
        base: &'static str,
        overlay: &'static str,
    },

    #[error("overrides put a {overlay} where config key '{key}' has a {base} at '{path}'")]
    OverrideConflict {
        key: String,
        path: KeyPath,
        base: &'static str,
        overlay: &'static str,
    },

    #[error("invalid overrides JSON: {0}")]
    InvalidOverrides(#[source] serde_json::Error),

    #[error("invalid constraints JSON: {0}")]
    InvalidConstraints(#[source] serde_json::Error),

    #[error("failed to serialize options: {0}")]
    Serialize(#[source] serde_json::Error),
}
