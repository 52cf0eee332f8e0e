use std::path::PathBuf;
use thiserror::Error;

/// Why the contents of a config file could not be turned into a value.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FormatError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid JSON5: {0}")]
    Json5(#[from] json5::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("content is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("number at '{0}' is not finite")]
    NonFiniteNumber(String),

    #[error("unsupported file extension '{0}'")]
    Unsupported(String),
}

#[derive(Debug, Error)]
#[error("failed to parse config file '{path}': {source}")]
pub struct ParseError {
    pub path: PathBuf,
    #[source]
    pub source: FormatError,
}
