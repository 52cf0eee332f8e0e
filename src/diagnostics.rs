//! Problems found while scanning roots, reported together at build time.

use std::path::PathBuf;

use thiserror::Error;

use crate::loader::ParseError;
use crate::source::SourceError;
use crate::value::merge::KeyPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Diagnostic {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("'{first}' and '{second}' both define {} of config key '{key}'", describe(.feature))]
    DuplicateSource {
        key: String,
        feature: Option<String>,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("config key '{key}' is defined differently by '{first}' and '{second}'")]
    ConflictingBase {
        key: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("config key '{key}' is defined identically by '{first}' and '{second}'")]
    DuplicateBase {
        key: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("feature '{feature}' overlays config key '{key}' differently in '{first}' and '{second}'")]
    ConflictingOverlay {
        key: String,
        feature: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("feature '{feature}' overlays config key '{key}' identically in '{first}' and '{second}'")]
    DuplicateOverlay {
        key: String,
        feature: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("overlay '{path}' puts a {overlay} where config key '{key}' has a {base} at '{at}'")]
    OverlayTypeConflict {
        key: String,
        feature: String,
        path: PathBuf,
        at: KeyPath,
        base: &'static str,
        overlay: &'static str,
    },

    #[error("invalid feature metadata in '{path}': {source}")]
    InvalidMetadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("'{first}' and '{second}' both define metadata for feature '{feature}'")]
    DuplicateMetadata {
        feature: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("feature '{feature}' has different metadata in '{first}' and '{second}'")]
    ConflictingMetadata {
        feature: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("feature name '{name}' refers to both '{first}' and '{second}'")]
    AmbiguousFeatureName {
        name: String,
        first: String,
        second: String,
    },

    #[error("feature '{feature}' imports '{import}', which is not a feature")]
    UnknownImport { feature: String, import: String },

    #[error("feature '{feature}' imports '{import}'; use the canonical name '{canonical}'")]
    NonCanonicalImport {
        feature: String,
        import: String,
        canonical: String,
    },

    #[error("feature '{feature}' imports '{import}', which has conditions")]
    ConditionalImport { feature: String, import: String },

    #[error("features import each other in a cycle: {}", .cycle.join(" -> "))]
    ImportCycle { cycle: Vec<String> },
}

fn describe(feature: &Option<String>) -> String {
    match feature {
        Some(feature) => format!("the '{feature}' overlay"),
        None => "the base".to_owned(),
    }
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::DuplicateBase { .. } | Diagnostic::DuplicateOverlay { .. } => {
                Severity::Warning
            }
            _ => Severity::Error,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Error
    }
}

/// The build failed; carries every fatal diagnostic found while scanning.
#[derive(Debug, Error)]
#[error("{}", summarize(.diagnostics))]
pub struct BuildError {
    diagnostics: Vec<Diagnostic>,
}

impl BuildError {
    pub(crate) fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    let details: Vec<String> = diagnostics.iter().map(ToString::to_string).collect();
    format!(
        "failed to build options provider with {} error(s): {}",
        diagnostics.len(),
        details.join("; ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity() {
        let warning = Diagnostic::DuplicateBase {
            key: "k".into(),
            first: "a/k.json".into(),
            second: "b/k.json".into(),
        };
        let error = Diagnostic::ConflictingBase {
            key: "k".into(),
            first: "a/k.json".into(),
            second: "b/k.json".into(),
        };
        assert_eq!(warning.severity(), Severity::Warning);
        assert!(error.is_fatal());
    }

    #[test]
    fn test_build_error_lists_every_diagnostic() {
        let err = BuildError::new(vec![
            Diagnostic::DuplicateSource {
                key: "k".into(),
                feature: None,
                first: "k.json".into(),
                second: "k.yaml".into(),
            },
            Diagnostic::DuplicateSource {
                key: "k".into(),
                feature: Some("f".into()),
                first: "f/k.json".into(),
                second: "f/k.toml".into(),
            },
        ]);
        let message = err.to_string();
        assert!(message.contains("2 error(s)"), "{message}");
        assert!(message.contains("both define the base of config key 'k'"), "{message}");
        assert!(message.contains("both define the 'f' overlay of config key 'k'"), "{message}");
        assert_eq!(err.diagnostics().len(), 2);
    }

    #[test]
    fn test_import_cycle_message() {
        let diagnostic = Diagnostic::ImportCycle {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert!(diagnostic.is_fatal());
        assert_eq!(
            diagnostic.to_string(),
            "features import each other in a cycle: a -> b -> a"
        );
    }
}
