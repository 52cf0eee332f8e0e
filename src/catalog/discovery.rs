//! Maps a file's path inside a root to the config key and feature it defines.
//!
//! ```text
//! <root>/myConfig.json                        base of "myConfig"
//! <root>/feature_A/myConfig.yaml              overlay "feature_A"
//! <root>/feature_B/initial/myConfig.json5     overlay "feature_B/initial"
//! <root>/feature_A/_metadata.yaml             metadata of "feature_A"
//! ```

use std::path::{Component, Path};

use super::metadata::METADATA_STEM;
use crate::loader::Format;

/// Joins directory segments into hierarchical feature names.
pub const FEATURE_SEPARATOR: &str = "/";

/// What a config file contributes to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub key: String,
    /// `None` for a base file at the top of the root.
    pub feature: Option<String>,
    pub format: Format,
}

/// A feature's metadata file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataLocation {
    pub feature: String,
    pub format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A path segment starts with `.`.
    Hidden,
    UnsupportedExtension,
    /// A path segment is not valid UTF-8.
    NonUtf8Name,
    /// The path leaves the root or is empty.
    NotRelative,
    /// A metadata file at the top of a root, which belongs to no feature.
    RootMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Source(SourceLocation),
    Metadata(MetadataLocation),
    Skipped(SkipReason),
}

/// Classifies a path relative to a scanned root. Pure; no I/O.
pub fn classify(relative_path: &Path) -> Classification {
    let mut segments = Vec::new();
    for component in relative_path.components() {
        match component {
            Component::Normal(segment) => match segment.to_str() {
                Some(segment) if segment.starts_with('.') => {
                    return Classification::Skipped(SkipReason::Hidden)
                }
                Some(segment) => segments.push(segment),
                None => return Classification::Skipped(SkipReason::NonUtf8Name),
            },
            Component::CurDir => {}
            _ => return Classification::Skipped(SkipReason::NotRelative),
        }
    }

    let Some(file_name) = segments.pop() else {
        return Classification::Skipped(SkipReason::NotRelative);
    };
    let Some((key, extension)) = file_name.rsplit_once('.') else {
        return Classification::Skipped(SkipReason::UnsupportedExtension);
    };
    let Some(format) = Format::from_extension(extension) else {
        return Classification::Skipped(SkipReason::UnsupportedExtension);
    };

    let feature = if segments.is_empty() {
        None
    } else {
        Some(segments.join(FEATURE_SEPARATOR))
    };
    if key == METADATA_STEM {
        return match feature {
            Some(feature) => Classification::Metadata(MetadataLocation { feature, format }),
            None => Classification::Skipped(SkipReason::RootMetadata),
        };
    }
    Classification::Source(SourceLocation {
        key: key.to_owned(),
        feature,
        format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn source(key: &str, feature: Option<&str>, format: Format) -> Classification {
        Classification::Source(SourceLocation {
            key: key.to_owned(),
            feature: feature.map(str::to_owned),
            format,
        })
    }

    #[test]
    fn test_base_file() {
        assert_eq!(
            classify(Path::new("myConfig.json")),
            source("myConfig", None, Format::Json)
        );
    }

    #[test]
    fn test_overlay_file() {
        assert_eq!(
            classify(Path::new("feature_A/myConfig.yaml")),
            source("myConfig", Some("feature_A"), Format::Yaml)
        );
    }

    #[test]
    fn test_nested_overlay_uses_slash_separator() {
        let path: PathBuf = ["feature_B", "initial", "myConfig.json5"].iter().collect();
        assert_eq!(
            classify(&path),
            source("myConfig", Some("feature_B/initial"), Format::Json5)
        );
    }

    #[test]
    fn test_key_keeps_inner_dots() {
        assert_eq!(
            classify(Path::new("app.settings.toml")),
            source("app.settings", None, Format::Toml)
        );
    }

    #[test]
    fn test_skipped_files() {
        assert_eq!(
            classify(Path::new("README.md")),
            Classification::Skipped(SkipReason::UnsupportedExtension)
        );
        assert_eq!(
            classify(Path::new("Makefile")),
            Classification::Skipped(SkipReason::UnsupportedExtension)
        );
        assert_eq!(
            classify(Path::new(".hidden/myConfig.json")),
            Classification::Skipped(SkipReason::Hidden)
        );
        assert_eq!(
            classify(Path::new(".json")),
            Classification::Skipped(SkipReason::Hidden)
        );
        assert_eq!(
            classify(Path::new("../myConfig.json")),
            Classification::Skipped(SkipReason::NotRelative)
        );
        assert_eq!(
            classify(Path::new("")),
            Classification::Skipped(SkipReason::NotRelative)
        );
    }

    #[test]
    fn test_metadata_file() {
        let path: PathBuf = ["feature_B", "initial", "_metadata.yaml"].iter().collect();
        assert_eq!(
            classify(&path),
            Classification::Metadata(MetadataLocation {
                feature: "feature_B/initial".to_owned(),
                format: Format::Yaml,
            })
        );
        assert_eq!(
            classify(Path::new("_metadata.json")),
            Classification::Skipped(SkipReason::RootMetadata)
        );
    }
}
