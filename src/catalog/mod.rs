//! The catalog of config keys, their bases, and feature overlays.
//!
//! [`CatalogBuilder`] collects loaded files per scanned root and, in
//! [`CatalogBuilder::finish`], reconciles roots into an immutable [`Catalog`].
//! Nothing here touches the file system.

pub mod conditions;
pub mod discovery;
pub mod features;
pub mod metadata;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::diagnostics::Diagnostic;
use crate::value::merge::deep_merge;
use crate::value::ConfigValue;

pub use discovery::{
    classify, Classification, MetadataLocation, SkipReason, SourceLocation, FEATURE_SEPARATOR,
};
pub use features::FeatureIndex;
pub use metadata::FeatureMetadata;

/// Everything known about one config key.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub base: ConfigValue,
    pub overlays: BTreeMap<String, ConfigValue>,
    /// Features defined by the roots this key comes from. Requesting one of
    /// these without an overlay for the key leaves the key unchanged.
    pub features: BTreeSet<String>,
}

/// Immutable mapping from config key to its base and overlays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: BTreeMap<String, CatalogEntry>,
    features: BTreeSet<String>,
    index: FeatureIndex,
}

impl Catalog {
    pub fn get(&self, key: &str) -> Option<&CatalogEntry> {
        self.entries.get(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &CatalogEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Union of the features of every scanned root, sorted.
    pub fn features(&self) -> &BTreeSet<String> {
        &self.features
    }

    /// Name lookup, metadata and imports of every feature.
    pub fn feature_index(&self) -> &FeatureIndex {
        &self.index
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug)]
struct Located<T = ConfigValue> {
    value: T,
    path: PathBuf,
}

/// Files loaded from a single root.
#[derive(Debug, Default)]
struct RootContents {
    features: BTreeSet<String>,
    bases: BTreeMap<String, Located>,
    overlays: BTreeMap<String, BTreeMap<String, Located>>,
    metadata: BTreeMap<String, Located<FeatureMetadata>>,
}

impl RootContents {
    fn keys(&self) -> BTreeSet<&String> {
        self.bases.keys().chain(self.overlays.keys()).collect()
    }
}

/// Accumulates loaded files and reconciles them into a [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    roots: Vec<RootContents>,
}

/// Handle to a root registered with [`CatalogBuilder::add_root`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootId(usize);

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self) -> RootId {
        self.roots.push(RootContents::default());
        RootId(self.roots.len() - 1)
    }

    /// Records a loaded file. `path` is only used for diagnostics.
    ///
    /// A second file for the same key and feature within one root is rejected.
    pub fn insert(
        &mut self,
        root: RootId,
        location: SourceLocation,
        value: ConfigValue,
        path: &Path,
    ) -> Result<(), Diagnostic> {
        let contents = &mut self.roots[root.0];
        let located = Located {
            value,
            path: path.to_path_buf(),
        };

        let slot = match &location.feature {
            None => contents.bases.get(&location.key),
            Some(feature) => contents
                .overlays
                .get(&location.key)
                .and_then(|overlays| overlays.get(feature)),
        };
        if let Some(existing) = slot {
            return Err(Diagnostic::DuplicateSource {
                key: location.key,
                feature: location.feature,
                first: existing.path.clone(),
                second: located.path,
            });
        }

        match location.feature {
            None => {
                contents.bases.insert(location.key, located);
            }
            Some(feature) => {
                contents.features.insert(feature.clone());
                contents
                    .overlays
                    .entry(location.key)
                    .or_default()
                    .insert(feature, located);
            }
        }
        Ok(())
    }

    /// Records a feature's metadata. The feature exists in `root` even if it
    /// has no config files there.
    pub fn insert_metadata(
        &mut self,
        root: RootId,
        feature: String,
        metadata: FeatureMetadata,
        path: &Path,
    ) -> Result<(), Diagnostic> {
        let contents = &mut self.roots[root.0];
        if let Some(existing) = contents.metadata.get(&feature) {
            return Err(Diagnostic::DuplicateMetadata {
                feature,
                first: existing.path.clone(),
                second: path.to_path_buf(),
            });
        }
        contents.features.insert(feature.clone());
        contents.metadata.insert(
            feature,
            Located {
                value: metadata,
                path: path.to_path_buf(),
            },
        );
        Ok(())
    }

    /// Reconciles all roots. Returns the catalog together with every
    /// diagnostic raised; the catalog must not be used if any is fatal.
    pub fn finish(self) -> (Catalog, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let mut features = BTreeSet::new();
        let mut pending: BTreeMap<String, PendingEntry> = BTreeMap::new();
        let mut metadata: BTreeMap<&str, &Located<FeatureMetadata>> = BTreeMap::new();

        for root in &self.roots {
            features.extend(root.features.iter().cloned());

            for (feature, located) in &root.metadata {
                match metadata.get(feature.as_str()).copied() {
                    None => {
                        metadata.insert(feature.as_str(), located);
                    }
                    Some(existing) if existing.value == located.value => {
                        tracing::debug!(%feature, path = ?located.path, "identical feature metadata in another root");
                    }
                    Some(existing) => diagnostics.push(Diagnostic::ConflictingMetadata {
                        feature: feature.clone(),
                        first: existing.path.clone(),
                        second: located.path.clone(),
                    }),
                }
            }

            for key in root.keys() {
                let entry = pending.entry(key.clone()).or_default();
                entry.features.extend(root.features.iter().cloned());

                if let Some(base) = root.bases.get(key) {
                    match entry.base {
                        None => entry.base = Some(base),
                        Some(existing) if existing.value == base.value => {
                            diagnostics.push(Diagnostic::DuplicateBase {
                                key: key.clone(),
                                first: existing.path.clone(),
                                second: base.path.clone(),
                            });
                        }
                        Some(existing) => diagnostics.push(Diagnostic::ConflictingBase {
                            key: key.clone(),
                            first: existing.path.clone(),
                            second: base.path.clone(),
                        }),
                    }
                }

                for (feature, overlay) in root.overlays.get(key).into_iter().flatten() {
                    match entry.overlays.get(feature).copied() {
                        None => {
                            entry.overlays.insert(feature.clone(), overlay);
                        }
                        Some(existing) if existing.value == overlay.value => {
                            diagnostics.push(Diagnostic::DuplicateOverlay {
                                key: key.clone(),
                                feature: feature.clone(),
                                first: existing.path.clone(),
                                second: overlay.path.clone(),
                            });
                        }
                        Some(existing) => diagnostics.push(Diagnostic::ConflictingOverlay {
                            key: key.clone(),
                            feature: feature.clone(),
                            first: existing.path.clone(),
                            second: overlay.path.clone(),
                        }),
                    }
                }
            }
        }

        let mut entries = BTreeMap::new();
        for (key, pending) in pending {
            let base = match pending.base {
                Some(base) => base.value.clone(),
                None => {
                    tracing::debug!(%key, "config key has overlays but no base file, using an empty mapping");
                    ConfigValue::empty_mapping()
                }
            };

            let mut overlays = BTreeMap::new();
            for (feature, overlay) in pending.overlays {
                let mut scratch = base.clone();
                if let Err(conflict) = deep_merge(&mut scratch, &overlay.value) {
                    diagnostics.push(Diagnostic::OverlayTypeConflict {
                        key: key.clone(),
                        feature: feature.clone(),
                        path: overlay.path.clone(),
                        at: conflict.path,
                        base: conflict.base,
                        overlay: conflict.overlay,
                    });
                }
                overlays.insert(feature, overlay.value.clone());
            }

            entries.insert(
                key,
                CatalogEntry {
                    base,
                    overlays,
                    features: pending.features,
                },
            );
        }

        let metadata = metadata
            .into_iter()
            .map(|(feature, located)| (feature.to_owned(), located.value.clone()))
            .collect();
        let (index, index_diagnostics) = FeatureIndex::build(&features, metadata);
        diagnostics.extend(index_diagnostics);

        (
            Catalog {
                entries,
                features,
                index,
            },
            diagnostics,
        )
    }
}

#[derive(Default)]
struct PendingEntry<'a> {
    base: Option<&'a Located>,
    overlays: BTreeMap<String, &'a Located>,
    features: BTreeSet<String>,
}
