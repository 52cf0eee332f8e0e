//! The frozen, queryable result of a build.

mod error;
mod preferences;

pub use error::ResolveError;
pub use preferences::GetOptionsPreferences;

use std::collections::BTreeSet;

use crate::catalog::{Catalog, CatalogEntry, FeatureMetadata};
use crate::value::json::to_canonical_json;
use crate::value::merge::deep_merge;
use crate::value::{unescape_token, ConfigValue, Mapping};

/// Resolves options for a config key and an ordered list of features.
///
/// A provider never changes after [`Builder::build`](crate::Builder::build),
/// so it can be shared freely between threads. Every query is a pure function
/// of the catalog and its arguments.
#[derive(Debug, Clone)]
pub struct Provider {
    catalog: Catalog,
}

impl Provider {
    pub(crate) fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Every canonical feature name across all keys, deduplicated and sorted.
    pub fn features(&self) -> Vec<String> {
        self.catalog.features().iter().cloned().collect()
    }

    /// Whether `name` is a feature's canonical name or alias, in any case.
    pub fn has_feature(&self, name: &str) -> bool {
        self.canonical_feature_name(name).is_some()
    }

    /// Maps a canonical name or alias, in any case, to the canonical name.
    pub fn canonical_feature_name(&self, name: &str) -> Option<&str> {
        self.catalog.feature_index().canonical_name(name)
    }

    pub fn feature_metadata(&self, name: &str) -> Option<&FeatureMetadata> {
        let feature = self.canonical_feature_name(name)?;
        self.catalog.feature_index().metadata(feature)
    }

    /// Canonical names of the requested features that apply under the
    /// constraints in `preferences`, in request order.
    pub fn get_filtered_features<S: AsRef<str>>(
        &self,
        features: &[S],
        preferences: &GetOptionsPreferences,
    ) -> Result<Vec<String>, ResolveError> {
        let mut filtered = Vec::new();
        for name in names(features) {
            let feature = self
                .lookup(name, preferences)
                .ok_or_else(|| ResolveError::UndefinedFeature(name.to_owned()))?;
            if self.is_enabled(feature, preferences) {
                filtered.push(feature.to_owned());
            }
        }
        Ok(filtered)
    }

    /// Every config key, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.catalog.keys().map(str::to_owned).collect()
    }

    /// Features that may be requested for `key`, sorted.
    pub fn features_for(&self, key: &str) -> Result<Vec<String>, ResolveError> {
        Ok(self.entry(key)?.features.iter().cloned().collect())
    }

    /// Merges the overlays of `features` onto the base of `key`, in order.
    ///
    /// Later features win over earlier ones. A feature that is defined for the
    /// key's namespace but has no overlay for this key changes nothing.
    /// Names may be aliases or differ in case. A feature's imports are
    /// applied just before the feature itself.
    pub fn get_options<S: AsRef<str>>(
        &self,
        key: &str,
        features: &[S],
    ) -> Result<ConfigValue, ResolveError> {
        self.resolve(key, features, &GetOptionsPreferences::default())
    }

    /// Like [`get_options`](Self::get_options), but drops features whose
    /// conditions fail the constraints and applies any overrides last.
    pub fn get_options_with_preferences<S: AsRef<str>>(
        &self,
        key: &str,
        features: &[S],
        preferences: &GetOptionsPreferences,
    ) -> Result<ConfigValue, ResolveError> {
        self.resolve(key, features, preferences)
    }

    /// [`get_options`](Self::get_options) rendered as canonical JSON.
    pub fn get_options_json<S: AsRef<str>>(
        &self,
        key: &str,
        features: &[S],
    ) -> Result<String, ResolveError> {
        render(&self.get_options(key, features)?)
    }

    pub fn get_options_json_with_preferences<S: AsRef<str>>(
        &self,
        key: &str,
        features: &[S],
        preferences: &GetOptionsPreferences,
    ) -> Result<String, ResolveError> {
        render(&self.get_options_with_preferences(key, features, preferences)?)
    }

    /// Resolves every key at once, as a mapping from key to options.
    ///
    /// Each key only applies the requested features of its own namespace. A
    /// feature unknown to every key is an error.
    pub fn get_all_options<S: AsRef<str>>(&self, features: &[S]) -> Result<ConfigValue, ResolveError> {
        let requested = self.get_filtered_features(features, &GetOptionsPreferences::default())?;

        let mut all = Mapping::new();
        for (key, entry) in self.catalog.entries() {
            let applicable = requested
                .iter()
                .filter(|feature| entry.features.contains(feature.as_str()))
                .flat_map(|feature| self.expand(feature));
            all.insert(key.to_owned(), merge_features(key, entry, applicable)?);
        }
        Ok(ConfigValue::Mapping(all))
    }

    pub fn get_all_options_json<S: AsRef<str>>(&self, features: &[S]) -> Result<String, ResolveError> {
        render(&self.get_all_options(features)?)
    }

    /// Names that could appear below a JSON pointer, across the base and
    /// every overlay.
    ///
    /// `""` lists the config keys. `/myConfig/server` lists the mapping keys
    /// found at `server` in any file for `myConfig`. Sequences, scalars and
    /// unknown paths have no names.
    pub fn possible_keys(&self, pointer: &str) -> Vec<String> {
        if pointer.is_empty() {
            return self.keys();
        }
        let Some(rest) = pointer.strip_prefix('/') else {
            return Vec::new();
        };
        let (key_token, inner) = match rest.find('/') {
            Some(index) => rest.split_at(index),
            None => (rest, ""),
        };
        let Some(entry) = self.catalog.get(&unescape_token(key_token)) else {
            return Vec::new();
        };

        let mut found = BTreeSet::new();
        for value in std::iter::once(&entry.base).chain(entry.overlays.values()) {
            if let Some(ConfigValue::Mapping(map)) = value.pointer(inner) {
                found.extend(map.keys().cloned());
            }
        }
        found.into_iter().collect()
    }

    fn entry(&self, key: &str) -> Result<&CatalogEntry, ResolveError> {
        self.catalog
            .get(key)
            .ok_or_else(|| ResolveError::KeyNotFound(key.to_owned()))
    }

    fn lookup(&self, name: &str, preferences: &GetOptionsPreferences) -> Option<&str> {
        if preferences.skip_feature_name_conversion {
            self.catalog.features().get(name).map(String::as_str)
        } else {
            self.canonical_feature_name(name)
        }
    }

    fn is_enabled(&self, feature: &str, preferences: &GetOptionsPreferences) -> bool {
        let conditions = self.catalog.feature_index().conditions(feature);
        match (&preferences.constraints, conditions) {
            (Some(constraints), Some(conditions)) => {
                let enabled = conditions.evaluate(constraints);
                if !enabled {
                    tracing::trace!(%feature, "feature conditions not met, skipping");
                }
                enabled
            }
            _ => true,
        }
    }

    fn expand(&self, feature: &str) -> impl Iterator<Item = &str> {
        self.catalog
            .feature_index()
            .expansion(feature)
            .iter()
            .map(String::as_str)
    }

    fn resolve<S: AsRef<str>>(
        &self,
        key: &str,
        features: &[S],
        preferences: &GetOptionsPreferences,
    ) -> Result<ConfigValue, ResolveError> {
        tracing::trace!(%key, features = features.len(), "resolving options");
        let entry = self.entry(key)?;

        let mut applied = Vec::new();
        for name in names(features) {
            let feature = self
                .lookup(name, preferences)
                .filter(|feature| entry.features.contains(*feature))
                .ok_or_else(|| ResolveError::UnknownFeature {
                    key: key.to_owned(),
                    feature: name.to_owned(),
                })?;
            if self.is_enabled(feature, preferences) {
                applied.extend(self.expand(feature));
            }
        }

        let mut options = merge_features(key, entry, applied)?;
        if let Some(overrides) = &preferences.overrides {
            deep_merge(&mut options, overrides).map_err(|conflict| {
                ResolveError::OverrideConflict {
                    key: key.to_owned(),
                    path: conflict.path,
                    base: conflict.base,
                    overlay: conflict.overlay,
                }
            })?;
        }
        Ok(options)
    }
}

fn names<S: AsRef<str>>(features: &[S]) -> impl Iterator<Item = &str> + '_ {
    features.iter().map(|feature| feature.as_ref())
}

fn merge_features<'a>(
    key: &str,
    entry: &CatalogEntry,
    features: impl IntoIterator<Item = &'a str>,
) -> Result<ConfigValue, ResolveError> {
    let mut options = entry.base.clone();
    for feature in features {
        let Some(overlay) = entry.overlays.get(feature) else {
            continue;
        };
        deep_merge(&mut options, overlay).map_err(|conflict| ResolveError::TypeConflict {
            key: key.to_owned(),
            feature: feature.to_owned(),
            path: conflict.path,
            base: conflict.base,
            overlay: conflict.overlay,
        })?;
    }
    Ok(options)
}

fn render(options: &ConfigValue) -> Result<String, ResolveError> {
    to_canonical_json(options).map_err(ResolveError::Serialize)
}
