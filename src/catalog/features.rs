//! Feature names: case-insensitive lookup, aliases, and import expansion.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use super::conditions::Condition;
use super::metadata::FeatureMetadata;
use crate::diagnostics::Diagnostic;

/// Resolves requested names to canonical feature names and canonical names
/// to the ordered list of features they apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureIndex {
    metadata: BTreeMap<String, FeatureMetadata>,
    /// Case-folded canonical name or alias to canonical name.
    names: BTreeMap<String, String>,
    /// Imports first (recursively), the feature itself last.
    expansions: BTreeMap<String, Vec<String>>,
}

fn fold(name: &str) -> String {
    name.to_lowercase()
}

impl FeatureIndex {
    pub(crate) fn build(
        features: &BTreeSet<String>,
        metadata: BTreeMap<String, FeatureMetadata>,
    ) -> (Self, Vec<Diagnostic>) {
        let mut index = FeatureIndex {
            metadata,
            ..Self::default()
        };
        let mut diagnostics = Vec::new();

        for feature in features {
            index.add_name(feature, feature, &mut diagnostics);
        }
        let aliases: Vec<(String, String)> = index
            .metadata
            .iter()
            .flat_map(|(feature, metadata)| {
                metadata
                    .aliases
                    .iter()
                    .map(move |alias| (alias.clone(), feature.clone()))
            })
            .collect();
        for (alias, feature) in &aliases {
            index.add_name(alias, feature, &mut diagnostics);
        }

        for (feature, metadata) in &index.metadata {
            diagnostics.extend(
                metadata
                    .imports
                    .iter()
                    .filter_map(|import| index.check_import(feature, import)),
            );
        }

        let mut stack = Vec::new();
        for feature in features {
            index.expand(feature, &mut stack, &mut diagnostics);
        }
        (index, diagnostics)
    }

    /// The canonical name for a canonical name or alias, in any case.
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        self.names.get(&fold(name)).map(String::as_str)
    }

    pub fn metadata(&self, feature: &str) -> Option<&FeatureMetadata> {
        self.metadata.get(feature)
    }

    pub fn conditions(&self, feature: &str) -> Option<&Condition> {
        self.metadata(feature)?.conditions.as_ref()
    }

    /// Features applied when `feature` is requested, in merge order.
    pub fn expansion(&self, feature: &str) -> &[String] {
        self.expansions
            .get(feature)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn is_canonical(&self, name: &str) -> bool {
        self.canonical_name(name) == Some(name)
    }

    fn add_name(&mut self, name: &str, feature: &str, diagnostics: &mut Vec<Diagnostic>) {
        match self.names.entry(fold(name)) {
            Entry::Vacant(slot) => {
                slot.insert(feature.to_owned());
            }
            Entry::Occupied(slot) if slot.get() == feature => {}
            Entry::Occupied(slot) => diagnostics.push(Diagnostic::AmbiguousFeatureName {
                name: name.to_owned(),
                first: slot.get().clone(),
                second: feature.to_owned(),
            }),
        }
    }

    fn check_import(&self, feature: &str, import: &str) -> Option<Diagnostic> {
        match self.canonical_name(import) {
            None => Some(Diagnostic::UnknownImport {
                feature: feature.to_owned(),
                import: import.to_owned(),
            }),
            Some(canonical) if canonical != import => Some(Diagnostic::NonCanonicalImport {
                feature: feature.to_owned(),
                import: import.to_owned(),
                canonical: canonical.to_owned(),
            }),
            Some(_) if self.conditions(import).is_some() => Some(Diagnostic::ConditionalImport {
                feature: feature.to_owned(),
                import: import.to_owned(),
            }),
            Some(_) => None,
        }
    }

    fn expand(&mut self, feature: &str, stack: &mut Vec<String>, diagnostics: &mut Vec<Diagnostic>) {
        if self.expansions.contains_key(feature) {
            return;
        }
        if let Some(start) = stack.iter().position(|f| f == feature) {
            let mut cycle = stack[start..].to_vec();
            cycle.push(feature.to_owned());
            diagnostics.push(Diagnostic::ImportCycle { cycle });
            return;
        }

        let imports = self
            .metadata(feature)
            .map(|metadata| metadata.imports.clone())
            .unwrap_or_default();
        stack.push(feature.to_owned());
        let mut expansion = Vec::new();
        for import in &imports {
            if !self.is_canonical(import) {
                continue;
            }
            self.expand(import, stack, diagnostics);
            expansion.extend(self.expansion(import).iter().cloned());
        }
        stack.pop();

        expansion.push(feature.to_owned());
        self.expansions.insert(feature.to_owned(), expansion);
    }
}
