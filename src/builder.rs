use std::path::Path;

use crate::catalog::{classify, CatalogBuilder, Classification, FeatureMetadata, RootId};
use crate::diagnostics::{BuildError, Diagnostic, Severity};
use crate::loader::{self, Format};
use crate::value::ConfigValue;
use crate::provider::Provider;
use crate::source::{ConfigSource, DirectorySource, SourceError};

/// Builder for an options [`Provider`].
///
/// Each added root is scanned immediately. Files at the top of a root are
/// base configurations; files in subdirectories are feature overlays named
/// after their directory path:
///
/// ```text
/// configs/
///   myConfig.json                     # base of "myConfig"
///   feature_A/myConfig.json           # overlay "feature_A"
///   feature_B/initial/myConfig.yaml   # overlay "feature_B/initial"
/// ```
///
/// A `_metadata.<ext>` file inside a feature directory declares the
/// feature's aliases, imports and conditions (see
/// [`FeatureMetadata`](crate::catalog::FeatureMetadata)).
///
/// Problems in individual files do not stop the scan. They are collected
/// and reported together by [`build`](Self::build).
///
/// ## Example
///
/// ```no_run
/// use feature_config::Builder;
///
/// let mut builder = Builder::new();
/// builder.add_directory("configs")?;
/// let provider = builder.build()?;
///
/// let json = provider.get_options_json("myConfig", &["feature_A"])?;
/// # Ok::<(), feature_config::Error>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct Builder {
    catalog: CatalogBuilder,
    diagnostics: Vec<Diagnostic>,
    follow_links: bool,
    max_depth: Option<usize>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow symbolic links while scanning directories added after this call.
    pub fn follow_links(&mut self, follow_links: bool) -> &mut Self {
        self.follow_links = follow_links;
        self
    }

    /// Only scan this many directory levels below each root added after this
    /// call. `None` removes the limit.
    pub fn max_depth(&mut self, max_depth: Option<usize>) -> &mut Self {
        self.max_depth = max_depth;
        self
    }

    /// Scans a directory of config files.
    ///
    /// Fails only if `path` is missing or not a directory; anything wrong with
    /// the files inside is reported by [`build`](Self::build).
    pub fn add_directory(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, SourceError> {
        let source = DirectorySource::new(path)?
            .follow_links(self.follow_links)
            .max_depth(self.max_depth);
        Ok(self.add_source(&source))
    }

    /// Scans any [`ConfigSource`], such as an in-memory
    /// [`MemorySource`](crate::source::MemorySource).
    pub fn add_source<S: ConfigSource + ?Sized>(&mut self, source: &S) -> &mut Self {
        let root = self.catalog.add_root();
        tracing::debug!(root = ?source.root(), "scanning config source");

        for entry in source.list() {
            let relative = match entry {
                Ok(relative) => relative,
                Err(e) => {
                    self.report(e.into());
                    continue;
                }
            };
            let display_path = source.root().join(&relative);

            match classify(&relative) {
                Classification::Source(location) => {
                    let Some(value) = self.load(source, &relative, location.format, &display_path) else {
                        continue;
                    };
                    tracing::debug!(
                        path = ?display_path,
                        key = %location.key,
                        feature = ?location.feature,
                        "loaded config file"
                    );
                    if let Err(diagnostic) = self.catalog.insert(root, location, value, &display_path) {
                        self.report(diagnostic);
                    }
                }
                Classification::Metadata(location) => {
                    let Some(value) = self.load(source, &relative, location.format, &display_path) else {
                        continue;
                    };
                    self.add_metadata(root, location.feature, value, &display_path);
                }
                Classification::Skipped(reason) => {
                    tracing::debug!(path = ?display_path, ?reason, "skipping file");
                }
            }
        }
        self
    }

    /// Diagnostics collected so far by [`add_directory`](Self::add_directory)
    /// and [`add_source`](Self::add_source).
    ///
    /// Conflicts between roots are only detected by [`build`](Self::build).
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Reconciles every scanned root into a frozen [`Provider`].
    ///
    /// Fails with every fatal diagnostic if any file could not be read or
    /// parsed, or if roots disagree about a key.
    pub fn build(self) -> Result<Provider, BuildError> {
        let (catalog, reconciled) = self.catalog.finish();
        for diagnostic in reconciled.iter().filter(|d| !d.is_fatal()) {
            tracing::warn!(%diagnostic, "config build warning");
        }

        let fatal: Vec<Diagnostic> = self
            .diagnostics
            .into_iter()
            .chain(reconciled)
            .filter(Diagnostic::is_fatal)
            .collect();
        if !fatal.is_empty() {
            return Err(BuildError::new(fatal));
        }

        tracing::debug!(
            keys = catalog.keys().count(),
            features = catalog.features().len(),
            "built options provider"
        );
        Ok(Provider::new(catalog))
    }

    fn load<S: ConfigSource + ?Sized>(
        &mut self,
        source: &S,
        relative: &Path,
        format: Format,
        display_path: &Path,
    ) -> Option<ConfigValue> {
        let loaded = source
            .read(relative)
            .map_err(Diagnostic::from)
            .and_then(|bytes| Ok(loader::load_bytes(format, display_path, &bytes)?));
        match loaded {
            Ok(value) => Some(value),
            Err(diagnostic) => {
                self.report(diagnostic);
                None
            }
        }
    }

    fn add_metadata(&mut self, root: RootId, feature: String, value: ConfigValue, path: &Path) {
        let metadata = match FeatureMetadata::from_value(value) {
            Ok(metadata) => metadata,
            Err(source) => {
                self.report(Diagnostic::InvalidMetadata {
                    path: path.to_path_buf(),
                    source,
                });
                return;
            }
        };
        tracing::debug!(path = ?path, %feature, "loaded feature metadata");
        if let Err(diagnostic) = self.catalog.insert_metadata(root, feature, metadata, path) {
            self.report(diagnostic);
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Warning => tracing::warn!(%diagnostic, "config build warning"),
            Severity::Error => tracing::debug!(%diagnostic, "config build error"),
        }
        self.diagnostics.push(diagnostic);
    }
}
