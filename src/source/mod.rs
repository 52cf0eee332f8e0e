//! Places config files are discovered from.
//!
//! A [`ConfigSource`] lists files relative to its root and reads them on
//! demand. [`DirectorySource`] walks the file system; [`MemorySource`] holds
//! files in memory and follows the same discovery rules.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error("config directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("config path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to walk config directory: {0}")]
    Walk(#[from] walkdir::Error),
}

pub trait ConfigSource: Send + Sync + fmt::Debug {
    /// Root the listed paths are relative to, used to label diagnostics.
    fn root(&self) -> &Path;

    /// Every file below the root, relative to it, in sorted order.
    ///
    /// Entries that cannot be listed are reported individually so the rest of
    /// the tree can still be scanned.
    fn list(&self) -> Vec<Result<PathBuf, SourceError>>;

    fn read(&self, relative_path: &Path) -> Result<Vec<u8>, SourceError>;
}

/// Files under a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    follow_links: bool,
    max_depth: Option<usize>,
}

impl DirectorySource {
    /// Checks that `root` exists and is a directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SourceError> {
        let root = root.as_ref();
        let metadata = match std::fs::metadata(root) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SourceError::DirectoryNotFound(root.to_path_buf()))
            }
            Err(e) => {
                return Err(SourceError::Read {
                    path: root.to_path_buf(),
                    source: e,
                })
            }
        };
        if !metadata.is_dir() {
            return Err(SourceError::NotADirectory(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
            follow_links: false,
            max_depth: None,
        })
    }

    pub fn follow_links(mut self, follow_links: bool) -> Self {
        self.follow_links = follow_links;
        self
    }

    /// Limits how many directory levels below the root are scanned.
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl ConfigSource for DirectorySource {
    fn root(&self) -> &Path {
        &self.root
    }

    fn list(&self) -> Vec<Result<PathBuf, SourceError>> {
        let mut walker = WalkDir::new(&self.root)
            .follow_links(self.follow_links)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()));
        if let Some(depth) = self.max_depth {
            // Files directly in the root sit at walkdir depth 1.
            walker = walker.max_depth(depth.saturating_add(1));
        }

        walker
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
            .filter_map(|entry| match entry {
                Ok(entry) if entry.file_type().is_dir() => None,
                Ok(entry) => entry
                    .path()
                    .strip_prefix(&self.root)
                    .ok()
                    .map(|relative| Ok(relative.to_path_buf())),
                Err(e) => Some(Err(e.into())),
            })
            .collect()
    }

    fn read(&self, relative_path: &Path) -> Result<Vec<u8>, SourceError> {
        let path = self.root.join(relative_path);
        std::fs::read(&path).map_err(|source| SourceError::Read { path, source })
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}

/// Files held in memory, keyed by their path relative to a virtual root.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    root: PathBuf,
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: BTreeMap::new(),
        }
    }

    pub fn with_file(mut self, relative_path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(relative_path, contents);
        self
    }

    pub fn insert(&mut self, relative_path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.files.insert(relative_path.into(), contents.into());
    }
}

impl ConfigSource for MemorySource {
    fn root(&self) -> &Path {
        &self.root
    }

    fn list(&self) -> Vec<Result<PathBuf, SourceError>> {
        self.files.keys().cloned().map(Ok).collect()
    }

    fn read(&self, relative_path: &Path) -> Result<Vec<u8>, SourceError> {
        self.files
            .get(relative_path)
            .cloned()
            .ok_or_else(|| SourceError::Read {
                path: self.root.join(relative_path),
                source: std::io::ErrorKind::NotFound.into(),
            })
    }
}
