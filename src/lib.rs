//! Resolve configuration options from a directory of base files and
//! feature overlays.
//!
//! A [`Builder`] scans one or more roots and freezes them into a
//! [`Provider`]. The provider merges a key's base with the overlays of the
//! requested features, in request order, and renders the result as
//! canonical JSON.

pub mod builder;
pub mod catalog;
pub mod diagnostics;
mod error;
pub mod loader;
pub mod provider;
pub mod source;
pub mod value;

pub use builder::Builder;
pub use catalog::FeatureMetadata;
pub use diagnostics::{BuildError, Diagnostic, Severity};
pub use error::Error;
pub use loader::{Format, ParseError};
pub use provider::{GetOptionsPreferences, Provider, ResolveError};
pub use source::{ConfigSource, DirectorySource, MemorySource, SourceError};
pub use value::ConfigValue;
