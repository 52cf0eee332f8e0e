use crate::diagnostics::BuildError;
use crate::loader::ParseError;
use crate::provider::ResolveError;
use crate::source::SourceError;
use thiserror::Error;

/// Top-level error type for the feature-config library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("config source error: {0}")]
    Source(#[from] SourceError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("options resolution error: {0}")]
    Resolve(#[from] ResolveError),
}
