use crate::syntax::DetailedNode;
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Error type for plugin operations
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("language setup failed: {0}")]
    Language(String),
    #[error("parser produced no tree for {0}")]
    NoTree(String),
}

/// Produces the detailed syntax tree of a source file on demand.
///
/// Implementations must be deterministic for unchanged input: the lazy layer
/// binds the returned tree to an existing stub tree by declaration order.
pub trait SourceParser: Send + Sync + Debug {
    /// Parser name (for logging/debugging)
    fn name(&self) -> &str;

    /// Parse the whole file at `path`.
    fn parse(&self, path: &Path) -> Result<Arc<DetailedNode>, BoxError>;

    /// Parse already-loaded source text. `path` is informational.
    fn parse_source(&self, source: &str, path: &Path) -> Result<Arc<DetailedNode>, BoxError>;
}
