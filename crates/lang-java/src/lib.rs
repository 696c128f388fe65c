//! Java source parser for the stub builder, backed by tree-sitter-java.

mod lower;
pub mod naming;

pub use naming::JavaNamingConvention;

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use stubscope_plugin::{BoxError, DetailedNode, ParseError, SourceParser};
use tracing::debug;

pub const JAVA_EXTENSIONS: &[&str] = &["java"];

#[derive(Clone)]
pub struct JavaSourceParser {
    language: tree_sitter::Language,
}

impl fmt::Debug for JavaSourceParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JavaSourceParser").finish_non_exhaustive()
    }
}

impl JavaSourceParser {
    pub fn new() -> Result<Self, ParseError> {
        let language: tree_sitter::Language = tree_sitter_java::LANGUAGE.into();
        // surfaces ABI mismatches here instead of on the first parse
        tree_sitter::Parser::new()
            .set_language(&language)
            .map_err(|e| ParseError::Language(e.to_string()))?;
        Ok(Self { language })
    }

    fn tree(&self, source: &str, path: &Path) -> Result<tree_sitter::Tree, ParseError> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| ParseError::Language(e.to_string()))?;
        parser
            .parse(source, None)
            .ok_or_else(|| ParseError::NoTree(path.display().to_string()))
    }
}

impl SourceParser for JavaSourceParser {
    fn name(&self) -> &str {
        "java"
    }

    fn parse(&self, path: &Path) -> Result<Arc<DetailedNode>, BoxError> {
        let source = std::fs::read_to_string(path).map_err(|e| ParseError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        self.parse_source(&source, path)
    }

    fn parse_source(&self, source: &str, path: &Path) -> Result<Arc<DetailedNode>, BoxError> {
        let tree = self.tree(source, path)?;
        let root = tree.root_node();
        if root.has_error() {
            debug!(path = %path.display(), "Java source contains syntax errors");
        }
        Ok(Arc::new(lower::Lowering::new(source).file(root)))
    }
}
