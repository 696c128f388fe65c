//! Stub building and indexing for a whole source tree.

use crate::cache::{CacheOutcome, StubCache};
use crate::index::FileIndex;
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stubscope_plugin::{NamingConvention, SourceParser};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusReport {
    /// Files whose stubs made it into the index.
    pub indexed: usize,
    /// Files served from the memory or disk cache.
    pub cached: usize,
    /// Files whose persisted stubs were corrupt and got rebuilt.
    pub rebuilt: usize,
    pub failed: usize,
    /// Declaration occurrences reported to the index.
    pub declarations: usize,
    /// Malformed-input diagnostics across freshly built files.
    pub diagnostics: usize,
    pub failures: Vec<(PathBuf, String)>,
}

/// Files under `root` with one of `extensions`, honouring ignore files.
pub fn discover_sources(root: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkBuilder::new(root)
        .build()
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();
            let ext = path.extension()?.to_str()?;
            if path.is_file() && extensions.contains(&ext) {
                return Some(path.to_path_buf());
            }
            None
        })
        .collect();
    files.sort();
    files
}

enum FileResult {
    Indexed {
        outcome: CacheOutcome,
        declarations: usize,
        diagnostics: usize,
    },
    Failed(PathBuf, String),
}

/// Load or build the stubs of every file in parallel and feed them to
/// `index`. A failing file is logged and counted, never fatal.
pub fn index_corpus(
    files: &[PathBuf],
    parser: &Arc<dyn SourceParser>,
    naming: &Arc<dyn NamingConvention>,
    cache: &StubCache,
    index: &FileIndex,
) -> CorpusReport {
    let results: Vec<FileResult> = files
        .par_iter()
        .map(|path| match cache.load_or_build(path, parser, naming) {
            Ok(loaded) => FileResult::Indexed {
                outcome: loaded.outcome,
                declarations: index.index_file(path, loaded.file.tree()),
                diagnostics: loaded.diagnostics,
            },
            Err(e) => {
                warn!(path = %path.display(), "Failed to build stubs: {}", e);
                FileResult::Failed(path.clone(), e.to_string())
            }
        })
        .collect();

    let mut report = CorpusReport::default();
    for result in results {
        match result {
            FileResult::Indexed {
                outcome,
                declarations,
                diagnostics,
            } => {
                report.indexed += 1;
                report.declarations += declarations;
                report.diagnostics += diagnostics;
                match outcome {
                    CacheOutcome::Memory | CacheOutcome::Disk => report.cached += 1,
                    CacheOutcome::Rebuilt => report.rebuilt += 1,
                    CacheOutcome::Built => {}
                }
            }
            FileResult::Failed(path, reason) => {
                report.failed += 1;
                report.failures.push((path, reason));
            }
        }
    }

    info!(
        indexed = report.indexed,
        cached = report.cached,
        rebuilt = report.rebuilt,
        failed = report.failed,
        "Corpus indexing finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_filters_by_extension() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("src/nested")).unwrap();
        std::fs::write(temp.path().join("src/A.java"), "class A {}").unwrap();
        std::fs::write(temp.path().join("src/nested/B.java"), "class B {}").unwrap();
        std::fs::write(temp.path().join("src/notes.txt"), "hi").unwrap();

        let files = discover_sources(temp.path(), &["java"]);
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "java"));
    }
}
