mod common;

use common::LineParser;
use std::path::PathBuf;
use std::sync::Arc;
use stubscope_core::{
    FileIndex, IndexKey, StubCache, StubConfig, discover_sources, index_corpus,
};
use stubscope_plugin::{DotPathConvention, NamingConvention, SourceParser};
use tempfile::TempDir;

fn write(root: &std::path::Path, rel: &str, source: &str) -> PathBuf {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, source).unwrap();
    path
}

#[test]
fn test_index_corpus_and_reuse_cache() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    write(&src, "bank/Account.kt", "package bank\nclass Account\nfun open() { }\n");
    write(&src, "bank/Rates.kt", "package bank\nval base = 0.05\n");
    write(&src, "util/Strings.kt", "package util\nfun trim() = 1\n");
    write(&src, "README.md", "not a source file");

    let parser: Arc<dyn SourceParser> = Arc::new(LineParser::default());
    let naming: Arc<dyn NamingConvention> = Arc::new(DotPathConvention);
    let cache = StubCache::new(StubConfig::default().with_cache_dir(temp.path().join("cache")));

    let files = discover_sources(&src, &["kt"]);
    assert_eq!(files.len(), 3);

    let index = FileIndex::new();
    let report = index_corpus(&files, &parser, &naming, &cache, &index);
    assert_eq!(report.indexed, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(report.cached, 0);
    assert_eq!(report.declarations, 4);

    let bank = index.files_for(&IndexKey::PackageMember("bank".into()));
    assert_eq!(bank.len(), 2);

    // second pass over a fresh cache instance comes from disk
    let cache = StubCache::new(StubConfig::default().with_cache_dir(temp.path().join("cache")));
    let again = FileIndex::new();
    let report = index_corpus(&files, &parser, &naming, &cache, &again);
    assert_eq!(report.cached, 3);
    assert_eq!(again.file_count(), index.file_count());
}

#[test]
fn test_failing_file_is_reported_not_fatal() {
    let temp = TempDir::new().unwrap();
    let good = write(temp.path(), "Good.kt", "package demo\nclass Good\n");
    let missing = temp.path().join("Missing.kt");

    let parser: Arc<dyn SourceParser> = Arc::new(LineParser::default());
    let naming: Arc<dyn NamingConvention> = Arc::new(DotPathConvention);
    let cache = StubCache::new(StubConfig::default().with_cache_dir(temp.path().join("cache")));
    let index = FileIndex::new();

    let report = index_corpus(&[good, missing.clone()], &parser, &naming, &cache, &index);
    assert_eq!(report.indexed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures[0].0, missing);
    assert_eq!(index.file_count(), 1);
}
