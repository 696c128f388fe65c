//! Tests for the persistent stub cache

mod common;

use common::LineParser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stubscope_core::cache::{CacheOutcome, FileKey, StubCache};
use stubscope_core::{StubConfig, StubKind, StubTreeBuilder, codec};
use stubscope_plugin::{DotPathConvention, NamingConvention, SourceParser};
use tempfile::TempDir;

struct Fixture {
    temp: TempDir,
    parser: Arc<LineParser>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
            parser: Arc::new(LineParser::default()),
        }
    }

    fn cache_dir(&self) -> PathBuf {
        self.temp.path().join("stub_cache")
    }

    fn cache(&self, compress: bool) -> StubCache {
        StubCache::new(
            StubConfig::default()
                .with_cache_dir(self.cache_dir())
                .with_compression(compress),
        )
    }

    fn write(&self, name: &str, source: &str) -> PathBuf {
        let path = self.temp.path().join(name);
        std::fs::write(&path, source).unwrap();
        path
    }

    fn parser(&self) -> Arc<dyn SourceParser> {
        self.parser.clone()
    }
}

fn naming() -> Arc<dyn NamingConvention> {
    Arc::new(DotPathConvention)
}

const SOURCE: &str = "package demo\nclass Money\nval zero = Money()\nfun main() { }\n";

fn persisted_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|e| e == "stubs"))
        .collect()
}

#[test]
fn test_build_then_memory_hit() {
    let fx = Fixture::new();
    let cache = fx.cache(true);
    let path = fx.write("Money.kt", SOURCE);

    let first = cache.load_or_build(&path, &fx.parser(), &naming()).unwrap();
    assert_eq!(first.outcome, CacheOutcome::Built);
    assert_eq!(first.file.tree().len(), 4);

    let second = cache.load_or_build(&path, &fx.parser(), &naming()).unwrap();
    assert_eq!(second.outcome, CacheOutcome::Memory);
    assert!(Arc::ptr_eq(&first.file, &second.file));
    assert_eq!(fx.parser.calls(), 1);
}

#[test]
fn test_cache_persistence() {
    let fx = Fixture::new();
    let path = fx.write("Money.kt", SOURCE);

    let built = {
        let cache = fx.cache(true);
        cache.load_or_build(&path, &fx.parser(), &naming()).unwrap()
    };

    // a new cache instance finds the persisted tree without parsing
    let cache = fx.cache(true);
    let loaded = cache.load_or_build(&path, &fx.parser(), &naming()).unwrap();
    assert_eq!(loaded.outcome, CacheOutcome::Disk);
    assert_eq!(loaded.file.tree().as_ref(), built.file.tree().as_ref());
    assert_eq!(fx.parser.calls(), 1);

    // promotion still works on a tree that came from disk
    let zero = loaded
        .file
        .elements()
        .find(|e| e.name() == Some("zero"))
        .unwrap();
    let init = zero.expression_or_absent().unwrap().unwrap();
    assert_eq!(init.text.as_deref(), Some("Money()"));
    assert_eq!(fx.parser.calls(), 2);
}

#[test]
fn test_uncompressed_files_are_raw_stub_streams() {
    let fx = Fixture::new();
    let cache = fx.cache(false);
    let path = fx.write("Money.kt", SOURCE);
    cache.load_or_build(&path, &fx.parser(), &naming()).unwrap();

    let files = persisted_files(&fx.cache_dir());
    assert_eq!(files.len(), 1);
    let bytes = std::fs::read(&files[0]).unwrap();
    assert!(codec::is_stub_stream(&bytes));

    let summary = &cache.scan()[0];
    assert!(!summary.compressed);
    assert_eq!(summary.stub_count, Some(4));
}

#[test]
fn test_corrupt_file_is_rebuilt() {
    let fx = Fixture::new();
    let path = fx.write("Money.kt", SOURCE);
    fx.cache(true)
        .load_or_build(&path, &fx.parser(), &naming())
        .unwrap();

    let key = FileKey::from_path(&path).unwrap();
    let cache = fx.cache(true);
    let cache_path = cache.cache_path(key.hash());
    std::fs::write(&cache_path, b"STUB\xff\xff garbage").unwrap();

    let loaded = cache.load_or_build(&path, &fx.parser(), &naming()).unwrap();
    assert_eq!(loaded.outcome, CacheOutcome::Rebuilt);
    assert_eq!(loaded.file.tree().len(), 4);
    assert_eq!(fx.parser.calls(), 2);

    // the replacement is valid again
    let again = fx.cache(true);
    let reloaded = again.load_or_build(&path, &fx.parser(), &naming()).unwrap();
    assert_eq!(reloaded.outcome, CacheOutcome::Disk);
}

#[test]
fn test_cache_invalidation_on_file_change() {
    let fx = Fixture::new();
    let cache = fx.cache(true);
    let path = fx.write("Money.kt", SOURCE);
    let key1 = FileKey::from_path(&path).unwrap();
    cache.load_or_build(&path, &fx.parser(), &naming()).unwrap();

    std::thread::sleep(std::time::Duration::from_millis(10));
    std::fs::write(&path, "package demo\nclass Money\nclass Rate\n").unwrap();
    let key2 = FileKey::from_path(&path).unwrap();
    assert_ne!(key1.hash(), key2.hash());

    let loaded = cache.load_or_build(&path, &fx.parser(), &naming()).unwrap();
    assert_eq!(loaded.outcome, CacheOutcome::Built);
    let names: Vec<_> = loaded
        .file
        .tree()
        .root()
        .children()
        .filter_map(|c| c.name())
        .collect();
    assert_eq!(names, vec!["Money", "Rate"]);
}

#[test]
fn test_invalidate_drops_memory_and_disk() {
    let fx = Fixture::new();
    let cache = fx.cache(true);
    let path = fx.write("Money.kt", SOURCE);
    cache.load_or_build(&path, &fx.parser(), &naming()).unwrap();
    assert!(cache.get(&path).is_some());

    assert!(cache.invalidate(&path));
    assert!(cache.get(&path).is_none());
    assert!(persisted_files(&fx.cache_dir()).is_empty());
    assert!(!cache.invalidate(&path));
}

#[test]
fn test_edits_leave_one_persisted_tree() {
    let fx = Fixture::new();
    let cache = fx.cache(true);
    let path = fx.write("Money.kt", SOURCE);

    for i in 0..5 {
        // a different size per edit changes the key even within one mtime tick
        let classes: String = (0..=i).map(|n| format!("class C{}\n", n)).collect();
        std::fs::write(&path, format!("package demo\n{}", classes)).unwrap();
        let loaded = cache.load_or_build(&path, &fx.parser(), &naming()).unwrap();
        assert_eq!(loaded.file.tree().len(), i + 2);
        assert_eq!(persisted_files(&fx.cache_dir()).len(), 1, "after edit {}", i);
    }

    assert!(cache.invalidate(&path));
    assert!(persisted_files(&fx.cache_dir()).is_empty());
}

#[test]
fn test_too_deep_tree_is_not_persisted() {
    let fx = Fixture::new();
    let cache = StubCache::new(
        StubConfig::default()
            .with_cache_dir(fx.cache_dir())
            .with_max_depth(4),
    );
    let class_file = fx.write("Deep.class", "\u{cafe}");

    let mut builder = StubTreeBuilder::new(Default::default());
    let mut parent = builder.root();
    for i in 0..4 {
        parent = builder
            .push_child(
                parent,
                stubscope_core::model::ClassStub {
                    name: Some(format!("C{}", i).into()),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    let err = cache.insert_binary(&class_file, builder.finish()).unwrap_err();
    assert!(matches!(err, stubscope_core::StubError::InvalidTree(_)));
    assert!(persisted_files(&fx.cache_dir()).is_empty());
    assert!(cache.load_binary(&class_file).unwrap().is_none());
}

#[test]
fn test_binary_stubs() {
    let fx = Fixture::new();
    let cache = fx.cache(true);
    let class_file = fx.write("Money.class", "\u{cafe}");

    let mut builder = StubTreeBuilder::new(Default::default());
    let root = builder.root();
    builder
        .push_child(
            root,
            stubscope_core::model::PropertyStub {
                name: Some("zero".into()),
                fq_name: Some("zero".into()),
                is_top_level: true,
                has_initializer: true,
                ..Default::default()
            },
        )
        .unwrap();
    let file = cache.insert_binary(&class_file, builder.finish()).unwrap();
    assert!(!file.source_available());

    let zero = file.root_element().children().remove(0);
    assert_eq!(zero.kind(), StubKind::Property);
    assert!(zero.has_initializer());
    assert!(zero.expression_or_absent().unwrap().is_none());

    let reopened = fx.cache(true).load_binary(&class_file).unwrap().unwrap();
    assert!(!reopened.source_available());
    assert_eq!(reopened.tree().as_ref(), file.tree().as_ref());
}

#[test]
fn test_cache_stats() {
    let fx = Fixture::new();
    let cache = fx.cache(true);

    for i in 0..3 {
        let path = fx.write(&format!("File{}.kt", i), &format!("package p{}\nclass C{}\n", i, i));
        cache.load_or_build(&path, &fx.parser(), &naming()).unwrap();
    }

    let stats = cache.stats();
    assert_eq!(stats.persisted_trees, 3);
    assert_eq!(stats.loaded_files, 3);
    assert_eq!(stats.materialized_files, 0);
    assert!(stats.persisted_bytes > 0);
}

#[test]
fn test_cache_clear() {
    let fx = Fixture::new();
    let cache = fx.cache(true);
    let path = fx.write("Money.kt", SOURCE);
    cache.load_or_build(&path, &fx.parser(), &naming()).unwrap();

    cache.clear().unwrap();

    assert!(cache.get(&path).is_none());
    assert!(persisted_files(&fx.cache_dir()).is_empty());
    let loaded = fx
        .cache(true)
        .load_or_build(&path, &fx.parser(), &naming())
        .unwrap();
    assert_eq!(loaded.outcome, CacheOutcome::Built);
}
