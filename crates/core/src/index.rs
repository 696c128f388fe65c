//! Extraction of searchable facts from stub trees.
//!
//! Indexing only reads stubs. It never touches the detailed tree, so it can
//! run over deserialized and compiled stubs alike.

use crate::model::{Name, StubKind, StubRef, StubTree};
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// One searchable fact about a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexKey {
    ClassShortName(Name),
    ClassFqName(Name),
    /// Short name of a supertype the declaration extends.
    SuperName(Name),
    ObjectShortName(Name),
    ObjectFqName(Name),
    FunctionShortName(Name),
    TopLevelFunctionFqName(Name),
    PropertyShortName(Name),
    TopLevelPropertyFqName(Name),
    /// Package that holds a top-level declaration.
    PackageMember(Name),
}

impl IndexKey {
    pub fn category(&self) -> &'static str {
        match self {
            IndexKey::ClassShortName(_) => "class",
            IndexKey::ClassFqName(_) => "class_fq",
            IndexKey::SuperName(_) => "super",
            IndexKey::ObjectShortName(_) => "object",
            IndexKey::ObjectFqName(_) => "object_fq",
            IndexKey::FunctionShortName(_) => "function",
            IndexKey::TopLevelFunctionFqName(_) => "top_level_function",
            IndexKey::PropertyShortName(_) => "property",
            IndexKey::TopLevelPropertyFqName(_) => "top_level_property",
            IndexKey::PackageMember(_) => "package",
        }
    }

    pub fn value(&self) -> &Name {
        match self {
            IndexKey::ClassShortName(n)
            | IndexKey::ClassFqName(n)
            | IndexKey::SuperName(n)
            | IndexKey::ObjectShortName(n)
            | IndexKey::ObjectFqName(n)
            | IndexKey::FunctionShortName(n)
            | IndexKey::TopLevelFunctionFqName(n)
            | IndexKey::PropertyShortName(n)
            | IndexKey::TopLevelPropertyFqName(n)
            | IndexKey::PackageMember(n) => n,
        }
    }
}

impl FromStr for IndexKey {
    type Err = String;

    /// Parses the `category:value` form produced by `Display`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (category, value) = s
            .split_once(':')
            .ok_or_else(|| format!("expected category:value, got {s:?}"))?;
        let value = Name::new(value);
        let key = match category {
            "class" => IndexKey::ClassShortName(value),
            "class_fq" => IndexKey::ClassFqName(value),
            "super" => IndexKey::SuperName(value),
            "object" => IndexKey::ObjectShortName(value),
            "object_fq" => IndexKey::ObjectFqName(value),
            "function" => IndexKey::FunctionShortName(value),
            "top_level_function" => IndexKey::TopLevelFunctionFqName(value),
            "property" => IndexKey::PropertyShortName(value),
            "top_level_property" => IndexKey::TopLevelPropertyFqName(value),
            "package" => IndexKey::PackageMember(value),
            other => return Err(format!("unknown index category {other:?}")),
        };
        Ok(key)
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category(), self.value())
    }
}

/// Receiver of index facts.
pub trait IndexSink {
    /// Called exactly once for every declaration stub, with all of its keys.
    fn occurrence(&mut self, owner: StubRef<'_>, keys: &[IndexKey]);
}

/// Keys contributed by one stub. Empty for files and delegates.
pub fn keys_for(stub: StubRef<'_>) -> Vec<IndexKey> {
    let mut keys = Vec::new();
    let name = stub.data().name().cloned();
    let fq_name = stub.data().qualified_name().cloned();

    match stub.kind() {
        StubKind::Class | StubKind::EnumEntry => {
            keys.extend(name.map(IndexKey::ClassShortName));
            keys.extend(fq_name.map(IndexKey::ClassFqName));
        }
        StubKind::Object => {
            keys.extend(name.map(IndexKey::ObjectShortName));
            keys.extend(fq_name.map(IndexKey::ObjectFqName));
        }
        StubKind::Function => {
            keys.extend(name.map(IndexKey::FunctionShortName));
            if stub.is_top_level() {
                keys.extend(fq_name.map(IndexKey::TopLevelFunctionFqName));
            }
        }
        StubKind::Property => {
            keys.extend(name.map(IndexKey::PropertyShortName));
            if stub.is_top_level() {
                keys.extend(fq_name.map(IndexKey::TopLevelPropertyFqName));
            }
        }
        StubKind::File | StubKind::PropertyDelegate => return keys,
    }

    keys.extend(stub.super_names().iter().cloned().map(IndexKey::SuperName));
    if stub.is_top_level() {
        if let Some(package) = stub.package() {
            keys.push(IndexKey::PackageMember(Name::new(package)));
        }
    }
    keys
}

/// Feed every declaration of `tree` to `sink`. Returns the number of
/// occurrences reported.
pub fn index_stub_tree(tree: &StubTree, sink: &mut dyn IndexSink) -> usize {
    let mut reported = 0;
    for stub in tree.iter() {
        if !stub.kind().is_declaration() {
            continue;
        }
        let keys = keys_for(stub);
        sink.occurrence(stub, &keys);
        reported += 1;
    }
    reported
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub kind: StubKind,
    pub name: Option<Name>,
    pub keys: Vec<IndexKey>,
}

/// Sink that simply records what it is told.
#[derive(Debug, Default)]
pub struct FactCollector {
    pub occurrences: Vec<Occurrence>,
}

impl FactCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &IndexKey> {
        self.occurrences.iter().flat_map(|o| o.keys.iter())
    }

    pub fn contains(&self, key: &IndexKey) -> bool {
        self.keys().any(|k| k == key)
    }
}

impl IndexSink for FactCollector {
    fn occurrence(&mut self, owner: StubRef<'_>, keys: &[IndexKey]) {
        self.occurrences.push(Occurrence {
            kind: owner.kind(),
            name: owner.data().name().cloned(),
            keys: keys.to_vec(),
        });
    }
}

/// Concurrent reverse index from key to the files that declare it.
#[derive(Debug, Default)]
pub struct FileIndex {
    entries: DashMap<IndexKey, BTreeSet<Arc<Path>>>,
    files: DashMap<Arc<Path>, Vec<IndexKey>>,
}

impl FileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything recorded for `path` with the facts of `tree`.
    pub fn index_file(&self, path: &Path, tree: &StubTree) -> usize {
        self.remove_file(path);
        let mut sink = self.sink_for(path);
        index_stub_tree(tree, &mut sink)
    }

    pub fn sink_for(&self, path: &Path) -> FileIndexSink<'_> {
        FileIndexSink {
            index: self,
            path: Arc::from(path),
        }
    }

    pub fn files_for(&self, key: &IndexKey) -> Vec<PathBuf> {
        self.entries
            .get(key)
            .map(|files| files.iter().map(|p| p.to_path_buf()).collect())
            .unwrap_or_default()
    }

    pub fn keys_of(&self, path: &Path) -> Vec<IndexKey> {
        self.files
            .get(path)
            .map(|keys| keys.value().clone())
            .unwrap_or_default()
    }

    pub fn remove_file(&self, path: &Path) {
        let Some((path, keys)) = self.files.remove(path) else {
            return;
        };
        for key in keys {
            if let Some(mut files) = self.entries.get_mut(&key) {
                files.remove(&path);
            }
            self.entries.remove_if(&key, |_, files| files.is_empty());
        }
    }

    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<IndexKey> {
        let mut keys: Vec<_> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

pub struct FileIndexSink<'a> {
    index: &'a FileIndex,
    path: Arc<Path>,
}

impl IndexSink for FileIndexSink<'_> {
    fn occurrence(&mut self, _owner: StubRef<'_>, keys: &[IndexKey]) {
        for key in keys {
            self.index
                .entries
                .entry(key.clone())
                .or_default()
                .insert(self.path.clone());
        }
        self.index
            .files
            .entry(self.path.clone())
            .or_default()
            .extend(keys.iter().cloned());
    }
}
