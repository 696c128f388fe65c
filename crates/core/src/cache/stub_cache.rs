//! Persistent per-file stub cache
//!
//! Maps a file's identity (path, size, mtime) to its stub tree. Trees are
//! kept in memory as [`StubbedFile`]s and persisted as `{hash:016x}.stubs`
//! files so that later runs skip parsing unchanged files.

use crate::builder::StubBuilder;
use crate::codec;
use crate::config::StubConfig;
use crate::error::{Result, StubError};
use crate::lazy::StubbedFile;
use crate::model::StubTree;
use dashmap::DashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use stubscope_plugin::{NamingConvention, SourceParser};
use tracing::{debug, warn};
use xxhash_rust::xxh3::xxh3_64;

const CACHE_EXTENSION: &str = "stubs";

/// Key identifying one version of a file
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FileKey {
    pub path: PathBuf,
    pub size: u64,
    pub mtime: u64, // Unix timestamp for serialization simplicity
}

impl FileKey {
    /// Create a FileKey from a file path
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let mtime = metadata
            .modified()?
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);

        Ok(Self {
            path: path.to_path_buf(),
            size: metadata.len(),
            mtime,
        })
    }

    /// Compute a hash for this file key
    pub fn hash(&self) -> u64 {
        let key_str = format!("{}:{}:{}", self.path.display(), self.size, self.mtime);
        xxh3_64(key_str.as_bytes())
    }
}

/// How [`StubCache::load_or_build`] obtained a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Memory,
    Disk,
    Built,
    /// The persisted tree was corrupt and has been replaced.
    Rebuilt,
}

#[derive(Debug, Clone)]
pub struct Loaded {
    pub file: Arc<StubbedFile>,
    pub outcome: CacheOutcome,
    /// Malformed-input diagnostics of a fresh build (0 when loaded).
    pub diagnostics: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedTreeSummary {
    pub hash: String,
    pub size_bytes: u64,
    pub compressed: bool,
    /// `None` when the file does not decode.
    pub stub_count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub cache_dir: PathBuf,
    pub persisted_trees: usize,
    pub persisted_bytes: u64,
    pub loaded_files: usize,
    pub materialized_files: usize,
}

/// Stub cache manager
#[derive(Debug)]
pub struct StubCache {
    config: StubConfig,
    loaded: DashMap<PathBuf, (FileKey, Arc<StubbedFile>)>,
}

impl StubCache {
    /// Create a cache persisting under `config.cache_dir`
    pub fn new(config: StubConfig) -> Self {
        fs::create_dir_all(&config.cache_dir).unwrap_or_default();
        Self {
            config,
            loaded: DashMap::new(),
        }
    }

    /// Create a cache configured from the environment
    pub fn at_default_location() -> Self {
        Self::new(StubConfig::from_env())
    }

    pub fn config(&self) -> &StubConfig {
        &self.config
    }

    pub fn cache_dir(&self) -> &Path {
        &self.config.cache_dir
    }

    /// Get the cache file path for a file hash
    pub fn cache_path(&self, hash: u64) -> PathBuf {
        self.config
            .cache_dir
            .join(format!("{:016x}.{}", hash, CACHE_EXTENSION))
    }

    /// The in-memory entry for `path`, whatever version it was built from.
    pub fn get(&self, path: &Path) -> Option<Arc<StubbedFile>> {
        self.loaded.get(path).map(|entry| entry.value().1.clone())
    }

    /// Return the stubs of a source file, from memory, from disk, or by
    /// parsing it.
    ///
    /// A persisted tree that fails to decode is deleted and rebuilt.
    pub fn load_or_build(
        &self,
        path: &Path,
        parser: &Arc<dyn SourceParser>,
        naming: &Arc<dyn NamingConvention>,
    ) -> Result<Loaded> {
        let key = FileKey::from_path(path)?;

        if let Some(file) = self.lookup(&key) {
            debug!(path = %path.display(), "Stub cache hit (memory)");
            return Ok(Loaded {
                file,
                outcome: CacheOutcome::Memory,
                diagnostics: 0,
            });
        }

        let cache_path = self.cache_path(key.hash());
        let mut rebuilt = false;
        if cache_path.exists() {
            match self.read_persisted(&cache_path) {
                Ok(tree) => {
                    debug!(path = %path.display(), "Stub cache hit (disk)");
                    let file = self.install(
                        key,
                        StubbedFile::source(Arc::new(tree), path, parser.clone(), naming.clone()),
                    );
                    return Ok(Loaded {
                        file,
                        outcome: CacheOutcome::Disk,
                        diagnostics: 0,
                    });
                }
                Err(e) if e.is_corrupt() => {
                    warn!(
                        path = %path.display(),
                        cache = %cache_path.display(),
                        "Discarding corrupt stub cache entry: {}",
                        e
                    );
                    let _ = fs::remove_file(&cache_path);
                    rebuilt = true;
                }
                Err(e) => return Err(e),
            }
        }

        let root = parser.parse(path)?;
        let out = StubBuilder::new(naming.as_ref()).build(&root);
        if let Err(e) = self.write_tree(&cache_path, &out.tree) {
            warn!(cache = %cache_path.display(), "Failed to persist stubs: {}", e);
        }
        let file = self.install(
            key,
            StubbedFile::source(Arc::new(out.tree), path, parser.clone(), naming.clone()),
        );
        Ok(Loaded {
            file,
            outcome: if rebuilt {
                CacheOutcome::Rebuilt
            } else {
                CacheOutcome::Built
            },
            diagnostics: out.diagnostics.len(),
        })
    }

    /// Register and persist stubs of compiled code at `path`.
    pub fn insert_binary(&self, path: &Path, tree: StubTree) -> Result<Arc<StubbedFile>> {
        let key = FileKey::from_path(path)?;
        self.write_tree(&self.cache_path(key.hash()), &tree)?;
        Ok(self.install(key, StubbedFile::binary(Arc::new(tree), path)))
    }

    /// Stubs of compiled code persisted by an earlier [`insert_binary`](Self::insert_binary).
    pub fn load_binary(&self, path: &Path) -> Result<Option<Arc<StubbedFile>>> {
        let key = FileKey::from_path(path)?;
        if let Some(file) = self.lookup(&key) {
            return Ok(Some(file));
        }
        let cache_path = self.cache_path(key.hash());
        if !cache_path.exists() {
            return Ok(None);
        }
        match self.read_persisted(&cache_path) {
            Ok(tree) => Ok(Some(
                self.install(key, StubbedFile::binary(Arc::new(tree), path)),
            )),
            Err(e) if e.is_corrupt() => {
                warn!(cache = %cache_path.display(), "Discarding corrupt stub cache entry: {}", e);
                let _ = fs::remove_file(&cache_path);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Drop everything cached for `path`, in memory and on disk.
    pub fn invalidate(&self, path: &Path) -> bool {
        let mut removed = false;
        if let Some((_, (key, _))) = self.loaded.remove(path) {
            let _ = fs::remove_file(self.cache_path(key.hash()));
            removed = true;
        }
        if let Ok(key) = FileKey::from_path(path) {
            removed |= fs::remove_file(self.cache_path(key.hash())).is_ok();
        }
        removed
    }

    /// Clear all cached data
    pub fn clear(&self) -> std::io::Result<()> {
        self.loaded.clear();

        if self.config.cache_dir.exists() {
            for entry in fs::read_dir(&self.config.cache_dir)? {
                let entry = entry?;
                if is_cache_file(&entry.path()) {
                    let _ = fs::remove_file(entry.path());
                }
            }
        }

        Ok(())
    }

    /// Scan all persisted trees returning their summaries
    pub fn scan(&self) -> Vec<CachedTreeSummary> {
        let mut summaries = Vec::new();
        let Ok(entries) = fs::read_dir(&self.config.cache_dir) else {
            return summaries;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !is_cache_file(&path) {
                continue;
            }
            let Ok(bytes) = fs::read(&path) else {
                continue;
            };
            let hash = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            summaries.push(CachedTreeSummary {
                hash,
                size_bytes: bytes.len() as u64,
                compressed: !codec::is_stub_stream(&bytes),
                stub_count: self.decode(&bytes).ok().map(|tree| tree.len()),
            });
        }

        summaries.sort_by(|a, b| a.hash.cmp(&b.hash));
        summaries
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let summaries = self.scan();
        CacheStats {
            cache_dir: self.config.cache_dir.clone(),
            persisted_trees: summaries.len(),
            persisted_bytes: summaries.iter().map(|s| s.size_bytes).sum(),
            loaded_files: self.loaded.len(),
            materialized_files: self
                .loaded
                .iter()
                .filter(|e| e.value().1.is_materialized())
                .count(),
        }
    }

    /// The in-memory entry for exactly this version of the file. An entry
    /// built from an older version has its persisted tree deleted.
    fn lookup(&self, key: &FileKey) -> Option<Arc<StubbedFile>> {
        let stale = {
            let entry = self.loaded.get(&key.path)?;
            let (cached_key, file) = entry.value();
            if cached_key == key {
                return Some(file.clone());
            }
            cached_key.hash()
        };
        if stale != key.hash() {
            debug!(path = %key.path.display(), "Dropping stubs of a previous version");
            let _ = fs::remove_file(self.cache_path(stale));
        }
        None
    }

    fn install(&self, key: FileKey, file: StubbedFile) -> Arc<StubbedFile> {
        let file = Arc::new(file);
        let previous = self.loaded.insert(key.path.clone(), (key.clone(), file.clone()));
        if let Some((old_key, _)) = previous {
            if old_key.hash() != key.hash() {
                let _ = fs::remove_file(self.cache_path(old_key.hash()));
            }
        }
        file
    }

    /// Decode a persisted `.stubs` file, compressed or raw.
    pub fn read_persisted(&self, cache_path: &Path) -> Result<StubTree> {
        let bytes = fs::read(cache_path)?;
        self.decode(&bytes)
    }

    fn write_tree(&self, cache_path: &Path, tree: &StubTree) -> Result<()> {
        let bytes = self.encode(tree)?;
        let tmp = cache_path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, cache_path)?;
        Ok(())
    }

    fn encode(&self, tree: &StubTree) -> Result<Vec<u8>> {
        let bytes = codec::serialize_with_limit(tree, self.config.max_depth)?;
        if !self.config.compress {
            return Ok(bytes);
        }
        Ok(zstd::encode_all(&bytes[..], self.config.compression_level)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<StubTree> {
        if codec::is_stub_stream(bytes) {
            return codec::deserialize_with_limit(bytes, self.config.max_depth);
        }
        let raw = zstd::decode_all(bytes)
            .map_err(|e| StubError::corrupt(format!("zstd decompression failed: {}", e)))?;
        codec::deserialize_with_limit(&raw, self.config.max_depth)
    }
}

fn is_cache_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == CACHE_EXTENSION)
}
