pub mod stub_cache;

pub use stub_cache::{CacheOutcome, CacheStats, CachedTreeSummary, FileKey, Loaded, StubCache};
