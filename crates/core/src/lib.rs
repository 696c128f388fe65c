//! Stub trees: compact, serializable declaration skeletons of source files,
//! with lazy promotion to the full syntax tree and index extraction.

pub mod builder;
pub mod cache;
pub mod codec;
pub mod config;
pub mod corpus;
pub mod error;
pub mod index;
pub mod lazy;
pub mod logging;
pub mod model;

pub use builder::{BuildOutput, MalformedInput, StubBuilder};
pub use cache::{CacheOutcome, FileKey, StubCache};
pub use config::StubConfig;
pub use corpus::{CorpusReport, discover_sources, index_corpus};
pub use error::{Result, StubError};
pub use index::{FactCollector, FileIndex, IndexKey, IndexSink, index_stub_tree};
pub use lazy::{BoundElement, FileAst, StubOrigin, StubbedFile};
pub use model::{Name, StubId, StubKind, StubRef, StubTree, StubTreeBuilder};
