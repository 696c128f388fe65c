//! Stub node model: the declaration skeleton of one source file.

pub mod kind;
pub mod payload;
pub mod tree;
pub mod types;

/// Interned-friendly name type used for every identifier in a stub.
pub type Name = smol_str::SmolStr;

pub use kind::StubKind;
pub use payload::{
    ClassStub, FileStub, FunctionStub, ObjectStub, PropertyDelegateStub, PropertyStub, StubData,
};
pub use tree::{Descendants, StubId, StubNode, StubRef, StubTree, StubTreeBuilder};
pub use types::{
    ClassId, TypeArgument, TypeBean, UnderlyingTypes, ValueClassRepresentation, Variance,
};
