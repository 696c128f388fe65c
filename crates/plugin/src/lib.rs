//! Seams between the stub subsystem and its external collaborators.
//!
//! The stub core never parses source text itself. A language plugin supplies a
//! [`SourceParser`] that produces owned [`DetailedNode`] trees, and a
//! [`NamingConvention`] describing how qualified names are joined.

pub mod naming;
pub mod parser;
pub mod syntax;

pub use naming::{DotPathConvention, NamingConvention};
pub use parser::{BoxError, ParseError, SourceParser};
pub use syntax::{DetailedNode, Modifier, SyntaxKind, TextRange};
