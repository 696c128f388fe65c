//! On-demand promotion of stubs to detailed syntax nodes.
//!
//! A [`StubbedFile`] starts out with only its stub tree. The first caller that
//! needs detail-only content (an initializer, a delegate expression, a body)
//! triggers one parse of the whole file; the reparsed nodes are bound to stub
//! ids by replaying the builder walk and handed out through memo cells, so
//! every caller observes the same `Arc<DetailedNode>`.

use crate::builder::StubBuilder;
use crate::error::{Result, StubError};
use crate::model::{ClassId, Name, StubId, StubKind, StubRef, StubTree, ValueClassRepresentation};
use once_cell::sync::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stubscope_plugin::{DetailedNode, NamingConvention, SourceParser, SyntaxKind};
use tracing::{debug, trace};

/// Where a stub tree came from, and therefore whether it can be promoted.
#[derive(Clone)]
pub enum StubOrigin {
    Source {
        path: PathBuf,
        parser: Arc<dyn SourceParser>,
        naming: Arc<dyn NamingConvention>,
    },
    /// Compiled code. There is no source to reparse.
    Binary { path: PathBuf },
}

impl StubOrigin {
    pub fn path(&self) -> &Path {
        match self {
            StubOrigin::Source { path, .. } | StubOrigin::Binary { path } => path,
        }
    }

    pub fn is_source(&self) -> bool {
        matches!(self, StubOrigin::Source { .. })
    }
}

impl fmt::Debug for StubOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StubOrigin::Source { path, parser, .. } => f
                .debug_struct("Source")
                .field("path", path)
                .field("parser", &parser.name())
                .finish(),
            StubOrigin::Binary { path } => f.debug_struct("Binary").field("path", path).finish(),
        }
    }
}

/// A reparsed file bound to its stub tree.
#[derive(Debug)]
pub struct FileAst {
    pub root: Arc<DetailedNode>,
    /// Detailed node for each stub id.
    pub bindings: Vec<Arc<DetailedNode>>,
}

#[derive(Debug)]
pub struct StubbedFile {
    tree: Arc<StubTree>,
    origin: StubOrigin,
    ast: OnceCell<Arc<FileAst>>,
    attached: Box<[OnceCell<Arc<DetailedNode>>]>,
}

impl StubbedFile {
    pub fn new(tree: Arc<StubTree>, origin: StubOrigin) -> Self {
        let attached = (0..tree.len()).map(|_| OnceCell::new()).collect();
        Self {
            tree,
            origin,
            ast: OnceCell::new(),
            attached,
        }
    }

    pub fn source(
        tree: Arc<StubTree>,
        path: impl Into<PathBuf>,
        parser: Arc<dyn SourceParser>,
        naming: Arc<dyn NamingConvention>,
    ) -> Self {
        Self::new(
            tree,
            StubOrigin::Source {
                path: path.into(),
                parser,
                naming,
            },
        )
    }

    pub fn binary(tree: Arc<StubTree>, path: impl Into<PathBuf>) -> Self {
        Self::new(tree, StubOrigin::Binary { path: path.into() })
    }

    pub fn tree(&self) -> &Arc<StubTree> {
        &self.tree
    }

    pub fn origin(&self) -> &StubOrigin {
        &self.origin
    }

    pub fn path(&self) -> &Path {
        self.origin.path()
    }

    pub fn source_available(&self) -> bool {
        self.origin.is_source()
    }

    /// Whether the file has been reparsed.
    pub fn is_materialized(&self) -> bool {
        self.ast.get().is_some()
    }

    pub fn root_element(self: &Arc<Self>) -> BoundElement {
        BoundElement {
            file: self.clone(),
            id: StubId::ROOT,
        }
    }

    pub fn element(self: &Arc<Self>, id: StubId) -> Option<BoundElement> {
        (id.index() < self.tree.len()).then(|| BoundElement {
            file: self.clone(),
            id,
        })
    }

    /// Every element of the file in pre-order.
    pub fn elements(self: &Arc<Self>) -> impl Iterator<Item = BoundElement> + '_ {
        (0..self.tree.len()).map(move |i| BoundElement {
            file: self.clone(),
            id: StubId::new(i),
        })
    }

    fn ast(&self) -> Result<&Arc<FileAst>> {
        self.ast.get_or_try_init(|| self.reparse())
    }

    fn reparse(&self) -> Result<Arc<FileAst>> {
        let StubOrigin::Source {
            path,
            parser,
            naming,
        } = &self.origin
        else {
            return Err(StubError::Parse(format!(
                "{} is compiled code and has no source",
                self.path().display()
            )));
        };

        debug!(path = %path.display(), parser = parser.name(), "Reparsing file for stub promotion");
        let root = parser.parse(path)?;
        let out = StubBuilder::new(naming.as_ref()).build_with_bindings(&root);
        if !out.tree.shape_matches(&self.tree) {
            return Err(StubError::StaleStub(format!(
                "{} no longer matches its stub tree ({} stubs, reparse gives {})",
                path.display(),
                self.tree.len(),
                out.tree.len()
            )));
        }
        Ok(Arc::new(FileAst {
            root,
            bindings: out.bindings.unwrap_or_default(),
        }))
    }
}

/// One stub node together with its lazily attached detailed node.
#[derive(Clone)]
pub struct BoundElement {
    file: Arc<StubbedFile>,
    id: StubId,
}

impl BoundElement {
    pub fn id(&self) -> StubId {
        self.id
    }

    pub fn file(&self) -> &Arc<StubbedFile> {
        &self.file
    }

    pub fn stub(&self) -> StubRef<'_> {
        self.file.tree.stub(self.id)
    }

    pub fn kind(&self) -> StubKind {
        self.stub().kind()
    }

    pub fn name(&self) -> Option<&str> {
        self.stub().name()
    }

    pub fn qualified_name(&self) -> Option<&str> {
        self.stub().qualified_name()
    }

    pub fn super_names(&self) -> &[Name] {
        self.stub().super_names()
    }

    pub fn is_interface(&self) -> bool {
        self.stub().is_interface()
    }

    pub fn is_enum_entry(&self) -> bool {
        self.stub().is_enum_entry()
    }

    pub fn is_local(&self) -> bool {
        self.stub().is_local()
    }

    pub fn is_top_level(&self) -> bool {
        self.stub().is_top_level()
    }

    pub fn is_companion(&self) -> bool {
        self.stub().is_companion()
    }

    pub fn is_var(&self) -> bool {
        self.stub().is_var()
    }

    pub fn is_extension(&self) -> bool {
        self.stub().is_extension()
    }

    pub fn has_initializer(&self) -> bool {
        self.stub().has_initializer()
    }

    pub fn has_delegate(&self) -> bool {
        self.stub().has_delegate()
    }

    pub fn has_expression(&self) -> bool {
        self.stub().has_expression()
    }

    pub fn has_body(&self) -> bool {
        self.stub().has_body()
    }

    pub fn class_id(&self) -> Option<&ClassId> {
        self.stub().class_id()
    }

    pub fn value_class(&self) -> Option<&ValueClassRepresentation> {
        self.stub().value_class()
    }

    pub fn source_available(&self) -> bool {
        self.file.source_available()
    }

    pub fn parent(&self) -> Option<BoundElement> {
        let parent = self.stub().parent()?.id();
        Some(BoundElement {
            file: self.file.clone(),
            id: parent,
        })
    }

    pub fn children(&self) -> Vec<BoundElement> {
        self.stub()
            .children()
            .map(|c| BoundElement {
                file: self.file.clone(),
                id: c.id(),
            })
            .collect()
    }

    /// The attached detailed node, if some earlier call promoted this element.
    pub fn detailed(&self) -> Option<&Arc<DetailedNode>> {
        self.file.attached[self.id.index()].get()
    }

    /// Delegate expression, property initializer or function body.
    ///
    /// Answers from the stub whenever it can: elements whose stub records no
    /// such content, and every element of compiled code, return `Ok(None)`
    /// without parsing. Otherwise the file is reparsed once and the detailed
    /// node is attached for all later callers.
    pub fn expression_or_absent(&self) -> Result<Option<Arc<DetailedNode>>> {
        if let Some(detailed) = self.detailed() {
            return Ok(self.expression_in(detailed));
        }
        if !self.stub().data().has_detail_expression() {
            return Ok(None);
        }
        if !self.source_available() {
            trace!(
                path = %self.file.path().display(),
                stub = self.id.index(),
                "Compiled stub has no expression to load"
            );
            return Ok(None);
        }

        let detailed = self.promote()?;
        Ok(self.expression_in(detailed))
    }

    fn promote(&self) -> Result<&Arc<DetailedNode>> {
        self.file.attached[self.id.index()].get_or_try_init(|| {
            let ast = self.file.ast()?;
            ast.bindings.get(self.id.index()).cloned().ok_or_else(|| {
                StubError::StaleStub(format!("no detailed node for stub {}", self.id.index()))
            })
        })
    }

    fn expression_in(&self, detailed: &DetailedNode) -> Option<Arc<DetailedNode>> {
        match self.kind() {
            StubKind::Property | StubKind::PropertyDelegate => {
                detailed.child_of_kind(SyntaxKind::Expression).cloned()
            }
            StubKind::Function => detailed
                .children()
                .find(|c| matches!(c.kind, SyntaxKind::Block | SyntaxKind::Expression))
                .cloned(),
            _ => None,
        }
    }
}

impl fmt::Debug for BoundElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundElement")
            .field("path", &self.file.path())
            .field("stub", &self.stub())
            .field("attached", &self.detailed().is_some())
            .finish()
    }
}
