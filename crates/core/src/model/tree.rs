use super::kind::StubKind;
use super::payload::{FileStub, StubData};
use super::types::{ClassId, ValueClassRepresentation};
use super::Name;
use crate::error::{Result, StubError};
use std::fmt;

/// Index of a node inside its [`StubTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StubId(u32);

impl StubId {
    pub const ROOT: StubId = StubId(0);

    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubNode {
    data: StubData,
    parent: Option<StubId>,
    children: Vec<StubId>,
}

impl StubNode {
    pub fn kind(&self) -> StubKind {
        self.data.kind()
    }

    pub fn data(&self) -> &StubData {
        &self.data
    }

    pub fn parent(&self) -> Option<StubId> {
        self.parent
    }

    pub fn children(&self) -> &[StubId] {
        &self.children
    }
}

/// Immutable stub tree of one file, stored as an arena.
///
/// Parents always precede their children, so ids double as a topological
/// order. Trees are only obtainable through [`StubTreeBuilder::finish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubTree {
    nodes: Vec<StubNode>,
}

impl StubTree {
    pub fn root(&self) -> StubRef<'_> {
        StubRef {
            tree: self,
            id: StubId::ROOT,
        }
    }

    pub fn get(&self, id: StubId) -> Option<StubRef<'_>> {
        (id.index() < self.nodes.len()).then_some(StubRef { tree: self, id })
    }

    /// Cursor for an id obtained from this tree.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    pub fn stub(&self, id: StubId) -> StubRef<'_> {
        assert!(id.index() < self.nodes.len(), "stub id out of range");
        StubRef { tree: self, id }
    }

    pub fn node(&self, id: StubId) -> Option<&StubNode> {
        self.nodes.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in pre-order (source order).
    pub fn iter(&self) -> Descendants<'_> {
        self.root().descendants()
    }

    /// Number of nodes that contribute facts to the index.
    pub fn declaration_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.kind().is_declaration())
            .count()
    }

    /// Same structure, kinds and names; payload flags are not compared.
    pub fn shape_matches(&self, other: &StubTree) -> bool {
        self.nodes.len() == other.nodes.len()
            && self.nodes.iter().zip(&other.nodes).all(|(a, b)| {
                a.kind() == b.kind() && a.parent == b.parent && a.data.name() == b.data.name()
            })
    }
}

/// Assembles a [`StubTree`] node by node in pre-order.
///
/// A child may only be appended to a node on the path from the root to the
/// most recently pushed node, which keeps ids in source order. Every push is
/// validated, so a finished tree is always well formed.
#[derive(Debug)]
pub struct StubTreeBuilder {
    nodes: Vec<StubNode>,
    open: Vec<StubId>,
}

impl StubTreeBuilder {
    pub fn new(root: FileStub) -> Self {
        Self {
            nodes: vec![StubNode {
                data: StubData::File(root),
                parent: None,
                children: Vec::new(),
            }],
            open: vec![StubId::ROOT],
        }
    }

    pub fn root(&self) -> StubId {
        StubId::ROOT
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn kind_of(&self, id: StubId) -> Option<StubKind> {
        self.nodes.get(id.index()).map(|n| n.kind())
    }

    /// Append `data` as the last child of `parent`.
    pub fn push_child(&mut self, parent: StubId, data: impl Into<StubData>) -> Result<StubId> {
        let data = data.into();
        let parent_kind = self.kind_of(parent).ok_or_else(|| {
            StubError::InvalidTree(format!("unknown parent stub {}", parent.index()))
        })?;
        let kind = data.kind();
        if !parent_kind.can_contain(kind) {
            return Err(StubError::InvalidTree(format!(
                "{} cannot contain {}",
                parent_kind, kind
            )));
        }

        let Some(depth) = self.open.iter().rposition(|&open| open == parent) else {
            return Err(StubError::InvalidTree(format!(
                "stub {} is already closed",
                parent.index()
            )));
        };
        self.open.truncate(depth + 1);

        let id = StubId::new(self.nodes.len());
        self.open.push(id);
        self.nodes.push(StubNode {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        Ok(id)
    }

    pub fn finish(self) -> StubTree {
        StubTree { nodes: self.nodes }
    }
}

/// Read-only cursor over one node of a [`StubTree`].
#[derive(Clone, Copy)]
pub struct StubRef<'a> {
    tree: &'a StubTree,
    id: StubId,
}

impl<'a> StubRef<'a> {
    fn node(&self) -> &'a StubNode {
        &self.tree.nodes[self.id.index()]
    }

    pub fn id(&self) -> StubId {
        self.id
    }

    pub fn tree(&self) -> &'a StubTree {
        self.tree
    }

    pub fn kind(&self) -> StubKind {
        self.node().kind()
    }

    pub fn data(&self) -> &'a StubData {
        &self.node().data
    }

    pub fn name(&self) -> Option<&'a str> {
        self.data().name().map(Name::as_str)
    }

    pub fn qualified_name(&self) -> Option<&'a str> {
        self.data().qualified_name().map(Name::as_str)
    }

    pub fn super_names(&self) -> &'a [Name] {
        self.data().super_names()
    }

    /// Package of the file this node belongs to.
    pub fn package(&self) -> Option<&'a str> {
        match self.tree.root().data() {
            StubData::File(f) => f.package_fq_name.as_deref(),
            _ => None,
        }
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.data(), StubData::Class(c) if c.is_interface)
    }

    pub fn is_enum_entry(&self) -> bool {
        self.kind() == StubKind::EnumEntry
    }

    pub fn is_local(&self) -> bool {
        self.data().is_local()
    }

    pub fn is_top_level(&self) -> bool {
        self.data().is_top_level()
    }

    pub fn is_companion(&self) -> bool {
        matches!(self.data(), StubData::Object(o) if o.is_companion)
    }

    pub fn is_var(&self) -> bool {
        matches!(self.data(), StubData::Property(p) if p.is_var)
    }

    pub fn is_extension(&self) -> bool {
        match self.data() {
            StubData::Function(f) => f.is_extension,
            StubData::Property(p) => p.is_extension,
            _ => false,
        }
    }

    pub fn has_initializer(&self) -> bool {
        matches!(self.data(), StubData::Property(p) if p.has_initializer)
    }

    pub fn has_delegate(&self) -> bool {
        matches!(self.data(), StubData::Property(p) if p.has_delegate)
    }

    pub fn has_expression(&self) -> bool {
        matches!(self.data(), StubData::PropertyDelegate(d) if d.has_expression)
    }

    pub fn has_body(&self) -> bool {
        matches!(self.data(), StubData::Function(f) if f.has_body)
    }

    pub fn class_id(&self) -> Option<&'a ClassId> {
        match self.data() {
            StubData::Class(c) => c.class_id.as_ref(),
            _ => None,
        }
    }

    pub fn value_class(&self) -> Option<&'a ValueClassRepresentation> {
        match self.data() {
            StubData::Class(c) => c.value_class.as_ref(),
            _ => None,
        }
    }

    pub fn parent(&self) -> Option<StubRef<'a>> {
        self.node().parent.map(|id| StubRef {
            tree: self.tree,
            id,
        })
    }

    pub fn children(&self) -> impl Iterator<Item = StubRef<'a>> + 'a {
        let tree = self.tree;
        self.node()
            .children
            .iter()
            .map(move |&id| StubRef { tree, id })
    }

    /// This node and everything below it, in pre-order.
    pub fn descendants(&self) -> Descendants<'a> {
        Descendants {
            tree: self.tree,
            stack: vec![self.id],
        }
    }
}

impl fmt::Debug for StubRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StubRef")
            .field("id", &self.id.index())
            .field("kind", &self.kind())
            .field("name", &self.name())
            .finish()
    }
}

pub struct Descendants<'a> {
    tree: &'a StubTree,
    stack: Vec<StubId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = StubRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = &self.tree.nodes[id.index()];
        self.stack.extend(node.children.iter().rev().copied());
        Some(StubRef {
            tree: self.tree,
            id,
        })
    }
}

impl fmt::Display for StubTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_node(f: &mut fmt::Formatter<'_>, stub: StubRef<'_>, depth: usize) -> fmt::Result {
            write!(f, "{:indent$}{}", "", stub.kind(), indent = depth * 2)?;
            if let Some(name) = stub.name() {
                write!(f, " {}", name)?;
            }
            if let Some(fq) = stub.qualified_name() {
                write!(f, " [{}]", fq)?;
            }
            if !stub.super_names().is_empty() {
                let supers: Vec<&str> = stub.super_names().iter().map(Name::as_str).collect();
                write!(f, " : {}", supers.join(", "))?;
            }
            if let Some(repr) = stub.value_class() {
                let types: Vec<String> =
                    repr.underlying_types.iter().map(|t| t.to_string()).collect();
                write!(
                    f,
                    " value({}{})",
                    if repr.is_inline { "inline " } else { "" },
                    types.join(", ")
                )?;
            }
            writeln!(f)?;
            for child in stub.children() {
                write_node(f, child, depth + 1)?;
            }
            Ok(())
        }
        write_node(f, self.root(), 0)
    }
}
