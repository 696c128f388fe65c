use std::sync::Arc;

/// Byte offsets of a node within its source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub start: u32,
    pub end: u32,
}

impl TextRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}

/// Category of a detailed syntax node, as far as stub building cares.
///
/// Parsers map their own grammar onto this vocabulary. Anything the stub
/// builder does not need to look at is `Other` (walked through) or
/// `Expression` / `Block` (detail-only content).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    File,
    Class,
    EnumEntry,
    Object,
    Function,
    Property,
    PropertyDelegate,
    /// Primary-constructor parameter; `text` holds the declared type.
    ValueParameter,
    /// Declared type parameter; `name` holds its identifier.
    TypeParameter,
    /// One entry of a supertype list; `text` holds the reference as written.
    SuperTypeEntry,
    /// Explicit receiver type of an extension declaration.
    ReceiverType,
    /// Declared return/value type.
    TypeReference,
    /// Statement list (function body).
    Block,
    Expression,
    /// Parser recovery node.
    Error,
    Other,
}

/// Modifier keywords the stub builder reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Interface,
    /// Enum class; only these may declare enum entries.
    Enum,
    Value,
    Inline,
    Companion,
    Var,
}

/// Owned node of the full syntax tree.
///
/// Children are reference counted so that a subtree (an initializer, a
/// delegate expression) can be handed out without copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailedNode {
    pub kind: SyntaxKind,
    pub range: TextRange,
    pub name: Option<String>,
    pub text: Option<String>,
    pub modifiers: Vec<Modifier>,
    pub children: Vec<Arc<DetailedNode>>,
}

impl DetailedNode {
    pub fn new(kind: SyntaxKind, range: TextRange) -> Self {
        Self {
            kind,
            range,
            name: None,
            text: None,
            modifiers: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        if !self.modifiers.contains(&modifier) {
            self.modifiers.push(modifier);
        }
        self
    }

    pub fn with_child(mut self, child: DetailedNode) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = DetailedNode>) -> Self {
        self.children.extend(children.into_iter().map(Arc::new));
        self
    }

    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    pub fn children(&self) -> impl Iterator<Item = &Arc<DetailedNode>> {
        self.children.iter()
    }

    pub fn children_of_kind(&self, kind: SyntaxKind) -> impl Iterator<Item = &Arc<DetailedNode>> {
        self.children.iter().filter(move |c| c.kind == kind)
    }

    /// First direct child of the given kind.
    pub fn child_of_kind(&self, kind: SyntaxKind) -> Option<&Arc<DetailedNode>> {
        self.children.iter().find(|c| c.kind == kind)
    }

    pub fn has_child_of_kind(&self, kind: SyntaxKind) -> bool {
        self.child_of_kind(kind).is_some()
    }
}
