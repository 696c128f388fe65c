//! Builds a [`StubTree`] from a detailed syntax tree.
//!
//! The walk keeps only the declaration skeleton. Expression bodies and
//! statement lists are reduced to boolean flags; blocks are only searched for
//! local class and object declarations.

use crate::model::{
    ClassId, ClassStub, FileStub, FunctionStub, Name, ObjectStub, PropertyDelegateStub,
    PropertyStub, StubData, StubId, StubKind, StubTree, StubTreeBuilder, TypeBean,
    ValueClassRepresentation,
};
use std::sync::Arc;
use stubscope_plugin::{DetailedNode, Modifier, NamingConvention, SyntaxKind, TextRange};
use tracing::warn;

const COMPANION_NAME: &str = "Companion";

/// Recoverable problem found while building a stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedInput {
    pub range: TextRange,
    pub kind: SyntaxKind,
    pub reason: String,
}

#[derive(Debug)]
pub struct BuildOutput {
    pub tree: StubTree,
    pub diagnostics: Vec<MalformedInput>,
    /// Detailed node each stub was built from, indexed by stub id.
    pub bindings: Option<Vec<Arc<DetailedNode>>>,
}

pub struct StubBuilder<'a> {
    naming: &'a dyn NamingConvention,
}

impl<'a> StubBuilder<'a> {
    pub fn new(naming: &'a dyn NamingConvention) -> Self {
        Self { naming }
    }

    pub fn build(&self, root: &Arc<DetailedNode>) -> BuildOutput {
        self.run(root, false)
    }

    /// Like [`build`](Self::build), also recording which detailed node
    /// produced each stub.
    pub fn build_with_bindings(&self, root: &Arc<DetailedNode>) -> BuildOutput {
        self.run(root, true)
    }

    fn run(&self, root: &Arc<DetailedNode>, bind: bool) -> BuildOutput {
        let package = non_empty(root.name.as_deref());
        let mut walk = Walk {
            naming: self.naming,
            tree: StubTreeBuilder::new(FileStub {
                package_fq_name: package.clone(),
            }),
            diagnostics: Vec::new(),
            bindings: bind.then(|| vec![root.clone()]),
        };
        if root.kind != SyntaxKind::File {
            walk.malformed(root, format!("root node is {:?}, not a file", root.kind));
        }

        let scope = Scope {
            parent: StubId::ROOT,
            parent_syntax: SyntaxKind::File,
            qualifier: match &package {
                Some(pkg) => Qualifier::Prefix(pkg.clone()),
                None => Qualifier::Root,
            },
            nesting: Nesting::Package(package),
            in_enum: false,
            local: false,
            statement: false,
        };
        walk.children(root, &scope);

        BuildOutput {
            tree: walk.tree.finish(),
            diagnostics: walk.diagnostics,
            bindings: walk.bindings,
        }
    }
}

/// How members of the current container get their qualified names.
#[derive(Debug, Clone)]
enum Qualifier {
    /// Default package: members are qualified by their own name.
    Root,
    Prefix(Name),
    /// Inside a local or unnamed declaration: no qualified names.
    Unavailable,
}

/// What a class declared in the current container is nested in.
#[derive(Debug, Clone)]
enum Nesting {
    Package(Option<Name>),
    Class(ClassId),
    /// Local or under an unnamed container: no class id.
    Unavailable,
}

#[derive(Debug, Clone)]
struct Scope {
    parent: StubId,
    parent_syntax: SyntaxKind,
    qualifier: Qualifier,
    nesting: Nesting,
    /// Directly in the body of an enum class.
    in_enum: bool,
    /// Anywhere below a function body.
    local: bool,
    /// Directly in a statement list, where functions and properties are
    /// local and not stubbed.
    statement: bool,
}

struct Walk<'a> {
    naming: &'a dyn NamingConvention,
    tree: StubTreeBuilder,
    diagnostics: Vec<MalformedInput>,
    bindings: Option<Vec<Arc<DetailedNode>>>,
}

impl Walk<'_> {
    fn malformed(&mut self, node: &DetailedNode, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(
            kind = ?node.kind,
            start = node.range.start,
            end = node.range.end,
            "Malformed input: {}",
            reason
        );
        self.diagnostics.push(MalformedInput {
            range: node.range,
            kind: node.kind,
            reason,
        });
    }

    fn children(&mut self, node: &DetailedNode, scope: &Scope) {
        for child in node.children() {
            self.visit(child, scope);
        }
    }

    fn visit(&mut self, node: &Arc<DetailedNode>, scope: &Scope) {
        match node.kind {
            SyntaxKind::Class
            | SyntaxKind::EnumEntry
            | SyntaxKind::Object
            | SyntaxKind::Function
            | SyntaxKind::Property => self.declaration(node, scope),
            SyntaxKind::Block => {
                let inner = Scope {
                    qualifier: Qualifier::Unavailable,
                    nesting: Nesting::Unavailable,
                    in_enum: false,
                    local: true,
                    statement: true,
                    ..scope.clone()
                };
                self.children(node, &inner);
            }
            SyntaxKind::Error => {
                self.malformed(node, "parser recovery node");
                self.children(node, scope);
            }
            SyntaxKind::Other => self.children(node, scope),
            SyntaxKind::PropertyDelegate => {
                self.malformed(node, "delegate outside of a property");
            }
            SyntaxKind::File => self.malformed(node, "nested file node"),
            SyntaxKind::Expression
            | SyntaxKind::ValueParameter
            | SyntaxKind::TypeParameter
            | SyntaxKind::SuperTypeEntry
            | SyntaxKind::ReceiverType
            | SyntaxKind::TypeReference => {}
        }
    }

    fn declaration(&mut self, node: &Arc<DetailedNode>, scope: &Scope) {
        if scope.statement && matches!(node.kind, SyntaxKind::Function | SyntaxKind::Property) {
            return;
        }

        let kind = match node.kind {
            SyntaxKind::EnumEntry => StubKind::EnumEntry,
            SyntaxKind::Object => StubKind::Object,
            SyntaxKind::Function => StubKind::Function,
            SyntaxKind::Property => StubKind::Property,
            _ => StubKind::Class,
        };
        let parent_kind = self.tree.kind_of(scope.parent).unwrap_or(StubKind::File);
        if !parent_kind.can_contain(kind) {
            self.malformed(node, format!("{} cannot appear inside {}", kind, parent_kind));
            return;
        }
        if kind == StubKind::EnumEntry && !scope.in_enum {
            self.malformed(node, "enum entry outside of an enum class");
            return;
        }

        let mut name = non_empty(node.name.as_deref());
        if name.is_none()
            && node.kind == SyntaxKind::Object
            && node.has_modifier(Modifier::Companion)
        {
            name = Some(Name::new_static(COMPANION_NAME));
        }
        if name.is_none() {
            self.malformed(node, format!("{} without a name", kind));
        }
        let fq_name = self.qualify(scope, node.kind, name.as_deref());
        let is_top_level = scope.parent == StubId::ROOT && !scope.local;
        let class_id = match (&scope.nesting, &name) {
            _ if scope.local || !kind.is_class_like() => None,
            (Nesting::Package(package), Some(name)) => {
                Some(ClassId::top_level(package.clone(), name.clone()))
            }
            (Nesting::Class(outer), Some(name)) => Some(outer.nested(name)),
            _ => None,
        };

        let data: StubData = match kind {
            StubKind::Class | StubKind::EnumEntry => ClassStub {
                super_names: self.super_names(node),
                is_interface: node.has_modifier(Modifier::Interface),
                is_enum_entry: kind == StubKind::EnumEntry,
                is_local: scope.local,
                is_top_level,
                value_class: self.value_class(node),
                class_id: class_id.clone(),
                name,
                fq_name: fq_name.clone(),
            }
            .into(),
            StubKind::Object => ObjectStub {
                super_names: self.super_names(node),
                is_companion: node.has_modifier(Modifier::Companion),
                is_local: scope.local,
                is_top_level,
                name,
                fq_name: fq_name.clone(),
            }
            .into(),
            StubKind::Function => FunctionStub {
                is_top_level,
                is_extension: node.has_child_of_kind(SyntaxKind::ReceiverType),
                has_body: node.has_child_of_kind(SyntaxKind::Block)
                    || node.has_child_of_kind(SyntaxKind::Expression),
                name,
                fq_name: fq_name.clone(),
            }
            .into(),
            _ => {
                if is_top_level && fq_name.is_none() {
                    self.malformed(node, "top-level property without a qualified name");
                }
                PropertyStub {
                    is_var: node.has_modifier(Modifier::Var),
                    is_top_level,
                    is_extension: node.has_child_of_kind(SyntaxKind::ReceiverType),
                    has_initializer: node.has_child_of_kind(SyntaxKind::Expression),
                    has_delegate: node.has_child_of_kind(SyntaxKind::PropertyDelegate),
                    has_return_type_ref: node.has_child_of_kind(SyntaxKind::TypeReference),
                    name,
                    fq_name: fq_name.clone(),
                }
                .into()
            }
        };

        let Some(id) = self.push(scope.parent, data, node) else {
            return;
        };

        match kind {
            StubKind::Property => self.delegate(node, id),
            StubKind::Function => {
                let body = Scope {
                    parent: id,
                    parent_syntax: node.kind,
                    qualifier: Qualifier::Unavailable,
                    nesting: Nesting::Unavailable,
                    in_enum: false,
                    local: true,
                    statement: true,
                };
                for block in node.children_of_kind(SyntaxKind::Block) {
                    self.children(block, &body);
                }
            }
            _ => {
                let members = Scope {
                    parent: id,
                    parent_syntax: node.kind,
                    qualifier: match fq_name {
                        Some(fq) => Qualifier::Prefix(fq),
                        None => Qualifier::Unavailable,
                    },
                    nesting: match class_id {
                        Some(id) => Nesting::Class(id),
                        None => Nesting::Unavailable,
                    },
                    in_enum: node.has_modifier(Modifier::Enum),
                    local: scope.local,
                    statement: false,
                };
                self.children(node, &members);
            }
        }
    }

    fn delegate(&mut self, property: &DetailedNode, id: StubId) {
        let mut delegates = property.children_of_kind(SyntaxKind::PropertyDelegate);
        if let Some(delegate) = delegates.next() {
            let data = PropertyDelegateStub {
                has_expression: delegate.has_child_of_kind(SyntaxKind::Expression),
            };
            self.push(id, data.into(), delegate);
        }
        if delegates.next().is_some() {
            self.malformed(property, "property with more than one delegate");
        }
    }

    fn push(&mut self, parent: StubId, data: StubData, node: &Arc<DetailedNode>) -> Option<StubId> {
        match self.tree.push_child(parent, data) {
            Ok(id) => {
                if let Some(bindings) = self.bindings.as_mut() {
                    bindings.push(node.clone());
                }
                Some(id)
            }
            Err(e) => {
                self.malformed(node, e.to_string());
                None
            }
        }
    }

    fn qualify(&self, scope: &Scope, kind: SyntaxKind, name: Option<&str>) -> Option<Name> {
        if scope.local {
            return None;
        }
        let name = name?;
        let container = match &scope.qualifier {
            Qualifier::Root => None,
            Qualifier::Prefix(prefix) => Some(prefix.as_str()),
            Qualifier::Unavailable => return None,
        };
        Some(Name::new(
            self.naming
                .qualify(container, scope.parent_syntax, kind, name),
        ))
    }

    fn super_names(&mut self, node: &DetailedNode) -> Vec<Name> {
        let mut names = Vec::new();
        for entry in node.children_of_kind(SyntaxKind::SuperTypeEntry) {
            match entry.text.as_deref().and_then(|t| self.super_name(t)) {
                Some(name) => names.push(name),
                None => self.malformed(entry, "unreadable supertype reference"),
            }
        }
        names
    }

    /// Short name of a supertype reference: `a.b.Comparable<T>` becomes
    /// `Comparable`, `Base()` becomes `Base`.
    fn super_name(&self, text: &str) -> Option<Name> {
        let end = text
            .find(|c: char| c == '<' || c == '(' || c.is_whitespace())
            .unwrap_or(text.len());
        let reference = text[..end].trim_end_matches('?');
        let short = self.naming.short_name(reference);
        (!short.is_empty()).then(|| Name::new(short))
    }

    fn value_class(&mut self, node: &DetailedNode) -> Option<ValueClassRepresentation> {
        let is_inline_modifier = node.has_modifier(Modifier::Inline);
        if !is_inline_modifier && !node.has_modifier(Modifier::Value) {
            return None;
        }

        let type_params: Vec<&str> = node
            .children_of_kind(SyntaxKind::TypeParameter)
            .filter_map(|p| p.name.as_deref())
            .collect();
        let mut types = Vec::new();
        let mut parameters = 0usize;
        for param in node.children_of_kind(SyntaxKind::ValueParameter) {
            parameters += 1;
            match param
                .text
                .as_deref()
                .and_then(|text| TypeBean::parse(text, &type_params))
            {
                Some(bean) => types.push(bean),
                None => self.malformed(param, "unreadable value class parameter type"),
            }
        }
        if parameters == 0 {
            self.malformed(node, "value class without an underlying type");
        }

        let is_inline = is_inline_modifier || parameters <= 1;
        Some(ValueClassRepresentation::new(is_inline, types))
    }
}

fn non_empty(name: Option<&str>) -> Option<Name> {
    name.filter(|n| !n.is_empty()).map(Name::new)
}
