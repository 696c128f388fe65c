//! Lowering of tree-sitter-java syntax into [`DetailedNode`] trees.
//!
//! Only the shapes the stub builder looks at are kept: type and member
//! declarations, supertype lists, type parameters, field initializers and
//! method bodies. Method bodies keep just the local classes they declare.

use stubscope_plugin::{DetailedNode, Modifier, SyntaxKind, TextRange};
use tree_sitter::Node;

const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

pub(crate) struct Lowering<'a> {
    source: &'a str,
}

fn range(node: Node<'_>) -> TextRange {
    TextRange::new(node.start_byte() as u32, node.end_byte() as u32)
}

fn is_type_declaration(kind: &str) -> bool {
    TYPE_DECLARATIONS.contains(&kind)
}

impl<'a> Lowering<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self { source }
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        &self.source[node.byte_range()]
    }

    fn field_text(&self, node: Node<'_>, field: &str) -> Option<&'a str> {
        node.child_by_field_name(field).map(|n| self.text(n))
    }

    pub(crate) fn file(&self, root: Node<'_>) -> DetailedNode {
        let mut file = DetailedNode::new(SyntaxKind::File, range(root));
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            if child.kind() == "package_declaration" {
                if let Some(name) = self.package_name(child) {
                    file = file.with_name(name);
                }
            }
        }
        file.with_children(self.members(root))
    }

    fn package_name(&self, package: Node<'_>) -> Option<&'a str> {
        let mut cursor = package.walk();
        let name = package
            .named_children(&mut cursor)
            .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))?;
        Some(self.text(name))
    }

    /// Declarations directly inside a program or a type body.
    fn members(&self, body: Node<'_>) -> Vec<DetailedNode> {
        let mut out = Vec::new();
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            match child.kind() {
                kind if is_type_declaration(kind) => out.push(self.type_declaration(child)),
                "method_declaration"
                | "constructor_declaration"
                | "compact_constructor_declaration"
                | "annotation_type_element_declaration" => out.push(self.method(child)),
                "field_declaration" | "constant_declaration" => {
                    out.extend(self.fields(child, body.kind() == "interface_body"))
                }
                "enum_constant" => out.push(self.enum_constant(child)),
                "enum_body_declarations" => out.extend(self.members(child)),
                "ERROR" => out.push(
                    DetailedNode::new(SyntaxKind::Error, range(child))
                        .with_children(self.members(child)),
                ),
                _ => {}
            }
        }
        out
    }

    fn type_declaration(&self, node: Node<'_>) -> DetailedNode {
        let mut decl = DetailedNode::new(SyntaxKind::Class, range(node));
        if let Some(name) = self.field_text(node, "name") {
            decl = decl.with_name(name);
        }
        match node.kind() {
            "interface_declaration" | "annotation_type_declaration" => {
                decl = decl.with_modifier(Modifier::Interface)
            }
            "enum_declaration" => decl = decl.with_modifier(Modifier::Enum),
            _ => {}
        }

        decl = decl
            .with_children(self.type_parameters(node))
            .with_children(self.super_types(node));

        if node.kind() == "record_declaration" {
            decl = decl.with_children(self.record_components(node));
        }
        if let Some(body) = node.child_by_field_name("body") {
            decl = decl.with_children(self.members(body));
        }
        decl
    }

    fn is_final(&self, node: Node<'_>) -> bool {
        let mut cursor = node.walk();
        node.children(&mut cursor)
            .filter(|c| c.kind() == "modifiers")
            .any(|m| {
                let mut inner = m.walk();
                m.children(&mut inner).any(|t| t.kind() == "final")
            })
    }

    fn type_parameters(&self, node: Node<'_>) -> Vec<DetailedNode> {
        let Some(params) = node.child_by_field_name("type_parameters") else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            if param.kind() != "type_parameter" {
                continue;
            }
            let mut inner = param.walk();
            let ident = param
                .named_children(&mut inner)
                .find(|c| matches!(c.kind(), "type_identifier" | "identifier"));
            let mut lowered = DetailedNode::new(SyntaxKind::TypeParameter, range(param));
            if let Some(ident) = ident {
                lowered = lowered.with_name(self.text(ident));
            }
            out.push(lowered);
        }
        out
    }

    /// `extends` and `implements` clauses, in source order.
    fn super_types(&self, node: Node<'_>) -> Vec<DetailedNode> {
        let mut out = Vec::new();
        let mut cursor = node.walk();
        for clause in node.named_children(&mut cursor) {
            match clause.kind() {
                "superclass" => {
                    let mut inner = clause.walk();
                    if let Some(ty) = clause.named_children(&mut inner).next() {
                        out.push(self.super_type_entry(ty));
                    }
                }
                "super_interfaces" | "extends_interfaces" => {
                    let mut inner = clause.walk();
                    for list in clause.named_children(&mut inner) {
                        if list.kind() != "type_list" {
                            continue;
                        }
                        let mut types = list.walk();
                        for ty in list.named_children(&mut types) {
                            out.push(self.super_type_entry(ty));
                        }
                    }
                }
                _ => {}
            }
        }
        out
    }

    fn super_type_entry(&self, ty: Node<'_>) -> DetailedNode {
        DetailedNode::new(SyntaxKind::SuperTypeEntry, range(ty)).with_text(self.text(ty))
    }

    fn record_components(&self, node: Node<'_>) -> Vec<DetailedNode> {
        let Some(params) = node.child_by_field_name("parameters") else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            let Some(name) = self.field_text(param, "name") else {
                continue;
            };
            let mut property = DetailedNode::new(SyntaxKind::Property, range(param)).with_name(name);
            if let Some(ty) = param.child_by_field_name("type") {
                property = property.with_child(
                    DetailedNode::new(SyntaxKind::TypeReference, range(ty)).with_text(self.text(ty)),
                );
            }
            out.push(property);
        }
        out
    }

    fn enum_constant(&self, node: Node<'_>) -> DetailedNode {
        let mut entry = DetailedNode::new(SyntaxKind::EnumEntry, range(node));
        if let Some(name) = self.field_text(node, "name") {
            entry = entry.with_name(name);
        }
        if let Some(body) = node.child_by_field_name("body") {
            entry = entry.with_children(self.members(body));
        }
        entry
    }

    /// One property per declarator: `int a = 1, b;` declares two.
    fn fields(&self, node: Node<'_>, in_interface: bool) -> Vec<DetailedNode> {
        let ty = node.child_by_field_name("type");
        let var = !in_interface && node.kind() == "field_declaration" && !self.is_final(node);

        let mut out = Vec::new();
        let mut cursor = node.walk();
        for declarator in node.children_by_field_name("declarator", &mut cursor) {
            let mut property = DetailedNode::new(SyntaxKind::Property, range(declarator));
            if let Some(name) = self.field_text(declarator, "name") {
                property = property.with_name(name);
            }
            if var {
                property = property.with_modifier(Modifier::Var);
            }
            if let Some(ty) = ty {
                property = property.with_child(
                    DetailedNode::new(SyntaxKind::TypeReference, range(ty)).with_text(self.text(ty)),
                );
            }
            if let Some(value) = declarator.child_by_field_name("value") {
                property = property.with_child(
                    DetailedNode::new(SyntaxKind::Expression, range(value))
                        .with_text(self.text(value)),
                );
            }
            out.push(property);
        }
        out
    }

    fn method(&self, node: Node<'_>) -> DetailedNode {
        let mut function = DetailedNode::new(SyntaxKind::Function, range(node));
        if let Some(name) = self.field_text(node, "name") {
            function = function.with_name(name);
        }
        function = function.with_children(self.type_parameters(node));
        if let Some(ty) = node.child_by_field_name("type") {
            function = function.with_child(
                DetailedNode::new(SyntaxKind::TypeReference, range(ty)).with_text(self.text(ty)),
            );
        }
        if let Some(body) = node.child_by_field_name("body") {
            function = function.with_child(
                DetailedNode::new(SyntaxKind::Block, range(body))
                    .with_children(self.local_declarations(body)),
            );
        }
        function
    }

    /// Local classes declared anywhere in a method body. Anonymous class
    /// bodies are not entered.
    fn local_declarations(&self, node: Node<'_>) -> Vec<DetailedNode> {
        let mut out = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                kind if is_type_declaration(kind) => out.push(self.type_declaration(child)),
                "ERROR" => out.push(
                    DetailedNode::new(SyntaxKind::Error, range(child))
                        .with_children(self.local_declarations(child)),
                ),
                "class_body" | "lambda_expression" => {}
                _ => out.extend(self.local_declarations(child)),
            }
        }
        out
    }
}
