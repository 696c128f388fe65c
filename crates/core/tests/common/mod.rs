//! Line-oriented toy parser shared by the integration tests.
//!
//! Understands one declaration per line:
//! `package a.b`, `class Name`, `val name = expr`, `var name by expr`,
//! `fun name() = expr`, `fun name() { }` and `fun name()`.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use stubscope_plugin::{
    BoxError, DetailedNode, Modifier, ParseError, SourceParser, SyntaxKind, TextRange,
};

#[derive(Debug, Default)]
pub struct LineParser {
    calls: AtomicUsize,
}

impl LineParser {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn range(start: usize, len: usize) -> TextRange {
    TextRange::new(start as u32, (start + len) as u32)
}

fn declaration(line: &str, offset: usize) -> Option<DetailedNode> {
    let whole = range(offset, line.len());
    let (keyword, rest) = line.split_once(' ')?;
    let rest_offset = offset + keyword.len() + 1;

    match keyword {
        "class" => Some(DetailedNode::new(SyntaxKind::Class, whole).with_name(rest.trim())),
        "val" | "var" => {
            let mut node = DetailedNode::new(SyntaxKind::Property, whole);
            if keyword == "var" {
                node = node.with_modifier(Modifier::Var);
            }
            if let Some((name, expr)) = rest.split_once(" by ") {
                let expr_start = rest_offset + name.len() + 4;
                let delegate = DetailedNode::new(
                    SyntaxKind::PropertyDelegate,
                    range(expr_start - 3, expr.len() + 3),
                )
                .with_child(
                    DetailedNode::new(SyntaxKind::Expression, range(expr_start, expr.len()))
                        .with_text(expr),
                );
                Some(node.with_name(name.trim()).with_child(delegate))
            } else if let Some((name, expr)) = rest.split_once(" = ") {
                let expr_start = rest_offset + name.len() + 3;
                Some(
                    node.with_name(name.trim()).with_child(
                        DetailedNode::new(SyntaxKind::Expression, range(expr_start, expr.len()))
                            .with_text(expr),
                    ),
                )
            } else {
                Some(node.with_name(rest.trim()))
            }
        }
        "fun" => {
            let (name, tail) = rest.split_once("()")?;
            let node = DetailedNode::new(SyntaxKind::Function, whole).with_name(name.trim());
            let tail_offset = rest_offset + name.len() + 2;
            let tail_trimmed = tail.trim_start();
            let body_start = tail_offset + (tail.len() - tail_trimmed.len());
            if let Some(expr) = tail_trimmed.strip_prefix("= ") {
                Some(node.with_child(
                    DetailedNode::new(SyntaxKind::Expression, range(body_start + 2, expr.len()))
                        .with_text(expr),
                ))
            } else if tail_trimmed.starts_with('{') {
                Some(node.with_child(DetailedNode::new(
                    SyntaxKind::Block,
                    range(body_start, tail_trimmed.len()),
                )))
            } else {
                Some(node)
            }
        }
        _ => None,
    }
}

impl SourceParser for LineParser {
    fn name(&self) -> &str {
        "line"
    }

    fn parse(&self, path: &Path) -> Result<Arc<DetailedNode>, BoxError> {
        let source = std::fs::read_to_string(path).map_err(|e| ParseError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        self.parse_source(&source, path)
    }

    fn parse_source(&self, source: &str, _path: &Path) -> Result<Arc<DetailedNode>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut file = DetailedNode::new(SyntaxKind::File, range(0, source.len()));
        let mut offset = 0;
        for line in source.split_inclusive('\n') {
            let text = line.trim_end();
            if let Some(package) = text.strip_prefix("package ") {
                file = file.with_name(package.trim());
            } else if let Some(decl) = declaration(text, offset) {
                file = file.with_child(decl);
            }
            offset += line.len();
        }
        Ok(Arc::new(file))
    }
}
