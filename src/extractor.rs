// src/extractor.rs

//! Java source → type elements.
//!
//! Extraction is a pure function of the source text: it returns the
//! declarations it found and leaves placing them into a package tree to
//! the caller.

use crate::error::{HistoryError, Result};
use crate::model::{AttributeElement, OperationElement, TypeElement, TypeKind};
use tree_sitter::{Node, Parser};
use tracing::debug;

pub struct SourceModelExtractor {
    parser: Parser,
}

impl SourceModelExtractor {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::language())
            .map_err(|err| HistoryError::parse("<java grammar>", err.to_string()))?;
        Ok(SourceModelExtractor { parser })
    }

    /// Extracts every type declared in `source`, in declaration order.
    pub fn extract(&mut self, path: &str, source: &[u8]) -> Result<Vec<TypeElement>> {
        let text = std::str::from_utf8(source)
            .map_err(|err| HistoryError::parse(path, format!("not valid UTF-8: {err}")))?;
        let tree = self
            .parser
            .parse(text, None)
            .ok_or_else(|| HistoryError::parse(path, "parser gave up"))?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(HistoryError::parse(path, syntax_error_location(root)));
        }

        let Some(package) = package_name(root, text) else {
            debug!(path, "no package declaration, skipping file");
            return Ok(Vec::new());
        };

        let mut types = Vec::new();
        collect_types(root, text, &package, &mut types);
        Ok(types)
    }
}

fn syntax_error_location(root: Node<'_>) -> String {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let pos = node.start_position();
            return format!("syntax error at line {}, column {}", pos.row + 1, pos.column + 1);
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).filter(|c| c.has_error()).collect();
        stack.extend(children.into_iter().rev());
    }
    "syntax error".to_string()
}

fn text_of<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    &source[node.byte_range()]
}

fn package_name(root: Node<'_>, source: &str) -> Option<String> {
    let mut cursor = root.walk();
    let declaration = root
        .children(&mut cursor)
        .find(|c| c.kind() == "package_declaration")?;

    let mut cursor = declaration.walk();
    let name = declaration
        .children(&mut cursor)
        .find(|c| c.kind() == "scoped_identifier" || c.kind() == "identifier")
        .map(|n| text_of(n, source).split_whitespace().collect::<String>())?;

    (!name.is_empty()).then_some(name)
}

fn type_kind(node: Node<'_>) -> Option<TypeKind> {
    match node.kind() {
        "class_declaration" => Some(TypeKind::Class),
        "interface_declaration" => Some(TypeKind::Interface),
        "enum_declaration" => Some(TypeKind::Enum),
        _ => None,
    }
}

/// Types that are not modelled but still name a scope for what they contain
fn is_scope_only(node: Node<'_>) -> bool {
    matches!(node.kind(), "record_declaration" | "annotation_type_declaration")
}

/// Depth-first search for type declarations below `node`, in declaration
/// order. Nested types are named after their enclosing types, `Outer.Inner`.
///
/// Uses an explicit worklist; expression trees can be far deeper than the
/// thread stack allows.
fn collect_types(node: Node<'_>, source: &str, package: &str, out: &mut Vec<TypeElement>) {
    // enclosing-type prefixes, "" for top level
    let mut scopes = vec![String::new()];
    let mut stack = vec![(node, 0usize)];
    let mut cursor = node.walk();

    while let Some((current, scope)) = stack.pop() {
        let mut inner_scope = scope;
        let mut descend_into = Some(current);

        if type_kind(current).is_some() || is_scope_only(current) {
            let name = current.child_by_field_name("name").map(|n| text_of(n, source));
            let body = current.child_by_field_name("body");
            descend_into = None;

            if let Some(name) = name {
                let qualified = if scopes[scope].is_empty() {
                    name.to_string()
                } else {
                    format!("{}.{}", scopes[scope], name)
                };

                match type_kind(current) {
                    Some(kind @ (TypeKind::Class | TypeKind::Interface)) => {
                        let mut element = TypeElement::new(kind, qualified.clone(), package);
                        if let Some(body) = body {
                            element.attributes = attributes(body, source);
                            element.operations = operations(body, source);
                        }
                        out.push(element);
                    }
                    Some(TypeKind::Enum) => out.push(TypeElement::new(TypeKind::Enum, qualified.clone(), package)),
                    None => {}
                }

                scopes.push(qualified);
                inner_scope = scopes.len() - 1;
                descend_into = body;
            }
        }

        if let Some(parent) = descend_into {
            let children: Vec<_> = parent.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev().map(|child| (child, inner_scope)));
        }
    }
}

fn attributes(body: Node<'_>, source: &str) -> Vec<AttributeElement> {
    let mut result = Vec::new();
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        if !matches!(member.kind(), "field_declaration" | "constant_declaration") {
            continue;
        }
        let Some(declared) = member.child_by_field_name("type").map(|t| text_of(t, source)) else {
            continue;
        };

        let mut declarators = member.walk();
        for declarator in member.children_by_field_name("declarator", &mut declarators) {
            let Some(name) = declarator.child_by_field_name("name") else {
                continue;
            };
            let dims = declarator
                .child_by_field_name("dimensions")
                .map(|d| text_of(d, source).split_whitespace().collect::<String>())
                .unwrap_or_default();
            result.push(AttributeElement {
                name: text_of(name, source).to_string(),
                type_name: format!("{declared}{dims}"),
            });
        }
    }
    result
}

fn operations(body: Node<'_>, source: &str) -> Vec<OperationElement> {
    let mut cursor = body.walk();
    body.named_children(&mut cursor)
        .filter(|member| member.kind() == "method_declaration")
        .filter_map(|method| method.child_by_field_name("name"))
        .map(|name| OperationElement {
            name: text_of(name, source).to_string(),
        })
        .collect()
}
