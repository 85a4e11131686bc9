//! detectors/ast/ast.rs
//!
//! Tree-sitter plumbing shared by structure and token extraction.

use std::cell::RefCell;
use std::collections::VecDeque;

use tree_sitter::{Node, Parser, Tree};

thread_local! {
    static PY_PARSER: RefCell<Option<Parser>> = RefCell::new(make_python_parser());
}

fn make_python_parser() -> Option<Parser> {
    let mut p = Parser::new();
    match p.set_language(&tree_sitter_python::language()) {
        Ok(()) => Some(p),
        Err(e) => {
            tracing::error!(error = %e, "python grammar rejected by tree-sitter");
            None
        }
    }
}

/// Parse Python source.
///
/// Returns `None` when tree-sitter gives up or recovers with ERROR/MISSING
/// nodes anywhere in the tree; callers treat both as "does not parse".
pub fn parse_python(source: &str) -> Option<Tree> {
    let tree = PY_PARSER.with(|p| p.borrow_mut().as_mut()?.parse(source, None))?;

    if tree.root_node().has_error() {
        tracing::trace!(bytes = source.len(), "candidate has syntax errors");
        return None;
    }

    Some(tree)
}

pub fn node_text<'s>(node: Node, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Breadth-first walk over named nodes.
///
/// `visit` returns whether the walk should descend into the node.
pub fn walk_breadth_first<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>) -> bool) {
    let mut queue = VecDeque::from([root]);

    while let Some(node) = queue.pop_front() {
        if !visit(node) {
            continue;
        }
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() != "comment" {
                queue.push_back(child);
            }
        }
    }
}

fn is_field<'t>(parent: Node<'t>, field: &str, node: Node<'t>) -> bool {
    parent.child_by_field_name(field).map_or(false, |n| n == node)
}

fn is_except_target(node: Node) -> bool {
    node.prev_sibling()
        .map_or(false, |prev| matches!(prev.kind(), "as" | ","))
}

fn is_parameter_list(kind: &str) -> bool {
    matches!(kind, "parameters" | "lambda_parameters")
}

/// Whether an `identifier` node is a variable reference (load or store),
/// as opposed to a definition name, parameter, attribute or import path.
pub fn is_name_reference(node: Node) -> bool {
    let Some(parent) = node.parent() else {
        return true;
    };

    match parent.kind() {
        "function_definition" | "class_definition" => !is_field(parent, "name", node),
        "attribute" => !is_field(parent, "attribute", node),
        "keyword_argument" => !is_field(parent, "name", node),
        "default_parameter" | "typed_default_parameter" => !is_field(parent, "name", node),
        "typed_parameter" => false,
        "list_splat_pattern" | "dictionary_splat_pattern" => !parent
            .parent()
            .map_or(false, |gp| is_parameter_list(gp.kind()) || gp.kind() == "typed_parameter"),
        "dotted_name" | "aliased_import" | "global_statement" | "nonlocal_statement" => false,
        // `except E as e` binds a plain name, not a variable reference
        "except_clause" => !is_except_target(node),
        "as_pattern_target" => !parent
            .parent()
            .and_then(|p| p.parent())
            .map_or(false, |gp| gp.kind() == "except_clause"),
        kind if is_parameter_list(kind) => false,
        _ => true,
    }
}

/// Python type name of a literal node, `None` when the node is not a
/// plain constant (f-strings are not constants).
pub fn constant_type(node: Node, source: &str) -> Option<&'static str> {
    match node.kind() {
        "integer" | "float" => {
            let text = node_text(node, source);
            if text.ends_with('j') || text.ends_with('J') {
                Some("complex")
            } else if node.kind() == "integer" {
                Some("int")
            } else {
                Some("float")
            }
        }
        "true" | "false" => Some("bool"),
        "none" => Some("NoneType"),
        "ellipsis" => Some("ellipsis"),
        "string" => string_type(node, source),
        "concatenated_string" => {
            let mut cursor = node.walk();
            let parts: Vec<_> = node
                .named_children(&mut cursor)
                .filter(|c| c.kind() == "string")
                .map(|c| string_type(c, source))
                .collect();
            if parts.iter().any(Option::is_none) {
                None
            } else {
                parts.first().copied().flatten()
            }
        }
        _ => None,
    }
}

fn string_type(node: Node, source: &str) -> Option<&'static str> {
    let prefix = string_prefix(node, source);
    if prefix.contains('f') {
        None
    } else if prefix.contains('b') {
        Some("bytes")
    } else {
        Some("str")
    }
}

fn string_prefix(node: Node, source: &str) -> String {
    let mut cursor = node.walk();
    let start = node
        .children(&mut cursor)
        .find(|c| c.kind() == "string_start")
        .map(|c| node_text(c, source))
        .unwrap_or_else(|| node_text(node, source));

    start
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_lowercase()
}

pub fn is_fstring(node: Node, source: &str) -> bool {
    node.kind() == "string" && string_prefix(node, source).contains('f')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_python() {
        assert!(parse_python("def f(x):\n    return x\n").is_some());
        assert!(parse_python("").is_some());
    }

    #[test]
    fn rejects_broken_python() {
        assert!(parse_python("def f(:\n    return").is_none());
        assert!(parse_python("this is not ) python (").is_none());
    }

    #[test]
    fn breadth_first_visits_outer_before_inner() {
        let src = "def outer():\n    def inner():\n        pass\n";
        let tree = parse_python(src).unwrap();
        let mut names = Vec::new();
        walk_breadth_first(tree.root_node(), |n| {
            if n.kind() == "function_definition" {
                if let Some(name) = n.child_by_field_name("name") {
                    names.push(node_text(name, src).to_string());
                }
            }
            true
        });
        assert_eq!(names, vec!["outer", "inner"]);
    }
}
