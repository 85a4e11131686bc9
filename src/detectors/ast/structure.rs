//! detectors/ast/structure.rs
//!
//! Structural summary extraction: function/class definitions, imports,
//! control flow and expression-statement kinds.

use tree_sitter::Node;

use super::ast::{constant_type, node_text, parse_python, walk_breadth_first};
use crate::types::{ClassDef, FunctionDef, StructuralSummary};

/// Best-effort structural fingerprint. Never fails: source that does not
/// parse yields the all-empty summary.
pub fn extract_structure(source: &str) -> StructuralSummary {
    let Some(tree) = parse_python(source) else {
        return StructuralSummary::default();
    };

    let mut summary = StructuralSummary::default();

    walk_breadth_first(tree.root_node(), |node| {
        match node.kind() {
            "function_definition" => summary.function_defs.push(function_def(node, source)),
            "class_definition" => summary.classes.push(class_def(node, source)),
            "import_statement" => summary.imports.extend(plain_imports(node, source)),
            "import_from_statement" => summary.imports.push(from_import(node, source)),
            "if_statement" | "elif_clause" => summary.control_flow.push("If".into()),
            "for_statement" => summary.control_flow.push("For".into()),
            "while_statement" => summary.control_flow.push("While".into()),
            "expression_statement" => {
                if let Some(kind) = expression_statement_kind(node, source) {
                    summary.expressions.push(kind);
                }
            }
            _ => {}
        }
        true
    });

    summary
}

/* ============================================================
   Definitions
   ============================================================ */

fn function_def(node: Node, source: &str) -> FunctionDef {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, source).to_string())
        .unwrap_or_default();

    let arg_count = node
        .child_by_field_name("parameters")
        .map(positional_arg_count)
        .unwrap_or(0);

    FunctionDef {
        name,
        arg_count,
        decorator_count: decorator_count(node),
    }
}

/// Ordinary positional-or-keyword parameters only: anything before `/`
/// is positional-only and anything after `*`/`*args` is keyword-only.
fn positional_arg_count(params: Node) -> usize {
    let mut count = 0;
    let mut cursor = params.walk();

    for child in params.named_children(&mut cursor) {
        match child.kind() {
            "identifier" | "default_parameter" | "typed_default_parameter" => count += 1,
            "typed_parameter" => {
                let mut inner = child.walk();
                let splat = child.named_children(&mut inner).any(|c| {
                    matches!(c.kind(), "list_splat_pattern" | "dictionary_splat_pattern")
                });
                if splat {
                    break;
                }
                count += 1;
            }
            "positional_separator" => count = 0,
            "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator" => break,
            _ => {}
        }
    }

    count
}

fn decorator_count(def: Node) -> usize {
    let Some(parent) = def.parent() else {
        return 0;
    };
    if parent.kind() != "decorated_definition" {
        return 0;
    }

    let mut cursor = parent.walk();
    let count = parent
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "decorator")
        .count();
    count
}

fn class_def(node: Node, source: &str) -> ClassDef {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, source).to_string())
        .unwrap_or_default();

    let base_count = node
        .child_by_field_name("superclasses")
        .map(|args| {
            let mut cursor = args.walk();
            let count = args
                .named_children(&mut cursor)
                .filter(|c| {
                    !matches!(
                        c.kind(),
                        "keyword_argument" | "dictionary_splat" | "comment"
                    )
                })
                .count();
            count
        })
        .unwrap_or(0);

    ClassDef { name, base_count }
}

/* ============================================================
   Imports
   ============================================================ */

fn imported_name(node: Node, source: &str) -> String {
    match node.kind() {
        "aliased_import" => node
            .child_by_field_name("name")
            .map(|n| node_text(n, source).to_string())
            .unwrap_or_default(),
        "wildcard_import" => "*".to_string(),
        _ => node_text(node, source).to_string(),
    }
}

/// `import a, b.c as d` -> `["a", "b.c"]`
fn plain_imports(node: Node, source: &str) -> Vec<String> {
    let mut cursor = node.walk();
    let names = node
        .children_by_field_name("name", &mut cursor)
        .map(|n| imported_name(n, source))
        .collect();
    names
}

/// `from m import x, y` -> `"m.x, y"`; a bare relative module renders as
/// `None`.
fn from_import(node: Node, source: &str) -> String {
    let module_node = node.child_by_field_name("module_name");

    let module = module_node
        .map(|n| node_text(n, source).trim_start_matches('.').to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "None".to_string());

    let mut cursor = node.walk();
    let names: Vec<String> = node
        .named_children(&mut cursor)
        .filter(|c| Some(*c) != module_node)
        .filter(|c| matches!(c.kind(), "dotted_name" | "aliased_import" | "wildcard_import"))
        .map(|c| imported_name(c, source))
        .collect();

    format!("{}.{}", module, names.join(", "))
}

/* ============================================================
   Expression statements
   ============================================================ */

/// Kind of the value of an expression statement, named after the
/// corresponding Python `ast` class. Assignments are statements of their
/// own and yield `None`.
fn expression_statement_kind(node: Node, source: &str) -> Option<String> {
    let mut cursor = node.walk();
    let values: Vec<Node> = node
        .named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect();

    match values.as_slice() {
        [] => None,
        [single] => match single.kind() {
            "assignment" | "augmented_assignment" => None,
            _ => Some(expression_kind(*single, source)),
        },
        _ => Some("Tuple".to_string()),
    }
}

pub(crate) fn expression_kind(node: Node, source: &str) -> String {
    if constant_type(node, source).is_some() {
        return "Constant".to_string();
    }

    let name = match node.kind() {
        "parenthesized_expression" => {
            let mut cursor = node.walk();
            let inner = node
                .named_children(&mut cursor)
                .find(|c| c.kind() != "comment");
            return match inner {
                Some(inner) => expression_kind(inner, source),
                None => "Tuple".to_string(),
            };
        }
        "string" | "concatenated_string" => "JoinedStr",
        "call" => "Call",
        "identifier" => "Name",
        "attribute" => "Attribute",
        "subscript" => "Subscript",
        "await" => "Await",
        "yield" => "Yield",
        "binary_operator" => "BinOp",
        "boolean_operator" => "BoolOp",
        "comparison_operator" => "Compare",
        "not_operator" | "unary_operator" => "UnaryOp",
        "lambda" => "Lambda",
        "conditional_expression" => "IfExp",
        "list" => "List",
        "tuple" | "expression_list" => "Tuple",
        "dictionary" => "Dict",
        "set" => "Set",
        "list_comprehension" => "ListComp",
        "set_comprehension" => "SetComp",
        "dictionary_comprehension" => "DictComp",
        "generator_expression" => "GeneratorExp",
        "named_expression" => "NamedExpr",
        "list_splat" => "Starred",
        other => return camel_case(other),
    };

    name.to_string()
}

fn camel_case(kind: &str) -> String {
    kind.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
