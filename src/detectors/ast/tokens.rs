//! detectors/ast/tokens.rs
//!
//! Flattened, tagged token profile used by the token-similarity metric.

use super::ast::{constant_type, is_fstring, is_name_reference, node_text, parse_python, walk_breadth_first};

pub const NAME_TAG: &str = "NAME";
pub const FUNC_TAG: &str = "FUNC";
pub const CLASS_TAG: &str = "CLASS";
pub const CONST_TAG: &str = "CONST";

/// Breadth-first token profile: `NAME:<id>`, `FUNC:<name>`,
/// `CLASS:<name>`, `CONST:<type>`. Empty when the source does not parse.
pub fn extract_token_profile(source: &str) -> Vec<String> {
    let Some(tree) = parse_python(source) else {
        return Vec::new();
    };

    let mut tokens = Vec::new();

    walk_breadth_first(tree.root_node(), |node| match node.kind() {
        "identifier" => {
            if is_name_reference(node) {
                tokens.push(format!("{NAME_TAG}:{}", node_text(node, source)));
            }
            false
        }
        "function_definition" | "class_definition" => {
            let tag = if node.kind() == "function_definition" {
                FUNC_TAG
            } else {
                CLASS_TAG
            };
            if let Some(name) = node.child_by_field_name("name") {
                tokens.push(format!("{tag}:{}", node_text(name, source)));
            }
            true
        }
        "string" | "concatenated_string" => {
            if let Some(ty) = constant_type(node, source) {
                tokens.push(format!("{CONST_TAG}:{ty}"));
                return false;
            }
            // f-string: only the interpolated expressions carry tokens
            node.kind() == "concatenated_string" || is_fstring(node, source)
        }
        "string_content" | "string_start" | "string_end" | "escape_sequence" => false,
        _ => {
            if let Some(ty) = constant_type(node, source) {
                tokens.push(format!("{CONST_TAG}:{ty}"));
                return false;
            }
            true
        }
    });

    tokens
}
