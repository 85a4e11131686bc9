use similar::{ChangeTag, TextDiff};

use crate::types::{ClassDef, FunctionDef, StructuralSummary};

/// Field name -> list-literal rendering, in a fixed order. Every field is a
/// list; two summaries are compared field by field over these strings.
pub fn structure_fields(s: &StructuralSummary) -> Vec<(&'static str, String)> {
    vec![
        ("function_defs", render_list(&s.function_defs, render_function)),
        ("classes", render_list(&s.classes, render_class)),
        ("imports", render_list(&s.imports, |i| quote(i))),
        ("control_flow", render_list(&s.control_flow, |c| quote(c))),
        ("expressions", render_list(&s.expressions, |e| quote(e))),
    ]
}

fn render_list<T>(items: &[T], render: impl Fn(&T) -> String) -> String {
    let inner: Vec<String> = items.iter().map(render).collect();
    format!("[{}]", inner.join(", "))
}

fn render_function(f: &FunctionDef) -> String {
    format!(
        "{{'name': {}, 'args': {}, 'decorators': {}}}",
        quote(&f.name),
        f.arg_count,
        f.decorator_count
    )
}

fn render_class(c: &ClassDef) -> String {
    format!("{{'name': {}, 'bases': {}}}", quote(&c.name), c.base_count)
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Line diff between two candidates, for the single-task detail view.
pub fn pretty_diff(
    before: Option<&str>,
    after: Option<&str>,
) -> String {
    match (before, after) {
        (Some(b), Some(a)) => {
            let diff = TextDiff::from_lines(b, a);
            let mut out = String::new();

            for change in diff.iter_all_changes() {
                let sign = match change.tag() {
                    ChangeTag::Delete => "-",
                    ChangeTag::Insert => "+",
                    ChangeTag::Equal => " ",
                };
                out.push_str(sign);
                out.push_str(change.value());
                if change.missing_newline() {
                    out.push('\n');
                }
            }

            out
        }

        (None, Some(a)) => format!("+{}", a),
        (Some(b), None) => format!("-{}", b),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_python_style_lists() {
        let s = StructuralSummary {
            function_defs: vec![FunctionDef {
                name: "f".into(),
                arg_count: 1,
                decorator_count: 0,
            }],
            imports: vec!["os".into()],
            ..Default::default()
        };

        let fields = structure_fields(&s);
        assert_eq!(fields.len(), 5);
        assert_eq!(
            fields[0],
            (
                "function_defs",
                "[{'name': 'f', 'args': 1, 'decorators': 0}]".to_string()
            )
        );
        assert_eq!(fields[1].1, "[]");
        assert_eq!(fields[2].1, "['os']");
    }

    #[test]
    fn diff_marks_changed_lines() {
        let d = pretty_diff(Some("a\nb\n"), Some("a\nc\n"));
        assert_eq!(d, " a\n-b\n+c\n");
        assert_eq!(pretty_diff(None, None), "");
    }
}
