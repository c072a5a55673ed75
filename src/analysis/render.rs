//! Normalized re-serialization of Python statement subtrees.
//!
//! Compound statements are rebuilt from their header text and block
//! statements with 4-space indentation, one statement per line. Comments and
//! blank lines are dropped. Simple statements keep their source text; only
//! their first line is re-indented, so multi-line string literals and
//! bracketed continuations come out unchanged.

use phf::phf_set;
use tree_sitter::Node;

use super::ParsedSource;

const INDENT: &str = "    ";

/// Clause nodes rendered at the level of the statement that owns them.
static CLAUSE_KINDS: phf::Set<&'static str> = phf_set! {
    "elif_clause",
    "else_clause",
    "except_clause",
    "except_group_clause",
    "finally_clause",
    "case_clause",
};

/// Render a statement (usually a function definition) as normalized text.
///
/// The result always ends with a newline.
pub fn render(parsed: &ParsedSource, node: Node) -> String {
    let mut lines = Vec::new();
    render_statement(parsed, node, 0, &mut lines);
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn render_statement(parsed: &ParsedSource, node: Node, depth: usize, lines: &mut Vec<String>) {
    match node.kind() {
        "comment" => {}
        "decorated_definition" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                match child.kind() {
                    "comment" => {}
                    "decorator" => push_fragment(parsed.node_text(child), depth, lines),
                    _ => render_statement(parsed, child, depth, lines),
                }
            }
        }
        _ if has_block(node) => render_compound(parsed, node, depth, lines),
        _ => push_fragment(parsed.node_text(node), depth, lines),
    }
}

fn has_block(node: Node) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|child| child.kind() == "block");
    found
}

fn render_compound(parsed: &ParsedSource, node: Node, depth: usize, lines: &mut Vec<String>) {
    // Byte range of the header tokens seen since the last block.
    let mut header: Option<(usize, usize)> = None;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "comment" => {}
            "block" => {
                if let Some((start, end)) = header.take() {
                    push_fragment(&parsed.source[start..end], depth, lines);
                }
                let mut block_cursor = child.walk();
                for statement in child.named_children(&mut block_cursor) {
                    render_statement(parsed, statement, depth + 1, lines);
                }
            }
            kind if CLAUSE_KINDS.contains(kind) => {
                if let Some((start, end)) = header.take() {
                    push_fragment(&parsed.source[start..end], depth, lines);
                }
                render_statement(parsed, child, depth, lines);
            }
            _ => {
                let start = header.map_or(child.start_byte(), |(start, _)| start);
                header = Some((start, child.end_byte()));
            }
        }
    }

    if let Some((start, end)) = header {
        push_fragment(&parsed.source[start..end], depth, lines);
    }
}

fn push_fragment(text: &str, depth: usize, lines: &mut Vec<String>) {
    let text = text.trim_end();
    if text.is_empty() {
        return;
    }

    let mut parts = text.split('\n');
    if let Some(first) = parts.next() {
        lines.push(format!("{}{}", INDENT.repeat(depth), first.trim()));
    }
    for rest in parts {
        lines.push(rest.trim_end_matches('\r').to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::SourceParser;

    fn render_first(source: &str) -> String {
        let parsed = SourceParser::new().parse(source).unwrap();
        let node = parsed.root().named_child(0).unwrap();
        render(&parsed, node)
    }

    #[test]
    fn test_one_line_body_is_split() {
        assert_eq!(render_first("def f(): return 1\n"), "def f():\n    return 1\n");
    }

    #[test]
    fn test_comments_and_blank_lines_dropped() {
        let source = r#"
def f(x):  # header comment
    # leading comment
    y = x + 1

    return y  # trailing
"#;
        assert_eq!(render_first(source), "def f(x):\n    y = x + 1\n    return y\n");
    }

    #[test]
    fn test_indentation_normalized() {
        let source = "def f(x):\n  if x:\n        return 1\n  else:\n        return 2\n";
        assert_eq!(
            render_first(source),
            "def f(x):\n    if x:\n        return 1\n    else:\n        return 2\n"
        );
    }

    #[test]
    fn test_clauses_stay_at_statement_level() {
        let source = r#"
def f(items):
    try:
        for item in items:
            pass
        else:
            return None
    except ValueError as exc:
        raise exc
    finally:
        items.clear()
"#;
        let expected = "def f(items):\n    try:\n        for item in items:\n            pass\n        else:\n            return None\n    except ValueError as exc:\n        raise exc\n    finally:\n        items.clear()\n";
        assert_eq!(render_first(source), expected);
    }

    #[test]
    fn test_elif_chain() {
        let source = "def sign(x):\n    if x > 0:\n        return 1\n    elif x < 0:\n        return -1\n    else:\n        return 0\n";
        assert_eq!(render_first(source), source);
    }

    #[test]
    fn test_semicolons_become_lines() {
        assert_eq!(render_first("def f():\n    a = 1; b = 2\n"), "def f():\n    a = 1\n    b = 2\n");
    }

    #[test]
    fn test_multiline_string_preserved() {
        let source = "def f():\n    text = \"\"\"first\n  second\n\"\"\"\n    return text\n";
        assert_eq!(render_first(source), source);
    }

    #[test]
    fn test_decorators_on_own_lines() {
        let source = "@cache\n@route('/x')\ndef handler(): pass\n";
        assert_eq!(render_first(source), "@cache\n@route('/x')\ndef handler():\n    pass\n");
    }

    #[test]
    fn test_nested_definition_reindented() {
        let source = "class A:\n        def m(self):\n                return self\n";
        let parsed = SourceParser::new().parse(source).unwrap();
        let class = parsed.root().named_child(0).unwrap();
        let body = class.child_by_field_name("body").unwrap();
        let method = body.named_child(0).unwrap();
        assert_eq!(render(&parsed, method), "def m(self):\n    return self\n");
    }
}
