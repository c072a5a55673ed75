//! Function definition extraction.

use lazy_static::lazy_static;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor};

use super::facts::{line_complexity, FunctionRecord, LineSpan};
use super::parser::{DiagnosticSink, ParseError, ParsedSource, SourceParser, PYTHON};
use super::{docstring, render};

/// Tree-sitter query matching every function definition, nested ones and
/// methods included. Coroutines match too and are filtered out afterwards.
const FUNCTION_QUERY_SOURCE: &str = r#"
(function_definition
  name: (identifier)
) @function
"#;

lazy_static! {
    static ref FUNCTION_QUERY: Query =
        Query::new(&PYTHON, FUNCTION_QUERY_SOURCE).expect("function query must compile");
}

/// Extract every plain `def` from source text, in document order.
///
/// `async def` definitions are not extracted, though plain functions nested
/// inside them are.
///
/// A syntax error is reported to `sink` exactly once and yields no records.
/// Other parse failures yield no records silently.
pub fn extract_functions(source: &str, sink: &mut dyn DiagnosticSink) -> Vec<FunctionRecord> {
    let parsed = match SourceParser::new().parse(source) {
        Ok(parsed) => parsed,
        Err(ParseError::Syntax(err)) => {
            sink.report(&err);
            return Vec::new();
        }
        Err(err) => {
            tracing::debug!(error = %err, "skipping unparsed source");
            return Vec::new();
        }
    };

    functions_in(&parsed)
}

/// Extract function records from an already parsed source.
pub fn functions_in(parsed: &ParsedSource) -> Vec<FunctionRecord> {
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&FUNCTION_QUERY, parsed.root(), parsed.source.as_bytes());

    let mut functions = Vec::new();
    while let Some(m) = matches.next() {
        for capture in m.captures {
            if FUNCTION_QUERY.capture_names()[capture.index as usize] != "function" {
                continue;
            }
            if is_coroutine(capture.node) {
                continue;
            }
            functions.push(build_record(parsed, capture.node));
        }
    }
    functions
}

fn is_coroutine(node: Node) -> bool {
    node.child(0).is_some_and(|first| first.kind() == "async")
}

/// The statement whose rendering becomes the record's code: the decorated
/// definition when decorators are present.
fn code_root(node: Node) -> Node {
    match node.parent() {
        Some(parent) if parent.kind() == "decorated_definition" => parent,
        _ => node,
    }
}

fn build_record(parsed: &ParsedSource, node: Node) -> FunctionRecord {
    let name = node
        .child_by_field_name("name")
        .map(|n| parsed.node_text(n).to_string())
        .unwrap_or_default();

    let args = node
        .child_by_field_name("parameters")
        .map(|params| positional_names(parsed, params))
        .unwrap_or_default();

    let docstring = node
        .child_by_field_name("body")
        .and_then(|body| docstring::extract(parsed, body));

    let span = LineSpan::of_definition(node);
    let code = render::render(parsed, code_root(node));
    let complexity = line_complexity(&code);

    FunctionRecord {
        name,
        args,
        docstring,
        lineno: span.start_line,
        length: Some(span.length()),
        code,
        complexity,
    }
}

/// Names of positional-or-keyword parameters.
///
/// Positional-only parameters (before `/`), `*args`, keyword-only parameters
/// and `**kwargs` are not included.
fn positional_names(parsed: &ParsedSource, params: Node) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = params.walk();

    for param in params.named_children(&mut cursor) {
        match param.kind() {
            "identifier" => names.push(parsed.node_text(param).to_string()),
            "typed_parameter" => match param.named_child(0) {
                Some(inner) if inner.kind() == "identifier" => {
                    names.push(parsed.node_text(inner).to_string())
                }
                _ => break,
            },
            "default_parameter" | "typed_default_parameter" => {
                if let Some(name) = param.child_by_field_name("name") {
                    if name.kind() == "identifier" {
                        names.push(parsed.node_text(name).to_string());
                    }
                }
            }
            "positional_separator" => names.clear(),
            "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator" => break,
            _ => {}
        }
    }

    names
}
