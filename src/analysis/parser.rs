//! Python source parsing on top of tree-sitter.

use std::fmt;

use once_cell::sync::Lazy;
use thiserror::Error;
use tree_sitter::{Language, Node, Parser, Tree};

/// The tree-sitter Python grammar, loaded once.
pub(crate) static PYTHON: Lazy<Language> = Lazy::new(|| tree_sitter_python::LANGUAGE.into());

/// Location and description of the first syntax problem in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// Line of the offending token (1-indexed).
    pub line: usize,
    /// Column of the offending token (1-indexed).
    pub column: usize,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (line {}, column {})", self.message, self.line, self.column)
    }
}

/// Errors that can occur while parsing a source file.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("SyntaxError: {0}")]
    Syntax(SyntaxError),
    #[error("failed to load Python grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
    #[error("parser produced no tree")]
    NoTree,
}

/// Receives syntax errors reported by extractors.
pub trait DiagnosticSink {
    fn report(&mut self, error: &SyntaxError);
}

impl DiagnosticSink for Vec<SyntaxError> {
    fn report(&mut self, error: &SyntaxError) {
        self.push(error.clone());
    }
}

/// Sink that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, error: &SyntaxError) {
        tracing::error!(line = error.line, column = error.column, "SyntaxError: {}", error.message);
    }
}

/// A parsed source file: the tree plus the text it was parsed from.
pub struct ParsedSource {
    /// The tree-sitter parse tree.
    pub tree: Tree,
    /// The original source code (kept for node text extraction).
    pub source: String,
}

impl ParsedSource {
    /// Root node of the tree.
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Get text for a tree-sitter node.
    pub fn node_text(&self, node: Node) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }
}

/// Parses Python source text into syntax trees.
///
/// tree-sitter always produces a tree and marks broken regions with ERROR or
/// MISSING nodes; any such node makes the whole parse a [`ParseError::Syntax`].
/// So do constructs the grammar accepts but Python 3 rejects: Python 2
/// `print`/`exec` statements and a non-default parameter after a default one.
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceParser;

impl SourceParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse source text into a tree.
    pub fn parse(&self, source: &str) -> Result<ParsedSource, ParseError> {
        let mut parser = Parser::new();
        parser.set_language(&PYTHON)?;
        let tree = parser.parse(source, None).ok_or(ParseError::NoTree)?;

        let root = tree.root_node();
        if root.has_error() {
            let error = match first_error(root) {
                Some(node) => describe(node, source),
                None => SyntaxError {
                    line: 1,
                    column: 1,
                    message: "invalid syntax".to_string(),
                },
            };
            return Err(ParseError::Syntax(error));
        }
        if let Some(error) = first_rejected(root) {
            return Err(ParseError::Syntax(error));
        }

        Ok(ParsedSource {
            tree,
            source: source.to_string(),
        })
    }
}

/// Depth-first search for the first ERROR or MISSING node.
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    None
}

/// Depth-first search for the first construct that is valid for the grammar
/// but not for Python 3.
fn first_rejected(node: Node<'_>) -> Option<SyntaxError> {
    match node.kind() {
        "print_statement" => return Some(rejected_at(node, "Missing parentheses in call to 'print'")),
        "exec_statement" => return Some(rejected_at(node, "Missing parentheses in call to 'exec'")),
        "parameters" | "lambda_parameters" => {
            if let Some(param) = non_default_after_default(node) {
                return Some(rejected_at(param, "non-default argument follows default argument"));
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if let Some(found) = first_rejected(child) {
            return Some(found);
        }
    }
    None
}

/// A plain positional parameter following a defaulted one, before any `*`.
fn non_default_after_default(params: Node<'_>) -> Option<Node<'_>> {
    let mut seen_default = false;
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        match param.kind() {
            "default_parameter" | "typed_default_parameter" => seen_default = true,
            "identifier" | "typed_parameter" => {
                // `*args: T` is a typed_parameter wrapping a splat pattern
                let is_splat = param.kind() == "typed_parameter"
                    && param
                        .named_child(0)
                        .is_some_and(|inner| inner.kind() != "identifier");
                if is_splat {
                    return None;
                }
                if seen_default {
                    return Some(param);
                }
            }
            "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator" => return None,
            _ => {}
        }
    }
    None
}

fn rejected_at(node: Node, message: &str) -> SyntaxError {
    let position = node.start_position();
    SyntaxError {
        line: position.row + 1,
        column: position.column + 1,
        message: message.to_string(),
    }
}

fn describe(node: Node, source: &str) -> SyntaxError {
    let position = node.start_position();
    let message = if node.is_missing() {
        format!("expected '{}'", node.kind())
    } else {
        let text = node.utf8_text(source.as_bytes()).unwrap_or("");
        let near: String = text.lines().next().unwrap_or("").trim().chars().take(40).collect();
        if near.is_empty() {
            "invalid syntax".to_string()
        } else {
            format!("invalid syntax near '{}'", near)
        }
    };

    SyntaxError {
        line: position.row + 1,
        column: position.column + 1,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_source() {
        let parsed = SourceParser::new().parse("x = 1\n").unwrap();
        assert_eq!(parsed.root().kind(), "module");
        assert_eq!(parsed.node_text(parsed.root()).trim(), "x = 1");
    }

    #[test]
    fn test_parse_empty_source() {
        let parsed = SourceParser::new().parse("").unwrap();
        assert_eq!(parsed.root().named_child_count(), 0);
    }

    #[test]
    fn test_syntax_error_location() {
        let source = "def ok():\n    return 1\n\ndef broken(:\n    pass\n";
        match SourceParser::new().parse(source) {
            Err(ParseError::Syntax(err)) => {
                assert!(err.line >= 4, "expected error on line 4 or later, got {}", err.line);
                assert!(err.column >= 1);
                assert!(!err.message.is_empty());
            }
            other => panic!("expected syntax error, got {:?}", other.map(|p| p.source)),
        }
    }

    fn syntax_error(source: &str) -> SyntaxError {
        match SourceParser::new().parse(source) {
            Err(ParseError::Syntax(err)) => err,
            other => panic!("expected syntax error, got {:?}", other.map(|p| p.source)),
        }
    }

    #[test]
    fn test_python2_print_rejected() {
        let err = syntax_error("def f():\n    print \"hello\"\n");
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 5);
        assert!(err.message.contains("print"));
    }

    #[test]
    fn test_python2_exec_rejected() {
        let err = syntax_error("exec \"x = 1\"\n");
        assert_eq!(err.line, 1);
        assert!(err.message.contains("exec"));
    }

    #[test]
    fn test_print_call_accepted() {
        assert!(SourceParser::new().parse("print(\"hello\")\nprint()\n").is_ok());
    }

    #[test]
    fn test_non_default_after_default_rejected() {
        let err = syntax_error("def f(a=1, b):\n    return a\n");
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 12);
        assert_eq!(err.message, "non-default argument follows default argument");

        let err = syntax_error("g = lambda a=1, b: a\n");
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_parameter_orders_python_accepts() {
        let parser = SourceParser::new();
        for source in [
            "def f(a, b=1, *args, c, d=2, **kw):\n    pass\n",
            "def f(a=1, *, b):\n    pass\n",
            "def f(a=1, *args: int):\n    pass\n",
            "def f(a: int, b: str = 'x'):\n    pass\n",
        ] {
            assert!(parser.parse(source).is_ok(), "should parse: {source:?}");
        }
    }

    #[test]
    fn test_vec_sink_collects() {
        let mut sink: Vec<SyntaxError> = Vec::new();
        let err = SyntaxError {
            line: 3,
            column: 7,
            message: "invalid syntax".to_string(),
        };
        sink.report(&err);
        assert_eq!(sink, vec![err]);
    }

    #[test]
    fn test_syntax_error_display() {
        let err = SyntaxError {
            line: 2,
            column: 5,
            message: "expected ':'".to_string(),
        };
        assert_eq!(err.to_string(), "expected ':' (line 2, column 5)");
    }
}
