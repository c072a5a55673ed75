//! Imported module extraction.

use lazy_static::lazy_static;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Query, QueryCursor};

use super::parser::{ParsedSource, SourceParser, PYTHON};

/// Tree-sitter query for imported module names.
///
/// Captures:
/// - `module`: the dotted name of an import or the source module of a
///   from-import (relative imports only when they name a module)
/// - `future`: `from __future__ import ...`
const IMPORT_QUERY_SOURCE: &str = r#"
; import a.b, c
(import_statement
  name: (dotted_name) @module)

; import a.b as c
(import_statement
  name: (aliased_import
    name: (dotted_name) @module))

; from a.b import c
(import_from_statement
  module_name: (dotted_name) @module)

; from .a import b
(import_from_statement
  module_name: (relative_import
    (dotted_name) @module))

(future_import_statement) @future
"#;

const FUTURE_MODULE: &str = "__future__";

lazy_static! {
    static ref IMPORT_QUERY: Query =
        Query::new(&PYTHON, IMPORT_QUERY_SOURCE).expect("import query must compile");
}

/// Extract the top-level package of every import, in order of appearance.
///
/// Duplicates are kept. Parse failures of any kind yield an empty list and
/// are not reported.
pub fn extract_modules(source: &str) -> Vec<String> {
    match SourceParser::new().parse(source) {
        Ok(parsed) => modules_in(&parsed),
        Err(_) => Vec::new(),
    }
}

/// Extract module names from an already parsed source.
pub fn modules_in(parsed: &ParsedSource) -> Vec<String> {
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&IMPORT_QUERY, parsed.root(), parsed.source.as_bytes());

    let mut modules = Vec::new();
    while let Some(m) = matches.next() {
        for capture in m.captures {
            match IMPORT_QUERY.capture_names()[capture.index as usize] {
                "module" => {
                    // First identifier of the dotted name; tolerant of `os . path`.
                    let first = capture
                        .node
                        .named_child(0)
                        .map(|segment| parsed.node_text(segment))
                        .unwrap_or_else(|| parsed.node_text(capture.node));
                    let name = first.split('.').next().unwrap_or("").trim();
                    if !name.is_empty() {
                        modules.push(name.to_string());
                    }
                }
                "future" => modules.push(FUTURE_MODULE.to_string()),
                _ => {}
            }
        }
    }
    modules
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_import_uses_first_segment() {
        assert_eq!(extract_modules("import os.path\n"), vec!["os"]);
    }

    #[test]
    fn test_multiple_and_aliased_imports() {
        assert_eq!(
            extract_modules("import json, numpy as np, xml.etree.ElementTree as ET\n"),
            vec!["json", "numpy", "xml"]
        );
    }

    #[test]
    fn test_from_import() {
        assert_eq!(extract_modules("from pkg.sub import y\n"), vec!["pkg"]);
        assert_eq!(extract_modules("from collections import (Counter,\n    OrderedDict)\n"), vec!["collections"]);
    }

    #[test]
    fn test_relative_imports() {
        assert!(extract_modules("from . import x\n").is_empty());
        assert!(extract_modules("from .. import x\n").is_empty());
        assert_eq!(extract_modules("from .models import User\n"), vec!["models"]);
    }

    #[test]
    fn test_future_import() {
        assert_eq!(extract_modules("from __future__ import annotations\n"), vec!["__future__"]);
    }

    #[test]
    fn test_duplicates_and_order_preserved() {
        let source = r#"
import requests
from os import path
import requests

def f():
    import os
    return os.getcwd()
"#;
        assert_eq!(extract_modules(source), vec!["requests", "os", "requests", "os"]);
    }

    #[test]
    fn test_syntax_error_is_silent() {
        assert!(extract_modules("import os\ndef broken(:\n").is_empty());
    }
}
