//! Integration tests for function and module extraction.
//!
//! These tests run the extractors against the Python fixtures in testdata.

use std::path::PathBuf;

use gittextlab::analysis::{extract_functions, extract_modules, line_complexity, SyntaxError};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn read_fixture(relative: &str) -> String {
    std::fs::read_to_string(testdata_path().join(relative)).expect("fixture should exist")
}

// =============================================================================
// Functions
// =============================================================================

#[test]
fn test_functions_in_document_order() {
    let source = read_fixture("project/shapes.py");
    let mut diagnostics: Vec<SyntaxError> = Vec::new();
    let functions = extract_functions(&source, &mut diagnostics);

    assert!(diagnostics.is_empty());
    let names: Vec<_> = functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["distance", "area", "scale"]);
}

#[test]
fn test_function_facts() {
    let source = read_fixture("project/shapes.py");
    let functions = extract_functions(&source, &mut Vec::new());

    let distance = &functions[0];
    assert_eq!(distance.args, vec!["a", "b"]);
    assert_eq!(distance.lineno, 9);
    assert_eq!(distance.length, Some(2));
    assert_eq!(
        distance.docstring.as_deref(),
        Some("Return the distance between two points.")
    );
    assert_eq!(
        distance.code,
        "def distance(a, b):\n    \"\"\"Return the distance between two points.\"\"\"\n    return math.hypot(a.x - b.x, a.y - b.y)\n"
    );
    assert_eq!(distance.complexity, 4);

    let area = &functions[1];
    assert_eq!(area.args, vec!["radius"]);
    assert_eq!(area.lineno, 14);
    assert_eq!(area.length, Some(4));
    assert_eq!(area.docstring, None);
    assert_eq!(
        area.code,
        "def area(radius, *, precise=False):\n    if precise:\n        return math.pi * radius ** 2\n    return 3.14 * radius ** 2\n"
    );

    let scale = &functions[2];
    assert_eq!(scale.args, vec!["self", "factor"]);
    assert_eq!(scale.lineno, 22);
    assert_eq!(scale.length, Some(2));
}

#[test]
fn test_complexity_and_length_invariants() {
    for fixture in ["project/shapes.py", "project/pkg/units.py"] {
        let source = read_fixture(fixture);
        for function in extract_functions(&source, &mut Vec::new()) {
            assert_eq!(function.complexity, line_complexity(&function.code));
            assert_eq!(function.complexity, function.code.split('\n').count());
            assert!(function.complexity >= 1);
            assert!(function.code.ends_with('\n'));
            assert!(function.length.is_some());
        }
    }
}

#[test]
fn test_docstring_only_module_has_no_functions() {
    let source = read_fixture("project/notes.py");
    let mut diagnostics: Vec<SyntaxError> = Vec::new();

    assert!(extract_functions(&source, &mut diagnostics).is_empty());
    assert!(diagnostics.is_empty());
}

#[test]
fn test_broken_file_reports_one_diagnostic() {
    let source = read_fixture("broken.py");
    let mut diagnostics: Vec<SyntaxError> = Vec::new();

    assert!(extract_functions(&source, &mut diagnostics).is_empty());
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].line >= 3);
    assert!(diagnostics[0].column >= 1);
}

#[test]
fn test_python2_file_reports_one_diagnostic() {
    let source = read_fixture("legacy_print.py");
    let mut diagnostics: Vec<SyntaxError> = Vec::new();

    assert!(extract_functions(&source, &mut diagnostics).is_empty());
    assert_eq!(diagnostics.len(), 1);
    assert_eq!((diagnostics[0].line, diagnostics[0].column), (5, 5));
}

#[test]
fn test_default_before_required_reports_one_diagnostic() {
    let source = "def f(a=1, b):\n    return a + b\n\ndef g():\n    return 2\n";
    let mut diagnostics: Vec<SyntaxError> = Vec::new();

    assert!(extract_functions(source, &mut diagnostics).is_empty());
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].line, 1);
}

#[test]
fn test_decorated_and_async_fixture() {
    let source = read_fixture("decorated.py");
    let mut diagnostics: Vec<SyntaxError> = Vec::new();
    let functions = extract_functions(&source, &mut diagnostics);

    assert!(diagnostics.is_empty());
    let names: Vec<_> = functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["fib", "key"]);

    let fib = &functions[0];
    assert_eq!(fib.lineno, 5);
    assert_eq!(fib.length, Some(3));
    assert_eq!(
        fib.code,
        "@functools.lru_cache(maxsize=None)\ndef fib(n):\n    if n < 2:\n        return n\n    return fib(n - 1) + fib(n - 2)\n"
    );
    assert_eq!(fib.complexity, 6);

    let key = &functions[1];
    assert_eq!(key.lineno, 18);
    assert!(key.args.is_empty());
    assert!(key.code.starts_with("@staticmethod\ndef key(*parts):\n"));
}

// =============================================================================
// Modules
// =============================================================================

#[test]
fn test_modules_from_fixture() {
    let source = read_fixture("project/shapes.py");
    assert_eq!(extract_modules(&source), vec!["math", "collections", "units"]);
}

#[test]
fn test_modules_future_dotted_and_bare_relative() {
    let source = read_fixture("project/pkg/units.py");
    assert_eq!(extract_modules(&source), vec!["__future__", "os"]);
}

#[test]
fn test_modules_broken_file_is_silent() {
    let source = read_fixture("broken.py");
    assert!(extract_modules(&source).is_empty());
}

#[test]
fn test_modules_python2_file_is_silent() {
    let source = read_fixture("legacy_print.py");
    assert!(extract_modules(&source).is_empty());
}

#[test]
fn test_modules_from_decorated_fixture() {
    let source = read_fixture("decorated.py");
    assert_eq!(extract_modules(&source), vec!["functools"]);
}
