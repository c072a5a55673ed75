//! Records extracted from Python syntax trees.

use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Point};

/// First and last source line of a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    /// Start line (1-indexed).
    pub start_line: usize,
    /// Line of the last non-comment token (1-indexed).
    pub end_line: usize,
}

impl LineSpan {
    /// Span of a definition node, ignoring trailing comments that tree-sitter
    /// attaches to the end of indented blocks.
    pub fn of_definition(node: Node) -> Self {
        Self {
            start_line: node.start_position().row + 1,
            end_line: last_code_position(node).row + 1,
        }
    }

    /// End line minus start line.
    pub fn length(&self) -> usize {
        self.end_line.saturating_sub(self.start_line)
    }
}

fn last_code_position(node: Node) -> Point {
    let mut cursor = node.walk();
    let last = node
        .children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .last();
    match last {
        Some(child) if child.child_count() > 0 => last_code_position(child),
        Some(child) => child.end_position(),
        None => node.end_position(),
    }
}

/// A function definition extracted from source code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    /// Declared name. Not unique within a file.
    pub name: String,
    /// Positional parameter names in declaration order.
    pub args: Vec<String>,
    /// Cleaned docstring, if the body starts with a string literal.
    pub docstring: Option<String>,
    /// Line of the `def` keyword (1-indexed).
    pub lineno: usize,
    /// End line minus start line.
    pub length: Option<usize>,
    /// Normalized rendering of the definition.
    pub code: String,
    /// Number of newline-delimited segments in `code`.
    pub complexity: usize,
}

/// Line-count complexity of rendered code.
///
/// Counts segments between newlines, so the trailing newline every rendering
/// ends with contributes one empty segment.
pub fn line_complexity(code: &str) -> usize {
    code.split('\n').count()
}
