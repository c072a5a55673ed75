//! AST-backed extraction of functions and imports from Python source.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌────────────────────┐
//! │ Source text │────▶│ SourceParser │────▶│ ParsedSource       │
//! └─────────────┘     └──────────────┘     │ (tree + text)      │
//!                            │             └────────────────────┘
//!                            │ SyntaxError            │
//!                            ▼                        ▼
//!                     ┌──────────────┐     ┌────────────────────┐
//!                     │DiagnosticSink│     │ functions / modules│
//!                     └──────────────┘     │ (query walks)      │
//!                                          └────────────────────┘
//! ```
//!
//! The two extractors differ in how they treat a file that does not parse:
//! [`extract_functions`] reports the syntax error to its sink, while
//! [`extract_modules`] returns an empty list without reporting anything.

pub mod docstring;
mod facts;
mod functions;
mod modules;
mod parser;
pub mod render;

pub use facts::{line_complexity, FunctionRecord, LineSpan};
pub use functions::{extract_functions, functions_in};
pub use modules::{extract_modules, modules_in};
pub use parser::{DiagnosticSink, LogSink, ParseError, ParsedSource, SourceParser, SyntaxError};
