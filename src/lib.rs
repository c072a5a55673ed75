//! gittextlab - explain a Python repository with a local language model.
//!
//! gittextlab fetches the Python sources of a repository, extracts every
//! function and imported module from their syntax trees, asks a locally
//! hosted chat model to explain (and optionally optimize or review) each
//! function, and asks it once more for a 0-100 project score.
//!
//! # Architecture
//!
//! - `analysis`: tree-sitter extraction of functions and imports
//! - `repository`: where source files come from (GitHub, local directory)
//! - `annotate`: the language-model client and prompt templates
//! - `pipeline`: per-file orchestration producing `FileAnalysisResult`s
//! - `score`: project score prompt and reply parsing
//! - `stats`: most-common function names and modules
//! - `report`: output formatting (report file, JSON, pretty)
//! - `config`: YAML configuration with defaults

pub mod analysis;
pub mod annotate;
pub mod cli;
pub mod config;
pub mod pipeline;
pub mod report;
pub mod repository;
pub mod score;
pub mod stats;

pub use analysis::{extract_functions, extract_modules, DiagnosticSink, FunctionRecord, SyntaxError};
pub use annotate::{AnnotationTask, Annotator, ChatClient};
pub use config::Config;
pub use pipeline::{AnalysisRun, FileAnalysisResult, FunctionAnalysisResult, Pipeline, PipelineError};
pub use repository::{GitHubRepository, LocalRepository, SourceRef, SourceRepository};
pub use score::{ProjectScore, ScoreOutcome, Scorer};
