//! Per-file orchestration: fetch, extract, annotate.
//!
//! Files are processed one at a time in listing order. A failure while
//! handling one file skips that file only; the run fails only when there is
//! nothing to analyze or nothing came out of the analysis.

use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::{extract_functions, extract_modules, DiagnosticSink, FunctionRecord, SyntaxError};
use crate::annotate::{AnnotationTask, Annotator};
use crate::config::AnalysisConfig;
use crate::repository::{RepositoryError, SourceRef, SourceRepository};

/// Run-level failures.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to list sources: {0}")]
    Listing(#[from] RepositoryError),
    #[error("no Python files found in {0}")]
    NoSources(String),
    #[error("no files in {0} could be analyzed")]
    NoResults(String),
}

/// One function with its annotations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionAnalysisResult {
    pub name: String,
    pub args: Vec<String>,
    pub docstring: Option<String>,
    pub lineno: usize,
    pub length: Option<usize>,
    pub complexity: usize,
    pub explanation: Option<String>,
    pub optimization: Option<String>,
    pub error_check: Option<String>,
}

impl FunctionAnalysisResult {
    /// Carry over the extracted facts, with no annotations yet.
    pub fn from_record(record: &FunctionRecord) -> Self {
        Self {
            name: record.name.clone(),
            args: record.args.clone(),
            docstring: record.docstring.clone(),
            lineno: record.lineno,
            length: record.length,
            complexity: record.complexity,
            explanation: None,
            optimization: None,
            error_check: None,
        }
    }
}

/// Everything produced for one source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileAnalysisResult {
    pub source_file: String,
    pub file_summary: Option<String>,
    pub functions: Vec<FunctionAnalysisResult>,
}

/// A syntax error found while analyzing a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiagnostic {
    pub file: String,
    pub error: SyntaxError,
}

/// The outcome of a whole run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRun {
    /// Repository identity, used to name the report.
    pub identity: String,
    pub files: Vec<FileAnalysisResult>,
    /// Every imported top-level module, duplicates kept.
    pub modules: Vec<String>,
    pub diagnostics: Vec<FileDiagnostic>,
}

impl AnalysisRun {
    pub fn total_functions(&self) -> usize {
        self.files.iter().map(|f| f.functions.len()).sum()
    }
}

/// Collects syntax errors for one file and logs them.
struct FileSink<'a> {
    file: &'a str,
    diagnostics: &'a mut Vec<FileDiagnostic>,
}

impl DiagnosticSink for FileSink<'_> {
    fn report(&mut self, error: &SyntaxError) {
        warn!(file = self.file, line = error.line, column = error.column, "SyntaxError: {}", error.message);
        self.diagnostics.push(FileDiagnostic {
            file: self.file.to_string(),
            error: error.clone(),
        });
    }
}

/// Drives a repository and an annotator through one analysis run.
pub struct Pipeline<'a> {
    repository: &'a dyn SourceRepository,
    annotator: &'a dyn Annotator,
    options: AnalysisConfig,
    progress: Option<ProgressBar>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        repository: &'a dyn SourceRepository,
        annotator: &'a dyn Annotator,
        options: AnalysisConfig,
    ) -> Self {
        Self {
            repository,
            annotator,
            options,
            progress: None,
        }
    }

    /// Report per-file progress on `bar`; its length is set once sources are listed.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    pub async fn run(&self) -> Result<AnalysisRun, PipelineError> {
        let identity = self.repository.identity();
        let sources = self.repository.list_sources().await?;
        if sources.is_empty() {
            return Err(PipelineError::NoSources(identity));
        }
        info!(repository = %identity, files = sources.len(), "found source files");

        if let Some(bar) = &self.progress {
            bar.set_length(sources.len() as u64);
        }

        let mut run = AnalysisRun {
            identity,
            ..Default::default()
        };

        for source in &sources {
            if let Some(bar) = &self.progress {
                bar.set_message(source.path.clone());
            }
            if let Some(result) = self.analyze_source(source, &mut run).await {
                run.files.push(result);
            }
            if let Some(bar) = &self.progress {
                bar.inc(1);
            }
        }

        if let Some(bar) = &self.progress {
            bar.finish_and_clear();
        }

        if run.files.is_empty() {
            return Err(PipelineError::NoResults(run.identity));
        }
        Ok(run)
    }

    /// Analyze one file; `None` means the file was skipped.
    async fn analyze_source(
        &self,
        source: &SourceRef,
        run: &mut AnalysisRun,
    ) -> Option<FileAnalysisResult> {
        let text = match self.repository.fetch(source).await {
            Ok(text) => text,
            Err(e) => {
                warn!(file = %source.path, error = %e, "failed to fetch file, skipping");
                return None;
            }
        };

        if text.trim().chars().count() < self.options.min_source_chars {
            info!(file = %source.path, "file too small, skipping");
            return None;
        }

        let records = {
            let mut sink = FileSink {
                file: &source.path,
                diagnostics: &mut run.diagnostics,
            };
            extract_functions(&text, &mut sink)
        };
        run.modules.extend(extract_modules(&text));

        let file_summary = if self.options.summarize_files {
            Some(self.annotator.run_task(AnnotationTask::SummarizeFile, &text).await)
        } else {
            None
        };

        if records.is_empty() {
            info!(file = %source.path, "no functions found");
        } else {
            debug!(file = %source.path, functions = records.len(), "extracted functions");
        }

        let mut functions = Vec::new();
        for record in records.iter().take(self.options.max_functions_per_file) {
            functions.push(self.analyze_function(record).await);
        }

        Some(FileAnalysisResult {
            source_file: source.path.clone(),
            file_summary,
            functions,
        })
    }

    async fn analyze_function(&self, record: &FunctionRecord) -> FunctionAnalysisResult {
        let mut result = FunctionAnalysisResult::from_record(record);
        result.explanation = Some(self.annotator.run_task(AnnotationTask::Explain, &record.code).await);
        if self.options.optimize {
            result.optimization = Some(self.annotator.run_task(AnnotationTask::Optimize, &record.code).await);
        }
        if self.options.check_errors {
            result.error_check = Some(self.annotator.run_task(AnnotationTask::FindErrors, &record.code).await);
        }
        result
    }
}
