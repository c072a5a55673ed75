//! Natural-language annotation of code by a language model.
//!
//! The pipeline and scorer talk to an [`Annotator`]; [`ChatClient`] is the
//! adapter for OpenAI-compatible chat completions servers (LM Studio,
//! llama.cpp, Ollama's compatibility endpoint).

mod client;

pub use client::ChatClient;

use async_trait::async_trait;
use thiserror::Error;

/// Prefix of the placeholder text returned when a request fails.
pub const ERROR_PLACEHOLDER_PREFIX: &str = "LLM error:";

/// Errors that can occur while talking to the model server.
#[derive(Error, Debug)]
pub enum AnnotationError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("server returned HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("reply contained no message content")]
    EmptyReply,
}

/// The kinds of annotation requested during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationTask {
    /// Explain what a function does.
    Explain,
    /// Suggest a more efficient rewrite.
    Optimize,
    /// Review a function for bugs and bad practice.
    FindErrors,
    /// Describe a whole file.
    SummarizeFile,
}

impl AnnotationTask {
    /// Build the prompt for this task around `code`.
    pub fn prompt(self, code: &str) -> String {
        match self {
            AnnotationTask::Explain => {
                format!("Explain the following Python function:\n\n{}", code)
            }
            AnnotationTask::Optimize => format!(
                "Rewrite the following Python function to be more efficient and better optimized. \
                 If there are several alternatives, suggest a few different solutions:\n\n{}",
                code
            ),
            AnnotationTask::FindErrors => format!(
                "Does the following Python function contain any bugs, bad practices or potential problems? \
                 Point out every kind of issue, such as syntax errors, missing edge cases or poor style:\n\n{}",
                code
            ),
            AnnotationTask::SummarizeFile => format!(
                "Explain the overall structure of the following Python file. Which modules does it use \
                 and what does it do? What are its important classes and functions, and what is the \
                 purpose of the file? Give a general assessment of its security, efficiency and \
                 readability:\n\n{}",
                code
            ),
        }
    }
}

/// Something that can turn a prompt into model-written text.
///
/// Implementations never fail: a transport or decoding failure is returned
/// as text starting with [`ERROR_PLACEHOLDER_PREFIX`].
#[async_trait]
pub trait Annotator: Send + Sync {
    async fn annotate(&self, prompt: &str) -> String;

    async fn run_task(&self, task: AnnotationTask, code: &str) -> String {
        self.annotate(&task.prompt(code)).await
    }
}

/// Format a failure as placeholder annotation text.
pub fn error_placeholder(error: &AnnotationError) -> String {
    format!("{} {}", ERROR_PLACEHOLDER_PREFIX, error)
}
