//! Source repositories: where Python files come from.
//!
//! - `GitHubRepository`: the GitHub contents API plus raw file downloads
//! - `LocalRepository`: a directory on disk

mod github;
mod local;

pub use github::GitHubRepository;
pub use local::LocalRepository;

use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use thiserror::Error;

use crate::config::RepositoryConfig;

/// Errors that can occur while listing or fetching sources.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("HTTP {0}")]
    Status(u16),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),
    #[error("invalid repository {0:?}, expected OWNER/REPO")]
    InvalidSlug(String),
}

/// A source file discovered in a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    /// Repository-relative path with `/` separators.
    pub path: String,
    /// Where to fetch the contents from (URL or filesystem path).
    pub location: String,
}

impl SourceRef {
    pub fn new(path: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            location: location.into(),
        }
    }

    /// Final path component.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// A repository of source files.
#[async_trait]
pub trait SourceRepository: Send + Sync {
    /// Name used for report files, e.g. `owner_repo`.
    fn identity(&self) -> String;

    /// List every source file, depth-first.
    async fn list_sources(&self) -> Result<Vec<SourceRef>, RepositoryError>;

    /// Fetch the text of one source file.
    async fn fetch(&self, source: &SourceRef) -> Result<String, RepositoryError>;
}

/// Include/exclude glob matching on repository-relative paths.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl SourceFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, RepositoryError> {
        Ok(Self {
            include: build_set(include)?,
            exclude: build_set(exclude)?,
        })
    }

    pub fn from_config(config: &RepositoryConfig) -> Result<Self, RepositoryError> {
        Self::new(&config.include, &config.excluded_paths)
    }

    /// Whether a path should be analyzed.
    pub fn matches(&self, path: &str) -> bool {
        self.include.is_match(path) && !self.exclude.is_match(path)
    }
}

fn build_set(patterns: &[String]) -> Result<GlobSet, RepositoryError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
