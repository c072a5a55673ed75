//! Configuration for gittextlab runs.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file names searched for in the current directory.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["gittextlab.yaml", ".gittextlab.yaml"];

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub annotation: AnnotationConfig,
    pub repository: RepositoryConfig,
    pub analysis: AnalysisConfig,
    pub scoring: ScoringConfig,
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    /// Parse a config from YAML text. Empty text yields the defaults.
    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Load the config at `path`, or the discovered one, or the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::parse_file(p),
            None => match discover() {
                Some(p) => {
                    tracing::debug!(path = %p.display(), "using discovered config");
                    Self::parse_file(p)
                }
                None => Ok(Self::default()),
            },
        }
    }
}

/// Language-model endpoint settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AnnotationConfig {
    /// OpenAI-compatible chat completions URL.
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    /// Request timeout in seconds; no timeout when unset.
    pub timeout_secs: Option<u64>,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:1234/v1/chat/completions".to_string(),
            model: "local-model".to_string(),
            temperature: 0.1,
            timeout_secs: None,
        }
    }
}

impl AnnotationConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Source repository settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Base URL of the hosting API (directory listings).
    pub api_base: String,
    /// Base URL for raw file contents.
    pub raw_base: String,
    pub branch: String,
    /// Timeout for each file fetch, in seconds.
    pub fetch_timeout_secs: u64,
    /// Glob patterns for files to analyze.
    pub include: Vec<String>,
    /// Glob patterns for paths to skip (e.g. "**/tests/**").
    pub excluded_paths: Vec<String>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            raw_base: "https://raw.githubusercontent.com".to_string(),
            branch: "master".to_string(),
            fetch_timeout_secs: 10,
            include: vec!["**/*.py".to_string()],
            excluded_paths: Vec::new(),
        }
    }
}

impl RepositoryConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Per-file analysis settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Only the first N functions of each file are annotated.
    pub max_functions_per_file: usize,
    /// Files shorter than this (after trimming) are skipped.
    pub min_source_chars: usize,
    /// Ask for optimization suggestions.
    pub optimize: bool,
    /// Ask for an error review.
    pub check_errors: bool,
    /// Ask for a whole-file summary.
    pub summarize_files: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_functions_per_file: 10,
            min_source_chars: 10,
            optimize: false,
            check_errors: false,
            summarize_files: true,
        }
    }
}

/// Project scoring settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    pub enabled: bool,
    /// Score used when no number can be read from the model's replies.
    pub default_score: u8,
    /// Characters of each file summary included in the scoring prompt.
    pub summary_char_limit: usize,
    /// Number of file summaries included in the scoring prompt.
    pub summary_file_limit: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_score: 65,
            summary_char_limit: 300,
            summary_file_limit: 5,
        }
    }
}

/// Discover a config file: current directory first, then the user config dir.
pub fn discover() -> Option<PathBuf> {
    for name in DEFAULT_CONFIG_NAMES {
        let path = PathBuf::from(name);
        if path.exists() {
            return Some(path);
        }
    }
    ProjectDirs::from("", "", "gittextlab")
        .map(|dirs| dirs.config_dir().join("config.yaml"))
        .filter(|path| path.exists())
}

/// Validate a config, returning an error describing the first problem.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if config.annotation.endpoint.trim().is_empty() {
        anyhow::bail!("annotation.endpoint must not be empty");
    }
    if !(0.0..=2.0).contains(&config.annotation.temperature) {
        anyhow::bail!(
            "annotation.temperature must be between 0 and 2, got {}",
            config.annotation.temperature
        );
    }
    if config.analysis.max_functions_per_file == 0 {
        anyhow::bail!("analysis.max_functions_per_file must be at least 1");
    }
    if config.scoring.default_score > 100 {
        anyhow::bail!(
            "scoring.default_score must be between 0 and 100, got {}",
            config.scoring.default_score
        );
    }
    if config.repository.include.is_empty() {
        anyhow::bail!("repository.include must list at least one pattern");
    }
    for pattern in config
        .repository
        .include
        .iter()
        .chain(&config.repository.excluded_paths)
    {
        if let Err(e) = globset::Glob::new(pattern) {
            anyhow::bail!("invalid glob pattern {:?}: {}", pattern, e);
        }
    }
    Ok(())
}
