//! Project scoring for gittextlab.
//!
//! Asks the annotator for a 0-100 quality score for the whole project and
//! reads the number out of its free-text reply.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::annotate::Annotator;
use crate::config::ScoringConfig;
use crate::pipeline::FileAnalysisResult;

/// Score band thresholds.
pub mod bands {
    pub const GOOD_MIN: u8 = 80;
    pub const FAIR_MIN: u8 = 60;
}

/// Shown in the scoring prompt for files without a summary.
pub const MISSING_SUMMARY: &str = "No summary available";

lazy_static! {
    /// Tried in order; only the first match of each pattern is considered.
    static ref SCORE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)\b(\d{1,3})\b").unwrap(),
        Regex::new(r"(?i)(\d{1,3})/100").unwrap(),
        Regex::new(r"(?i)Puan[:\s]*(\d{1,3})").unwrap(),
        Regex::new(r"(?i)Score[:\s]*(\d{1,3})").unwrap(),
        Regex::new(r"(?i)(\d{1,3})(?:\s*puan|\s*point)").unwrap(),
    ];
    static ref BARE_NUMBER: Regex = Regex::new(r"\b(\d{1,3})\b").unwrap();
}

/// A project quality score from 0 to 100, higher is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectScore(u8);

impl ProjectScore {
    /// `None` when `value` is above 100.
    pub fn new(value: u8) -> Option<Self> {
        (value <= 100).then_some(Self(value))
    }

    pub fn clamped(value: u8) -> Self {
        Self(value.min(100))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn band(self) -> ScoreBand {
        match self.0 {
            s if s >= bands::GOOD_MIN => ScoreBand::Good,
            s if s >= bands::FAIR_MIN => ScoreBand::Fair,
            _ => ScoreBand::Poor,
        }
    }
}

impl std::fmt::Display for ProjectScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Good => "good",
            ScoreBand::Fair => "fair",
            ScoreBand::Poor => "poor",
        }
    }
}

/// Which step of the cascade produced the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    /// Parsed from the reply to the full scoring prompt.
    Primary,
    /// Parsed from the reply to the minimal retry prompt.
    Fallback,
    /// Neither reply contained a usable number.
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    pub score: ProjectScore,
    pub source: ScoreSource,
}

/// Read a score from a reply using the pattern cascade.
pub fn parse_score(reply: &str) -> Option<ProjectScore> {
    SCORE_PATTERNS.iter().find_map(|pattern| {
        let digits = pattern.captures(reply)?.get(1)?.as_str();
        parse_in_range(digits)
    })
}

/// Read the first bare number from a reply, if it is a valid score.
pub fn parse_bare_number(reply: &str) -> Option<ProjectScore> {
    let digits = BARE_NUMBER.captures(reply)?.get(1)?.as_str();
    parse_in_range(digits)
}

fn parse_in_range(digits: &str) -> Option<ProjectScore> {
    let value: u16 = digits.parse().ok()?;
    u8::try_from(value).ok().and_then(ProjectScore::new)
}

/// Summarize the first files of a run for the scoring prompt.
pub fn project_summary(files: &[FileAnalysisResult], config: &ScoringConfig) -> String {
    let total_functions: usize = files.iter().map(|f| f.functions.len()).sum();
    let mut summary = format!(
        "Project overview:\n- {} Python files in total\n- {} functions in total\n\nFile summaries:\n",
        files.len(),
        total_functions
    );

    for file in files.iter().take(config.summary_file_limit) {
        let text = file.file_summary.as_deref().unwrap_or(MISSING_SUMMARY);
        let truncated: String = text.chars().take(config.summary_char_limit).collect();
        summary.push_str(&format!("- {}: {}...\n", file.source_file, truncated));
    }
    summary
}

/// The full scoring prompt.
pub fn scoring_prompt(summary: &str) -> String {
    format!(
        "Analyze the following Python code project and give it ONLY A NUMERIC SCORE between 0 and 100.\n\
         \n\
         Evaluation criteria:\n\
         1. Code readability (25%): variable names, comments, docstring usage\n\
         2. Structure and organization (20%): file organization, function layout\n\
         3. Functional correctness (25%): whether the code works, logical flow\n\
         4. Error handling and security (15%): try/except blocks, input validation\n\
         5. Module usage and efficiency (15%): suitable library choices, algorithmic efficiency\n\
         \n\
         IMPORTANT: Return only a number between 0 and 100. Do not write an explanation.\n\
         \n\
         Example output: 73\n\
         \n\
         {}",
        summary
    )
}

/// The minimal prompt used when the first reply had no usable number.
pub fn fallback_prompt(total_files: usize, total_functions: usize) -> String {
    format!(
        "Give this Python project a score between 0 and 100. Write only the number:\n\
         \n\
         Project: {} files, {} functions\n\
         \n\
         Score:",
        total_files, total_functions
    )
}

/// Scores a project by asking an annotator.
pub struct Scorer<'a> {
    annotator: &'a dyn Annotator,
    config: ScoringConfig,
}

impl<'a> Scorer<'a> {
    pub fn new(annotator: &'a dyn Annotator, config: ScoringConfig) -> Self {
        Self { annotator, config }
    }

    pub async fn score(&self, files: &[FileAnalysisResult]) -> ScoreOutcome {
        let summary = project_summary(files, &self.config);
        let reply = self.annotator.annotate(&scoring_prompt(&summary)).await;
        debug!(reply = %reply, "scoring reply");

        if let Some(score) = parse_score(&reply) {
            info!(score = score.value(), "project scored");
            return ScoreOutcome {
                score,
                source: ScoreSource::Primary,
            };
        }

        let total_functions = files.iter().map(|f| f.functions.len()).sum();
        let reply = self
            .annotator
            .annotate(&fallback_prompt(files.len(), total_functions))
            .await;
        debug!(reply = %reply, "fallback scoring reply");

        if let Some(score) = parse_bare_number(&reply) {
            info!(score = score.value(), "project scored from fallback prompt");
            return ScoreOutcome {
                score,
                source: ScoreSource::Fallback,
            };
        }

        warn!(default = self.config.default_score, "no valid score in replies, using default");
        ScoreOutcome {
            score: ProjectScore::clamped(self.config.default_score),
            source: ScoreSource::Default,
        }
    }
}
