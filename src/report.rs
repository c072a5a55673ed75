//! Output formatting for gittextlab runs.
//!
//! Supports:
//! - Report file: `{identity}_analysis.json`, the array of file results
//! - JSON: run summary plus file results on stdout
//! - Pretty: colored terminal output for human readability

use colored::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::pipeline::{AnalysisRun, FileAnalysisResult};
use crate::score::{ScoreBand, ScoreOutcome};
use crate::stats::{top_function_names, top_modules, TOP_FUNCTION_NAMES, TOP_MODULES};

/// Width of the score bar in the pretty output.
const SCORE_BAR_WIDTH: usize = 40;
/// Characters of annotation text shown per field in the pretty output.
const EXCERPT_CHARS: usize = 240;

// =============================================================================
// Report file
// =============================================================================

/// File name of the report written for a repository.
pub fn report_file_name(identity: &str) -> String {
    format!("{}_analysis.json", identity)
}

/// Serialize file results with 4-space indentation.
pub fn to_json_string<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(String::from_utf8(buf)?)
}

/// Write the report for a run into `dir`, returning its path.
pub fn write_report_file(dir: &Path, run: &AnalysisRun) -> anyhow::Result<PathBuf> {
    let path = dir.join(report_file_name(&run.identity));
    write_report_to(&path, &run.files)?;
    Ok(path)
}

/// Write file results to an explicit path.
pub fn write_report_to(path: &Path, files: &[FileAnalysisResult]) -> anyhow::Result<()> {
    let json = to_json_string(files)?;
    fs::write(path, json)?;
    tracing::info!(path = %path.display(), "wrote report");
    Ok(())
}

// =============================================================================
// JSON Format
// =============================================================================

/// Run summary printed on stdout with `--format json`.
#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub repository: String,
    pub files_analyzed: usize,
    pub total_functions: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<JsonScore>,
    pub top_functions: Vec<CountEntry>,
    pub top_modules: Vec<CountEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub syntax_errors: Vec<JsonSyntaxError>,
    pub files: Vec<FileAnalysisResult>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonScore {
    pub value: u8,
    pub band: String,
    pub source: String,
}

#[derive(Serialize, Deserialize)]
pub struct CountEntry {
    pub name: String,
    pub count: usize,
}

#[derive(Serialize, Deserialize)]
pub struct JsonSyntaxError {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

fn count_entries(counts: Vec<(String, usize)>) -> Vec<CountEntry> {
    counts
        .into_iter()
        .map(|(name, count)| CountEntry { name, count })
        .collect()
}

/// Build the stdout JSON summary for a run.
pub fn json_report(run: &AnalysisRun, score: Option<&ScoreOutcome>) -> JsonReport {
    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        repository: run.identity.clone(),
        files_analyzed: run.files.len(),
        total_functions: run.total_functions(),
        score: score.map(|s| JsonScore {
            value: s.score.value(),
            band: s.score.band().label().to_string(),
            source: format!("{:?}", s.source).to_lowercase(),
        }),
        top_functions: count_entries(top_function_names(&run.files, TOP_FUNCTION_NAMES)),
        top_modules: count_entries(top_modules(&run.modules, TOP_MODULES)),
        syntax_errors: run
            .diagnostics
            .iter()
            .map(|d| JsonSyntaxError {
                file: d.file.clone(),
                line: d.error.line,
                column: d.error.column,
                message: d.error.message.clone(),
            })
            .collect(),
        files: run.files.clone(),
    }
}

/// Write a run in JSON format to stdout.
pub fn write_json(run: &AnalysisRun, score: Option<&ScoreOutcome>) -> anyhow::Result<()> {
    let json = to_json_string(&json_report(run, score))?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write a run in pretty (human-readable) format.
pub fn write_pretty(run: &AnalysisRun, score: Option<&ScoreOutcome>, report_path: Option<&Path>) {
    // Header
    println!();
    print!("  ");
    print!("{}", "gittextlab".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Repository: ".dimmed());
    println!("{}", run.identity);
    print!("  {}", "Files:      ".dimmed());
    println!("{}", run.files.len());
    print!("  {}", "Functions:  ".dimmed());
    println!("{}", run.total_functions());
    println!();

    for file in &run.files {
        write_file(file);
    }

    if !run.diagnostics.is_empty() {
        println!("  {} ({}):", "Syntax errors".bold(), run.diagnostics.len());
        for d in &run.diagnostics {
            print!("    {}", d.file.blue());
            print!("{}", format!(":{}:{}", d.error.line, d.error.column).dimmed());
            println!("  {}", d.error.message);
        }
        println!();
    }

    write_frequencies(
        "Most common function names",
        &top_function_names(&run.files, TOP_FUNCTION_NAMES),
    );
    write_frequencies("Most used modules", &top_modules(&run.modules, TOP_MODULES));

    if let Some(score) = score {
        write_score(score);
        println!();
    }

    if let Some(path) = report_path {
        print!("  {}", "Report: ".dimmed());
        println!("{}", path.display());
        println!();
    }
}

fn write_file(file: &FileAnalysisResult) {
    println!("  {} {}", "▸".cyan(), file.source_file.blue().bold());
    if let Some(summary) = &file.file_summary {
        write_field("summary", summary);
    }

    if file.functions.is_empty() {
        println!("      {}", "(no functions)".dimmed());
    }

    for f in &file.functions {
        print!("      {}", f.name.bold());
        print!("({})", f.args.join(", "));
        print!("{}", format!("  line {}", f.lineno).dimmed());
        if let Some(length) = f.length {
            print!("{}", format!("  length {}", length).dimmed());
        }
        println!("{}", format!("  complexity {}", f.complexity).dimmed());

        if let Some(doc) = &f.docstring {
            if let Some(first) = doc.lines().next() {
                println!("        {}", format!("\"{}\"", first).italic().dimmed());
            }
        }
        if let Some(text) = &f.explanation {
            write_field("explanation", text);
        }
        if let Some(text) = &f.optimization {
            write_field("optimization", text);
        }
        if let Some(text) = &f.error_check {
            write_field("errors", text);
        }
    }
    println!();
}

fn write_field(label: &str, text: &str) {
    println!("        {} {}", format!("{}:", label).dimmed(), excerpt(text, EXCERPT_CHARS));
}

/// Collapse whitespace and cut to `limit` characters.
fn excerpt(text: &str, limit: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= limit {
        flat
    } else {
        let cut: String = flat.chars().take(limit).collect();
        format!("{}…", cut.trim_end())
    }
}

fn write_frequencies(title: &str, counts: &[(String, usize)]) {
    if counts.is_empty() {
        return;
    }
    println!("  {}", format!("{}:", title).bold());

    let total: usize = counts.iter().map(|(_, c)| c).sum();
    let max = counts.iter().map(|(_, c)| *c).max().unwrap_or(1);
    for (name, count) in counts {
        let width = (count * 20).div_ceil(max);
        let share = *count as f64 * 100.0 / total as f64;
        println!(
            "    {:<24} {} {:>3} ({:.1}%)",
            name,
            "█".repeat(width).cyan(),
            count,
            share
        );
    }
    println!();
}

fn write_score(outcome: &ScoreOutcome) {
    let value = outcome.score.value();
    let filled = score_bar_cells(value);
    let bar = format!(
        "{}{}",
        "█".repeat(filled),
        "░".repeat(SCORE_BAR_WIDTH - filled)
    );

    print!("  {} ", "Project score:".bold());
    let band = outcome.score.band();
    let (number, bar) = match band {
        ScoreBand::Good => (value.to_string().green().bold(), bar.green()),
        ScoreBand::Fair => (value.to_string().yellow().bold(), bar.yellow()),
        ScoreBand::Poor => (value.to_string().red().bold(), bar.red()),
    };
    println!("{}/100  {}  {}", number, bar, band.label().dimmed());

    if matches!(outcome.source, crate::score::ScoreSource::Default) {
        println!("  {}", "(no score could be read from the model, default used)".dimmed());
    }
}

fn score_bar_cells(value: u8) -> usize {
    (usize::from(value.min(100)) * SCORE_BAR_WIDTH) / 100
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::FunctionAnalysisResult;
    use tempfile::TempDir;

    fn sample_run() -> AnalysisRun {
        AnalysisRun {
            identity: "octocat_spoon".to_string(),
            files: vec![FileAnalysisResult {
                source_file: "spoon/core.py".to_string(),
                file_summary: Some("Kaşık işlemleri".to_string()),
                functions: vec![FunctionAnalysisResult {
                    name: "stir".to_string(),
                    args: vec!["cup".to_string()],
                    docstring: Some("Stir the cup.".to_string()),
                    lineno: 3,
                    length: Some(1),
                    complexity: 3,
                    explanation: Some("Stirs.".to_string()),
                    optimization: None,
                    error_check: None,
                }],
            }],
            modules: vec!["os".to_string(), "os".to_string(), "json".to_string()],
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(report_file_name("octocat_spoon"), "octocat_spoon_analysis.json");
    }

    #[test]
    fn test_four_space_indent() {
        let json = to_json_string(&sample_run().files).unwrap();
        assert!(json.starts_with("[\n    {\n        \"source_file\""));
    }

    #[test]
    fn test_write_report_file() {
        let temp = TempDir::new().unwrap();
        let run = sample_run();
        let path = write_report_file(temp.path(), &run).unwrap();

        assert_eq!(path.file_name().unwrap(), "octocat_spoon_analysis.json");
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Kaşık işlemleri"));
        let parsed: Vec<FileAnalysisResult> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, run.files);
    }

    #[test]
    fn test_json_report_summary() {
        let run = sample_run();
        let report = json_report(&run, None);
        assert_eq!(report.files_analyzed, 1);
        assert_eq!(report.total_functions, 1);
        assert!(report.score.is_none());
        assert_eq!(report.top_modules[0].name, "os");
        assert_eq!(report.top_modules[0].count, 2);
        assert_eq!(report.top_functions[0].name, "stir");
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("a\n  b   c", 10), "a b c");
        assert_eq!(excerpt("abcdef", 3), "abc…");
    }

    #[test]
    fn test_score_bar_cells() {
        assert_eq!(score_bar_cells(0), 0);
        assert_eq!(score_bar_cells(65), 26);
        assert_eq!(score_bar_cells(100), SCORE_BAR_WIDTH);
    }
}
