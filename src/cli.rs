//! Command-line interface for gittextlab.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::annotate::ChatClient;
use crate::config::{self, Config};
use crate::pipeline::Pipeline;
use crate::report;
use crate::repository::{GitHubRepository, LocalRepository, SourceRepository};
use crate::score::Scorer;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 2;

/// Commented configuration template written by `init`.
const CONFIG_TEMPLATE: &str = include_str!("templates/default.yaml");

/// Explain a Python repository with a local language model.
///
/// gittextlab fetches the Python files of a GitHub repository (or a local
/// directory), extracts every function and import, asks a locally hosted
/// model to explain the code, and scores the project from 0 to 100.
#[derive(Parser)]
#[command(name = "gittextlab")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log progress details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a repository
    Analyze(AnalyzeArgs),
    /// Write a configuration file from the default template
    Init(InitArgs),
}

/// Arguments for the analyze command.
#[derive(Parser)]
pub struct AnalyzeArgs {
    /// GitHub repository as OWNER/REPO
    #[arg(required_unless_present = "path", conflicts_with = "path")]
    pub repository: Option<String>,

    /// Analyze a local directory instead of a GitHub repository
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// Branch to fetch raw files from
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Ask for optimization suggestions for each function
    #[arg(long)]
    pub optimize: bool,

    /// Ask for an error review of each function
    #[arg(long)]
    pub check_errors: bool,

    /// Maximum functions annotated per file
    #[arg(long)]
    pub max_functions: Option<usize>,

    /// Skip project scoring
    #[arg(long)]
    pub no_score: bool,

    /// Chat completions endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Model name sent to the endpoint
    #[arg(long)]
    pub model: Option<String>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Report file path (default: {identity}_analysis.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Do not write the report file
    #[arg(long, conflicts_with = "output")]
    pub no_report: bool,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "gittextlab.yaml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Apply command-line overrides on top of the loaded config.
fn apply_overrides(config: &mut Config, args: &AnalyzeArgs) {
    if let Some(branch) = &args.branch {
        config.repository.branch = branch.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        config.annotation.endpoint = endpoint.clone();
    }
    if let Some(model) = &args.model {
        config.annotation.model = model.clone();
    }
    if let Some(max) = args.max_functions {
        config.analysis.max_functions_per_file = max;
    }
    if args.optimize {
        config.analysis.optimize = true;
    }
    if args.check_errors {
        config.analysis.check_errors = true;
    }
    if args.no_score {
        config.scoring.enabled = false;
    }
}

fn open_repository(args: &AnalyzeArgs, config: &Config) -> anyhow::Result<Box<dyn SourceRepository>> {
    if let Some(path) = &args.path {
        if !path.is_dir() {
            anyhow::bail!("not a directory: {}", path.display());
        }
        return Ok(Box::new(LocalRepository::new(path, &config.repository)?));
    }
    match &args.repository {
        Some(slug) => Ok(Box::new(GitHubRepository::from_slug(slug, config.repository.clone())?)),
        None => anyhow::bail!("either a repository or --path is required"),
    }
}

/// Create bar progress style
fn create_bar_style() -> anyhow::Result<ProgressStyle> {
    Ok(ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
        .progress_chars("█▓▒░  "))
}

/// Create spinner progress style
fn create_spinner_style() -> anyhow::Result<ProgressStyle> {
    Ok(ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")?)
}

/// Run the analyze command.
pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    // Validate format
    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }
    let pretty = args.format == "pretty";

    let mut config = match Config::load(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error parsing config: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    apply_overrides(&mut config, args);

    if let Err(e) = config::validate(&config) {
        eprintln!("Error: invalid config: {}", e);
        return Ok(EXIT_ERROR);
    }

    let repository = match open_repository(args, &config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    let annotator = ChatClient::new(config.annotation.clone())?;
    let runtime = tokio::runtime::Runtime::new()?;

    let mut pipeline = Pipeline::new(repository.as_ref(), &annotator, config.analysis.clone());
    if pretty {
        pipeline = pipeline.with_progress(ProgressBar::new(0).with_style(create_bar_style()?));
    }

    let run = match runtime.block_on(pipeline.run()) {
        Ok(run) => run,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let score = if config.scoring.enabled {
        let spinner = if pretty {
            let spinner = ProgressBar::new_spinner().with_style(create_spinner_style()?);
            spinner.set_message("Scoring project...");
            spinner.enable_steady_tick(Duration::from_millis(100));
            Some(spinner)
        } else {
            None
        };

        let scorer = Scorer::new(&annotator, config.scoring.clone());
        let outcome = runtime.block_on(scorer.score(&run.files));

        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        Some(outcome)
    } else {
        None
    };

    let report_path = if args.no_report {
        None
    } else {
        match &args.output {
            Some(path) => {
                report::write_report_to(path, &run.files)?;
                Some(path.clone())
            }
            None => Some(report::write_report_file(Path::new("."), &run)?),
        }
    };

    if pretty {
        report::write_pretty(&run, score.as_ref(), report_path.as_deref());
    } else {
        report::write_json(&run, score.as_ref())?;
    }

    Ok(EXIT_SUCCESS)
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // Check if output already exists
    if args.output.exists() && !args.force {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it, pass --force, or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, CONFIG_TEMPLATE) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Point annotation.endpoint at your model server");
    println!(
        "  2. Run: gittextlab analyze OWNER/REPO --config {}",
        args.output.display()
    );

    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(argv: &[&str]) -> Cli {
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_analyze_requires_repository_or_path() {
        assert!(Cli::try_parse_from(["gittextlab", "analyze"]).is_err());
        assert!(Cli::try_parse_from(["gittextlab", "analyze", "a/b", "--path", "."]).is_err());

        let cli = parse(&["gittextlab", "analyze", "--path", "."]);
        match cli.command {
            Commands::Analyze(args) => assert_eq!(args.path, Some(PathBuf::from("."))),
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_overrides() {
        let cli = parse(&[
            "gittextlab",
            "-v",
            "analyze",
            "octocat/spoon",
            "--branch",
            "main",
            "--optimize",
            "--max-functions",
            "3",
            "--no-score",
            "--model",
            "qwen",
        ]);
        assert!(cli.verbose);
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };

        let mut config = Config::default();
        apply_overrides(&mut config, &args);
        assert_eq!(config.repository.branch, "main");
        assert_eq!(config.analysis.max_functions_per_file, 3);
        assert!(config.analysis.optimize);
        assert!(!config.analysis.check_errors);
        assert!(!config.scoring.enabled);
        assert_eq!(config.annotation.model, "qwen");
    }

    #[test]
    fn test_init_writes_template() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("conf/gittextlab.yaml");
        let args = InitArgs {
            output: output.clone(),
            force: false,
        };

        assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);
        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(Config::parse_str(&written).unwrap(), Config::default());

        // refuses to overwrite without --force
        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);
        let forced = InitArgs { output, force: true };
        assert_eq!(run_init(&forced).unwrap(), EXIT_SUCCESS);
    }

    #[test]
    fn test_invalid_format() {
        let cli = parse(&["gittextlab", "analyze", "a/b", "--format", "sarif"]);
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(run_analyze(&args).unwrap(), EXIT_ERROR);
    }
}
