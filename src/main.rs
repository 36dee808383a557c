use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use tagdedup::dedup::{ConsolidationError, ConsolidationSuggestion};
use tagdedup::paperless::PaperlessClientBuilder;
use tagdedup::report::{
    confirm_consolidation, print_analysis_report, print_consolidation_result, print_suggestion,
};
use tagdedup::{Config, ConfigError, TagAdvisor, TagAdvisorBuilder};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// tagdedup - find and merge duplicate Paperless-ngx tags
#[derive(Parser)]
#[command(name = "tagdedup")]
#[command(about = "Finds near-duplicate Paperless-ngx tags and merges them")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Group similar tag names and suggest merges
    Analyze(AnalyzeCommand),
    /// Merge the secondary tags of one suggestion into its primary tag
    Consolidate(ConsolidateCommand),
}

/// Analyze the tag vocabulary
#[derive(Parser)]
struct AnalyzeCommand {
    /// Minimum name similarity (0.0-1.0) for tags to be grouped
    #[arg(short, long, value_parser = parse_threshold_arg)]
    threshold: Option<f64>,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,
}

/// Consolidate one suggestion
#[derive(Parser)]
#[command(group(ArgGroup::new("source").required(true).args(["file", "suggestion"])))]
struct ConsolidateCommand {
    /// JSON file holding one suggestion, or `-` for stdin
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Number of the suggestion in a fresh analysis (as printed by `analyze`)
    #[arg(short, long, value_name = "N")]
    suggestion: Option<usize>,

    /// Minimum name similarity used when picking a suggestion by number
    #[arg(short, long, value_parser = parse_threshold_arg)]
    threshold: Option<f64>,

    /// Don't ask for confirmation
    #[arg(short, long)]
    yes: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

/// Errors caused by what the user asked for rather than by the server.
#[derive(Debug, Error)]
enum InputError {
    #[error("Suggestion {index} does not exist (analysis found {available})")]
    SuggestionOutOfRange { index: usize, available: usize },

    #[error("Consolidation declined")]
    Declined,

    #[error("Could not parse suggestion from {source_name}: {error}")]
    InvalidSuggestionJson {
        source_name: String,
        error: serde_json::Error,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Analyze(cmd) => handle_analyze(cmd),
        Commands::Consolidate(cmd) => handle_consolidate(cmd),
    };

    if let Err(e) = result {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Installs the stderr log subscriber. `-v` wins over `RUST_LOG`.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("tagdedup=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tagdedup=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Determines if an error is a user error (vs runtime failure).
///
/// User errors are bad configuration, bad input and invalid suggestions.
/// Everything else (network, server and consolidation failures) is a runtime error.
fn is_user_error(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause.is::<ConfigError>() || cause.is::<InputError>() || cause.is::<ConsolidationError>()
    })
}

fn parse_threshold_arg(raw: &str) -> Result<f64, String> {
    tagdedup::config::parse_threshold(raw).map_err(|e| e.to_string())
}

/// Loads configuration and applies a command-line threshold override.
fn load_config(threshold: Option<f64>) -> Result<Config> {
    let config = Config::load()?;
    match threshold {
        Some(t) => Ok(config.with_threshold(t)?),
        None => Ok(config),
    }
}

fn build_advisor(config: &Config) -> Result<TagAdvisor> {
    let client = PaperlessClientBuilder::new()
        .base_url(&config.base_url)
        .token(&config.token)
        .timeout(config.timeout)
        .build()
        .context("Failed to build Paperless client")?;

    Ok(TagAdvisorBuilder::new(Arc::new(client))
        .threshold(config.similarity_threshold)
        .build())
}

/// Handles the analyze command.
fn handle_analyze(cmd: &AnalyzeCommand) -> Result<()> {
    let config = load_config(cmd.threshold)?;
    let advisor = build_advisor(&config)?;

    let report = advisor.analyze_tags()?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_analysis_report(&report);
    }
    Ok(())
}

/// Handles the consolidate command.
fn handle_consolidate(cmd: &ConsolidateCommand) -> Result<()> {
    let config = load_config(cmd.threshold)?;
    let advisor = build_advisor(&config)?;

    let suggestion = match &cmd.file {
        Some(path) => read_suggestion(path)?,
        None => {
            let index = cmd
                .suggestion
                .context("Either --file or --suggestion is required")?;
            let report = advisor.analyze_tags()?;
            select_suggestion(report.suggestions, index)?
        }
    };

    print_suggestion(&suggestion);
    ensure_confirmed(cmd.yes, confirm_consolidation)?;

    let result = advisor.consolidate_tags(&suggestion)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_consolidation_result(&result);
    }

    if !result.success {
        anyhow::bail!(
            "consolidation finished with {} error(s)",
            result.errors.len()
        );
    }
    Ok(())
}

/// Passes when `--yes` was given or the prompt is accepted.
fn ensure_confirmed(yes: bool, confirm: impl FnOnce() -> bool) -> Result<()> {
    if yes || confirm() {
        return Ok(());
    }
    println!("Cancelled.");
    Err(InputError::Declined.into())
}

/// Reads one suggestion from a JSON file, or from stdin when `path` is `-`.
fn read_suggestion(path: &Path) -> Result<ConsolidationSuggestion> {
    let (source_name, contents) = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read suggestion from stdin")?;
        ("stdin".to_string(), buf)
    } else {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read suggestion file: {}", path.display()))?;
        (path.display().to_string(), contents)
    };

    parse_suggestion(&source_name, &contents)
}

fn parse_suggestion(source_name: &str, contents: &str) -> Result<ConsolidationSuggestion> {
    serde_json::from_str(contents).map_err(|error| {
        InputError::InvalidSuggestionJson {
            source_name: source_name.to_string(),
            error,
        }
        .into()
    })
}

/// Picks the 1-based `index` from a list of suggestions.
fn select_suggestion(
    suggestions: Vec<ConsolidationSuggestion>,
    index: usize,
) -> Result<ConsolidationSuggestion> {
    let available = suggestions.len();
    index
        .checked_sub(1)
        .and_then(|i| suggestions.into_iter().nth(i))
        .ok_or_else(|| InputError::SuggestionOutOfRange { index, available }.into())
}
