use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use note_funnel_analysis::length::{LengthEvaluation, LengthPolicy, evaluate_length};
use note_funnel_analysis::output::{OutputFormat, format_response, format_verdict};
use note_funnel_analysis::verdict::extract_verdict;
use note_funnel_analysis::{AnalysisOptions, EvaluationPolicy, analyze_records};
use note_funnel_core::Verdict;
use note_funnel_records::{AnalyzerConfig, LengthConfig, RecordBatch};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "note-funnel")]
#[command(about = "Funnel analysis of content-review pipeline runs", version)]
struct Cli {
    /// Log at debug level (otherwise RUST_LOG, default: warn).
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze a batch of pipeline run records into a funnel graph.
    Analyze(AnalyzeArgs),
    /// Extract a structured verdict from a model's free-text answer.
    Extract(ExtractArgs),
    /// Measure a note against the character budget.
    Length(LengthArgs),
    /// Validate an analyzer config file and print the effective values.
    CheckConfig(CheckConfigArgs),
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    /// Record file or directory of record files (`-` reads JSON from stdin).
    #[arg(long)]
    input: PathBuf,
    /// Analyzer config YAML.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Analyze at most this many records (overrides batch.limit).
    #[arg(long)]
    limit: Option<usize>,
    /// Worker threads for stage evaluation (overrides batch.jobs).
    #[arg(long)]
    jobs: Option<usize>,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
    /// Write output to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// File holding the model answer (default: stdin).
    #[arg(long)]
    input: Option<PathBuf>,
    /// Analyzer config YAML, for the length budget.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct LengthArgs {
    /// File holding the note text (default: stdin).
    #[arg(long)]
    input: Option<PathBuf>,
    /// Character budget.
    #[arg(long)]
    limit: Option<usize>,
    /// Characters charged per URL.
    #[arg(long)]
    url_cost: Option<usize>,
}

#[derive(Debug, Args)]
struct CheckConfigArgs {
    /// Analyzer config YAML.
    #[arg(long)]
    config: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Analyze(args) => run_analyze(args),
        Command::Extract(args) => run_extract(args),
        Command::Length(args) => run_length(args),
        Command::CheckConfig(args) => run_check_config(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// analyze command
// ---------------------------------------------------------------------------

fn run_analyze(args: AnalyzeArgs) -> Result<(), String> {
    if args.limit == Some(0) {
        return Err("--limit must be at least 1".to_string());
    }
    if args.jobs == Some(0) {
        return Err("--jobs must be at least 1".to_string());
    }

    let config = load_config(args.config.as_deref())?;
    let batch = load_batch(&args.input)?;

    let options = AnalysisOptions {
        policy: evaluation_policy(&config),
        limit: args.limit.or(config.batch.limit),
        jobs: args.jobs.or(config.batch.jobs),
    };
    debug!(?options, records = batch.len(), "starting analysis");

    let mut response = analyze_records(batch.records(), &options);
    response.generated_at = Some(chrono::Utc::now().to_rfc3339());

    let rendered = format_response(&response, args.format)?;
    match args.output {
        Some(path) => {
            write_file(&path, &rendered)?;
            println!(
                "Analyzed {} record(s) ({} failed); wrote '{}'.",
                response.total,
                response.summary.failed,
                path.display()
            );
        }
        None => println!("{}", rendered.trim_end()),
    }
    Ok(())
}

fn load_batch(input: &Path) -> Result<RecordBatch, String> {
    if input.as_os_str() == "-" {
        let raw = read_stdin()?;
        return RecordBatch::from_json_str(&raw)
            .map_err(|e| format!("Failed to load records from stdin: {e}"));
    }
    let batch = RecordBatch::from_path(input)
        .map_err(|e| format!("Failed to load records from '{}': {e}", input.display()))?;
    info!(count = batch.len(), input = %input.display(), "loaded records");
    Ok(batch)
}

fn evaluation_policy(config: &AnalyzerConfig) -> EvaluationPolicy {
    EvaluationPolicy {
        pass_threshold: config.evaluation.pass_threshold,
        platform_acceptance_floor: config.evaluation.platform_acceptance_floor,
        qualifying_status: config.evaluation.qualifying_status.clone(),
    }
}

// ---------------------------------------------------------------------------
// extract / length commands
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ExtractOutput<'a> {
    #[serde(flatten)]
    verdict: &'a Verdict,
    length: LengthEvaluation,
}

fn run_extract(args: ExtractArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let text = read_text(args.input.as_deref())?;
    let verdict = extract_verdict(&text).map_err(|e| e.to_string())?;
    let length = evaluate_length(&verdict.note, &length_policy(&config));

    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&ExtractOutput {
            verdict: &verdict,
            length,
        })
        .map_err(|e| format!("Failed to serialize output: {e}"))?,
        OutputFormat::Yaml => serde_yaml::to_string(&ExtractOutput {
            verdict: &verdict,
            length,
        })
        .map_err(|e| format!("Failed to serialize output: {e}"))?,
        other => format!(
            "{}\n{}",
            format_verdict(&verdict, other)?.trim_end(),
            length.reasoning
        ),
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn run_length(args: LengthArgs) -> Result<(), String> {
    let defaults = LengthConfig::default();
    let length = LengthConfig {
        limit: args.limit.unwrap_or(defaults.limit),
        url_cost: args.url_cost.unwrap_or(defaults.url_cost),
    };
    length.validate().map_err(|e| e.to_string())?;
    let policy = LengthPolicy {
        limit: length.limit,
        url_cost: length.url_cost,
    };

    let text = read_text(args.input.as_deref())?;

    // A trailing newline from the file or terminal is not part of the note.
    let note = text.trim_end_matches(['\n', '\r']);
    let evaluation = evaluate_length(note, &policy);
    let json = serde_json::to_string_pretty(&evaluation)
        .map_err(|e| format!("Failed to serialize output: {e}"))?;
    println!("{json}");
    Ok(())
}

fn length_policy(config: &AnalyzerConfig) -> LengthPolicy {
    LengthPolicy {
        limit: config.length.limit,
        url_cost: config.length.url_cost,
    }
}

// ---------------------------------------------------------------------------
// check-config command
// ---------------------------------------------------------------------------

fn run_check_config(args: CheckConfigArgs) -> Result<(), String> {
    let config = load_config(Some(&args.config))?;
    let yaml = serde_yaml::to_string(&config)
        .map_err(|e| format!("Failed to serialize config: {e}"))?;
    eprintln!("Config '{}' is valid.", args.config.display());
    print!("{yaml}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_config(path: Option<&Path>) -> Result<AnalyzerConfig, String> {
    match path {
        Some(path) => AnalyzerConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display())),
        None => Ok(AnalyzerConfig::default()),
    }
}

fn read_text(input: Option<&Path>) -> Result<String, String> {
    match input {
        Some(path) => fs::read_to_string(path)
            .map_err(|err| format!("Failed to read '{}': {err}", path.display())),
        None => read_stdin(),
    }
}

fn read_stdin() -> Result<String, String> {
    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .map_err(|err| format!("Failed to read stdin: {err}"))?;
    Ok(raw)
}

fn write_file(path: &Path, contents: &str) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                format!(
                    "Failed to create output directory '{}': {err}",
                    parent.display()
                )
            })?;
        }
    }
    fs::write(path, contents).map_err(|err| format!("Failed to write '{}': {err}", path.display()))
}
