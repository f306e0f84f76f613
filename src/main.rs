//! derisk-sql CLI
//!
//! Entry point for the command-line tool.
//!
//! Exit codes:
//! - 0: No fatal diagnostics
//! - 1: A fatal diagnostic was reported, or an analyzer failed to run
//! - 2: Tool error (config error, unreadable migrations, malformed input, etc.)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use derisk_sql::analysis::analyze_request;
use derisk_sql::config::{self, Config, DEFAULT_CONFIG_FILE};
use derisk_sql::input::MigrationLoader;
use derisk_sql::input::dbmate::DbmateLoader;
use derisk_sql::output::{self, JsonReporter, Reporter, TextReporter};
use derisk_sql::protocol::{self, AnalysisRequest};
use derisk_sql::{AnalyzerId, CheckPipeline, capability};

#[derive(Parser, Debug)]
#[command(name = "derisk-sql", version)]
#[command(about = "Lints dbmate SQL migration files for risky schema changes", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "DERISK_SQL_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze every migration in the migrations directory
    Run(RunArgs),

    /// Run one built-in analyzer over a request envelope read from stdin
    Analyzer {
        /// Built-in analyzer id (e.g., analyzer-naming-convention)
        id: String,
    },

    /// Print JSON report files written by a previous run
    Report {
        /// Directory holding report.*.json files
        #[arg(long, default_value = "reports")]
        input_dir: PathBuf,

        /// Print a header line per report
        #[arg(long)]
        details: bool,
    },

    /// Explain a built-in analyzer (e.g., explain analyzer-create-index-concurrently)
    Explain {
        id: String,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Directory holding dbmate migration files
    #[arg(long, env = "DBMATE_MIGRATIONS_DIR")]
    migrations_dir: Option<PathBuf>,

    /// Directory for JSON report files (empty disables them)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Analyzer to run; repeat to run several. Replaces the configured list
    #[arg(long = "analyzer", value_name = "NAME")]
    analyzers: Vec<String>,

    /// Analyzer config entry; repeat to set several
    #[arg(long = "config-value", value_name = "KEY=VALUE")]
    config_values: Vec<String>,

    /// Run built-in analyzers as child processes
    #[arg(long)]
    isolate: bool,

    /// Print a header line per report
    #[arg(long)]
    details: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(failed) => {
            if failed {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(2)
        }
    }
}

/// Logs go to stderr; stdout carries reports and protocol output.
fn init_logging(verbose: bool) {
    let default_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Returns `Ok(true)` when the run should exit 1, or `Err` on tool errors.
fn run(args: Args) -> Result<bool> {
    match args.command {
        Command::Run(run_args) => run_checks(args.config.as_deref(), run_args),
        Command::Analyzer { id } => run_analyzer(&id),
        Command::Report { input_dir, details } => print_reports(&input_dir, details),
        Command::Explain { id } => {
            explain_analyzer(&id)?;
            Ok(false)
        }
    }
}

fn run_checks(config_path: Option<&Path>, run_args: RunArgs) -> Result<bool> {
    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, run_args)?;

    // --- Step 1: Load migrations ---
    let migrations = DbmateLoader
        .load(&config.migrations.dir)
        .context("Failed to load migrations")?;
    if migrations.is_empty() {
        warn!(
            "No migrations detected in migration directory {:?}",
            config.migrations.dir.display().to_string()
        );
        return Ok(false);
    }
    info!(count = migrations.len(), "loaded migrations");

    // --- Step 2: Resolve analyzers ---
    let self_exe = if config.analyzers.isolate {
        Some(std::env::current_exe().context("Failed to locate the derisk-sql executable")?)
    } else {
        None
    };
    let mut pipeline = CheckPipeline::new();
    for name in &config.analyzers.names {
        pipeline.push(capability::resolve(name, self_exe.as_deref()));
    }

    // --- Step 3: Run ---
    let request = AnalysisRequest {
        metadata: config.metadata(),
        migrations,
    };
    let summary = pipeline.run(&request);

    // --- Step 4: Emit reports ---
    let text = TextReporter::new(config.output.verbose);
    let json = config.output.json_dir().map(JsonReporter::new);
    for outcome in &summary.outcomes {
        match &outcome.result {
            Ok(reports) => {
                text.emit(&outcome.name, reports)
                    .context("Failed to print reports")?;
                if let Some(json) = &json {
                    json.emit(&outcome.name, reports).with_context(|| {
                        format!("Failed to write report for {}", outcome.name)
                    })?;
                }
            }
            Err(err) => {
                eprintln!("Error encountered running analyzer {}: {}", outcome.name, err);
            }
        }
    }

    // --- Step 5: Summary and exit code ---
    eprintln!(
        "derisk-sql: {} diagnostic(s) from {} analyzer(s)",
        summary.diagnostic_count(),
        summary.outcomes.len()
    );
    if summary.is_fatal() {
        eprintln!("Encountered FATAL errors!");
    }

    Ok(summary.is_fatal() || summary.has_failures())
}

/// CLI flags take precedence over the config file.
fn apply_overrides(config: &mut Config, run_args: RunArgs) -> Result<()> {
    if let Some(dir) = run_args.migrations_dir {
        config.migrations.dir = dir;
    }
    if let Some(dir) = run_args.output_dir {
        config.output.dir = dir;
    }
    if !run_args.analyzers.is_empty() {
        config.analyzers.names = run_args.analyzers;
    }
    if run_args.isolate {
        config.analyzers.isolate = true;
    }
    if run_args.details {
        config.output.verbose = true;
    }
    for pair in &run_args.config_values {
        let (key, value) = config::parse_key_value(pair)?;
        config.set_rule_value(key, value);
    }
    config.validate()?;
    Ok(())
}

/// Subprocess mode: the request comes on stdin and the response goes to stdout.
fn run_analyzer(id: &str) -> Result<bool> {
    let analyzer = AnalyzerId::lookup(id)?;
    let request = protocol::read_request(std::io::stdin().lock())
        .context("Failed to decode analyzer request from stdin")?;

    let response = analyze_request(&request, &analyzer);
    protocol::write_response(std::io::stdout().lock(), &response)
        .context("Failed to write analyzer response")?;
    Ok(false)
}

fn print_reports(input_dir: &Path, details: bool) -> Result<bool> {
    let files = output::read_report_files(input_dir)
        .with_context(|| format!("Failed to read reports from {}", input_dir.display()))?;

    let text = TextReporter::new(details);
    let mut fatal = false;
    for file in &files {
        text.emit(&file.analyzer, &file.reports)
            .context("Failed to print reports")?;
        fatal |= derisk_sql::is_fatal(&file.reports);
    }
    Ok(fatal)
}

/// Load configuration from file.
///
/// If `config_path` is `Some`, the user explicitly passed `--config` and the file
/// must exist (error if not found). If `None`, the default config path is used;
/// a missing default config file is not an error (falls back to defaults with a warning).
fn load_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Config::from_file(path).context("Failed to load configuration")
        }
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                Config::from_file(&default_path).context("Failed to load configuration")
            } else {
                warn!(
                    "Config file {} not found, using defaults",
                    default_path.display()
                );
                Ok(Config::default())
            }
        }
    }
}

fn explain_analyzer(id: &str) -> Result<()> {
    let analyzer = AnalyzerId::lookup(id)?;
    println!("Analyzer: {}", analyzer);
    println!("Codes: {}", analyzer.codes().join(", "));
    println!("Description: {}", analyzer.description());
    println!();
    println!("{}", analyzer.explain());
    Ok(())
}
