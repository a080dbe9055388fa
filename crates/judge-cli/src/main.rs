//! Judge CLI
//!
//! Serves the judge API, or judges a single source file from the command line.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use judge_engine::{evaluate_with_policy, input_prompt, Judge, SubmissionRequest, Verdict};
use judge_report::{json::JsonGenerator, GradingReport, MarkdownGenerator};
use judge_server::{create_router, AppState, Config};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Default port for the HTTP API server.
const DEFAULT_PORT: u16 = 3000;

/// Exit code for an accepted submission.
const EXIT_ACCEPTED: u8 = 0;

/// Exit code for a usage, I/O or configuration error.
const EXIT_ERROR: u8 = 1;

/// Exit code for a submission that was judged but not accepted.
const EXIT_REJECTED: u8 = 2;

/// Judge - heuristic grading for teaching exercises
///
/// Validates submitted source text, predicts its output without running it,
/// and grades that output against a problem's fixtures.
#[derive(Parser, Debug)]
#[command(name = "judge")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: judge.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Artificial execution delay in milliseconds, overriding the config
    #[arg(long, value_name = "MS", global = true)]
    delay_ms: Option<u64>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP API and WebSocket server
    Serve {
        /// Port for the HTTP API server
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,
    },

    /// Judge a source file and print its simulated output
    Run {
        /// Path to the source file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Text supplied as stdin
        #[arg(long, value_name = "TEXT")]
        stdin: Option<String>,
    },

    /// Grade a source file against a problem's fixtures
    Grade {
        /// Path to the source file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Problem id to grade against
        #[arg(short, long, value_name = "ID")]
        problem: u64,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Markdown)]
        format: ReportFormat,

        /// Write the report to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Markdown,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::debug!(config = ?args.config, "Config file");

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(delay_ms) = args.delay_ms {
        config.execution_delay_ms = delay_ms;
    }

    // Re-validate after overrides
    config.validate()?;

    match args.command {
        Command::Serve { port, host } => {
            serve(config, SocketAddr::new(host, port)).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Run { file, stdin } => run_file(&config, &file, stdin).await,
        Command::Grade {
            file,
            problem,
            format,
            output,
        } => grade_file(&config, &file, problem, format, output.as_deref()).await,
    }
}

/// Runs the HTTP server until Ctrl+C.
async fn serve(config: Config, addr: SocketAddr) -> anyhow::Result<()> {
    print_config(&config);

    println!();
    println!("Starting HTTP API server on {addr}...");

    let router = create_router(AppState::new(config));

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {addr}: {e}\n\nSuggestion: Try a different port with --port"
        )
    })?;

    println!("HTTP API server running on http://{addr}");
    println!("Press Ctrl+C to stop");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

/// Judges one file and prints the verdict.
async fn run_file(config: &Config, file: &Path, stdin: Option<String>) -> anyhow::Result<ExitCode> {
    let request = SubmissionRequest::new(read_source(file)?, stdin)?;

    if let Some(prompt) = input_prompt(request.source_text()) {
        tracing::debug!(prompt = %prompt, "Program reads input");
        if request.stdin_text().is_none() {
            eprintln!("Note: the program asks \"{prompt}\"; pass input with --stdin");
        }
    }

    let judge = Judge::new(config.judge_options());
    let verdict = judge.judge(&request).await?;

    print_verdict(&verdict);

    Ok(ExitCode::from(exit_code(verdict.succeeded())))
}

/// Judges one file against a problem and emits a grading report.
async fn grade_file(
    config: &Config,
    file: &Path,
    problem_id: u64,
    format: ReportFormat,
    output: Option<&Path>,
) -> anyhow::Result<ExitCode> {
    let problem = config.problem_store().get(problem_id)?.ok_or_else(|| {
        anyhow::anyhow!(
            "Problem not found: {problem_id}\n\nSuggestion: Check the id against the configured problem set"
        )
    })?;

    let request = SubmissionRequest::new(read_source(file)?, None)?;
    let verdict = Judge::new(config.judge_options()).judge(&request).await?;
    let result = evaluate_with_policy(&verdict, &problem.fixtures, config.empty_fixture_policy);

    tracing::info!(
        problem_id,
        status = %result.status,
        passed = result.passed_count(),
        total = result.fixture_results.len(),
        "Graded submission"
    );

    let report = GradingReport::from_result(problem.title.clone(), &result)?
        .with_source_path(file.display().to_string());

    match (format, output) {
        (ReportFormat::Json, Some(path)) => {
            JsonGenerator::new(&report).write_to_file(path, true)?;
            println!("JSON report: {}", path.display());
        }
        (ReportFormat::Json, None) => println!("{}", JsonGenerator::new(&report).generate_pretty()?),
        (ReportFormat::Markdown, Some(path)) => {
            std::fs::write(path, MarkdownGenerator::new(&report).generate())?;
            println!("Markdown report: {}", path.display());
        }
        (ReportFormat::Markdown, None) => print!("{}", MarkdownGenerator::new(&report).generate()),
    }

    Ok(ExitCode::from(exit_code(result.is_accepted())))
}

/// Maps a judged submission to the process exit status.
const fn exit_code(accepted: bool) -> u8 {
    if accepted {
        EXIT_ACCEPTED
    } else {
        EXIT_REJECTED
    }
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to read '{}': {e}\n\nSuggestion: Check that the source file exists and is readable",
            path.display()
        )
    })
}

/// Loads configuration from file or defaults.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

fn print_config(config: &Config) {
    println!("Configuration loaded:");
    println!("  Execution delay: {}ms", config.execution_delay_ms);
    match config.timeout_ms {
        Some(ms) => println!("  Timeout: {ms}ms"),
        None => println!("  Timeout: none"),
    }
    println!("  Max concurrent: {}", config.max_concurrent);
    println!("  Overflow: {}", config.overflow.as_str());
    println!("  Empty fixture policy: {}", config.empty_fixture_policy.as_str());
    println!(
        "  Problems: {}",
        config.problems_file.as_deref().unwrap_or("built-in")
    );
}

fn print_verdict(verdict: &Verdict) {
    match verdict.diagnostic() {
        Some(diagnostic) => eprintln!("{}", diagnostic.message),
        None => println!("{}", verdict.simulated_output()),
    }
    eprintln!("Finished in {}", verdict.elapsed_label());
}
