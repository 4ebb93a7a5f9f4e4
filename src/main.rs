//! driftguard CLI entrypoint.
//!
//! Runs one mode (plan, validate or apply) for a CDKTF stack and exits
//! non-zero when the run fails or drift is detected.

use std::path::PathBuf;
use std::process::ExitCode;

use plan_drift_guard::artifacts::{ArtifactStore, LocalArtifactStore};
use plan_drift_guard::cli::{Cli, OutputFormatter};
use plan_drift_guard::config::{ConfigParser, ConfigValidator, GuardConfig};
use plan_drift_guard::error::Result;
use plan_drift_guard::modes::{ModeRunner, Outcome};
use plan_drift_guard::summary::{RunSummary, STEP_OUTPUT_VAR, STEP_SUMMARY_VAR, StepOutputs};
use plan_drift_guard::terraform::ProcessRunner;

use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let formatter = OutputFormatter::new(cli.output);

    match runtime.block_on(run(&cli)) {
        Ok(outcome) => {
            eprintln!("{}", formatter.format_outcome(&outcome, chrono::Utc::now()));
            match outcome.failure() {
                None => ExitCode::SUCCESS,
                Some(reason) => {
                    error!("{reason}");
                    ExitCode::FAILURE
                }
            }
        }
        Err(e) => {
            error!("{e}");
            eprintln!("{}", formatter.format_error(&e));
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Loads and validates the run configuration.
fn load_config(cli: &Cli) -> Result<GuardConfig> {
    let parser = ConfigParser::new().with_base_path(&cli.working_directory);
    parser.load_dotenv()?;

    let config = parser.resolve(cli.run_inputs(), |name| std::env::var(name).ok())?;

    let result = ConfigValidator::new().validate(&config)?;
    for warning in &result.warnings {
        warn!("{warning}");
    }

    Ok(config)
}

/// Main async entry point.
async fn run(cli: &Cli) -> Result<Outcome> {
    let config = load_config(cli)?;

    info!("🔧 Drift guard starting in mode: {}", config.mode);
    info!("📦 Stack: {}", config.stack_name);
    info!("📁 Working directory: {}", config.working_directory.display());
    if let Some(git_ref) = &config.git_ref {
        debug!("Ref: {git_ref}");
    }

    let store = LocalArtifactStore::with_stack_dir(config.stack_dir());
    debug!("Artifacts: {} ({})", store.location(), store.backend_type());
    let runner = ProcessRunner::new();
    let mut summary = RunSummary::with_path(env_path(STEP_SUMMARY_VAR));

    let outcome = ModeRunner::new(&config, &runner, &store)
        .run(&mut summary)
        .await;

    // Sections recorded before a hard abort are still published
    summary.write().await?;
    let outcome = outcome?;

    outcome
        .publish(&StepOutputs::with_path(env_path(STEP_OUTPUT_VAR)))
        .await?;

    Ok(outcome)
}

/// Path named by an environment variable, if set and non-empty.
fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
