//! CLI command definitions.
//!
//! This module defines the run modes and their shared arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{RunInputs, RunMode};

/// driftguard - Detects drift between two Terraform plans of a CDKTF stack.
#[derive(Parser, Debug)]
#[command(name = "driftguard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Stack to operate on.
    #[arg(long, global = true, env = "STACK_NAME")]
    pub stack: Option<String>,

    /// CDKTF project directory.
    #[arg(
        short = 'd',
        long,
        global = true,
        env = "DRIFTGUARD_WORKING_DIRECTORY",
        default_value = "."
    )]
    pub working_directory: PathBuf,

    /// Deployment environment name.
    #[arg(short, long, global = true, env = "DRIFTGUARD_ENVIRONMENT")]
    pub environment: Option<String>,

    /// Git ref being deployed.
    #[arg(long = "ref", global = true, env = "DRIFTGUARD_REF")]
    pub git_ref: Option<String>,

    /// Path to the configuration file.
    #[arg(short, long, global = true, env = "DRIFTGUARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Mode to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available run modes.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Generate the initial plan.
    Plan,

    /// Generate a second plan and compare it with the initial plan.
    Validate,

    /// Apply the saved plan.
    Apply,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Commands {
    /// Run mode selected by this command.
    #[must_use]
    pub const fn mode(self) -> RunMode {
        match self {
            Self::Plan => RunMode::Plan,
            Self::Validate => RunMode::Validate,
            Self::Apply => RunMode::Apply,
        }
    }
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Run inputs for configuration resolution.
    #[must_use]
    pub fn run_inputs(&self) -> RunInputs {
        RunInputs {
            mode: self.command.mode(),
            stack_name: self.stack.clone(),
            working_directory: self.working_directory.clone(),
            environment: self.environment.clone(),
            git_ref: self.git_ref.clone(),
            config_file: self.config.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_validate_with_flags() {
        let cli = Cli::try_parse_from([
            "driftguard",
            "validate",
            "--stack",
            "prod-stack",
            "-d",
            "infra",
            "--ref",
            "refs/heads/main",
            "--output",
            "json",
        ])
        .expect("valid arguments");

        assert_eq!(cli.command, Commands::Validate);
        assert_eq!(cli.output, OutputFormat::Json);

        let inputs = cli.run_inputs();
        assert_eq!(inputs.mode, RunMode::Validate);
        assert_eq!(inputs.stack_name.as_deref(), Some("prod-stack"));
        assert_eq!(inputs.working_directory, PathBuf::from("infra"));
        assert_eq!(inputs.git_ref.as_deref(), Some("refs/heads/main"));
    }

    #[test]
    fn test_mode_is_required() {
        assert!(Cli::try_parse_from(["driftguard", "--stack", "dev"]).is_err());
    }

    #[test]
    fn test_commands_map_to_modes() {
        assert_eq!(Commands::Plan.mode(), RunMode::Plan);
        assert_eq!(Commands::Apply.mode(), RunMode::Apply);
    }
}
