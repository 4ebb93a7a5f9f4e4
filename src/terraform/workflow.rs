//! CDKTF synth and Terraform stages.
//!
//! Every stage maps to one subprocess. A stage that exits non-zero yields a
//! failed [`RunResult`] and later stages are skipped. Only a missing stack
//! directory after a successful synth aborts with an error.

use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

use crate::artifacts::ArtifactStore;
use crate::config::{GuardConfig, PLAN_JSON_FILE};
use crate::error::{ArtifactError, ConfigError, GuardError, Result, ToolError};

use super::runner::{CommandResult, CommandRunner, Invocation};

/// Terraform's message for a plan without changes.
pub const NO_CHANGES_MARKER: &str = "No changes. Your infrastructure matches the configuration.";

/// Binary plan file written by `terraform plan`.
pub const PLAN_FILE: &str = "plan.tfplan";

const PLAN_STDOUT_LOG: &str = "plan.stdout.log";
const PLAN_STDERR_LOG: &str = "plan.stderr.log";
const SHOW_STDERR_LOG: &str = "plan_show.stderr.log";
const APPLY_STDOUT_LOG: &str = "apply.stdout.log";
const APPLY_STDERR_LOG: &str = "apply.stderr.log";

/// A workflow stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// CDKTF synth.
    Synth,
    /// `terraform init`.
    Init,
    /// `terraform plan`.
    Plan,
    /// `terraform show -json`.
    Show,
    /// `terraform apply`.
    Apply,
}

/// Outcome of a stage or a chain of stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunResult {
    /// Whether the stages succeeded.
    pub success: bool,
    /// Human-readable output.
    pub output: Option<String>,
    /// Failure message.
    pub error: Option<String>,
}

/// Outcome of the plan workflow.
#[derive(Debug, Clone, Default)]
pub struct PlanRun {
    /// Stage result.
    pub result: RunResult,
    /// `terraform show -json` output, empty unless a plan was extracted.
    pub plan_json: String,
    /// Terraform reported that nothing would change.
    pub no_changes: bool,
}

/// Outcome of the apply workflow.
#[derive(Debug, Clone, Default)]
pub struct ApplyRun {
    /// Stage result.
    pub result: RunResult,
}

/// Drives the synth command and Terraform for one stack.
#[derive(Debug)]
pub struct TerraformWorkflow<'a, R: ?Sized, S: ?Sized> {
    config: &'a GuardConfig,
    runner: &'a R,
    store: &'a S,
}

impl Stage {
    /// Stage name used in messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Synth => "CDKTF synth",
            Self::Init => "Terraform init",
            Self::Plan => "Terraform plan",
            Self::Show => "Terraform show",
            Self::Apply => "Terraform apply",
        }
    }

    /// Log file holding the stage's error output, if one is written.
    #[must_use]
    pub const fn error_log(self) -> Option<&'static str> {
        match self {
            Self::Synth | Self::Init => None,
            Self::Plan => Some(PLAN_STDERR_LOG),
            Self::Show => Some(SHOW_STDERR_LOG),
            Self::Apply => Some(APPLY_STDERR_LOG),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl RunResult {
    /// Successful result with output.
    #[must_use]
    pub fn succeeded(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            error: None,
        }
    }

    /// Failed result.
    #[must_use]
    pub fn failed(error: impl Into<String>, output: Option<String>) -> Self {
        Self {
            success: false,
            output,
            error: Some(error.into()),
        }
    }

    /// Failed result for a stage that exited non-zero.
    ///
    /// Stages with an error log point to it and carry stderr as output.
    #[must_use]
    pub fn stage_failed(stage: Stage, command: &CommandResult) -> Self {
        let mut error = ToolError::StageFailed {
            stage: stage.to_string(),
            exit_code: command.code(),
        }
        .to_string();

        if let Some(log) = stage.error_log() {
            error.push_str(&format!(" See {log} for details."));
        }

        let output = Some(command.stderr.clone()).filter(|s| !s.is_empty());
        Self::failed(error, output)
    }
}

impl<'a, R, S> TerraformWorkflow<'a, R, S>
where
    R: CommandRunner + ?Sized,
    S: ArtifactStore + ?Sized,
{
    /// Creates a workflow for the configured stack.
    #[must_use]
    pub const fn new(config: &'a GuardConfig, runner: &'a R, store: &'a S) -> Self {
        Self {
            config,
            runner,
            store,
        }
    }

    fn terraform(&self, args: &[&str]) -> Invocation {
        Invocation::new(
            &self.config.tools.terraform_bin,
            args.iter().copied(),
            self.config.stack_dir(),
        )
    }

    /// Runs the synth command in the working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the synth command is empty or cannot be started.
    pub async fn synth(&self) -> Result<RunResult> {
        info!("Running CDKTF synth...");

        let (program, args) = self.config.tools.synth_command.split_first().ok_or_else(|| {
            GuardError::Config(ConfigError::validation(
                "Synth command cannot be empty",
                "tools.synth_command",
            ))
        })?;

        let invocation = Invocation::new(program, args, &self.config.working_directory);
        let command = self.runner.run(&invocation).await?;
        debug!("Synth output:\n{}", command.stdout);

        if command.success() {
            Ok(RunResult::succeeded("CDKTF synth'd successfully."))
        } else {
            Ok(RunResult::stage_failed(Stage::Synth, &command))
        }
    }

    /// Runs `terraform init` in the stack directory.
    ///
    /// # Errors
    ///
    /// Returns an error if Terraform cannot be started.
    pub async fn init(&self) -> Result<RunResult> {
        info!("Initializing Terraform in {}...", self.config.stack_dir().display());

        let command = self.runner.run(&self.terraform(&["init", "-no-color"])).await?;
        debug!("Init output:\n{}", command.stdout);

        if command.success() {
            Ok(RunResult::succeeded("Terraform initialized successfully."))
        } else {
            Ok(RunResult::stage_failed(Stage::Init, &command))
        }
    }

    /// Synthesizes the app and initializes Terraform in the stack directory.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::StackDirMissing`] if synth succeeded but did
    /// not produce the stack directory.
    pub async fn prepare_stack(&self) -> Result<RunResult> {
        let synth = self.synth().await?;
        if !synth.success {
            return Ok(synth);
        }

        if !self.store.stack_exists().await? {
            return Err(GuardError::Artifact(ArtifactError::StackDirMissing {
                path: self.config.stack_dir(),
            }));
        }

        self.init().await
    }

    /// Produces a plan file and its JSON representation.
    ///
    /// # Errors
    ///
    /// Returns an error if a tool cannot be started, the stack directory is
    /// missing, or a log cannot be written.
    pub async fn plan(&self) -> Result<PlanRun> {
        let prepared = self.prepare_stack().await?;
        if !prepared.success {
            return Ok(PlanRun {
                result: prepared,
                ..PlanRun::default()
            });
        }

        info!("Running Terraform plan in {}...", self.config.stack_dir().display());

        let plan_out = format!("-out={PLAN_FILE}");
        let plan = self
            .runner
            .run(&self.terraform(&["plan", plan_out.as_str(), "-no-color"]))
            .await?;

        self.store.write(PLAN_STDOUT_LOG, &plan.stdout).await?;
        self.store.write(PLAN_STDERR_LOG, &plan.stderr).await?;

        if !plan.success() {
            return Ok(PlanRun {
                result: RunResult::stage_failed(Stage::Plan, &plan),
                ..PlanRun::default()
            });
        }

        if plan.stdout.contains(NO_CHANGES_MARKER) {
            info!("Terraform reported no changes");
            return Ok(PlanRun {
                result: RunResult::succeeded(
                    "✅ No changes detected in Terraform plan. Canceling job.",
                ),
                plan_json: String::new(),
                no_changes: true,
            });
        }

        info!("Extracting JSON plan from {PLAN_FILE}...");

        let show = self
            .runner
            .run(&self.terraform(&["show", "-json", PLAN_FILE]))
            .await?;

        self.store.write(SHOW_STDERR_LOG, &show.stderr).await?;
        self.store.write(PLAN_JSON_FILE, &show.stdout).await?;

        if !show.success() {
            return Ok(PlanRun {
                result: RunResult::stage_failed(Stage::Show, &show),
                ..PlanRun::default()
            });
        }

        Ok(PlanRun {
            result: RunResult::succeeded(plan.stdout),
            plan_json: show.stdout,
            no_changes: false,
        })
    }

    /// Applies the previously generated plan file.
    ///
    /// # Errors
    ///
    /// Returns an error if a tool cannot be started, the stack directory is
    /// missing, or a log cannot be written.
    pub async fn apply(&self) -> Result<ApplyRun> {
        let prepared = self.prepare_stack().await?;
        if !prepared.success {
            return Ok(ApplyRun { result: prepared });
        }

        info!("Running Terraform apply in {}...", self.config.stack_dir().display());

        let apply = self
            .runner
            .run(&self.terraform(&["apply", "-auto-approve", "-no-color", PLAN_FILE]))
            .await?;

        self.store.write(APPLY_STDOUT_LOG, &apply.stdout).await?;
        self.store.write(APPLY_STDERR_LOG, &apply.stderr).await?;

        if !apply.success() {
            return Ok(ApplyRun {
                result: RunResult::stage_failed(Stage::Apply, &apply),
            });
        }

        Ok(ApplyRun {
            result: RunResult::succeeded(apply.stdout),
        })
    }
}
