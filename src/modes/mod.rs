//! Run modes.
//!
//! - `plan` produces the initial plan
//! - `validate` produces a second plan and compares it with the initial one
//! - `apply` applies the saved plan file
//!
//! Each mode records its sections in the [`RunSummary`]; writing the summary
//! is left to the caller.

mod apply;
mod plan;
mod validate;

pub use apply::ApplyOutcome;
pub use plan::PlanOutcome;
pub use validate::{Fingerprints, ValidateOutcome};

use crate::artifacts::ArtifactStore;
use crate::config::{GuardConfig, RunMode};
use crate::error::Result;
use crate::summary::{RunSummary, StepOutputs};
use crate::terraform::{CommandRunner, RunResult, TerraformWorkflow};

/// Failure message when validate detects drift.
pub const DRIFT_MESSAGE: &str =
    "Terraform plans do NOT match. See the plan diff artifact for details.";

/// Runs the configured mode against a command runner and artifact store.
#[derive(Debug)]
pub struct ModeRunner<'a, R: ?Sized, S: ?Sized> {
    config: &'a GuardConfig,
    runner: &'a R,
    store: &'a S,
}

/// Outcome of any mode.
#[derive(Debug)]
pub enum Outcome {
    /// Plan mode outcome.
    Plan(PlanOutcome),
    /// Validate mode outcome.
    Validate(ValidateOutcome),
    /// Apply mode outcome.
    Apply(ApplyOutcome),
}

impl<'a, R, S> ModeRunner<'a, R, S>
where
    R: CommandRunner + ?Sized,
    S: ArtifactStore + ?Sized,
{
    /// Creates a mode runner.
    #[must_use]
    pub const fn new(config: &'a GuardConfig, runner: &'a R, store: &'a S) -> Self {
        Self {
            config,
            runner,
            store,
        }
    }

    pub(crate) const fn workflow(&self) -> TerraformWorkflow<'a, R, S> {
        TerraformWorkflow::new(self.config, self.runner, self.store)
    }

    /// Runs the mode named by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error only for hard aborts: tools that cannot be started,
    /// a missing stack directory, or artifacts that cannot be written.
    pub async fn run(&self, summary: &mut RunSummary) -> Result<Outcome> {
        match self.config.mode {
            RunMode::Plan => Ok(Outcome::Plan(self.plan(summary).await?)),
            RunMode::Validate => Ok(Outcome::Validate(self.validate(summary).await?)),
            RunMode::Apply => Ok(Outcome::Apply(self.apply(summary).await?)),
        }
    }
}

impl Outcome {
    /// Mode that produced this outcome.
    #[must_use]
    pub const fn mode(&self) -> RunMode {
        match self {
            Self::Plan(_) => RunMode::Plan,
            Self::Validate(_) => RunMode::Validate,
            Self::Apply(_) => RunMode::Apply,
        }
    }

    /// Stage result of the mode.
    #[must_use]
    pub const fn result(&self) -> &RunResult {
        match self {
            Self::Plan(o) => &o.result,
            Self::Validate(o) => &o.result,
            Self::Apply(o) => &o.result,
        }
    }

    /// Reason the run should be marked failed, if any.
    #[must_use]
    pub fn failure(&self) -> Option<String> {
        let result = self.result();
        let fallback = match self {
            Self::Plan(_) => "Terraform plan failed.",
            Self::Validate(_) => "Detecting plan drift failed.",
            Self::Apply(_) => "Terraform apply failed.",
        };

        if !result.success {
            return Some(result.error.clone().unwrap_or_else(|| fallback.to_string()));
        }

        match self {
            Self::Validate(o) if o.drift_detected => Some(DRIFT_MESSAGE.to_string()),
            _ => None,
        }
    }

    /// Returns true if the run passed.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.failure().is_none()
    }

    /// Step outputs of a successful mode.
    #[must_use]
    pub fn outputs(&self) -> Vec<(&'static str, String)> {
        if !self.result().success {
            return Vec::new();
        }

        match self {
            Self::Plan(o) => vec![("no_changes", o.no_changes.to_string())],
            Self::Validate(o) => vec![("drift_detected", o.drift_detected.to_string())],
            Self::Apply(_) => Vec::new(),
        }
    }

    /// Publishes the step outputs.
    ///
    /// # Errors
    ///
    /// Returns an error if an output cannot be written.
    pub async fn publish(&self, outputs: &StepOutputs) -> Result<()> {
        for (name, value) in self.outputs() {
            outputs.set(name, &value).await?;
        }
        Ok(())
    }
}

/// Records a stage section: heading, verdict line and collapsible output.
fn stage_section(
    summary: &mut RunSummary,
    heading: &str,
    action: &str,
    output_label: &str,
    result: &RunResult,
) {
    let verdict = if result.success {
        format!("✅ Terraform {action} completed successfully!\n\n")
    } else {
        format!("❌ Terraform {action} failed! See error:\n\n")
    };

    summary
        .heading(heading)
        .raw(&verdict)
        .output_details(output_label, result.output.as_deref())
        .separator();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(error: Option<&str>) -> RunResult {
        RunResult {
            success: false,
            output: None,
            error: error.map(String::from),
        }
    }

    #[test]
    fn test_failure_fallback_messages() {
        let plan = Outcome::Plan(PlanOutcome {
            result: failed(None),
            no_changes: false,
        });
        assert_eq!(plan.failure().as_deref(), Some("Terraform plan failed."));

        let apply = Outcome::Apply(ApplyOutcome {
            result: failed(Some("Terraform apply failed with exit code 1.")),
        });
        assert_eq!(
            apply.failure().as_deref(),
            Some("Terraform apply failed with exit code 1.")
        );
    }

    #[test]
    fn test_drift_fails_run() {
        let validate = Outcome::Validate(ValidateOutcome {
            result: RunResult {
                success: true,
                ..RunResult::default()
            },
            drift_detected: true,
            ..ValidateOutcome::default()
        });

        assert_eq!(validate.failure().as_deref(), Some(DRIFT_MESSAGE));
        assert_eq!(
            validate.outputs(),
            vec![("drift_detected", String::from("true"))]
        );
    }

    #[test]
    fn test_failed_mode_has_no_outputs() {
        let plan = Outcome::Plan(PlanOutcome {
            result: failed(None),
            no_changes: true,
        });
        assert!(plan.outputs().is_empty());
        assert!(!plan.succeeded());
    }

    #[test]
    fn test_stage_section_failure() {
        let mut summary = RunSummary::in_memory();
        stage_section(
            &mut summary,
            "🛠️ Terraform Apply",
            "apply",
            "Show Terraform Apply Output",
            &failed(Some("boom")),
        );
        assert!(summary.pending().contains("❌ Terraform apply failed! See error:\n\n"));
        assert!(summary.pending().contains("No output available."));
    }
}
