//! Pre-apply validation mode.
//!
//! Produces a second plan and compares it with the initial plan saved under
//! `previous/plan.json`. Any difference in the reduced change lists is drift.

use serde::Serialize;
use tracing::{error, info, warn};

use crate::artifacts::ArtifactStore;
use crate::config::PLAN_DIFF_FILE;
use crate::error::{ArtifactError, GuardError, Result};
use crate::planner::{Comparator, DiffResult, PlanFingerprint};
use crate::summary::RunSummary;
use crate::terraform::{CommandRunner, RunResult};

use super::{ModeRunner, stage_section};

/// Plan text used when Terraform reported no changes.
const EMPTY_PLAN: &str = "{}";

/// Summary heading of the diff section.
pub const DIFF_HEADING: &str = "Terraform Plan Diff - Current Plan vs Initial Plan";

const MATCH_MESSAGE: &str =
    "✅ Initial plan and current plan match! No infrastructure drift detected!\n\n";
const DRIFT_SUMMARY: &str =
    "❌ Initial plan and current plan differ! Infrastructure drift detected!\n\n";

/// Fingerprints of both reduced change lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fingerprints {
    /// Initial plan.
    pub previous: PlanFingerprint,
    /// Second plan.
    pub current: PlanFingerprint,
}

/// Outcome of validate mode.
#[derive(Debug, Default)]
pub struct ValidateOutcome {
    /// Stage result.
    pub result: RunResult,
    /// The plans differ.
    pub drift_detected: bool,
    /// Rendered diff report.
    pub diff_markdown: Option<String>,
    /// Structured diff.
    pub diff: Option<DiffResult>,
    /// Plan fingerprints.
    pub fingerprints: Option<Fingerprints>,
}

impl ValidateOutcome {
    fn failed(result: RunResult) -> Self {
        Self {
            result,
            ..Self::default()
        }
    }
}

impl<R, S> ModeRunner<'_, R, S>
where
    R: CommandRunner + ?Sized,
    S: ArtifactStore + ?Sized,
{
    /// Produces a new plan and compares it with the initial plan.
    ///
    /// Unreadable or empty baselines and malformed plans are reported as a
    /// failed result.
    ///
    /// # Errors
    ///
    /// Returns an error on hard aborts from the workflow or if the diff
    /// report cannot be written.
    pub async fn validate(&self, summary: &mut RunSummary) -> Result<ValidateOutcome> {
        let run = self.workflow().plan().await?;

        stage_section(
            summary,
            "🤔 Pre-Apply Terraform Plan",
            "plan",
            "Show Terraform Plan Output",
            &run.result,
        );

        if !run.result.success {
            return Ok(ValidateOutcome::failed(run.result));
        }

        info!("Loading previous plan...");
        let previous = match self.store.read_previous_plan().await {
            Ok(text) => text,
            Err(GuardError::Artifact(
                err @ (ArtifactError::PreviousPlanUnreadable { .. }
                | ArtifactError::PreviousPlanEmpty { .. }),
            )) => {
                error!("{err}");
                return Ok(ValidateOutcome::failed(RunResult::failed(err.summary(), None)));
            }
            Err(err) => return Err(err),
        };

        let current = if run.no_changes {
            EMPTY_PLAN
        } else {
            run.plan_json.as_str()
        };

        let comparison = match Comparator::new().compare_plan_texts(&previous, current) {
            Ok(comparison) => comparison,
            Err(err) if err.is_user_facing() => {
                error!("{err}");
                return Ok(ValidateOutcome::failed(RunResult::failed(err.to_string(), None)));
            }
            Err(err) => return Err(err),
        };

        let drift_detected = comparison.drift_detected();
        let diff_markdown = comparison.diff.to_markdown();

        info!("Terraform Diff - Current Plan vs Initial");
        info!("{diff_markdown}");
        if drift_detected {
            warn!(
                "Drift detected: plan {} no longer matches initial plan {}",
                comparison.new_fingerprint.short(),
                comparison.old_fingerprint.short()
            );
        }

        self.store.write(PLAN_DIFF_FILE, &diff_markdown).await?;

        summary.heading(DIFF_HEADING);
        if drift_detected {
            summary.raw(&format!("{DRIFT_SUMMARY}{diff_markdown}"));
        } else {
            summary.raw(MATCH_MESSAGE);
        }
        summary.separator();

        Ok(ValidateOutcome {
            result: RunResult {
                success: true,
                output: None,
                error: None,
            },
            drift_detected,
            diff_markdown: Some(diff_markdown),
            diff: Some(comparison.diff),
            fingerprints: Some(Fingerprints {
                previous: comparison.old_fingerprint,
                current: comparison.new_fingerprint,
            }),
        })
    }
}
