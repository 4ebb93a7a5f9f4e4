//! Initial plan mode.

use tracing::info;

use crate::artifacts::ArtifactStore;
use crate::error::Result;
use crate::summary::RunSummary;
use crate::terraform::{CommandRunner, RunResult};

use super::{ModeRunner, stage_section};

/// Outcome of plan mode.
#[derive(Debug, Clone, Default)]
pub struct PlanOutcome {
    /// Stage result.
    pub result: RunResult,
    /// Terraform reported that nothing would change.
    pub no_changes: bool,
}

impl<R, S> ModeRunner<'_, R, S>
where
    R: CommandRunner + ?Sized,
    S: ArtifactStore + ?Sized,
{
    /// Produces the initial plan and records it in the summary.
    ///
    /// # Errors
    ///
    /// Returns an error on hard aborts from the workflow.
    pub async fn plan(&self, summary: &mut RunSummary) -> Result<PlanOutcome> {
        let run = self.workflow().plan().await?;

        stage_section(
            summary,
            "🤔 Initial Terraform Plan",
            "plan",
            "Show Terraform Plan Output",
            &run.result,
        );

        if run.result.success {
            info!("Initial plan ready (no_changes={})", run.no_changes);
        }

        Ok(PlanOutcome {
            result: run.result,
            no_changes: run.no_changes,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::artifacts::{ArtifactStore, LocalArtifactStore};
    use crate::config::RunMode;
    use crate::modes::{ModeRunner, Outcome};
    use crate::summary::RunSummary;
    use crate::terraform::scripted::{ScriptedRunner, test_config};
    use crate::terraform::{CommandResult, NO_CHANGES_MARKER};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_plan_mode_records_summary() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let mut config = test_config(temp.path());
        config.mode = RunMode::Plan;
        std::fs::create_dir_all(config.stack_dir()).expect("create stack dir");
        let store = LocalArtifactStore::with_stack_dir(config.stack_dir());
        let runner = ScriptedRunner::new(vec![
            CommandResult::exited(0, "", ""),
            CommandResult::exited(0, "", ""),
            CommandResult::exited(0, "Plan: 2 to add", ""),
            CommandResult::exited(0, r#"{"resource_changes":[]}"#, ""),
        ]);

        let mut summary = RunSummary::in_memory();
        let outcome = ModeRunner::new(&config, &runner, &store)
            .run(&mut summary)
            .await
            .expect("plan runs");

        assert!(outcome.succeeded());
        assert_eq!(outcome.outputs(), vec![("no_changes", String::from("false"))]);
        assert!(summary.pending().contains("<h1>🤔 Initial Terraform Plan</h1>"));
        assert!(summary.pending().contains("✅ Terraform plan completed successfully!"));
        assert!(summary.pending().contains("```text\nPlan: 2 to add\n```"));
        assert!(store.read("plan.json").await.expect("read").is_some());
    }

    #[tokio::test]
    async fn test_plan_mode_no_changes() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let config = test_config(temp.path());
        std::fs::create_dir_all(config.stack_dir()).expect("create stack dir");
        let store = LocalArtifactStore::with_stack_dir(config.stack_dir());
        let runner = ScriptedRunner::new(vec![
            CommandResult::exited(0, "", ""),
            CommandResult::exited(0, "", ""),
            CommandResult::exited(0, NO_CHANGES_MARKER, ""),
        ]);

        let mut summary = RunSummary::in_memory();
        let outcome = ModeRunner::new(&config, &runner, &store)
            .plan(&mut summary)
            .await
            .expect("plan runs");

        assert!(outcome.no_changes);
        assert_eq!(
            Outcome::Plan(outcome).outputs(),
            vec![("no_changes", String::from("true"))]
        );
    }
}
