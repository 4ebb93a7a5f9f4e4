//! Apply mode.

use crate::artifacts::ArtifactStore;
use crate::error::Result;
use crate::summary::RunSummary;
use crate::terraform::{CommandRunner, RunResult};

use super::{ModeRunner, stage_section};

/// Outcome of apply mode.
#[derive(Debug, Clone, Default)]
pub struct ApplyOutcome {
    /// Stage result.
    pub result: RunResult,
}

impl<R, S> ModeRunner<'_, R, S>
where
    R: CommandRunner + ?Sized,
    S: ArtifactStore + ?Sized,
{
    /// Applies the saved plan file and records the output in the summary.
    ///
    /// # Errors
    ///
    /// Returns an error on hard aborts from the workflow.
    pub async fn apply(&self, summary: &mut RunSummary) -> Result<ApplyOutcome> {
        let run = self.workflow().apply().await?;

        stage_section(
            summary,
            "🛠️ Terraform Apply",
            "apply",
            "Show Terraform Apply Output",
            &run.result,
        );

        Ok(ApplyOutcome { result: run.result })
    }
}

#[cfg(test)]
mod tests {
    use crate::artifacts::LocalArtifactStore;
    use crate::config::RunMode;
    use crate::modes::ModeRunner;
    use crate::summary::RunSummary;
    use crate::terraform::CommandResult;
    use crate::terraform::scripted::{ScriptedRunner, test_config};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_apply_mode_success() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let mut config = test_config(temp.path());
        config.mode = RunMode::Apply;
        std::fs::create_dir_all(config.stack_dir()).expect("create stack dir");
        let store = LocalArtifactStore::with_stack_dir(config.stack_dir());
        let runner = ScriptedRunner::new(vec![
            CommandResult::exited(0, "", ""),
            CommandResult::exited(0, "", ""),
            CommandResult::exited(0, "Apply complete! Resources: 1 added, 0 changed, 0 destroyed.", ""),
        ]);

        let mut summary = RunSummary::in_memory();
        let outcome = ModeRunner::new(&config, &runner, &store)
            .run(&mut summary)
            .await
            .expect("apply runs");

        assert!(outcome.succeeded());
        assert!(outcome.outputs().is_empty());
        assert!(summary.pending().contains("<h1>🛠️ Terraform Apply</h1>"));
        assert!(summary.pending().contains("✅ Terraform apply completed successfully!"));
        assert!(summary.pending().contains("Show Terraform Apply Output"));
    }

    #[tokio::test]
    async fn test_apply_mode_failure() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let config = test_config(temp.path());
        std::fs::create_dir_all(config.stack_dir()).expect("create stack dir");
        let store = LocalArtifactStore::with_stack_dir(config.stack_dir());
        let runner = ScriptedRunner::new(vec![
            CommandResult::exited(0, "", ""),
            CommandResult::exited(0, "", ""),
            CommandResult::exited(1, "", "Error: resource already exists"),
        ]);

        let mut summary = RunSummary::in_memory();
        let outcome = ModeRunner::new(&config, &runner, &store)
            .apply(&mut summary)
            .await
            .expect("apply runs");

        assert!(!outcome.result.success);
        assert!(summary.pending().contains("❌ Terraform apply failed! See error:"));
        assert!(summary.pending().contains("Error: resource already exists"));
    }
}
