//! External tool invocation.
//!
//! The synth command and Terraform are driven through the [`CommandRunner`]
//! seam so the workflow can be exercised without real binaries.

mod runner;
mod workflow;

pub use runner::{CommandResult, CommandRunner, Invocation, ProcessRunner};
pub use workflow::{
    ApplyRun, NO_CHANGES_MARKER, PLAN_FILE, PlanRun, RunResult, Stage, TerraformWorkflow,
};

#[cfg(test)]
pub(crate) mod scripted;
