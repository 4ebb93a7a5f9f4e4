//! Configuration types for the drift guard.
//!
//! `GuardConfig` describes one run: which mode, which stack, where the CDKTF
//! project lives. `ToolsConfig` maps to the optional `driftguard.yaml` file
//! and describes how the external tools are invoked.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding the previous plan inside the stack directory.
pub const PREVIOUS_PLAN_DIR: &str = "previous";

/// Plan JSON file name.
pub const PLAN_JSON_FILE: &str = "plan.json";

/// Rendered diff report file name.
pub const PLAN_DIFF_FILE: &str = "plan_diff.md";

/// Run mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Produce the initial plan.
    Plan,
    /// Produce a new plan and compare it with the previous one.
    Validate,
    /// Apply the previously generated plan.
    Apply,
}

/// Complete configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    /// Run mode.
    pub mode: RunMode,
    /// Target stack identifier.
    pub stack_name: String,
    /// CDKTF project directory.
    pub working_directory: PathBuf,
    /// Deployment environment name.
    pub environment: String,
    /// Git ref being deployed, informational only.
    pub git_ref: Option<String>,
    /// External tool settings.
    pub tools: ToolsConfig,
}

/// External tool settings, loadable from `driftguard.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolsConfig {
    /// Command producing the Terraform configuration (program and args).
    #[serde(default = "default_synth_command")]
    pub synth_command: Vec<String>,
    /// Terraform binary.
    #[serde(default = "default_terraform_bin")]
    pub terraform_bin: String,
    /// Synth output directory, relative to the working directory.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

/// Root of the optional configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigFile {
    /// Tool settings.
    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_synth_command() -> Vec<String> {
    vec![
        String::from("npx"),
        String::from("cdktf"),
        String::from("synth"),
    ]
}

fn default_terraform_bin() -> String {
    String::from("terraform")
}

fn default_output_dir() -> String {
    String::from("cdktf.out")
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            synth_command: default_synth_command(),
            terraform_bin: default_terraform_bin(),
            output_dir: default_output_dir(),
        }
    }
}

impl GuardConfig {
    /// Directory of the synthesized stack:
    /// `<working_directory>/<output_dir>/stacks/<stack_name>`.
    #[must_use]
    pub fn stack_dir(&self) -> PathBuf {
        stack_dir_for(&self.working_directory, &self.tools.output_dir, &self.stack_name)
    }
}

/// Builds the stack directory path.
#[must_use]
pub fn stack_dir_for(working_directory: &Path, output_dir: &str, stack_name: &str) -> PathBuf {
    working_directory
        .join(output_dir)
        .join("stacks")
        .join(stack_name)
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Plan => "plan",
            Self::Validate => "validate",
            Self::Apply => "apply",
        };
        write!(f, "{s}")
    }
}
