//! Configuration module for the drift guard.
//!
//! This module handles all configuration-related functionality:
//! - Run configuration types and the optional `driftguard.yaml` file
//! - Merging defaults, files, `.env` and environment variables
//! - Validation before any external tool is invoked

mod types;
mod parser;
mod validator;

pub use types::{
    ConfigFile, GuardConfig, PLAN_DIFF_FILE, PLAN_JSON_FILE, PREVIOUS_PLAN_DIR, RunMode,
    ToolsConfig, stack_dir_for,
};
pub use parser::{
    ConfigParser, DEFAULT_CONFIG_FILES, ENVIRONMENT_VAR, RunInputs, STACK_NAME_VAR,
    SYNTH_COMMAND_VAR, TERRAFORM_BIN_VAR,
};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
