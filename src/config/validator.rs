//! Run configuration validation.
//!
//! Configuration problems abort the run before any plan is generated, so
//! everything that can be checked upfront is checked here.

use crate::error::{ConfigError, GuardError, Result};
use tracing::debug;

use super::types::{GuardConfig, ToolsConfig};

/// Validator for run configurations.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a run configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate(&self, config: &GuardConfig) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_stack(config, &mut result);
        Self::validate_tools(&config.tools, &mut result);

        if config.environment.trim().is_empty() {
            result
                .warnings
                .push(String::from("No environment provided; summaries will omit it"));
        }

        if result.errors.is_empty() {
            debug!("Configuration validation passed");
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(GuardError::Config(ConfigError::validation(
                first_error.message.clone(),
                first_error.field.clone(),
            )))
        }
    }

    fn validate_stack(config: &GuardConfig, result: &mut ValidationResult) {
        if config.stack_name.trim().is_empty() {
            result.errors.push(ValidationError {
                field: String::from("stack_name"),
                message: String::from("Stack name cannot be empty"),
            });
        } else if config.stack_name.contains(['/', '\\']) || config.stack_name == ".." {
            result.errors.push(ValidationError {
                field: String::from("stack_name"),
                message: format!(
                    "Stack name '{}' is invalid. It must not contain path separators.",
                    config.stack_name
                ),
            });
        }

        if config.working_directory.as_os_str().is_empty() {
            result.errors.push(ValidationError {
                field: String::from("working_directory"),
                message: String::from("Working directory cannot be empty"),
            });
        } else if !config.working_directory.is_dir() {
            result.errors.push(ValidationError {
                field: String::from("working_directory"),
                message: format!(
                    "Working directory does not exist: {}",
                    config.working_directory.display()
                ),
            });
        }
    }

    fn validate_tools(tools: &ToolsConfig, result: &mut ValidationResult) {
        if tools.synth_command.first().is_none_or(|p| p.trim().is_empty()) {
            result.errors.push(ValidationError {
                field: String::from("tools.synth_command"),
                message: String::from("Synth command cannot be empty"),
            });
        }

        if tools.terraform_bin.trim().is_empty() {
            result.errors.push(ValidationError {
                field: String::from("tools.terraform_bin"),
                message: String::from("Terraform binary cannot be empty"),
            });
        }

        if tools.output_dir.trim().is_empty() {
            result.errors.push(ValidationError {
                field: String::from("tools.output_dir"),
                message: String::from("Output directory cannot be empty"),
            });
        }
    }
}

impl ValidationResult {
    /// Returns true if no errors were found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}
