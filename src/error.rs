//! Error types for the plan drift guard.
//!
//! This module provides the error hierarchy for every stage of a run:
//! configuration, plan comparison, external tool invocation, and artifact
//! storage.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the plan drift guard.
#[derive(Debug, Error)]
pub enum GuardError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Plan comparison errors.
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    /// External tool (synth/terraform) errors.
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Artifact storage errors.
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// A required value was not provided.
    #[error("{message}")]
    MissingValue {
        /// Name of the missing setting.
        name: String,
        /// User-facing description.
        message: String,
    },
}

/// Plan comparison errors.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The plan text is not valid JSON.
    #[error("Failed to parse {source_name} as JSON: {message}")]
    Parse {
        /// Which plan failed to parse (e.g. "previous plan").
        source_name: String,
        /// Parser message.
        message: String,
    },

    /// A resource change record has an unexpected shape.
    #[error("Invalid resource change at index {index}: {message}")]
    InvalidResourceChange {
        /// Position in `resource_changes`.
        index: usize,
        /// Description of the problem.
        message: String,
    },

    /// A value could not be serialized for comparison.
    #[error("Failed to serialize value for comparison: {message}")]
    Serialization {
        /// Serializer message.
        message: String,
    },
}

/// External tool errors.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool binary could not be started.
    #[error("Failed to start `{program}`: {message}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// OS error description.
        message: String,
    },

    /// A stage exited with a non-zero status.
    #[error("{stage} failed with exit code {exit_code}.")]
    StageFailed {
        /// Stage that failed.
        stage: String,
        /// Exit code, or -1 when terminated by a signal.
        exit_code: i32,
    },
}

/// Artifact storage errors.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The previous plan could not be read.
    #[error("Could not read previous plan JSON at {path}: {message}")]
    PreviousPlanUnreadable {
        /// Expected location of the previous plan.
        path: PathBuf,
        /// Underlying IO message.
        message: String,
    },

    /// The previous plan exists but holds no content.
    #[error("Previous plan JSON at {path} is empty")]
    PreviousPlanEmpty {
        /// Location of the empty previous plan.
        path: PathBuf,
    },

    /// The stack output directory does not exist after synth.
    #[error("Stack directory does not exist: {path}")]
    StackDirMissing {
        /// Expected stack directory.
        path: PathBuf,
    },

    /// Writing an artifact failed.
    #[error("Failed to write artifact {name}: {message}")]
    WriteFailed {
        /// Artifact file name.
        name: String,
        /// Underlying IO message.
        message: String,
    },
}

/// Result type alias for drift guard operations.
pub type Result<T> = std::result::Result<T, GuardError>;

impl GuardError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error should be reported as a failed run result
    /// rather than aborting the process.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Plan(_)
                | Self::Tool(_)
                | Self::Artifact(
                    ArtifactError::PreviousPlanUnreadable { .. }
                        | ArtifactError::PreviousPlanEmpty { .. }
                )
        )
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a missing-value error.
    #[must_use]
    pub fn missing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MissingValue {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl PlanError {
    /// Creates a parse error for the named plan.
    #[must_use]
    pub fn parse(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

impl ArtifactError {
    /// Short message suitable for a failed run result.
    #[must_use]
    pub const fn summary(&self) -> &'static str {
        match self {
            Self::PreviousPlanUnreadable { .. } => "Could not read previous plan JSON",
            Self::PreviousPlanEmpty { .. } => "Previous plan JSON is empty",
            Self::StackDirMissing { .. } => "Stack directory does not exist",
            Self::WriteFailed { .. } => "Failed to write artifact",
        }
    }
}
