//! Configuration parser for assembling a run configuration.
//!
//! Settings come from, in increasing precedence: built-in defaults, the
//! optional `driftguard.yaml` file, a `.env` file, and finally environment
//! variables and command-line flags.

use crate::error::{ConfigError, GuardError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::types::{ConfigFile, GuardConfig, RunMode, ToolsConfig};

/// Environment variable holding the target stack.
pub const STACK_NAME_VAR: &str = "STACK_NAME";

/// Environment variable holding the deployment environment.
pub const ENVIRONMENT_VAR: &str = "DRIFTGUARD_ENVIRONMENT";

/// Environment variable overriding the Terraform binary.
pub const TERRAFORM_BIN_VAR: &str = "DRIFTGUARD_TERRAFORM_BIN";

/// Environment variable overriding the synth command.
pub const SYNTH_COMMAND_VAR: &str = "DRIFTGUARD_SYNTH_COMMAND";

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["driftguard.yaml", "driftguard.yml"];

/// Raw run inputs as collected from the command line.
#[derive(Debug, Clone)]
pub struct RunInputs {
    /// Requested run mode.
    pub mode: RunMode,
    /// Stack name, if passed explicitly.
    pub stack_name: Option<String>,
    /// CDKTF project directory.
    pub working_directory: PathBuf,
    /// Deployment environment, if passed explicitly.
    pub environment: Option<String>,
    /// Git ref being deployed.
    pub git_ref: Option<String>,
    /// Explicit configuration file.
    pub config_file: Option<PathBuf>,
}

/// Configuration parser for loading run configuration.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving the configuration and `.env` files.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    fn base_path(&self) -> PathBuf {
        self.base_path.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ConfigFile> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(GuardError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            GuardError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        Self::parse_yaml(&content, Some(path))
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(content: &str, source: Option<&Path>) -> Result<ConfigFile> {
        debug!("Parsing YAML configuration");

        if content.trim().is_empty() {
            return Ok(ConfigFile::default());
        }

        serde_yaml::from_str(content).map_err(|e| {
            GuardError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location: source.map(|p| p.display().to_string()),
            })
        })
    }

    /// Loads tool settings from an explicit file, or from a default file in
    /// the base path when present.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing or any file is invalid.
    pub fn load_tools(&self, explicit: Option<&Path>) -> Result<ToolsConfig> {
        if let Some(path) = explicit {
            return Ok(self.load_file(path)?.tools);
        }

        let base = self.base_path();
        for filename in DEFAULT_CONFIG_FILES {
            let candidate = base.join(filename);
            if candidate.exists() {
                return Ok(self.load_file(&candidate)?.tools);
            }
        }

        debug!("No configuration file found in {}, using defaults", base.display());
        Ok(ToolsConfig::default())
    }

    /// Applies environment overrides to the tool settings.
    pub fn apply_env_overrides<F>(tools: &mut ToolsConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bin) = lookup(TERRAFORM_BIN_VAR).filter(|v| !v.trim().is_empty()) {
            debug!("Overriding tools.terraform_bin from environment");
            tools.terraform_bin = bin;
        }

        if let Some(command) = lookup(SYNTH_COMMAND_VAR).filter(|v| !v.trim().is_empty()) {
            debug!("Overriding tools.synth_command from environment");
            tools.synth_command = command.split_whitespace().map(String::from).collect();
        }
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self.base_path().join(".env");

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                GuardError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    /// Assembles the run configuration from inputs, files and environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the stack name is missing or a configuration file
    /// is invalid.
    pub fn resolve<F>(&self, inputs: RunInputs, lookup: F) -> Result<GuardConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut tools = self.load_tools(inputs.config_file.as_deref())?;
        Self::apply_env_overrides(&mut tools, &lookup);

        let stack_name = inputs
            .stack_name
            .or_else(|| lookup(STACK_NAME_VAR))
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::missing(
                    STACK_NAME_VAR,
                    "STACK_NAME environment variable is required but was not provided.",
                )
            })?;

        let environment = inputs
            .environment
            .or_else(|| lookup(ENVIRONMENT_VAR))
            .unwrap_or_default();

        Ok(GuardConfig {
            mode: inputs.mode,
            stack_name,
            working_directory: inputs.working_directory,
            environment,
            git_ref: inputs.git_ref,
            tools,
        })
    }
}
