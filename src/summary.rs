//! CI run summary and step outputs.
//!
//! Sections accumulate in memory and are appended to the file named by
//! `GITHUB_STEP_SUMMARY` on [`RunSummary::write`]. Step outputs go to the
//! file named by `GITHUB_OUTPUT` as `key=value` lines.

use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::Result;

/// Environment variable naming the step summary file.
pub const STEP_SUMMARY_VAR: &str = "GITHUB_STEP_SUMMARY";

/// Environment variable naming the step output file.
pub const STEP_OUTPUT_VAR: &str = "GITHUB_OUTPUT";

/// Placeholder for a stage without output.
pub const NO_OUTPUT: &str = "No output available.";

/// Markdown run summary.
#[derive(Debug, Default)]
pub struct RunSummary {
    path: Option<PathBuf>,
    buffer: String,
}

/// Step outputs consumed by later CI steps.
#[derive(Debug, Default)]
pub struct StepOutputs {
    path: Option<PathBuf>,
}

impl RunSummary {
    /// Creates a summary that is never written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Creates a summary appended to `path` when set.
    #[must_use]
    pub fn with_path(path: Option<PathBuf>) -> Self {
        Self {
            path,
            buffer: String::new(),
        }
    }

    /// Adds a top-level heading.
    pub fn heading(&mut self, text: &str) -> &mut Self {
        self.buffer.push_str(&format!("<h1>{text}</h1>\n"));
        self
    }

    /// Adds raw markdown followed by a line break.
    pub fn raw(&mut self, text: &str) -> &mut Self {
        self.buffer.push_str(text);
        self.buffer.push('\n');
        self
    }

    /// Adds a collapsible block with the output of a stage.
    pub fn output_details(&mut self, label: &str, output: Option<&str>) -> &mut Self {
        let output = output.filter(|o| !o.is_empty()).unwrap_or(NO_OUTPUT);
        self.raw(&format!(
            "<details><summary>{label}</summary>\n\n```text\n{output}\n```\n</details>"
        ))
    }

    /// Adds a horizontal break.
    pub fn separator(&mut self) -> &mut Self {
        self.buffer.push_str("<br>\n");
        self
    }

    /// Markdown accumulated since the last write.
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Appends the pending sections to the summary file, if any, and clears
    /// them.
    ///
    /// # Errors
    ///
    /// Returns an error if the summary file cannot be written.
    pub async fn write(&mut self) -> Result<()> {
        let contents = std::mem::take(&mut self.buffer);

        let Some(path) = &self.path else {
            debug!("No step summary file configured, skipping summary write");
            return Ok(());
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(contents.as_bytes()).await?;
        file.flush().await?;

        debug!("Appended {} bytes to {}", contents.len(), path.display());
        Ok(())
    }
}

impl StepOutputs {
    /// Creates step outputs written to `path` when set.
    #[must_use]
    pub const fn with_path(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Sets a step output.
    ///
    /// # Errors
    ///
    /// Returns an error if the output file cannot be written.
    pub async fn set(&self, name: &str, value: &str) -> Result<()> {
        info!("Output {name}={value}");

        if let Some(path) = &self.path {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await?;
            file.write_all(format!("{name}={value}\n").as_bytes()).await?;
            file.flush().await?;
        }

        Ok(())
    }
}
