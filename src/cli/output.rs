//! Output formatting for CLI commands.
//!
//! This module renders the run verdict to the console as text or JSON.

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::RunMode;
use crate::error::GuardError;
use crate::modes::{Fingerprints, Outcome};
use crate::planner::DiffResult;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Diff count row for table display.
#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Change")]
    change: &'static str,
    #[tabled(rename = "Resources")]
    count: usize,
}

/// Machine-readable run verdict.
#[derive(Debug, Serialize)]
struct VerdictJson<'a> {
    mode: RunMode,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    drift_detected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    no_changes: Option<bool>,
    error: Option<String>,
    checked_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fingerprints: Option<&'a Fingerprints>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diff: Option<&'a DiffResult>,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the outcome of a run.
    #[must_use]
    pub fn format_outcome(&self, outcome: &Outcome, checked_at: DateTime<Utc>) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&Self::verdict_json(outcome, checked_at))
                    .unwrap_or_default()
            }
            OutputFormat::Text => Self::format_outcome_text(outcome),
        }
    }

    /// Formats an error that aborted the run.
    #[must_use]
    pub fn format_error(&self, err: &GuardError) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "success": false, "error": err.to_string() });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => format!("{} {err}", "✗".red()),
        }
    }

    fn verdict_json(outcome: &Outcome, checked_at: DateTime<Utc>) -> VerdictJson<'_> {
        let (drift_detected, no_changes, fingerprints, diff) = match outcome {
            Outcome::Plan(o) => (None, Some(o.no_changes), None, None),
            Outcome::Validate(o) => (
                Some(o.drift_detected),
                None,
                o.fingerprints.as_ref(),
                o.diff.as_ref(),
            ),
            Outcome::Apply(_) => (None, None, None, None),
        };

        VerdictJson {
            mode: outcome.mode(),
            success: outcome.succeeded(),
            drift_detected,
            no_changes,
            error: outcome.failure(),
            checked_at,
            fingerprints,
            diff,
        }
    }

    fn format_outcome_text(outcome: &Outcome) -> String {
        let mut output = String::new();

        match outcome.failure() {
            None => {
                let _ = writeln!(output, "{} {} succeeded", "✓".green(), outcome.mode());
            }
            Some(reason) => {
                let _ = writeln!(output, "{} {reason}", "✗".red());
            }
        }

        if let Outcome::Plan(o) = outcome {
            if o.result.success && o.no_changes {
                let _ = writeln!(output, "   No changes. Infrastructure matches the configuration.");
            }
        }

        if let Outcome::Validate(o) = outcome {
            if let Some(diff) = &o.diff {
                output.push('\n');
                output.push_str(&Self::count_table(diff));
                output.push('\n');
            }

            if let Some(fingerprints) = &o.fingerprints {
                let current = if o.drift_detected {
                    fingerprints.current.short().yellow().to_string()
                } else {
                    fingerprints.current.short().green().to_string()
                };
                let _ = writeln!(
                    output,
                    "\nPlan fingerprint: {} (initial) / {current} (current)",
                    fingerprints.previous.short()
                );
            }
        }

        output
    }

    fn count_table(diff: &DiffResult) -> String {
        let rows = vec![
            CountRow {
                change: "Added",
                count: diff.added.len(),
            },
            CountRow {
                change: "Removed",
                count: diff.removed.len(),
            },
            CountRow {
                change: "Updated",
                count: diff.updated.len(),
            },
        ];
        Table::new(rows).to_string()
    }
}
