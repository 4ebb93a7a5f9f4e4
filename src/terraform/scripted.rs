//! Scripted command runner for tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use crate::config::{GuardConfig, RunMode, ToolsConfig};
use crate::error::{GuardError, Result};

use super::runner::{CommandResult, CommandRunner, Invocation};

/// Replays canned results in order and records every invocation.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    results: Mutex<VecDeque<CommandResult>>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new(results: Vec<CommandResult>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandResult> {
        self.calls.lock().expect("calls lock").push(invocation.clone());
        self.results
            .lock()
            .expect("results lock")
            .pop_front()
            .ok_or_else(|| GuardError::internal(format!("unexpected invocation: {invocation}")))
    }
}

/// Configuration for a `dev-stack` rooted at `dir`.
pub fn test_config(dir: &Path) -> GuardConfig {
    GuardConfig {
        mode: RunMode::Validate,
        stack_name: String::from("dev-stack"),
        working_directory: dir.to_path_buf(),
        environment: String::from("dev"),
        git_ref: None,
        tools: ToolsConfig::default(),
    }
}
