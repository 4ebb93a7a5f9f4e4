//! Artifact store trait definition.
//!
//! This module defines the common interface for artifact storage backends.

use async_trait::async_trait;

use crate::error::Result;

/// Trait for artifact storage backends.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Reads the previous plan JSON.
    ///
    /// Fails with a distinct error when the plan cannot be read and when it
    /// is empty.
    async fn read_previous_plan(&self) -> Result<String>;

    /// Writes a named artifact, replacing any previous content.
    async fn write(&self, name: &str, contents: &str) -> Result<()>;

    /// Reads a named artifact.
    ///
    /// Returns `None` if it does not exist.
    async fn read(&self, name: &str) -> Result<Option<String>>;

    /// Checks whether the stack directory exists.
    async fn stack_exists(&self) -> Result<bool>;

    /// Human-readable location of the store.
    fn location(&self) -> String;

    /// Gets the backend type name.
    fn backend_type(&self) -> &'static str;
}
