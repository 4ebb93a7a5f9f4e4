//! Local file-based artifact storage backend.
//!
//! Artifacts live directly in the synthesized stack directory, the previous
//! plan under `previous/plan.json`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::{PLAN_JSON_FILE, PREVIOUS_PLAN_DIR};
use crate::error::{ArtifactError, GuardError, Result};

use super::store::ArtifactStore;

/// Local file-based artifact store.
#[derive(Debug)]
pub struct LocalArtifactStore {
    /// Stack directory holding the artifacts.
    stack_dir: PathBuf,
    /// Path to the previous plan.
    previous_plan_path: PathBuf,
}

impl LocalArtifactStore {
    /// Creates a store rooted at the given stack directory.
    #[must_use]
    pub fn with_stack_dir(stack_dir: impl Into<PathBuf>) -> Self {
        let stack_dir = stack_dir.into();
        let previous_plan_path = stack_dir.join(PREVIOUS_PLAN_DIR).join(PLAN_JSON_FILE);

        Self {
            stack_dir,
            previous_plan_path,
        }
    }

    /// Stack directory of this store.
    #[must_use]
    pub fn stack_dir(&self) -> &Path {
        &self.stack_dir
    }

    /// Path of a named artifact.
    #[must_use]
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.stack_dir.join(name)
    }

    /// Ensures the parent directory of `path` exists.
    async fn ensure_parent(path: &Path, name: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                debug!("Creating artifact directory: {}", parent.display());
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| write_failed(name, format!("Failed to create directory: {e}")))?;
            }
        }
        Ok(())
    }
}

fn write_failed(name: &str, message: String) -> GuardError {
    GuardError::Artifact(ArtifactError::WriteFailed {
        name: name.to_string(),
        message,
    })
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn read_previous_plan(&self) -> Result<String> {
        info!("Loading previous plan from: {}", self.previous_plan_path.display());

        let content = fs::read_to_string(&self.previous_plan_path)
            .await
            .map_err(|e| {
                GuardError::Artifact(ArtifactError::PreviousPlanUnreadable {
                    path: self.previous_plan_path.clone(),
                    message: e.to_string(),
                })
            })?;

        if content.trim().is_empty() {
            return Err(GuardError::Artifact(ArtifactError::PreviousPlanEmpty {
                path: self.previous_plan_path.clone(),
            }));
        }

        Ok(content)
    }

    async fn write(&self, name: &str, contents: &str) -> Result<()> {
        let path = self.artifact_path(name);
        Self::ensure_parent(&path, name).await?;

        debug!("Writing artifact: {}", path.display());

        // Write to a temporary file first, then rename for atomicity
        let temp_path = path.with_extension("tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| write_failed(name, format!("Failed to create temp file: {e}")))?;

        file.write_all(contents.as_bytes())
            .await
            .map_err(|e| write_failed(name, format!("Failed to write file: {e}")))?;

        file.sync_all()
            .await
            .map_err(|e| write_failed(name, format!("Failed to sync file: {e}")))?;

        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| write_failed(name, format!("Failed to rename file: {e}")))?;

        Ok(())
    }

    async fn read(&self, name: &str) -> Result<Option<String>> {
        let path = self.artifact_path(name);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path).await?))
    }

    async fn stack_exists(&self) -> Result<bool> {
        Ok(fs::try_exists(&self.stack_dir).await? && self.stack_dir.is_dir())
    }

    fn location(&self) -> String {
        self.stack_dir.display().to_string()
    }

    fn backend_type(&self) -> &'static str {
        "local"
    }
}
