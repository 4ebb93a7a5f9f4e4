//! Artifact storage for stack runs.
//!
//! A run reads the previous (reviewed) plan and writes its own artifacts
//! into the synthesized stack directory: plan JSON, tool logs and the
//! rendered diff report.

mod store;
mod local;

pub use store::ArtifactStore;
pub use local::LocalArtifactStore;
