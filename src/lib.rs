// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![warn(missing_docs)]                // All public items must be documented
#![warn(dead_code)]                   // Unused code is flagged
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![warn(unused_imports)]              // Unused imports are flagged
#![warn(unused_variables)]            // Unused variables are flagged
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Plan Drift Guard
//!
//! Detects drift between two Terraform plans of the same CDKTF stack: the
//! initial plan reviewed before a deployment, and a second plan produced
//! right before apply.
//!
//! ## Overview
//!
//! Terraform plan JSON is noisy. Keys arrive in arbitrary order, sets are
//! serialized as arrays in arbitrary order, some attributes hold JSON
//! documents encoded as strings, and empty collections show up as `null`.
//! The drift guard reduces both plans to the attributes that actually
//! change and compares them independently of that noise.
//!
//! ## Pipeline
//!
//! 1. **Canonicalize**: sort keys and arrays, re-encode embedded JSON,
//!    replace `null` with an empty collection
//! 2. **Extract**: drop no-op records and unchanged attributes
//! 3. **Compare**: order-insensitive equality of the reduced change lists
//! 4. **Diff**: added, removed and updated resources as a markdown report
//!
//! ## Modules
//!
//! - [`planner`]: Canonicalization, extraction, comparison and diff
//! - [`terraform`]: CDKTF synth and Terraform invocation
//! - [`artifacts`]: Previous plan, logs and report storage
//! - [`modes`]: The `plan`, `validate` and `apply` run modes
//! - [`summary`]: CI step summary and outputs
//! - [`config`]: Configuration parsing and validation
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```
//! use plan_drift_guard::planner::Comparator;
//!
//! let initial = r#"{"resource_changes":[{"address":"aws_s3_bucket.a",
//!     "change":{"actions":["create"],"before":null,"after":{"tags":["b","a"]}}}]}"#;
//! let second = r#"{"resource_changes":[{"address":"aws_s3_bucket.a",
//!     "change":{"actions":["create"],"before":null,"after":{"tags":["a","b"]}}}]}"#;
//!
//! let comparison = Comparator::new().compare_plan_texts(initial, second)?;
//! assert!(!comparison.drift_detected());
//! # Ok::<(), plan_drift_guard::error::GuardError>(())
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod artifacts;
pub mod cli;
pub mod config;
pub mod error;
pub mod modes;
pub mod planner;
pub mod summary;
pub mod terraform;

// ============================================================================
// Re-exports
// ============================================================================

pub use artifacts::{ArtifactStore, LocalArtifactStore};
pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, ConfigValidator, GuardConfig, RunMode};
pub use error::{GuardError, Result};
pub use modes::{ModeRunner, Outcome};
pub use planner::{Canonicalizer, Comparator, DiffEngine, DiffResult, FlatChange, extract_changes};
pub use summary::{RunSummary, StepOutputs};
pub use terraform::{CommandRunner, ProcessRunner, TerraformWorkflow};
