//! Plan comparison pipeline.
//!
//! Raw plan text is canonicalized, reduced to the attributes that change,
//! then compared and diffed against the other plan.

mod canonical;
mod compare;
mod diff;
mod extract;
mod report;

pub use canonical::{
    Canonicalizer, NullPolicy, SuffixNullPolicy, canonical_for_comparison, canonicalize,
    looks_like_json,
};
pub use compare::{Comparator, PlanComparison, PlanFingerprint};
pub use diff::{DiffEngine, DiffResult, DriftCondition, UpdatedResource};
pub use extract::{Change, FlatChange, NO_OP_ACTION, ResourceChange, extract_changes};
pub use report::{ADDED_HEADING, NONE_MARKER, REMOVED_HEADING, UPDATED_HEADING, render_markdown};
