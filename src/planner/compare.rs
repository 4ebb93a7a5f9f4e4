//! Order-insensitive comparison of plans.
//!
//! The comparator gives the final yes/no verdict on whether two plans
//! describe the same resource mutations, independent of the structured
//! diff. Fingerprints make that verdict visible in logs and JSON output.

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{PlanError, Result};

use super::canonical::Canonicalizer;
use super::diff::{DiffEngine, DiffResult};
use super::extract::{FlatChange, extract_changes};

/// Compares arbitrary serializable values by their canonical form.
#[derive(Debug, Default)]
pub struct Comparator {
    canonicalizer: Canonicalizer,
}

/// SHA-256 of the canonical form of a reduced change list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanFingerprint(String);

/// Outcome of comparing the initial plan with the second plan.
#[derive(Debug)]
pub struct PlanComparison {
    /// Whether the reduced change lists are canonically equal.
    pub plans_match: bool,
    /// Structured diff between the reduced change lists.
    pub diff: DiffResult,
    /// Fingerprint of the initial plan's reduced changes.
    pub old_fingerprint: PlanFingerprint,
    /// Fingerprint of the second plan's reduced changes.
    pub new_fingerprint: PlanFingerprint,
}

impl Comparator {
    /// Creates a new comparator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            canonicalizer: Canonicalizer::new(),
        }
    }

    /// Canonical string of any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Serialization`] if the value cannot be represented
    /// as JSON.
    pub fn canonical_string<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let value = serde_json::to_value(value).map_err(|e| PlanError::Serialization {
            message: e.to_string(),
        })?;
        Ok(self.canonicalizer.canonical_for_comparison(&value))
    }

    /// Returns true if both values are equal up to ordering, embedded JSON
    /// formatting and the null heuristic.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Serialization`] if either value cannot be
    /// represented as JSON.
    pub fn equivalent<T: Serialize + ?Sized>(&self, a: &T, b: &T) -> Result<bool> {
        Ok(self.canonical_string(a)? == self.canonical_string(b)?)
    }

    /// Fingerprints a reduced change list.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Serialization`] if the list cannot be serialized.
    pub fn fingerprint(&self, changes: &[FlatChange]) -> Result<PlanFingerprint> {
        let canonical = self.canonical_string(changes)?;
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Ok(PlanFingerprint(hex::encode(hasher.finalize())))
    }

    /// Runs the full pipeline on two raw plan texts: canonicalize, extract,
    /// compare and diff.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Parse`] if either text is not valid JSON.
    pub fn compare_plan_texts(&self, old_raw: &str, new_raw: &str) -> Result<PlanComparison> {
        info!("Normalizing plans...");
        let old_plan = self.canonicalizer.canonicalize_text(old_raw, "previous plan")?;
        let new_plan = self.canonicalizer.canonicalize_text(new_raw, "current plan")?;

        info!("Extracting resource changes...");
        let old_changes = extract_changes(&old_plan)?;
        let new_changes = extract_changes(&new_plan)?;
        debug!(
            "Initial plan has {} changes, second plan has {}",
            old_changes.len(),
            new_changes.len()
        );

        info!("Comparing resource changes...");
        let plans_match = self.equivalent(old_changes.as_slice(), new_changes.as_slice())?;
        let old_fingerprint = self.fingerprint(&old_changes)?;
        let new_fingerprint = self.fingerprint(&new_changes)?;
        debug!(
            "Fingerprints: initial {}, second {}",
            old_fingerprint.short(),
            new_fingerprint.short()
        );

        info!("Generating diff...");
        let diff = DiffEngine::new().compute_diff(&old_changes, &new_changes);

        Ok(PlanComparison {
            plans_match,
            diff,
            old_fingerprint,
            new_fingerprint,
        })
    }
}

impl PlanFingerprint {
    /// Full hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters for display.
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(self.0.as_str())
    }
}

impl std::fmt::Display for PlanFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PlanComparison {
    /// Drift is reported when the lists differ canonically or the diff has
    /// any entry.
    #[must_use]
    pub fn drift_detected(&self) -> bool {
        !self.plans_match || self.diff.drift_detected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value, json};

    fn plan_with_container_definitions(definitions: &str) -> String {
        json!({
            "resource_changes": [{
                "address": "aws_ecs_task_definition.example",
                "change": {
                    "actions": ["create"],
                    "before": {},
                    "after": {
                        "id": "example",
                        "container_definitions": definitions,
                        "cpu": "1024"
                    }
                }
            }]
        })
        .to_string()
    }

    fn plan_with_resources(resources: &[(&str, Value, Value)]) -> String {
        let records: Vec<Value> = resources
            .iter()
            .map(|(address, before, after)| {
                json!({
                    "address": address,
                    "change": {"actions": ["update"], "before": before, "after": after}
                })
            })
            .collect();
        json!({ "resource_changes": records }).to_string()
    }

    #[test]
    fn test_plans_match_when_only_embedded_key_order_differs() {
        let old = plan_with_container_definitions(
            r#"[{"name":"web","logConfiguration":{"options":{"awslogs-group":"x","awslogs-region":"us-east-1"}}}]"#,
        );
        let new = plan_with_container_definitions(
            r#"[{"name":"web","logConfiguration":{"options":{"awslogs-region":"us-east-1","awslogs-group":"x"}}}]"#,
        );

        let comparison = Comparator::new().compare_plan_texts(&old, &new).expect("valid plans");
        assert!(comparison.plans_match);
        assert!(!comparison.drift_detected());
        assert_eq!(comparison.old_fingerprint, comparison.new_fingerprint);
    }

    #[test]
    fn test_plans_differ_when_values_differ() {
        let old = plan_with_container_definitions(r#"[{"name":"web","image":"img:1"}]"#);
        let new = plan_with_container_definitions(r#"[{"name":"web","image":"img:2"}]"#);

        let comparison = Comparator::new().compare_plan_texts(&old, &new).expect("valid plans");
        assert!(!comparison.plans_match);
        assert!(comparison.drift_detected());
        assert_eq!(comparison.diff.updated.len(), 1);
        assert_ne!(comparison.old_fingerprint, comparison.new_fingerprint);
    }

    #[test]
    fn test_resource_order_does_not_matter() {
        let old = plan_with_resources(&[
            ("a.one", json!({"v": 1}), json!({"v": 2})),
            ("b.two", json!({"v": 1}), json!({"v": 3})),
        ]);
        let new = plan_with_resources(&[
            ("b.two", json!({"v": 1}), json!({"v": 3})),
            ("a.one", json!({"v": 1}), json!({"v": 2})),
        ]);

        let comparison = Comparator::new().compare_plan_texts(&old, &new).expect("valid plans");
        assert!(comparison.plans_match);
        assert!(!comparison.drift_detected());
    }

    #[test]
    fn test_no_op_resources_do_not_count() {
        let old = plan_with_resources(&[("a.one", json!({"v": 1}), json!({"v": 2}))]);
        let new = json!({
            "resource_changes": [
                {"address": "a.one", "change": {"actions": ["update"], "before": {"v": 1}, "after": {"v": 2}}},
                {"address": "z.noop", "change": {"actions": ["no-op"], "before": {"v": 1}, "after": {"v": 1}}}
            ]
        })
        .to_string();

        let comparison = Comparator::new().compare_plan_texts(&old, &new).expect("valid plans");
        assert!(!comparison.drift_detected());
    }

    #[test]
    fn test_null_and_empty_collection_are_equivalent() {
        let old = plan_with_resources(&[("a.one", json!({"tags": null}), json!({"tags": ["x"]}))]);
        let new = plan_with_resources(&[("a.one", json!({"tags": []}), json!({"tags": ["x"]}))]);

        let comparison = Comparator::new().compare_plan_texts(&old, &new).expect("valid plans");
        assert!(comparison.plans_match);
    }

    #[test]
    fn test_malformed_plan_is_an_error() {
        let valid = plan_with_resources(&[]);
        let result = Comparator::new().compare_plan_texts("{broken", &valid);
        assert!(matches!(
            result,
            Err(crate::error::GuardError::Plan(PlanError::Parse { .. }))
        ));
    }

    #[test]
    fn test_equivalent_lists_in_any_order() {
        let a = FlatChange::new("a", &["create"], Map::new(), Map::new());
        let b = FlatChange::new("b", &["create"], Map::new(), Map::new());
        let comparator = Comparator::new();

        assert!(
            comparator
                .equivalent(&[a.clone(), b.clone()][..], &[b, a][..])
                .expect("serializable")
        );
    }

    #[test]
    fn test_fingerprint_short_form() {
        let fingerprint = Comparator::new().fingerprint(&[]).expect("serializable");
        assert_eq!(fingerprint.as_str().len(), 64);
        assert_eq!(fingerprint.short().len(), 8);
        assert!(fingerprint.as_str().starts_with(fingerprint.short()));
    }
}
