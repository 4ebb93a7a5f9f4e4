//! Diff engine for comparing two reduced plans.
//!
//! This module classifies every resource address of the initial (reviewed)
//! plan and the second (pre-apply) plan as added, removed, or updated.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::canonical::Canonicalizer;
use super::extract::FlatChange;
use super::report;

/// Engine for computing diffs between two reduced change lists.
#[derive(Debug, Default)]
pub struct DiffEngine {
    /// Canonicalizer used for attribute map equality.
    canonicalizer: Canonicalizer,
}

/// Why an address present in both plans is reported as updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftCondition {
    /// The planned result state differs.
    PlanChanged,
    /// The observed starting state differs.
    ModifiedOutsidePlan,
}

/// An address whose reduced change differs between the two plans.
#[derive(Debug, Clone, Serialize)]
pub struct UpdatedResource {
    /// Resource instance address.
    pub address: String,
    /// Triggered conditions, result changes first.
    pub conditions: Vec<DriftCondition>,
    /// Reduced change from the initial plan.
    pub old: FlatChange,
    /// Reduced change from the second plan.
    pub new: FlatChange,
}

/// Complete diff result.
#[derive(Debug, Default, Serialize)]
pub struct DiffResult {
    /// Addresses only present in the second plan.
    pub added: Vec<String>,
    /// Addresses only present in the initial plan.
    pub removed: Vec<String>,
    /// Addresses present in both plans with differing changes.
    pub updated: Vec<UpdatedResource>,
}

impl DiffEngine {
    /// Creates a new diff engine.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            canonicalizer: Canonicalizer::new(),
        }
    }

    /// Computes the diff between the initial and the second reduced plan.
    ///
    /// Added and updated entries follow the order of `new_changes`, removed
    /// entries the order of `old_changes`. When an address repeats within a
    /// list the last record wins.
    #[must_use]
    pub fn compute_diff(&self, old_changes: &[FlatChange], new_changes: &[FlatChange]) -> DiffResult {
        let old_by_address = index_by_address(old_changes);
        let new_by_address = index_by_address(new_changes);

        let mut result = DiffResult::default();

        for address in unique_addresses(new_changes) {
            let Some(new_item) = new_by_address.get(address) else {
                continue;
            };
            let Some(old_item) = old_by_address.get(address) else {
                debug!("Resource {address} only appears in the second plan");
                result.added.push(address.to_string());
                continue;
            };

            let conditions = self.conditions_for(old_item, new_item);
            if conditions.is_empty() {
                continue;
            }

            debug!("Resource {address} differs ({conditions:?})");
            result.updated.push(UpdatedResource {
                address: address.to_string(),
                conditions,
                old: (*old_item).clone(),
                new: (*new_item).clone(),
            });
        }

        for address in unique_addresses(old_changes) {
            if !new_by_address.contains_key(address) {
                debug!("Resource {address} only appears in the initial plan");
                result.removed.push(address.to_string());
            }
        }

        result
    }

    /// Compares reduced `after` and `before` maps independently.
    fn conditions_for(&self, old: &FlatChange, new: &FlatChange) -> Vec<DriftCondition> {
        let mut conditions = Vec::new();
        if !self.maps_equal(&old.after, &new.after) {
            conditions.push(DriftCondition::PlanChanged);
        }
        if !self.maps_equal(&old.before, &new.before) {
            conditions.push(DriftCondition::ModifiedOutsidePlan);
        }
        conditions
    }

    fn maps_equal(&self, a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
        self.canonicalizer
            .canonical_for_comparison(&Value::Object(a.clone()))
            == self
                .canonicalizer
                .canonical_for_comparison(&Value::Object(b.clone()))
    }
}

fn index_by_address(changes: &[FlatChange]) -> HashMap<&str, &FlatChange> {
    changes.iter().map(|c| (c.address.as_str(), c)).collect()
}

/// Addresses in first-seen order.
fn unique_addresses(changes: &[FlatChange]) -> Vec<&str> {
    let mut seen = HashSet::new();
    changes
        .iter()
        .map(|c| c.address.as_str())
        .filter(|address| seen.insert(*address))
        .collect()
}

impl DiffResult {
    /// Returns true if any address was added, removed, or updated.
    #[must_use]
    pub fn drift_detected(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty() || !self.updated.is_empty()
    }

    /// Returns the total number of differing addresses.
    #[must_use]
    pub fn total_changes(&self) -> usize {
        self.added.len() + self.removed.len() + self.updated.len()
    }

    /// Renders the markdown report.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        report::render_markdown(self)
    }
}

impl UpdatedResource {
    /// Returns true if the given condition was triggered.
    #[must_use]
    pub fn has(&self, condition: DriftCondition) -> bool {
        self.conditions.contains(&condition)
    }
}

impl std::fmt::Display for DriftCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PlanChanged => "plan result changed",
            Self::ModifiedOutsidePlan => "modified outside plan",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for UpdatedResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: ", self.address)?;
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{condition}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn change(address: &str, before: Value, after: Value) -> FlatChange {
        let to_map = |v: Value| match v {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        FlatChange::new(address, &["update"], to_map(before), to_map(after))
    }

    #[test]
    fn test_detects_added_resource() {
        let new = vec![change("aws_s3_bucket.new", json!({}), json!({"name": "bucket"}))];
        let result = DiffEngine::new().compute_diff(&[], &new);

        assert_eq!(result.added, vec!["aws_s3_bucket.new"]);
        assert!(result.removed.is_empty());
        assert!(result.updated.is_empty());
        assert!(result.drift_detected());
    }

    #[test]
    fn test_detects_removed_resource() {
        let old = vec![change("aws_s3_bucket.old", json!({"name": "bucket"}), json!({}))];
        let result = DiffEngine::new().compute_diff(&old, &[]);

        assert_eq!(result.removed, vec!["aws_s3_bucket.old"]);
        assert!(result.added.is_empty());
        assert!(result.drift_detected());
    }

    #[test]
    fn test_detects_changed_result() {
        let old = vec![change("aws_instance.example", json!({"count": 1}), json!({"count": 1}))];
        let new = vec![change("aws_instance.example", json!({"count": 1}), json!({"count": 2}))];
        let result = DiffEngine::new().compute_diff(&old, &new);

        assert_eq!(result.updated.len(), 1);
        let updated = &result.updated[0];
        assert_eq!(updated.address, "aws_instance.example");
        assert_eq!(updated.conditions, vec![DriftCondition::PlanChanged]);
        assert!(result.drift_detected());
    }

    #[test]
    fn test_detects_modification_outside_plan() {
        let old = vec![change("aws_instance.example", json!({"count": 1}), json!({"count": 2}))];
        let new = vec![change("aws_instance.example", json!({"count": 2}), json!({"count": 2}))];
        let result = DiffEngine::new().compute_diff(&old, &new);

        assert_eq!(result.updated.len(), 1);
        assert_eq!(result.updated[0].conditions, vec![DriftCondition::ModifiedOutsidePlan]);
        assert!(result.drift_detected());
    }

    #[test]
    fn test_reports_both_conditions() {
        let old = vec![change("aws_instance.example", json!({"count": 1}), json!({"count": 2}))];
        let new = vec![change("aws_instance.example", json!({"count": 3}), json!({"count": 4}))];
        let result = DiffEngine::new().compute_diff(&old, &new);

        let updated = &result.updated[0];
        assert!(updated.has(DriftCondition::PlanChanged));
        assert!(updated.has(DriftCondition::ModifiedOutsidePlan));
        assert_eq!(updated.to_string(), "aws_instance.example: plan result changed, modified outside plan");
    }

    #[test]
    fn test_no_drift_for_identical_changes() {
        let old = vec![change("aws_instance.example", json!({"count": 1}), json!({"count": 2}))];
        let new = old.clone();
        let result = DiffEngine::new().compute_diff(&old, &new);

        assert!(!result.drift_detected());
        assert_eq!(result.total_changes(), 0);
    }

    #[test]
    fn test_list_order_does_not_matter() {
        let old = vec![change("x.a", json!({}), json!({"ids": [1, 2]}))];
        let new = vec![change("x.a", json!({}), json!({"ids": [2, 1]}))];
        let result = DiffEngine::new().compute_diff(&old, &new);

        assert!(!result.drift_detected());
    }

    #[test]
    fn test_partitions_are_disjoint_and_complete() {
        let old = vec![
            change("only.old", json!({"a": 1}), json!({})),
            change("both.same", json!({"a": 1}), json!({"a": 2})),
            change("both.changed", json!({"a": 1}), json!({"a": 2})),
        ];
        let new = vec![
            change("both.changed", json!({"a": 1}), json!({"a": 3})),
            change("only.new", json!({}), json!({"a": 1})),
            change("both.same", json!({"a": 1}), json!({"a": 2})),
        ];
        let result = DiffEngine::new().compute_diff(&old, &new);

        assert_eq!(result.added, vec!["only.new"]);
        assert_eq!(result.removed, vec!["only.old"]);
        let updated: Vec<&str> = result.updated.iter().map(|u| u.address.as_str()).collect();
        assert_eq!(updated, vec!["both.changed"]);
        assert_eq!(result.total_changes(), 3);
    }

    #[test]
    fn test_duplicate_addresses_reported_once() {
        let new = vec![
            change("dup.a", json!({}), json!({"v": 1})),
            change("dup.a", json!({}), json!({"v": 2})),
        ];
        let result = DiffEngine::new().compute_diff(&[], &new);
        assert_eq!(result.added, vec!["dup.a"]);
    }
}
