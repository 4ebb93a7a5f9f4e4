//! Reduction of plan resource changes to their net effect.
//!
//! A plan lists every resource it touched together with the full `before`
//! and `after` attribute maps. Only the attributes that actually change are
//! relevant when comparing two plans, so each record is reduced to those.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::error::{PlanError, Result};

use super::canonical::canonical_for_comparison;

/// Action marker for resources the plan leaves untouched.
pub const NO_OP_ACTION: &str = "no-op";

/// One entry of a plan's `resource_changes` list.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceChange {
    /// Resource instance address.
    pub address: String,
    /// Change details.
    #[serde(default)]
    pub change: Option<Change>,
}

/// The `change` block of a resource change record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Change {
    /// Planned actions; the first one is authoritative.
    #[serde(default)]
    pub actions: Vec<String>,
    /// State before the change.
    #[serde(default)]
    pub before: Option<Map<String, Value>>,
    /// State after the change.
    #[serde(default)]
    pub after: Option<Map<String, Value>>,
}

/// A resource change reduced to its differing attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatChange {
    /// Resource instance address.
    pub address: String,
    /// Planned actions.
    pub actions: Vec<String>,
    /// Attributes whose value differs, as seen before the change.
    pub before: Map<String, Value>,
    /// Attributes whose value differs, as seen after the change.
    pub after: Map<String, Value>,
}

impl ResourceChange {
    /// Returns true if the primary action is the no-op marker.
    #[must_use]
    pub fn is_no_op(&self) -> bool {
        self.actions().first().map(String::as_str) == Some(NO_OP_ACTION)
    }

    /// Planned actions, empty when the record carries no change block.
    #[must_use]
    pub fn actions(&self) -> &[String] {
        self.change
            .as_ref()
            .map(|c| c.actions.as_slice())
            .unwrap_or_default()
    }

    /// Reduces the record to the attributes whose canonical value differs.
    ///
    /// Returns `None` when nothing differs.
    #[must_use]
    pub fn flatten(&self) -> Option<FlatChange> {
        let empty = Map::new();
        let before = self
            .change
            .as_ref()
            .and_then(|c| c.before.as_ref())
            .unwrap_or(&empty);
        let after = self
            .change
            .as_ref()
            .and_then(|c| c.after.as_ref())
            .unwrap_or(&empty);

        let keys: BTreeSet<&String> = before.keys().chain(after.keys()).collect();

        let mut reduced_before = Map::new();
        let mut reduced_after = Map::new();
        for key in keys {
            let old = before.get(key);
            let new = after.get(key);
            if !values_differ(old, new) {
                continue;
            }
            if let Some(value) = old {
                reduced_before.insert(key.clone(), value.clone());
            }
            if let Some(value) = new {
                reduced_after.insert(key.clone(), value.clone());
            }
        }

        if reduced_before.is_empty() && reduced_after.is_empty() {
            return None;
        }

        Some(FlatChange {
            address: self.address.clone(),
            actions: self.actions().to_vec(),
            before: reduced_before,
            after: reduced_after,
        })
    }
}

impl FlatChange {
    /// Creates a flat change from its parts.
    #[must_use]
    pub fn new(
        address: impl Into<String>,
        actions: &[&str],
        before: Map<String, Value>,
        after: Map<String, Value>,
    ) -> Self {
        Self {
            address: address.into(),
            actions: actions.iter().map(|a| (*a).to_string()).collect(),
            before,
            after,
        }
    }
}

/// An attribute present on one side only always counts as a difference.
fn values_differ(old: Option<&Value>, new: Option<&Value>) -> bool {
    match (old, new) {
        (Some(old), Some(new)) => canonical_for_comparison(old) != canonical_for_comparison(new),
        (None, None) => false,
        _ => true,
    }
}

/// Extracts the reduced resource changes from a canonicalized plan.
///
/// No-op records and records without differing attributes are dropped.
/// Records without an address or with a malformed `change` block are
/// skipped with a warning. Input order is preserved.
///
/// # Errors
///
/// Currently infallible for any JSON value.
pub fn extract_changes(plan: &Value) -> Result<Vec<FlatChange>> {
    let Some(records) = plan.get("resource_changes").and_then(Value::as_array) else {
        debug!("Plan has no resource_changes");
        return Ok(Vec::new());
    };

    let mut changes = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let record: ResourceChange = match serde_json::from_value(record.clone()) {
            Ok(record) => record,
            Err(e) => {
                let err = PlanError::InvalidResourceChange {
                    index,
                    message: e.to_string(),
                };
                warn!("Skipping resource change: {err}");
                continue;
            }
        };

        if record.is_no_op() {
            debug!("Skipping no-op resource {}", record.address);
            continue;
        }

        match record.flatten() {
            Some(flat) => changes.push(flat),
            None => debug!("Resource {} has no net change", record.address),
        }
    }

    debug!(
        "Extracted {} of {} resource changes",
        changes.len(),
        records.len()
    );
    Ok(changes)
}
