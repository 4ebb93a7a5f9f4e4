//! Markdown rendering of a plan diff.
//!
//! The layout is consumed by CI summaries and kept in audit trails, so
//! headings, markers and the four-space indentation inside `<details>`
//! blocks must stay byte-stable.

use serde_json::{Map, Value};
use std::fmt::Write;

use super::diff::{DiffResult, DriftCondition, UpdatedResource};

/// Marker rendered for an empty section.
pub const NONE_MARKER: &str = "_None_";

/// Heading of the added section, without the count.
pub const ADDED_HEADING: &str = "## 🆕 Added";

/// Heading of the removed section, without the count.
pub const REMOVED_HEADING: &str = "## 🗑️ Removed";

/// Heading of the updated section, without the count.
pub const UPDATED_HEADING: &str = "## ✏️ Updated";

const INDENT: &str = "    ";

/// Renders the full report: added, removed and updated sections.
#[must_use]
pub fn render_markdown(diff: &DiffResult) -> String {
    let added = if diff.added.is_empty() {
        NONE_MARKER.to_string()
    } else {
        bullet_addresses(&diff.added)
    };

    let removed = if diff.removed.is_empty() {
        NONE_MARKER.to_string()
    } else {
        bullet_addresses(&diff.removed)
    };

    let updated = if diff.updated.is_empty() {
        NONE_MARKER.to_string()
    } else {
        diff.updated
            .iter()
            .map(|u| format!("- {}", render_update(u)))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    format!(
        "{ADDED_HEADING} ({})\n{added}\n\n{REMOVED_HEADING} ({})\n{removed}\n\n{UPDATED_HEADING} ({})\n{updated}\n",
        diff.added.len(),
        diff.removed.len(),
        diff.updated.len(),
    )
}

fn bullet_addresses(addresses: &[String]) -> String {
    addresses
        .iter()
        .map(|a| format!("- `{a}`"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders one collapsible block. The second plan's state is always shown
/// before the initial plan's state.
fn render_update(update: &UpdatedResource) -> String {
    let mut details = format!("<details><summary>🔄 {}</summary>\n", update.address);

    if update.has(DriftCondition::PlanChanged) {
        let _ = write!(
            details,
            "{INDENT}❌ Plan has changed!{INDENT}\n\n{}\n{}\n",
            state_block("Second Plan Result State:", &update.new.after, &update.new.before, false),
            state_block("Initial Plan Result State:", &update.old.after, &update.old.before, true),
        );
    }

    if update.has(DriftCondition::ModifiedOutsidePlan) {
        let _ = write!(
            details,
            "{INDENT}❌ Resource has been modified outside plan!{INDENT}\n\n{}\n{}\n",
            state_block("Second Plan Initial State:", &update.new.before, &update.new.before, false),
            state_block("Initial Plan Initial State:", &update.old.before, &update.old.before, true),
        );
    }

    details.push_str("</details>");
    details
}

/// Labelled, indented JSON code fence.
///
/// Keys shared with `lead` come first, then keys only present in `state`.
fn state_block(
    label: &str,
    state: &Map<String, Value>,
    lead: &Map<String, Value>,
    trailing_newline: bool,
) -> String {
    let pretty = pretty_ordered(state, lead);
    let body = pretty
        .lines()
        .map(|line| format!("{INDENT}{line}"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut block = format!("{INDENT}{label}\n{INDENT}```json\n{body}\n{INDENT}```");
    if trailing_newline {
        block.push('\n');
    }
    block
}

/// Pretty JSON object with two-space indentation and the key order of
/// [`state_block`].
fn pretty_ordered(state: &Map<String, Value>, lead: &Map<String, Value>) -> String {
    if state.is_empty() {
        return String::from("{}");
    }

    let (shared, own): (Vec<_>, Vec<_>) = state.iter().partition(|(key, _)| lead.contains_key(*key));
    let entries = shared
        .into_iter()
        .chain(own)
        .map(|(key, value)| {
            let value = format!("{value:#}").replace('\n', "\n  ");
            format!("  {}: {value}", Value::String(key.clone()))
        })
        .collect::<Vec<_>>()
        .join(",\n");

    format!("{{\n{entries}\n}}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::compare::Comparator;
    use crate::planner::diff::DiffEngine;
    use crate::planner::extract::FlatChange;
    use serde_json::json;

    fn change(address: &str, before: Value, after: Value) -> FlatChange {
        let to_map = |v: Value| match v {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        FlatChange::new(address, &["update"], to_map(before), to_map(after))
    }

    #[test]
    fn test_empty_report_is_structurally_complete() {
        let report = render_markdown(&DiffResult::default());
        assert_eq!(
            report,
            "## 🆕 Added (0)\n_None_\n\n## 🗑️ Removed (0)\n_None_\n\n## ✏️ Updated (0)\n_None_\n"
        );
    }

    #[test]
    fn test_added_and_removed_bullets() {
        let old = vec![change("aws_s3_bucket.old", json!({"name": "bucket"}), json!({}))];
        let new = vec![
            change("aws_s3_bucket.new", json!({}), json!({"name": "bucket"})),
            change("aws_s3_bucket.other", json!({}), json!({"name": "other"})),
        ];
        let report = DiffEngine::new().compute_diff(&old, &new).to_markdown();

        assert!(report.contains("## 🆕 Added (2)\n- `aws_s3_bucket.new`\n- `aws_s3_bucket.other`\n\n"));
        assert!(report.contains("## 🗑️ Removed (1)\n- `aws_s3_bucket.old`\n\n"));
        assert!(report.contains("## ✏️ Updated (0)\n_None_\n"));
    }

    #[test]
    fn test_plan_changed_block() {
        let old = vec![change("aws_instance.example", json!({"count": 1}), json!({"count": 1}))];
        let new = vec![change("aws_instance.example", json!({"count": 1}), json!({"count": 2}))];
        let report = DiffEngine::new().compute_diff(&old, &new).to_markdown();

        let expected = "## ✏️ Updated (1)\n\
- <details><summary>🔄 aws_instance.example</summary>\n\
\u{20}   ❌ Plan has changed!    \n\
\n\
\u{20}   Second Plan Result State:\n\
\u{20}   ```json\n\
\u{20}   {\n\
\u{20}     \"count\": 2\n\
\u{20}   }\n\
\u{20}   ```\n\
\u{20}   Initial Plan Result State:\n\
\u{20}   ```json\n\
\u{20}   {\n\
\u{20}     \"count\": 1\n\
\u{20}   }\n\
\u{20}   ```\n\
\n\
</details>\n";
        assert!(report.ends_with(expected), "unexpected report:\n{report}");
        assert!(!report.contains("modified outside plan!"));
    }

    #[test]
    fn test_modified_outside_plan_block() {
        let old = vec![change("aws_instance.example", json!({"count": 1}), json!({"count": 2}))];
        let new = vec![change("aws_instance.example", json!({"count": 2}), json!({"count": 2}))];
        let report = DiffEngine::new().compute_diff(&old, &new).to_markdown();

        assert!(report.contains("Resource has been modified outside plan!"));
        assert!(report.contains("Second Plan Initial State:"));
        assert!(report.contains("Initial Plan Initial State:"));
        assert!(!report.contains("Plan has changed!"));

        let second = report.find("Second Plan Initial State:").unwrap_or(usize::MAX);
        let initial = report.find("Initial Plan Initial State:").unwrap_or(0);
        assert!(second < initial);
    }

    #[test]
    fn test_result_condition_precedes_outside_modification() {
        let old = vec![change("aws_instance.example", json!({"count": 1}), json!({"count": 2}))];
        let new = vec![change("aws_instance.example", json!({"count": 3}), json!({"count": 4}))];
        let report = DiffEngine::new().compute_diff(&old, &new).to_markdown();

        let result_pos = report.find("Plan has changed!").unwrap_or(usize::MAX);
        let outside_pos = report.find("modified outside plan!").unwrap_or(0);
        assert!(result_pos < outside_pos);
    }

    #[test]
    fn test_both_conditions_block() {
        let old = vec![change("aws_instance.example", json!({"count": 1}), json!({"count": 2}))];
        let new = vec![change("aws_instance.example", json!({"count": 3}), json!({"count": 4}))];
        let report = DiffEngine::new().compute_diff(&old, &new).to_markdown();

        let expected = "## ✏️ Updated (1)\n\
- <details><summary>🔄 aws_instance.example</summary>\n\
\u{20}   ❌ Plan has changed!    \n\
\n\
\u{20}   Second Plan Result State:\n\
\u{20}   ```json\n\
\u{20}   {\n\
\u{20}     \"count\": 4\n\
\u{20}   }\n\
\u{20}   ```\n\
\u{20}   Initial Plan Result State:\n\
\u{20}   ```json\n\
\u{20}   {\n\
\u{20}     \"count\": 2\n\
\u{20}   }\n\
\u{20}   ```\n\
\n\
\u{20}   ❌ Resource has been modified outside plan!    \n\
\n\
\u{20}   Second Plan Initial State:\n\
\u{20}   ```json\n\
\u{20}   {\n\
\u{20}     \"count\": 3\n\
\u{20}   }\n\
\u{20}   ```\n\
\u{20}   Initial Plan Initial State:\n\
\u{20}   ```json\n\
\u{20}   {\n\
\u{20}     \"count\": 1\n\
\u{20}   }\n\
\u{20}   ```\n\
\n\
</details>\n";
        assert!(report.ends_with(expected), "unexpected report:\n{report}");
    }

    #[test]
    fn test_result_state_lists_shared_keys_first() {
        let state = match json!({"b": "new", "c": 2}) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let lead = match json!({"a": "gone", "c": 1}) {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let block = state_block("Label:", &state, &lead, false);
        assert_eq!(
            block,
            "    Label:\n    ```json\n    {\n      \"c\": 2,\n      \"b\": \"new\"\n    }\n    ```"
        );
    }

    #[test]
    fn test_nested_values_are_indented() {
        let state = match json!({"tags": {"env": "dev"}, "ports": [80]}) {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let block = state_block("Label:", &state, &state, false);
        assert_eq!(
            block,
            "    Label:\n    ```json\n    {\n      \"ports\": [\n        80\n      ],\n      \"tags\": {\n        \"env\": \"dev\"\n      }\n    }\n    ```"
        );
    }

    #[test]
    fn test_integral_floats_render_as_integers() {
        let plan = |cpu: &str| {
            format!(
                r#"{{"resource_changes":[{{"address":"aws_ecs_task_definition.app",
                "change":{{"actions":["update"],"before":{{"cpu":256.0}},"after":{{"cpu":{cpu}}}}}}}]}}"#
            )
        };
        let comparison = Comparator::new()
            .compare_plan_texts(&plan("512.0"), &plan("1.024e3"))
            .expect("valid plans");
        let report = comparison.diff.to_markdown();

        assert!(report.contains("\"cpu\": 1024\n"), "unexpected report:\n{report}");
        assert!(report.contains("\"cpu\": 512\n"));
        assert!(!report.contains(".0"));
    }

    #[test]
    fn test_multiple_updates_are_separated_by_blank_line() {
        let old = vec![
            change("a.one", json!({}), json!({"v": 1})),
            change("b.two", json!({}), json!({"v": 1})),
        ];
        let new = vec![
            change("a.one", json!({}), json!({"v": 2})),
            change("b.two", json!({}), json!({"v": 2})),
        ];
        let report = DiffEngine::new().compute_diff(&old, &new).to_markdown();
        assert!(report.contains("</details>\n\n- <details><summary>🔄 b.two</summary>"));
    }

    #[test]
    fn test_empty_state_renders_braces() {
        let block = state_block("Label:", &Map::new(), &Map::new(), false);
        assert_eq!(block, "    Label:\n    ```json\n    {}\n    ```");
    }
}
