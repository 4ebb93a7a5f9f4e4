//! Canonical form for plan documents.
//!
//! Plan documents carry incidental ordering noise: provider-dependent key
//! order, unordered sets rendered as lists, and JSON blobs embedded as string
//! attributes (container definitions, IAM policies, log configurations).
//! Canonicalization removes that noise so two plans can be compared
//! structurally.

use serde_json::{Map, Number, Value};

use crate::error::{PlanError, Result};

/// Decides what an attribute reported as `null` stands for.
///
/// Terraform reports `null` for unset collection attributes depending on the
/// provider, while the same attribute may show up as `[]` or `{}` in another
/// plan. A policy maps such a `null` to the empty container it is assumed to
/// represent.
pub trait NullPolicy {
    /// Returns the empty value substituted for a `null` stored under `key`.
    fn empty_value_for(&self, key: &str) -> Value;
}

/// Name-based null policy.
///
/// Keys ending in `s`, `_list` or `_groups` become `[]`, everything else
/// becomes `{}`. This is an approximation without schema knowledge: singular
/// names ending in `s` (such as `status`) are classified as lists.
#[derive(Debug, Default, Clone, Copy)]
pub struct SuffixNullPolicy;

impl NullPolicy for SuffixNullPolicy {
    fn empty_value_for(&self, key: &str) -> Value {
        if key.ends_with('s') || key.ends_with("_list") || key.ends_with("_groups") {
            Value::Array(Vec::new())
        } else {
            Value::Object(Map::new())
        }
    }
}

/// Recursive canonicalizer for plan values.
#[derive(Debug, Default, Clone)]
pub struct Canonicalizer<P = SuffixNullPolicy> {
    policy: P,
}

impl Canonicalizer<SuffixNullPolicy> {
    /// Creates a canonicalizer using the suffix null policy.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            policy: SuffixNullPolicy,
        }
    }
}

impl<P: NullPolicy> Canonicalizer<P> {
    /// Creates a canonicalizer with a custom null policy.
    #[must_use]
    pub const fn with_policy(policy: P) -> Self {
        Self { policy }
    }

    /// Parses raw plan text and returns its canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Parse`] if `raw` is not valid JSON.
    pub fn canonicalize_text(&self, raw: &str, source_name: &str) -> Result<Value> {
        let parsed: Value = serde_json::from_str(raw)
            .map_err(|e| PlanError::parse(source_name, e.to_string()))?;
        Ok(self.canonicalize_value(parsed))
    }

    /// Canonicalizes an in-memory value.
    #[must_use]
    pub fn canonicalize_value(&self, value: Value) -> Value {
        match value {
            Value::String(text) => Value::String(self.canonicalize_string(text)),
            Value::Array(items) => {
                let mut items: Vec<Value> = items
                    .into_iter()
                    .map(|item| self.canonicalize_value(item))
                    .collect();
                items.sort_by_cached_key(|item| item.to_string());
                Value::Array(items)
            }
            Value::Object(map) => {
                let mut entries: Vec<(String, Value)> = map.into_iter().collect();
                entries.sort_by(|a, b| a.0.cmp(&b.0));

                let mut canonical = Map::new();
                for (key, value) in entries {
                    let value = if value.is_null() {
                        self.policy.empty_value_for(&key)
                    } else {
                        value
                    };
                    let value = self.canonicalize_value(value);
                    canonical.insert(key, value);
                }
                Value::Object(canonical)
            }
            Value::Number(number) => Value::Number(canonical_number(number)),
            scalar => scalar,
        }
    }

    /// Returns the canonical serialized form of `value` for equality checks.
    ///
    /// Strings holding embedded JSON are compared by their decoded content,
    /// so `"{\"a\":1,\"b\":2}"` and `"{\"b\":2,\"a\":1}"` yield the same result.
    #[must_use]
    pub fn canonical_for_comparison(&self, value: &Value) -> String {
        let decoded = match value {
            Value::String(text) => decode_embedded_json(text),
            _ => None,
        };
        match decoded {
            Some(decoded) => self.canonicalize_value(decoded).to_string(),
            None => self.canonicalize_value(value.clone()).to_string(),
        }
    }

    /// Re-serializes an embedded JSON string in canonical order, leaving any
    /// other string untouched.
    fn canonicalize_string(&self, text: String) -> String {
        match decode_embedded_json(&text) {
            Some(decoded) => self.canonicalize_value(decoded).to_string(),
            None => text,
        }
    }
}

/// Returns true if the trimmed text is delimited by `{}` or `[]`.
#[must_use]
pub fn looks_like_json(text: &str) -> bool {
    let trimmed = text.trim();
    (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'))
}

/// Integral floats (`256.0`, `2.56e2`) become integers so they compare equal
/// to `256`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn canonical_number(number: Number) -> Number {
    let Some(float) = number.as_f64().filter(|_| number.is_f64()) else {
        return number;
    };
    if !float.is_finite() || float.fract() != 0.0 {
        return number;
    }

    if float >= i64::MIN as f64 && float < i64::MAX as f64 {
        Number::from(float as i64)
    } else if float >= 0.0 && float < u64::MAX as f64 {
        Number::from(float as u64)
    } else {
        number
    }
}

/// Decodes a JSON-shaped string. Malformed content yields `None`.
fn decode_embedded_json(text: &str) -> Option<Value> {
    if !looks_like_json(text) {
        return None;
    }
    serde_json::from_str(text).ok()
}

/// Parses and canonicalizes raw plan text with the default policy.
///
/// # Errors
///
/// Returns [`PlanError::Parse`] if `raw` is not valid JSON.
pub fn canonicalize(raw: &str) -> Result<Value> {
    Canonicalizer::new().canonicalize_text(raw, "plan")
}

/// Canonical string of `value` with the default policy.
#[must_use]
pub fn canonical_for_comparison(value: &Value) -> String {
    Canonicalizer::new().canonical_for_comparison(value)
}
