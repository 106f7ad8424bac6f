//! Response normalization - the trust boundary between the reasoning service
//! and the rest of the pipeline.
//!
//! Everything a model returns is adversarial until it has been through this
//! module: scores get clamped, enums get whitelisted with documented
//! fallbacks, arrays get defaulted, and cross-field coherence rules are
//! enforced in code rather than left to the model's discretion.
//!
//! Normalization is a projection: applying it to already-normalized data
//! yields the same data.

mod schema;

pub use schema::{
    AlertLevel, AnalysisOutput, Confidence, DataCompleteness, Finding, Meta, RedFlag, Score,
    Severity,
};

use serde_json::Value;

/// Read a field by canonical snake_case name, falling back to alternates
/// (camelCase spellings and synonyms models commonly emit).
pub(crate) fn field<'a>(raw: &'a Value, names: &[&str]) -> Option<&'a Value> {
    let obj = raw.as_object()?;
    names.iter().find_map(|name| obj.get(*name))
}

/// Coerce an arbitrary value into a score in [0, 100].
///
/// Numbers are clamped; numeric strings are parsed then clamped; everything
/// else (null, objects, non-numeric strings, absence) becomes 0.
pub(crate) fn clamp_score(raw: Option<&Value>) -> u8 {
    let numeric = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match numeric {
        Some(v) if v.is_finite() => v.clamp(0.0, 100.0).round() as u8,
        _ => 0,
    }
}

/// Coerce a value into a string, with empty string for non-strings.
pub(crate) fn string_or_empty(raw: Option<&Value>) -> String {
    raw.and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Coerce a value into a list, normalizing each element and dropping the
/// ones the element normalizer rejects. Non-arrays (including null and
/// absence) become an empty list - the contract promises a list, never null.
pub(crate) fn array_of<T>(raw: Option<&Value>, normalize: impl Fn(&Value) -> Option<T>) -> Vec<T> {
    match raw {
        Some(Value::Array(items)) => items.iter().filter_map(normalize).collect(),
        _ => Vec::new(),
    }
}

/// Coerce a value into a list of non-empty strings.
pub(crate) fn string_array(raw: Option<&Value>) -> Vec<String> {
    array_of(raw, |item| {
        let s = item.as_str()?.trim();
        (!s.is_empty()).then(|| s.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clamp_score_in_range() {
        assert_eq!(clamp_score(Some(&json!(42))), 42);
        assert_eq!(clamp_score(Some(&json!(0))), 0);
        assert_eq!(clamp_score(Some(&json!(100))), 100);
    }

    #[test]
    fn test_clamp_score_out_of_range() {
        assert_eq!(clamp_score(Some(&json!(140))), 100);
        assert_eq!(clamp_score(Some(&json!(999))), 100);
        assert_eq!(clamp_score(Some(&json!(-50))), 0);
    }

    #[test]
    fn test_clamp_score_garbage() {
        assert_eq!(clamp_score(Some(&json!("high"))), 0);
        assert_eq!(clamp_score(Some(&json!("87"))), 87);
        assert_eq!(clamp_score(Some(&json!(null))), 0);
        assert_eq!(clamp_score(Some(&json!({"v": 1}))), 0);
        assert_eq!(clamp_score(None), 0);
    }

    #[test]
    fn test_array_defaulting() {
        assert!(string_array(Some(&json!(null))).is_empty());
        assert!(string_array(Some(&json!("not an array"))).is_empty());
        assert!(string_array(None).is_empty());
        assert_eq!(
            string_array(Some(&json!(["a", 3, "", "b"]))),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_field_aliases() {
        let raw = json!({"redFlags": [1]});
        assert!(field(&raw, &["red_flags", "redFlags"]).is_some());
        assert!(field(&raw, &["red_flags"]).is_none());
    }
}
