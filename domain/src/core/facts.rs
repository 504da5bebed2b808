//! Flat fact maps.
//!
//! Department context, tool outputs and normalized observations all share
//! one shape: string keys mapped to JSON values. Checks read them through
//! the lenient accessors below so that `"3"`, `3` and `3.0` compare alike.

use serde_json::Value;
use std::collections::BTreeMap;

/// A flat map of named facts.
pub type Facts = BTreeMap<String, Value>;

/// Read a fact as a number.
///
/// Numbers are returned as-is, booleans map to `1.0`/`0.0`, and numeric
/// strings are parsed. Anything else is `None`.
pub fn fact_number(facts: &Facts, key: &str) -> Option<f64> {
    match facts.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a fact as a boolean flag.
pub fn fact_flag(facts: &Facts, key: &str) -> Option<bool> {
    match facts.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn facts() -> Facts {
        let mut facts = Facts::new();
        facts.insert("trucks".to_string(), json!(4));
        facts.insert("pressure".to_string(), json!("42.5"));
        facts.insert("permit".to_string(), json!("yes"));
        facts.insert("flag".to_string(), json!(true));
        facts.insert("notes".to_string(), json!(["a"]));
        facts
    }

    #[test]
    fn test_fact_number() {
        let facts = facts();
        assert_eq!(fact_number(&facts, "trucks"), Some(4.0));
        assert_eq!(fact_number(&facts, "pressure"), Some(42.5));
        assert_eq!(fact_number(&facts, "flag"), Some(1.0));
        assert_eq!(fact_number(&facts, "notes"), None);
        assert_eq!(fact_number(&facts, "missing"), None);
    }

    #[test]
    fn test_fact_flag() {
        let facts = facts();
        assert_eq!(fact_flag(&facts, "permit"), Some(true));
        assert_eq!(fact_flag(&facts, "flag"), Some(true));
        assert_eq!(fact_flag(&facts, "trucks"), Some(true));
        assert_eq!(fact_flag(&facts, "pressure"), None);
    }
}
