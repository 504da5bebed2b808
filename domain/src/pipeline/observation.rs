//! Normalization of context and tool output into observed facts.

use super::ToolResult;
use crate::core::facts::Facts;
use serde_json::Value;

/// Flatten department context and successful tool output into one map.
///
/// Context goes in first so tool output overrides it. Nested objects are
/// flattened with dotted keys (`{"crew": {"size": 4}}` becomes
/// `crew.size`). Results are applied in the order given, later tools
/// winning on key clashes.
pub fn normalize_observations<'a>(
    context: &Facts,
    results: impl IntoIterator<Item = &'a ToolResult>,
) -> Facts {
    let mut observations = Facts::new();
    for (key, value) in context {
        flatten_into(&mut observations, key, value);
    }
    for result in results.into_iter().filter(|r| r.is_success()) {
        for (key, value) in &result.fields {
            flatten_into(&mut observations, key, value);
        }
    }
    observations
}

fn flatten_into(out: &mut Facts, key: &str, value: &Value) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (child, v) in map {
                flatten_into(out, &format!("{}.{}", key, child), v);
            }
        }
        Value::Null => {}
        other => {
            out.insert(key.to_string(), other.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ToolStatus;
    use serde_json::json;

    #[test]
    fn test_tool_fields_override_context_and_nest() {
        let mut context = Facts::new();
        context.insert("trucks_available".to_string(), json!(2));
        context.insert("ward".to_string(), json!({"population": 12000, "zone": null}));

        let trucks = ToolResult::new("check_truck_availability", ToolStatus::Available)
            .with_field("trucks_available", 5)
            .with_field("depot", json!({"name": "north"}));
        let failed = ToolResult::error("check_landfill_capacity", "offline");

        let observations = normalize_observations(&context, [&trucks, &failed]);
        assert_eq!(observations["trucks_available"], json!(5));
        assert_eq!(observations["ward.population"], json!(12000));
        assert_eq!(observations["depot.name"], json!("north"));
        assert!(!observations.contains_key("ward.zone"));
        assert_eq!(observations.len(), 3);
    }
}
