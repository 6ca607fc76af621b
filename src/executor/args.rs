//! Best-effort mapping of a free-text task onto a tool's input schema.
//!
//! Only one field is ever populated, with the task text verbatim. Tools whose
//! schemas need structured values will reject the call upstream, which
//! surfaces as a normal gateway error.

use crate::gateway::ToolDescriptor;
use serde_json::{Map, Value};

/// Field names that conventionally accept free text, in order of preference.
const FREE_TEXT_KEYS: &[&str] = &["query", "q", "search", "prompt", "text", "input"];

/// Fallback key when the schema declares nothing usable.
const DEFAULT_KEY: &str = "task";

/// Build call arguments for `tool` from `task`.
pub fn build_arguments(tool: &ToolDescriptor, task: &str) -> Value {
    let schema = &tool.input_schema;
    let properties = schema.get("properties").and_then(Value::as_object);
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let key = pick_key(properties, &required).unwrap_or(DEFAULT_KEY);

    let mut args = Map::new();
    args.insert(key.to_string(), Value::String(task.to_string()));
    Value::Object(args)
}

fn pick_key<'a>(properties: Option<&'a Map<String, Value>>, required: &[&'a str]) -> Option<&'a str> {
    let declared = |key: &str| {
        properties.is_some_and(|p| p.contains_key(key)) || required.contains(&key)
    };

    if let Some(key) = FREE_TEXT_KEYS.iter().copied().find(|k| declared(*k)) {
        return Some(key);
    }

    let accepts_text = |key: &str| match properties.and_then(|p| p.get(key)) {
        Some(prop) => match prop.get("type") {
            Some(Value::String(t)) => t == "string",
            None => true,
            Some(_) => false,
        },
        None => true,
    };

    if let Some(key) = required.iter().copied().find(|k| accepts_text(*k)) {
        return Some(key);
    }

    match properties {
        Some(p) if p.len() == 1 => p.keys().next().map(String::as_str),
        _ => None,
    }
}
