//! Parsing of gateway payloads into domain types.
//!
//! Gateway versions disagree on the `/tools` envelope: some return a bare
//! array, others wrap it as `{"tools": [...]}`. The array form is tried first,
//! the wrapped form second, and anything else is rejected rather than read as
//! an empty catalog.

use crate::gateway::error::{GatewayError, GatewayResult};
use crate::gateway::types::{RpcResponse, ToolDescriptor};
use serde_json::Value;

const LIST_OPERATION: &str = "get_tools";
const CALL_OPERATION: &str = "call_tool";

/// Transform a `/tools` response body into tool descriptors.
///
/// Individual malformed tools are logged and skipped (partial success model).
/// If every entry is malformed the response as a whole is rejected.
pub fn parse_tool_list(json: &Value) -> GatewayResult<Vec<ToolDescriptor>> {
    let tools_array = extract_tools_array(json)?;

    let mut results = Vec::with_capacity(tools_array.len());

    for (idx, tool_value) in tools_array.iter().enumerate() {
        match normalize_tool(tool_value) {
            Ok(tool) => results.push(tool),
            Err(reason) => {
                tracing::warn!(index = idx, error = %reason, "Skipping malformed tool definition");
            }
        }
    }

    if results.is_empty() && !tools_array.is_empty() {
        return Err(GatewayError::InvalidResponse {
            operation: LIST_OPERATION,
            reason: "all tool definitions failed to parse".into(),
        });
    }

    tracing::debug!(
        total = tools_array.len(),
        parsed = results.len(),
        "Tool list parsed"
    );

    Ok(results)
}

fn extract_tools_array(json: &Value) -> GatewayResult<&Vec<Value>> {
    if let Some(array) = json.as_array() {
        return Ok(array);
    }

    json.get("tools")
        .and_then(|t| t.as_array())
        .ok_or_else(|| GatewayError::InvalidResponse {
            operation: LIST_OPERATION,
            reason: format!(
                "expected a tool array or an object with a 'tools' array, got {}",
                json_kind(json)
            ),
        })
}

fn normalize_tool(tool_value: &Value) -> Result<ToolDescriptor, String> {
    let name = tool_value
        .get("name")
        .and_then(|v| v.as_str())
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| format!("tool missing required 'name' field: {:?}", tool_value.get("name")))?;

    let description = tool_value
        .get("description")
        .and_then(|v| v.as_str())
        .unwrap_or("");

    let input_schema = tool_value
        .get("inputSchema")
        .or_else(|| tool_value.get("input_schema"))
        .filter(|s| s.is_object())
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()));

    let tool = ToolDescriptor::new(name, description, input_schema);

    let explicit_gateway = tool_value
        .get("gatewaySlug")
        .or_else(|| tool_value.get("gateway_slug"))
        .and_then(|v| v.as_str())
        .filter(|g| !g.is_empty());

    Ok(match explicit_gateway {
        Some(gateway) => tool.with_gateway(gateway),
        None => tool,
    })
}

/// Extract the textual result from a `/rpc` response body.
///
/// `result.content[].text` items are joined with newlines; when there are none
/// the serialized `result` is returned instead.
pub fn parse_call_result(tool: &str, json: Value) -> GatewayResult<String> {
    let response: RpcResponse =
        serde_json::from_value(json).map_err(|e| GatewayError::InvalidResponse {
            operation: CALL_OPERATION,
            reason: e.to_string(),
        })?;

    if let Some(error) = response.error {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(GatewayError::ToolFailed {
            tool: tool.to_string(),
            message,
        });
    }

    let result = response.result.unwrap_or(Value::Object(Default::default()));

    let texts: Vec<&str> = result
        .get("content")
        .and_then(|c| c.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("text").and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default();

    if texts.is_empty() {
        Ok(result.to_string())
    } else {
        Ok(texts.join("\n"))
    }
}

fn json_kind(json: &Value) -> &'static str {
    match json {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object without 'tools'",
    }
}
