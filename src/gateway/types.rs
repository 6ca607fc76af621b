//! Type definitions for the gateway module.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Separator between the owning gateway and the tool in a namespaced tool name.
pub const GATEWAY_SEPARATOR: &str = "__";

/// One capability exposed by an upstream MCP server, as reported by the gateway.
///
/// Descriptors are produced by a single `/tools` fetch and never mutated
/// afterwards; a refresh replaces the whole list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name, conventionally `gateway__tool`
    pub name: String,

    /// Free-text description used for relevance scoring
    pub description: String,

    /// JSON schema of the call arguments (`{}` when the gateway reports none)
    pub input_schema: Value,

    /// Owning gateway slug (the prefix before `__`, or the explicit slug field)
    pub gateway: String,
}

impl ToolDescriptor {
    /// Creates a descriptor, deriving the gateway slug from the name.
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        let name = name.into();
        let gateway = gateway_from_name(&name).to_string();
        Self {
            name,
            description: description.into(),
            input_schema,
            gateway,
        }
    }

    /// Overrides the gateway slug with an explicitly reported one.
    pub fn with_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.gateway = gateway.into();
        self
    }
}

/// Prefix before the first `__`, or empty when the name is not namespaced.
pub fn gateway_from_name(name: &str) -> &str {
    match name.find(GATEWAY_SEPARATOR) {
        Some(idx) if idx > 0 => &name[..idx],
        _ => "",
    }
}

/// JSON-RPC request body sent to `POST /rpc`.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: ToolCallParams<'a>,
}

#[derive(Debug, Serialize)]
pub struct ToolCallParams<'a> {
    pub name: &'a str,
    pub arguments: &'a Value,
}

/// JSON-RPC response envelope returned by `POST /rpc`.
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}
