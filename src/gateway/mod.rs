//! Communication with the upstream MCP gateway.
//!
//! This module owns the wire contract with the gateway REST API and turns its
//! payloads into [`ToolDescriptor`] records for the matcher.

pub mod client;
pub mod error;
pub mod parse;
pub mod types;

pub use client::{GatewayClient, ToolGateway};
pub use error::{GatewayError, GatewayResult};
pub use parse::{parse_call_result, parse_tool_list};
pub use types::{gateway_from_name, ToolDescriptor};
