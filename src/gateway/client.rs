//! HTTP client for the upstream gateway REST API.
//!
//! Operations:
//! - `GET /tools` to list tool descriptors
//! - `POST /rpc` (JSON-RPC `tools/call`) to invoke one tool
//!
//! Both carry a bearer token and a per-request timeout. Transport failures and
//! 5xx answers are retried with exponential backoff; 4xx answers and
//! unparsable 2xx bodies are returned immediately.

use crate::config::GatewayConfig;
use crate::gateway::error::{GatewayError, GatewayResult};
use crate::gateway::parse::{parse_call_result, parse_tool_list};
use crate::gateway::types::{RpcRequest, ToolCallParams, ToolDescriptor};
use async_trait::async_trait;
use reqwest::{redirect, Client, RequestBuilder};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Longest response body kept in an error, in bytes.
const MAX_ERROR_BODY: usize = 1024;

const MAX_REDIRECTS: usize = 5;

/// The gateway operations the router depends on.
#[async_trait]
pub trait ToolGateway: Send + Sync {
    /// Fetch the full tool list.
    async fn get_tools(&self) -> GatewayResult<Vec<ToolDescriptor>>;

    /// Invoke `name` with `arguments` and return its textual result.
    async fn call_tool(&self, name: &str, arguments: &Value) -> GatewayResult<String>;
}

/// Which transport failures may be retried for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryPolicy {
    /// Any transport failure; the request has no side effects.
    AnyTransportError,
    /// Only failures to establish the connection, since the request may
    /// already have reached the tool otherwise.
    ConnectOnly,
}

pub struct GatewayClient {
    client: Client,
    config: GatewayConfig,
    next_id: AtomicU64,
}

impl GatewayClient {
    /// Create a client, failing fast on missing URL or token.
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        config.validate().map_err(GatewayError::Configuration)?;

        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| GatewayError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    fn tools_url(&self) -> String {
        format!("{}/tools?limit=0&include_pagination=false", self.config.base_url)
    }

    fn rpc_url(&self) -> String {
        format!("{}/rpc", self.config.base_url)
    }

    /// Send a request built by `build`, retrying per `policy`, and decode the
    /// JSON body of the first non-retryable answer.
    async fn send_with_retry<F>(
        &self,
        operation: &'static str,
        policy: RetryPolicy,
        build: F,
    ) -> GatewayResult<Value>
    where
        F: Fn() -> RequestBuilder,
    {
        let max_attempts = self.config.max_retries.saturating_add(1);
        let mut last_error = String::new();
        let mut attempts = 0;

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let delay = self.config.backoff_delay(attempt - 1);
                warn!(
                    operation,
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %last_error,
                    "Retrying gateway request"
                );
                metrics::counter!("gateway_retries_total", "operation" => operation).increment(1);
                tokio::time::sleep(delay).await;
            }

            metrics::counter!("gateway_requests_total", "operation" => operation).increment(1);
            attempts += 1;

            let response = match build().bearer_auth(&self.config.auth_token).send().await {
                Ok(response) => response,
                Err(e) => {
                    last_error = describe_transport_error(&e);
                    if policy == RetryPolicy::ConnectOnly && !e.is_connect() {
                        break;
                    }
                    continue;
                }
            };

            let status = response.status();

            if status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                last_error = format!("HTTP {}: {}", status.as_u16(), self.scrub(&body));
                continue;
            }

            if status.is_client_error() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<unable to read response body>".to_string());
                return Err(GatewayError::RequestRejected {
                    operation,
                    status: status.as_u16(),
                    body: self.scrub(&body),
                });
            }

            if !status.is_success() {
                return Err(GatewayError::InvalidResponse {
                    operation,
                    reason: format!("unexpected HTTP status {}", status.as_u16()),
                });
            }

            debug!(operation, attempt = attempt + 1, status = status.as_u16(), "Gateway answered");

            return response
                .json::<Value>()
                .await
                .map_err(|e| GatewayError::InvalidResponse {
                    operation,
                    reason: format!("body is not valid JSON: {}", e),
                });
        }

        Err(GatewayError::Unavailable {
            operation,
            attempts,
            last_error,
        })
    }

    /// Remove the token from text that is about to be stored in an error, and
    /// cap its length.
    fn scrub(&self, body: &str) -> String {
        let mut cleaned = body.replace(self.config.auth_token.as_str(), "[REDACTED]");
        if cleaned.len() > MAX_ERROR_BODY {
            let mut end = MAX_ERROR_BODY;
            while !cleaned.is_char_boundary(end) {
                end -= 1;
            }
            cleaned.truncate(end);
            cleaned.push_str("...");
        }
        cleaned
    }
}

#[async_trait]
impl ToolGateway for GatewayClient {
    async fn get_tools(&self) -> GatewayResult<Vec<ToolDescriptor>> {
        let url = self.tools_url();
        debug!(url = %url, "Fetching tool list");

        let body = self
            .send_with_retry("get_tools", RetryPolicy::AnyTransportError, || {
                self.client.get(&url)
            })
            .await?;

        parse_tool_list(&body)
    }

    async fn call_tool(&self, name: &str, arguments: &Value) -> GatewayResult<String> {
        if name.trim().is_empty() {
            return Err(GatewayError::InvalidRequest("tool name must not be empty".into()));
        }

        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method: "tools/call",
            params: ToolCallParams { name, arguments },
        };
        let url = self.rpc_url();
        debug!(url = %url, tool = name, id = request.id, "Calling tool");

        let body = self
            .send_with_retry("call_tool", RetryPolicy::ConnectOnly, || {
                self.client.post(&url).json(&request)
            })
            .await?;

        parse_call_result(name, body)
    }
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    let kind = if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "network error"
    };
    // reqwest errors carry the URL but never request headers.
    format!("{}: {}", kind, err)
}
