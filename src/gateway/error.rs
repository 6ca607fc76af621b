use thiserror::Error;

/// Failures talking to the upstream gateway.
///
/// Response bodies carried here are scrubbed of the bearer token before the
/// error is constructed.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Missing or invalid connection settings. Never retried.
    #[error("Gateway configuration error: {0}")]
    Configuration(String),

    /// The call was refused client-side before anything was sent.
    #[error("Invalid gateway request: {0}")]
    InvalidRequest(String),

    /// The gateway answered with a 4xx status. Never retried.
    #[error("Gateway rejected {operation} (HTTP {status}): {body}")]
    RequestRejected {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// Transport failures or 5xx responses persisted through every retry.
    #[error("Gateway unavailable for {operation} after {attempts} attempts: {last_error}")]
    Unavailable {
        operation: &'static str,
        attempts: u32,
        last_error: String,
    },

    /// The gateway answered 2xx but the body is not what the operation expects.
    #[error("Invalid gateway response for {operation}: {reason}")]
    InvalidResponse {
        operation: &'static str,
        reason: String,
    },

    /// The tool ran and reported a JSON-RPC error object.
    #[error("Tool '{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },
}

impl GatewayError {
    /// Whether the failure may succeed on a later, independent attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Unavailable { .. })
    }
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
