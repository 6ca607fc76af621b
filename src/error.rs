use crate::gateway::GatewayError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No tool found for this task: '{task}'")]
    NoMatchingTool { task: String },

    #[error("Invalid input: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NoMatchingTool { task } => {
                tracing::info!(task = %task, "No matching tool");
                StatusCode::NOT_FOUND
            }
            AppError::ValidationError(msg) => {
                tracing::warn!(error = %msg, "Validation error");
                StatusCode::BAD_REQUEST
            }
            AppError::Gateway(e) => {
                let status = if e.is_transient() {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    match e {
                        GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                        GatewayError::RequestRejected { .. }
                        | GatewayError::InvalidResponse { .. }
                        | GatewayError::ToolFailed { .. } => StatusCode::BAD_GATEWAY,
                        GatewayError::Configuration(_) | GatewayError::Unavailable { .. } => {
                            StatusCode::INTERNAL_SERVER_ERROR
                        }
                    }
                };
                if status.is_server_error() {
                    tracing::error!(error = %e, "Gateway error");
                } else {
                    tracing::warn!(error = %e, "Gateway error");
                }
                status
            }
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
