use crate::error::{AppError, Result};
use crate::executor::ExecutionResult;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

fn default_top_n() -> usize {
    1
}

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    /// What the caller wants done, in natural language
    pub task: String,
    /// Optional extra text that narrows tool choice
    #[serde(default)]
    pub context: String,
    /// Number of ranked candidates to report (default: 1)
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

/// POST /execute - Run the best matching gateway tool for a task.
///
/// # Flow
/// 1. Validate input
/// 2. Load tools (cache or gateway)
/// 3. Rank and pick the best tool
/// 4. Build arguments and call it
pub async fn execute_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<ExecutionResult>> {
    if request.task.trim().is_empty() {
        return Err(AppError::ValidationError("Task cannot be empty".to_string()));
    }
    if request.top_n == 0 {
        return Err(AppError::ValidationError("top_n must be at least 1".to_string()));
    }

    let result = state
        .executor
        .execute(&request.task, &request.context, request.top_n)
        .await?;

    Ok(Json(result))
}
