//! Tool discovery handler.
//!
//! Lets callers see which gateway tools match a query, with per-tool score
//! breakdowns, before committing to `/execute`.

use crate::error::{AppError, Result};
use crate::executor::RankedCandidate;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default number of results to return
fn default_top_k() -> usize {
    10
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    /// The natural language query to match against tools
    pub query: String,
    #[serde(default)]
    pub context: String,
    /// Number of top results to return (default: 10)
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<RankedCandidate>,
}

/// POST /search - Find tools relevant to a natural language query.
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    let start_time = std::time::Instant::now();

    if request.query.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Query cannot be empty".to_string(),
        ));
    }

    if request.top_k == 0 {
        return Err(AppError::ValidationError(
            "top_k must be at least 1".to_string(),
        ));
    }

    let results = state
        .executor
        .search(&request.query, &request.context, request.top_k)
        .await?;

    tracing::info!(
        query = %request.query,
        top_k = request.top_k,
        matches = results.len(),
        total_ms = start_time.elapsed().as_millis() as u64,
        "Search completed"
    );

    metrics::histogram!("search_latency_ms").record(start_time.elapsed().as_millis() as f64);

    Ok(Json(SearchResponse { results }))
}
