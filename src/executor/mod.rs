//! End-to-end "accomplish this task" orchestration.
//!
//! # Flow
//! 1. Tool list from the catalog (cached, or fetched on expiry)
//! 2. Rank tools for the task
//! 3. Build arguments for the best tool from the task text
//! 4. Invoke it through the gateway
//!
//! Each `execute` is a single tool invocation. Gateway errors propagate
//! unchanged; no retry is layered on top of the client's own.

pub mod args;

pub use args::build_arguments;

use crate::catalog::{CacheEntry, ToolCatalog};
use crate::error::{AppError, Result};
use crate::gateway::ToolDescriptor;
use crate::matcher::{ScoreBreakdown, ScoredTool, ToolMatcher};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// A ranked tool, detached from the cached list it was scored against.
#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    pub name: String,
    pub gateway: String,
    pub description: String,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

impl From<&ScoredTool<'_>> for RankedCandidate {
    fn from(scored: &ScoredTool<'_>) -> Self {
        Self {
            name: scored.tool.name.clone(),
            gateway: scored.tool.gateway.clone(),
            description: scored.tool.description.clone(),
            score: scored.score,
            breakdown: scored.breakdown.clone(),
        }
    }
}

/// Wall-clock time spent in each phase, in milliseconds.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionTiming {
    pub lookup_ms: u64,
    pub match_ms: u64,
    pub call_ms: u64,
    pub total_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub execution_id: Uuid,
    /// The tool that was invoked
    pub tool: ToolDescriptor,
    pub arguments: Value,
    /// Raw upstream result
    pub result: String,
    /// Best-ranked tools, the invoked one first
    pub candidates: Vec<RankedCandidate>,
    pub timing: ExecutionTiming,
}

pub struct TaskExecutor {
    catalog: Arc<ToolCatalog>,
    matcher: ToolMatcher,
}

impl TaskExecutor {
    pub fn new(catalog: Arc<ToolCatalog>, matcher: ToolMatcher) -> Self {
        Self { catalog, matcher }
    }

    pub fn catalog(&self) -> &Arc<ToolCatalog> {
        &self.catalog
    }

    /// Run the best matching tool for `task`.
    ///
    /// `top_n` only controls how many candidates are reported; exactly one
    /// tool is invoked.
    pub async fn execute(&self, task: &str, context: &str, top_n: usize) -> Result<ExecutionResult> {
        let start = Instant::now();
        let execution_id = Uuid::new_v4();

        let entry = self.catalog.tools().await?;
        let lookup_elapsed = start.elapsed();

        let ranked = self.matcher.rank(&entry.tools, task, context, top_n.max(1)).await;
        let match_elapsed = start.elapsed() - lookup_elapsed;

        let Some(best) = ranked.first() else {
            tracing::info!(%execution_id, tools = entry.tools.len(), "No tool matched task");
            metrics::counter!("execute_no_match_total").increment(1);
            return Err(AppError::NoMatchingTool {
                task: task.trim().to_string(),
            });
        };

        let tool = best.tool.clone();
        let arguments = build_arguments(&tool, task);
        let candidates: Vec<RankedCandidate> = ranked.iter().map(RankedCandidate::from).collect();

        tracing::debug!(
            %execution_id,
            tool = %tool.name,
            score = best.score,
            candidates = candidates.len(),
            "Invoking best matching tool"
        );

        let call_start = Instant::now();
        let result = self
            .catalog
            .gateway()
            .call_tool(&tool.name, &arguments)
            .await?;
        let call_elapsed = call_start.elapsed();
        let total = start.elapsed();

        tracing::info!(
            %execution_id,
            tool = %tool.name,
            lookup_ms = lookup_elapsed.as_millis() as u64,
            call_ms = call_elapsed.as_millis() as u64,
            total_ms = total.as_millis() as u64,
            "Task executed"
        );

        metrics::counter!("execute_requests_total").increment(1);
        metrics::histogram!("execute_latency_ms").record(total.as_millis() as f64);

        Ok(ExecutionResult {
            execution_id,
            tool,
            arguments,
            result,
            candidates,
            timing: ExecutionTiming {
                lookup_ms: lookup_elapsed.as_millis() as u64,
                match_ms: match_elapsed.as_millis() as u64,
                call_ms: call_elapsed.as_millis() as u64,
                total_ms: total.as_millis() as u64,
            },
        })
    }

    /// Rank tools for `query` without invoking anything.
    pub async fn search(&self, query: &str, context: &str, top_n: usize) -> Result<Vec<RankedCandidate>> {
        let entry = self.catalog.tools().await?;
        let ranked = self.matcher.rank(&entry.tools, query, context, top_n).await;

        metrics::counter!("search_requests_total").increment(1);

        Ok(ranked.iter().map(RankedCandidate::from).collect())
    }

    /// The current tool list.
    pub async fn list_tools(&self) -> Result<Arc<CacheEntry>> {
        Ok(self.catalog.tools().await?)
    }
}
