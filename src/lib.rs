//! Tool Router - task-to-tool routing in front of an MCP gateway
//!
//! This library exposes the core components of the routing service: the
//! gateway client, the keyword matcher, the tool-list cache and the task
//! executor, plus the HTTP handlers that front them.

pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod gateway;
pub mod handlers;
pub mod matcher;
pub mod state;

// Re-export key types for convenience
pub use catalog::{CacheEntry, ToolCatalog};
pub use config::{Config, GatewayConfig, ScorerConfig};
pub use error::{AppError, Result};
pub use executor::{ExecutionResult, RankedCandidate, TaskExecutor};
pub use gateway::{GatewayClient, GatewayError, ToolDescriptor, ToolGateway};
pub use handlers::{execute_handler, health_handler, list_tools_handler, ready_handler, search_handler};
pub use matcher::{MatchWeights, RelevanceScorer, ScoredTool, ToolMatcher};
pub use state::AppState;
