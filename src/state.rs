use crate::catalog::ToolCatalog;
use crate::config::Config;
use crate::executor::TaskExecutor;
use crate::gateway::{GatewayClient, GatewayResult, ToolGateway};
use crate::matcher::{OllamaScorer, ToolMatcher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all request handlers.
pub struct AppState {
    pub executor: Arc<TaskExecutor>,
    /// Set once the tool list has been fetched successfully
    pub ready: AtomicBool,
}

impl AppState {
    /// Wire the gateway client, matcher and cache from configuration.
    ///
    /// Fails only on invalid gateway settings. A misconfigured scorer is
    /// logged and left out, since ranking works without it.
    pub fn new(config: &Config) -> GatewayResult<Self> {
        let gateway: Arc<dyn ToolGateway> = Arc::new(GatewayClient::new(config.gateway.clone())?);

        tracing::info!(
            gateway = ?config.gateway,
            cache_ttl_ms = config.cache_ttl_ms,
            "Gateway client configured"
        );

        let mut matcher = ToolMatcher::new(config.match_weights);
        if let Some(scorer_config) = &config.scorer {
            match OllamaScorer::new(scorer_config) {
                Ok(scorer) => {
                    tracing::info!(
                        endpoint = %scorer_config.endpoint,
                        model = %scorer_config.model,
                        weight = scorer_config.weight,
                        "Relevance scorer enabled"
                    );
                    matcher = matcher
                        .with_scorer(Arc::new(scorer), scorer_config.weight)
                        .with_scorer_timeout(Duration::from_millis(scorer_config.timeout_ms));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Relevance scorer unavailable, using keyword ranking only");
                }
            }
        }

        let catalog = Arc::new(ToolCatalog::new(gateway, config.cache_ttl()));
        Ok(Self::with_executor(TaskExecutor::new(catalog, matcher)))
    }

    /// State around an already-built executor.
    pub fn with_executor(executor: TaskExecutor) -> Self {
        Self {
            executor: Arc::new(executor),
            ready: AtomicBool::new(false),
        }
    }

    /// Prime the tool cache so the first task does not pay for the fetch.
    ///
    /// A failure is not fatal: the gateway may come up after the router, and
    /// the next request retries the fetch.
    pub async fn warmup(&self) {
        tracing::info!("Fetching initial tool list...");

        match self.executor.catalog().refresh().await {
            Ok(entry) => {
                self.ready.store(true, Ordering::SeqCst);
                tracing::info!(tools = entry.tools.len(), "Warmup completed successfully");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Warmup fetch failed; will retry on first request");
            }
        }
    }

    /// Ready once any tool fetch has succeeded.
    pub fn is_ready(&self) -> bool {
        if self.ready.load(Ordering::SeqCst) {
            return true;
        }
        if self.executor.catalog().cached().is_some() {
            self.ready.store(true, Ordering::SeqCst);
            return true;
        }
        false
    }
}
