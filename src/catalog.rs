//! Short-lived cache of the gateway tool list.
//!
//! The cache holds one immutable snapshot behind an `Arc`. Readers clone the
//! `Arc` under a brief read lock; a refresh builds a complete new snapshot and
//! publishes it with a single swap, so nobody ever observes a partial list.
//! A failed refresh leaves the previous snapshot in place. Concurrent callers
//! may both refresh on expiry; the last swap wins and both lists are valid.

use crate::gateway::{GatewayResult, ToolDescriptor, ToolGateway};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// The last successful tool fetch.
#[derive(Debug)]
pub struct CacheEntry {
    pub tools: Vec<ToolDescriptor>,
    pub fetched_at: Instant,
}

impl CacheEntry {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self {
            tools,
            fetched_at: Instant::now(),
        }
    }

    /// An entry may be served only while `now - fetched_at < ttl`.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// Tool list access with TTL caching in front of a [`ToolGateway`].
pub struct ToolCatalog {
    gateway: Arc<dyn ToolGateway>,
    ttl: Duration,
    entry: RwLock<Option<Arc<CacheEntry>>>,
}

impl ToolCatalog {
    pub fn new(gateway: Arc<dyn ToolGateway>, ttl: Duration) -> Self {
        Self {
            gateway,
            ttl,
            entry: RwLock::new(None),
        }
    }

    pub fn gateway(&self) -> &Arc<dyn ToolGateway> {
        &self.gateway
    }

    /// The cached snapshot, if it is still fresh.
    pub fn cached(&self) -> Option<Arc<CacheEntry>> {
        self.entry
            .read()
            .as_ref()
            .filter(|entry| entry.is_fresh(self.ttl))
            .cloned()
    }

    /// Current tool list: the fresh snapshot, or a new fetch that replaces it.
    pub async fn tools(&self) -> GatewayResult<Arc<CacheEntry>> {
        if let Some(entry) = self.cached() {
            metrics::counter!("tool_cache_hits_total").increment(1);
            return Ok(entry);
        }
        metrics::counter!("tool_cache_misses_total").increment(1);

        self.refresh().await
    }

    /// Fetch unconditionally and publish the result.
    pub async fn refresh(&self) -> GatewayResult<Arc<CacheEntry>> {
        let start = std::time::Instant::now();
        let tools = self.gateway.get_tools().await?;
        let entry = Arc::new(CacheEntry::new(tools));

        *self.entry.write() = Some(Arc::clone(&entry));

        tracing::info!(
            tools = entry.tools.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            ttl_ms = self.ttl.as_millis() as u64,
            "Tool list refreshed"
        );

        Ok(entry)
    }
}
