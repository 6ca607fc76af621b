use crate::matcher::MatchWeights;
use anyhow::{bail, Context};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Connection parameters for the upstream gateway.
///
/// Built once at start-up and never mutated. `Debug` never prints the token.
#[derive(Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub auth_token: String,
    /// Per-request timeout, applied to connect and to the whole exchange.
    pub timeout_ms: u64,
    /// Retries after the first attempt (an operation makes at most `max_retries + 1` attempts).
    pub max_retries: u32,
    /// Base delay; retry `k` (0-based) waits `retry_backoff_ms * 2^k`.
    pub retry_backoff_ms: u64,
}

impl GatewayConfig {
    pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

    /// Config with default timeout and retry policy.
    pub fn new(base_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: auth_token.into(),
            timeout_ms: Self::DEFAULT_TIMEOUT_MS,
            max_retries: Self::DEFAULT_MAX_RETRIES,
            retry_backoff_ms: Self::DEFAULT_RETRY_BACKOFF_MS,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Delay before retry number `retry` (0 for the first retry).
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = 1u64 << retry.min(20);
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(factor))
    }

    /// Check the settings the client cannot work without.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("base_url is required".into());
        }
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| format!("base_url '{}' is not a valid URL: {}", self.base_url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("base_url scheme '{}' is not http or https", url.scheme()));
        }
        if url.host_str().is_none() {
            return Err("base_url has no host".into());
        }
        if self.auth_token.trim().is_empty() {
            return Err("auth_token is required".into());
        }
        if self.timeout_ms == 0 {
            return Err("timeout_ms must be greater than zero".into());
        }
        Ok(())
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("auth_token", &"[REDACTED]")
            .field("timeout_ms", &self.timeout_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .finish()
    }
}

/// Settings for the optional Ollama-backed relevance scorer.
#[derive(Debug, Clone)]
pub struct ScorerConfig {
    pub endpoint: String,
    pub model: String,
    /// Share of the composite score taken by the external signal, in `[0, 1]`.
    pub weight: f64,
    pub timeout_ms: u64,
    /// Selections below this confidence are ignored.
    pub min_confidence: f64,
}

pub struct Config {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
    pub gateway: GatewayConfig,
    /// Freshness window of the cached tool list.
    pub cache_ttl_ms: u64,
    pub match_weights: MatchWeights,
    /// Present only when `SCORER_URL` is set.
    pub scorer: Option<ScorerConfig>,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// `GATEWAY_URL` and `GATEWAY_JWT` are required; everything else falls back
    /// to a default. Unparsable values are reported with the variable name.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = get("GATEWAY_URL").context("GATEWAY_URL is not set")?;
        let auth_token = get("GATEWAY_JWT").context("GATEWAY_JWT is not set")?;

        let gateway = GatewayConfig {
            timeout_ms: parse_or(&get, "GATEWAY_TIMEOUT_MS", GatewayConfig::DEFAULT_TIMEOUT_MS)?,
            max_retries: parse_or(&get, "GATEWAY_MAX_RETRIES", GatewayConfig::DEFAULT_MAX_RETRIES)?,
            retry_backoff_ms: parse_or(
                &get,
                "GATEWAY_RETRY_DELAY_MS",
                GatewayConfig::DEFAULT_RETRY_BACKOFF_MS,
            )?,
            ..GatewayConfig::new(base_url, auth_token)
        };
        if let Err(reason) = gateway.validate() {
            bail!("Invalid gateway configuration: {}", reason);
        }

        let defaults = MatchWeights::default();
        let match_weights = MatchWeights {
            name: weight_or(&get, "MATCH_NAME_WEIGHT", defaults.name)?,
            description: weight_or(&get, "MATCH_DESCRIPTION_WEIGHT", defaults.description)?,
            gateway: weight_or(&get, "MATCH_GATEWAY_WEIGHT", defaults.gateway)?,
            synonym_bonus: weight_or(&get, "MATCH_SYNONYM_BONUS", defaults.synonym_bonus)?,
        };

        let scorer = match get("SCORER_URL") {
            Some(endpoint) => Some(ScorerConfig {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                model: get("SCORER_MODEL").unwrap_or_else(|| "llama3.2:3b".to_string()),
                weight: weight_or(&get, "SCORER_WEIGHT", 0.3)?.min(1.0),
                timeout_ms: parse_or(&get, "SCORER_TIMEOUT_MS", 2_000)?,
                min_confidence: parse_or(&get, "SCORER_MIN_CONFIDENCE", 0.3)?,
            }),
            None => None,
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "PORT", 8030)?,
            shutdown_timeout_secs: parse_or(&get, "SHUTDOWN_TIMEOUT", 5)?,
            gateway,
            cache_ttl_ms: parse_or(&get, "TOOL_CACHE_TTL_MS", 60_000)?,
            match_weights,
            scorer,
        })
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}

/// Like [`parse_or`], for score weights: NaN, infinite and negative values are rejected.
fn weight_or<G>(get: &G, key: &str, default: f64) -> anyhow::Result<f64>
where
    G: Fn(&str) -> Option<String>,
{
    let weight = parse_or(get, key, default)?;
    if !weight.is_finite() || weight < 0.0 {
        bail!("{} must be a finite, non-negative number, got {}", key, weight);
    }
    Ok(weight)
}
