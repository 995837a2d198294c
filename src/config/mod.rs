// src/config/mod.rs
//! Layered configuration: prioritized sources with per-source retry.
//!
//! Every `resolve` re-queries the sources, so a value changed in a backing
//! store is observed on the next call. Callers that need a stable value for
//! the duration of a run must cache it themselves.

pub mod sources;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::retry::{retry, RetryPolicy};

/// One place a configuration value can come from. Lower priority numbers
/// win. `Ok(None)` means the source is healthy but does not hold the key;
/// only errors consume the retry budget.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    fn priority(&self) -> i32;
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration key \"{key}\" not found in any source after {attempts} attempts")]
    Missing { key: String, attempts: u32 },
}

pub struct ConfigResolver {
    sources: Vec<Box<dyn ConfigSource>>,
    retry: RetryPolicy,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            retry: RetryPolicy::linear_default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Register a source. The source list stays sorted ascending by
    /// priority; ties keep insertion order.
    pub fn register(&mut self, source: Box<dyn ConfigSource>) {
        self.sources.push(source);
        self.sources.sort_by_key(|s| s.priority());
    }

    pub fn sources(&self) -> impl Iterator<Item = &dyn ConfigSource> {
        self.sources.iter().map(|s| s.as_ref())
    }

    /// First present value in priority order. A source only passes its turn
    /// after its full retry budget is spent or it reports the key absent.
    pub async fn resolve(&self, key: &str) -> Result<Value, ConfigError> {
        self.resolve_with(key, &self.retry).await
    }

    pub async fn resolve_with(
        &self,
        key: &str,
        policy: &RetryPolicy,
    ) -> Result<Value, ConfigError> {
        for source in &self.sources {
            match retry(policy, || source.get(key)).await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => continue,
                Err(e) => {
                    warn!(
                        source = source.name(),
                        key,
                        attempts = policy.max_attempts,
                        error = %e,
                        "config source exhausted its retry budget"
                    );
                    continue;
                }
            }
        }
        Err(ConfigError::Missing {
            key: key.to_string(),
            attempts: policy.max_attempts,
        })
    }

    /// Non-fatal lookup for optional keys.
    pub async fn resolve_opt(&self, key: &str) -> Option<Value> {
        self.resolve(key).await.ok()
    }

    pub async fn resolve_string(&self, key: &str) -> Result<String, ConfigError> {
        Ok(value_to_string(self.resolve(key).await?))
    }

    /// Optional boolean toggle: absent or non-true means `false`.
    pub async fn flag(&self, key: &str) -> bool {
        match self.resolve_opt(key).await {
            Some(Value::Bool(b)) => b,
            Some(Value::String(s)) => s == "true",
            _ => false,
        }
    }
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// String values come back verbatim; anything else keeps its JSON encoding.
pub fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
