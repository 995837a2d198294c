// src/collect/types.rs
use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One unit of collection work: which collector kind, which source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub collector: String,
    pub identifier: String,
}

impl SourceDescriptor {
    pub fn new(collector: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            collector: collector.into(),
            identifier: identifier.into(),
        }
    }
}

/// A piece of content pulled from one source. `id` is unique within a run;
/// `score` starts at zero and is overwritten by the ranking merge, while
/// summarization later rewrites title/content/keywords in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedItem {
    pub id: String,
    pub title: String,
    pub content: String,
    pub url: String,
    pub publish_date: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

#[async_trait::async_trait]
pub trait Collector: Send + Sync {
    /// Re-validate credentials/config before a run.
    async fn refresh(&self) -> Result<()> {
        Ok(())
    }

    async fn scrape(&self, identifier: &str) -> Result<Vec<ScrapedItem>>;

    fn kind(&self) -> &'static str;
}
