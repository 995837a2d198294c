// src/summarize.rs
//! Summarization hand-off. The concrete summarizer lives outside this
//! crate; this module owns batching, per-item fallback and the digest
//! title.

use anyhow::Result;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::collect::types::ScrapedItem;
use crate::notify::Notifier;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub score: f64,
}

#[async_trait::async_trait]
pub trait Summarizer: Send + Sync {
    async fn refresh(&self) -> Result<()> {
        Ok(())
    }

    /// `raw` is the JSON encoding of one scraped item.
    async fn summarize(&self, raw: &str) -> Result<Summary>;

    async fn generate_title(&self, content: &str) -> Result<String>;
}

/// Max length of the generated digest title, in characters.
pub const MAX_TITLE_CHARS: usize = 64;

/// Summarize items in batches of `width`. Items within a batch run
/// concurrently; a later batch never starts before the prior batch fully
/// settles. A failed item keeps its original title/content and is never
/// dropped.
pub async fn summarize_batch(
    items: &mut [ScrapedItem],
    summarizer: &dyn Summarizer,
    notifier: &dyn Notifier,
    width: usize,
) {
    let width = width.max(1);
    for batch in items.chunks_mut(width) {
        let jobs = batch
            .iter_mut()
            .map(|item| summarize_one(item, summarizer, notifier));
        join_all(jobs).await;
    }
}

async fn summarize_one(item: &mut ScrapedItem, summarizer: &dyn Summarizer, notifier: &dyn Notifier) {
    let outcome = match serde_json::to_string(&*item) {
        Ok(raw) => summarizer.summarize(&raw).await,
        Err(e) => Err(e.into()),
    };

    match outcome {
        Ok(summary) => {
            item.title = summary.title;
            item.content = summary.content;
            item.metadata
                .insert("keywords".to_string(), serde_json::json!(summary.keywords));
        }
        Err(e) => {
            warn!(id = %item.id, error = %e, "summarization failed, keeping original content");
            notifier
                .warning(
                    "summarization failed",
                    &format!("id: {}\noriginal content kept", item.id),
                )
                .await;
            if item.title.is_empty() {
                item.title = "Untitled".to_string();
            }
            if item.content.is_empty() {
                item.content = "Summary unavailable".to_string();
            }
            item.metadata
                .entry("keywords".to_string())
                .or_insert_with(|| serde_json::json!([]));
        }
    }
}

/// Digest title: every collected title joined with `" | "`, condensed by
/// the summarizer, capped at [`MAX_TITLE_CHARS`].
pub async fn digest_title(items: &[ScrapedItem], summarizer: &dyn Summarizer) -> Result<String> {
    let joined = items
        .iter()
        .map(|i| i.title.as_str())
        .collect::<Vec<_>>()
        .join(" | ");
    let title = summarizer.generate_title(&joined).await?;
    Ok(title.chars().take(MAX_TITLE_CHARS).collect())
}
