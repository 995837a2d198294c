// src/publish.rs
//! Publishing-side collaborators: template renderer, cover-image generator
//! and the publisher itself. Interfaces only; the concrete platform
//! clients live outside this crate.

use std::fmt;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collect::types::ScrapedItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    Pending,
    Published,
    Failed,
    Draft,
    Scheduled,
}

impl fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PublishStatus::Pending => "pending",
            PublishStatus::Published => "published",
            PublishStatus::Failed => "failed",
            PublishStatus::Draft => "draft",
            PublishStatus::Scheduled => "scheduled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResult {
    pub publish_id: String,
    pub url: Option<String>,
    pub status: PublishStatus,
    pub published_at: DateTime<Utc>,
    pub platform: String,
}

#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    async fn refresh(&self) -> Result<()> {
        Ok(())
    }

    /// Upload a cover image by url, returning the platform media id.
    async fn upload_image(&self, image_url: &str) -> Result<String>;

    async fn publish(
        &self,
        html: &str,
        title: &str,
        digest: &str,
        media_id: &str,
    ) -> Result<PublishResult>;
}

#[async_trait::async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn refresh(&self) -> Result<()> {
        Ok(())
    }

    /// Generate a cover image, returning its url.
    async fn generate(&self, prompt: &str, size: &str) -> Result<String>;
}

pub trait TemplateRenderer: Send + Sync {
    fn render(&self, items: &[ScrapedItem]) -> Result<String>;
}
