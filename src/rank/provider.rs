// src/rank/provider.rs
//! Remote scoring capability: an OpenAI-compatible chat-completion client
//! and the ranker that drives it. The ranker returns the assistant text
//! verbatim; parsing lives in [`super::parser`], retries belong to the
//! caller.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::prompt;
use crate::collect::types::ScrapedItem;
use crate::config::ConfigResolver;

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("ranking api transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("ranking api request failed with status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("ranking api returned no completion content")]
    EmptyCompletion,
}

/// Remote chat-completion contract. Providers differ only in endpoint and
/// model.
#[async_trait::async_trait]
pub trait ChatCompletionApi: Send + Sync {
    async fn call(&self, messages: &[ChatMessage]) -> Result<String, ProviderError>;
    fn name(&self) -> &'static str;
}

pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    label: &'static str,
}

impl ChatClient {
    fn build(base_url: &str, api_key: String, model: String, label: &'static str) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("trend-digest/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(120))
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url: base_url.to_string(),
            api_key,
            model,
            label,
        }
    }

    /// `model_override`: pass Some("deepseek-reasoner") to override.
    pub fn deepseek(api_key: impl Into<String>, model_override: Option<&str>) -> Self {
        Self::build(
            "https://api.deepseek.com/v1",
            api_key.into(),
            model_override.unwrap_or("deepseek-chat").to_string(),
            "deepseek",
        )
    }

    pub fn dashscope(api_key: impl Into<String>, model_override: Option<&str>) -> Self {
        Self::build(
            "https://dashscope.aliyuncs.com/compatible-mode/v1",
            api_key.into(),
            model_override.unwrap_or("deepseek-r1").to_string(),
            "dashscope",
        )
    }

    pub async fn deepseek_from_config(
        config: &ConfigResolver,
    ) -> Result<Self, crate::config::ConfigError> {
        let key = config.resolve_string("DEEPSEEK_API_KEY").await?;
        Ok(Self::deepseek(key, None))
    }

    pub async fn dashscope_from_config(
        config: &ConfigResolver,
    ) -> Result<Self, crate::config::ConfigError> {
        let key = config.resolve_string("DASHSCOPE_API_KEY").await?;
        Ok(Self::dashscope(key, None))
    }
}

#[async_trait::async_trait]
impl ChatCompletionApi for ChatClient {
    async fn call(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: &'a [ChatMessage],
            temperature: f32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: Option<String>,
        }

        let req = Req {
            model: &self.model,
            messages,
            temperature: 0.3,
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: Resp = resp.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(ProviderError::EmptyCompletion);
        }
        Ok(content)
    }

    fn name(&self) -> &'static str {
        self.label
    }
}

/// Fixed-output chat api for tests and local runs.
pub struct MockChatApi {
    pub fixed: String,
}

#[async_trait::async_trait]
impl ChatCompletionApi for MockChatApi {
    async fn call(&self, _messages: &[ChatMessage]) -> Result<String, ProviderError> {
        Ok(self.fixed.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Scores a batch of items via a remote text-generation service, returning
/// the raw assistant text.
#[async_trait::async_trait]
pub trait RankingProvider: Send + Sync {
    async fn score(&self, items: &[ScrapedItem]) -> Result<String, ProviderError>;
    fn name(&self) -> &'static str;
}

pub struct ContentRanker {
    api: Box<dyn ChatCompletionApi>,
}

impl ContentRanker {
    pub fn new(api: Box<dyn ChatCompletionApi>) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl RankingProvider for ContentRanker {
    async fn score(&self, items: &[ScrapedItem]) -> Result<String, ProviderError> {
        if items.is_empty() {
            return Ok(String::new());
        }
        let messages = [
            ChatMessage::system(prompt::scoring_rubric()),
            ChatMessage::user(prompt::item_payload(items)),
        ];
        self.api.call(&messages).await
    }

    fn name(&self) -> &'static str {
        self.api.name()
    }
}
