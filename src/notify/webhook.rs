// src/notify/webhook.rs
//! Webhook push transport (bark-style JSON POST). Configuration is pulled
//! through the resolver; both keys are optional, so an unconfigured
//! transport silently degrades to "not delivered".

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::{Level, Notifier};
use crate::config::{value_to_string, ConfigResolver};

const ENABLE_KEY: &str = "ENABLE_WEBHOOK_NOTIFY";
const URL_KEY: &str = "WEBHOOK_NOTIFY_URL";

pub struct WebhookNotifier {
    url: Option<String>,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            url: Some(url),
            client: Self::client(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            url: None,
            client: Self::client(),
        }
    }

    /// Build from config: `ENABLE_WEBHOOK_NOTIFY` gates the transport,
    /// `WEBHOOK_NOTIFY_URL` points at the push endpoint.
    pub async fn from_config(config: &ConfigResolver) -> Self {
        if !config.flag(ENABLE_KEY).await {
            return Self::disabled();
        }
        let url = config.resolve_opt(URL_KEY).await.map(value_to_string);
        if url.is_none() {
            warn!("webhook notifications enabled but {URL_KEY} is not configured");
        }
        Self {
            url,
            client: Self::client(),
        }
    }

    fn client() -> Client {
        Client::builder()
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client")
    }

    fn push_level(level: Level) -> &'static str {
        match level {
            Level::Info => "passive",
            Level::Success => "active",
            Level::Warning | Level::Error => "timeSensitive",
        }
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, level: Level, title: &str, body: &str) -> bool {
        let Some(url) = &self.url else {
            debug!("webhook notifications disabled");
            return false;
        };

        let payload = serde_json::json!({
            "title": title,
            "body": body,
            "level": Self::push_level(level),
            "group": level.as_str(),
        });

        match self.client.post(url).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!(status = %resp.status(), "webhook notification rejected");
                false
            }
            Err(e) => {
                warn!(error = %e, "webhook notification failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::sources::MemorySource;

    #[tokio::test]
    async fn disabled_transport_reports_undelivered() {
        let notifier = WebhookNotifier::disabled();
        assert!(!notifier.notify(Level::Error, "t", "b").await);
    }

    #[tokio::test]
    async fn config_gate_defaults_to_disabled() {
        let resolver = ConfigResolver::new();
        let notifier = WebhookNotifier::from_config(&resolver).await;
        assert!(notifier.url.is_none());
    }

    #[tokio::test]
    async fn config_gate_reads_url_when_enabled() {
        let source = MemorySource::new();
        source.set(ENABLE_KEY, "true");
        source.set(URL_KEY, "https://push.example/device-key");

        let mut resolver = ConfigResolver::new();
        resolver.register(Box::new(source));

        let notifier = WebhookNotifier::from_config(&resolver).await;
        assert_eq!(
            notifier.url.as_deref(),
            Some("https://push.example/device-key")
        );
    }
}
