// src/notify/mod.rs
//! Run-lifecycle notifications. Transports report a delivered flag; a
//! transport failure is logged and swallowed, never aborting the pipeline.

pub mod webhook;

use std::sync::Arc;

use async_trait::async_trait;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Success => "success",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns whether the notification was delivered.
    async fn notify(&self, level: Level, title: &str, body: &str) -> bool;

    async fn info(&self, title: &str, body: &str) -> bool {
        self.notify(Level::Info, title, body).await
    }

    async fn success(&self, title: &str, body: &str) -> bool {
        self.notify(Level::Success, title, body).await
    }

    async fn warning(&self, title: &str, body: &str) -> bool {
        self.notify(Level::Warning, title, body).await
    }

    async fn error(&self, title: &str, body: &str) -> bool {
        self.notify(Level::Error, title, body).await
    }
}

/// Drops every notification. Useful where a notifier is required but none
/// is configured.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, _level: Level, _title: &str, _body: &str) -> bool {
        false
    }
}

/// Fan-out to every registered transport. Delivered when at least one
/// transport delivered.
#[derive(Default)]
pub struct NotifierMux {
    sinks: Vec<Arc<dyn Notifier>>,
}

impl NotifierMux {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn push(&mut self, sink: Arc<dyn Notifier>) -> &mut Self {
        self.sinks.push(sink);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl Notifier for NotifierMux {
    async fn notify(&self, level: Level, title: &str, body: &str) -> bool {
        let mut delivered = false;
        for sink in &self.sinks {
            delivered |= sink.notify(level, title, body).await;
        }
        delivered
    }
}
