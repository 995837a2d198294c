// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod collect;
pub mod config;
pub mod notify;
pub mod pipeline;
pub mod publish;
pub mod rank;
pub mod retry;
pub mod schedule;
pub mod summarize;

// ---- Re-exports for stable public API ----
pub use crate::collect::types::{Collector, ScrapedItem, SourceDescriptor};
pub use crate::config::{ConfigError, ConfigResolver, ConfigSource};
pub use crate::notify::{Level, Notifier, NotifierMux, NullNotifier};
pub use crate::pipeline::{
    DigestPipeline, DigestWorkflow, PipelineError, PipelineOptions, RunPhase, RunReport, RunStats,
};
pub use crate::rank::{RankResult, RankingProvider};
pub use crate::retry::{retry, Backoff, RetryPolicy};
