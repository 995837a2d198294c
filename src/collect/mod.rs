// src/collect/mod.rs
//! Source orchestration: iterate descriptors in order, isolate per-source
//! failures, accumulate items and success/failure counts.

pub mod catalog;
pub mod types;

use std::collections::HashMap;
use std::sync::Arc;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::notify::Notifier;
use types::{Collector, ScrapedItem, SourceDescriptor};

/// One-time metrics registration (so series show up on an exporter).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("collect_sources_total", "Source descriptors attempted.");
        describe_counter!(
            "collect_failures_total",
            "Source descriptors that failed to scrape."
        );
        describe_counter!("collect_items_total", "Items accumulated across sources.");
        describe_gauge!("collect_last_run_ts", "Unix ts when collection last ran.");
    });
}

/// Registry of collector instances keyed by kind.
pub type CollectorMap = HashMap<String, Arc<dyn Collector>>;

#[derive(Debug, Default)]
pub struct CollectOutcome {
    pub items: Vec<ScrapedItem>,
    pub success: usize,
    pub failed: usize,
}

/// Process descriptors strictly in order. A failing source bumps `failed`,
/// fires a warning notification and the run moves on; `success + failed`
/// always equals the number of descriptors attempted.
pub async fn collect_all(
    collectors: &CollectorMap,
    descriptors: &[SourceDescriptor],
    notifier: &dyn Notifier,
) -> CollectOutcome {
    ensure_metrics_described();

    let total = descriptors.len();
    let mut outcome = CollectOutcome::default();

    for (idx, desc) in descriptors.iter().enumerate() {
        let result = match collectors.get(desc.collector.as_str()) {
            Some(collector) => collector.scrape(&desc.identifier).await,
            None => Err(anyhow::anyhow!(
                "no collector registered for kind {:?}",
                desc.collector
            )),
        };

        match result {
            Ok(mut items) => {
                outcome.success += 1;
                counter!("collect_items_total").increment(items.len() as u64);
                outcome.items.append(&mut items);
            }
            Err(e) => {
                outcome.failed += 1;
                counter!("collect_failures_total").increment(1);
                warn!(
                    collector = %desc.collector,
                    identifier = %desc.identifier,
                    error = %e,
                    "source scrape failed"
                );
                notifier
                    .warning(
                        &format!("{} scrape failed", desc.collector),
                        &format!("source: {}\nerror: {:#}", desc.identifier, e),
                    )
                    .await;
            }
        }

        info!(target: "collect", current = idx + 1, total, "source processed");
    }

    counter!("collect_sources_total").increment(total as u64);
    gauge!("collect_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NullNotifier;
    use anyhow::bail;

    struct FixedCollector {
        kind: &'static str,
        items_per_scrape: usize,
        fail_for: Vec<&'static str>,
    }

    #[async_trait::async_trait]
    impl Collector for FixedCollector {
        async fn scrape(&self, identifier: &str) -> anyhow::Result<Vec<ScrapedItem>> {
            if self.fail_for.contains(&identifier) {
                bail!("fetch refused for {identifier}");
            }
            Ok((0..self.items_per_scrape)
                .map(|i| ScrapedItem {
                    id: format!("{identifier}-{i}"),
                    title: format!("title {i}"),
                    content: "body".to_string(),
                    url: identifier.to_string(),
                    publish_date: "2025-01-01".to_string(),
                    score: 0.0,
                    metadata: Default::default(),
                })
                .collect())
        }

        fn kind(&self) -> &'static str {
            self.kind
        }
    }

    fn collector_map(c: FixedCollector) -> CollectorMap {
        let mut map = CollectorMap::new();
        map.insert(c.kind().to_string(), Arc::new(c));
        map
    }

    #[tokio::test]
    async fn stats_account_for_every_descriptor() {
        let collectors = collector_map(FixedCollector {
            kind: "web",
            items_per_scrape: 2,
            fail_for: vec!["https://bad"],
        });
        let descriptors = vec![
            SourceDescriptor::new("web", "https://a"),
            SourceDescriptor::new("web", "https://bad"),
            SourceDescriptor::new("web", "https://b"),
        ];

        let outcome = collect_all(&collectors, &descriptors, &NullNotifier).await;
        assert_eq!(outcome.success, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.success + outcome.failed, descriptors.len());
        assert_eq!(outcome.items.len(), 4);
    }

    #[tokio::test]
    async fn unknown_collector_kind_counts_as_failure() {
        let collectors = collector_map(FixedCollector {
            kind: "web",
            items_per_scrape: 1,
            fail_for: vec![],
        });
        let descriptors = vec![
            SourceDescriptor::new("web", "https://a"),
            SourceDescriptor::new("nonexistent", "https://x"),
        ];

        let outcome = collect_all(&collectors, &descriptors, &NullNotifier).await;
        assert_eq!(outcome.success, 1);
        assert_eq!(outcome.failed, 1);
    }

    #[tokio::test]
    async fn no_descriptors_yield_empty_outcome() {
        let collectors = CollectorMap::new();
        let outcome = collect_all(&collectors, &[], &NullNotifier).await;
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.success + outcome.failed, 0);
    }
}
