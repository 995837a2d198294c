// tests/pipeline_e2e.rs
//! End-to-end runs of the digest pipeline against mock collaborators.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use chrono::Utc;

use trend_digest::collect::types::{Collector, ScrapedItem, SourceDescriptor};
use trend_digest::notify::{Level, Notifier};
use trend_digest::pipeline::{DigestPipeline, PipelineError, PipelineOptions, RunPhase};
use trend_digest::publish::{
    ImageGenerator, PublishResult, PublishStatus, Publisher, TemplateRenderer,
};
use trend_digest::rank::{ProviderError, RankingProvider};
use trend_digest::retry::RetryPolicy;
use trend_digest::summarize::{Summarizer, Summary};

// ---- mock collaborators ----------------------------------------------------

/// Scrapes a fixed number of items per identifier; identifiers in
/// `fail_for` refuse to scrape.
struct ScriptedCollector {
    items_for: HashMap<&'static str, usize>,
}

#[async_trait::async_trait]
impl Collector for ScriptedCollector {
    async fn scrape(&self, identifier: &str) -> Result<Vec<ScrapedItem>> {
        match self.items_for.get(identifier) {
            Some(count) => Ok((0..*count)
                .map(|i| ScrapedItem {
                    id: format!("{identifier}-{i}"),
                    title: format!("headline {identifier}-{i}"),
                    content: format!("body of {identifier}-{i}"),
                    url: format!("https://news.example/{identifier}/{i}"),
                    publish_date: "2025-06-01".to_string(),
                    score: 0.0,
                    metadata: Default::default(),
                })
                .collect()),
            None => bail!("upstream returned 503 for {identifier}"),
        }
    }

    fn kind(&self) -> &'static str {
        "web"
    }
}

/// Emits one scoring line per item, skipping ids listed in `skip` (the
/// ranking model deduplicated them away). One special id gets the top
/// score so ranked order provably differs from collection order.
struct ScriptedRanker {
    skip: Vec<&'static str>,
    boost: &'static str,
}

#[async_trait::async_trait]
impl RankingProvider for ScriptedRanker {
    async fn score(&self, items: &[ScrapedItem]) -> Result<String, ProviderError> {
        let mut out = String::new();
        for (i, item) in items.iter().enumerate() {
            if self.skip.contains(&item.id.as_str()) {
                continue;
            }
            let score = if item.id == self.boost {
                99.5
            } else {
                90.0 - i as f64
            };
            out.push_str(&format!("{}: {}\n", item.id, score));
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct FailingRanker;

#[async_trait::async_trait]
impl RankingProvider for FailingRanker {
    async fn score(&self, _items: &[ScrapedItem]) -> Result<String, ProviderError> {
        Err(ProviderError::EmptyCompletion)
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

struct GarbageRanker;

#[async_trait::async_trait]
impl RankingProvider for GarbageRanker {
    async fn score(&self, _items: &[ScrapedItem]) -> Result<String, ProviderError> {
        Ok("I would rate these articles quite highly overall.".to_string())
    }

    fn name(&self) -> &'static str {
        "garbage"
    }
}

struct EchoSummarizer;

#[async_trait::async_trait]
impl Summarizer for EchoSummarizer {
    async fn summarize(&self, raw: &str) -> Result<Summary> {
        let item: ScrapedItem = serde_json::from_str(raw)?;
        Ok(Summary {
            title: format!("condensed {}", item.id),
            content: format!("summary {}", item.id),
            keywords: vec!["ai".to_string()],
            score: 0.0,
        })
    }

    async fn generate_title(&self, _content: &str) -> Result<String> {
        Ok("Top AI stories of the day".to_string())
    }
}

struct IdListRenderer;

impl TemplateRenderer for IdListRenderer {
    fn render(&self, items: &[ScrapedItem]) -> Result<String> {
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        Ok(ids.join(","))
    }
}

struct StaticImageGen;

#[async_trait::async_trait]
impl ImageGenerator for StaticImageGen {
    async fn generate(&self, _prompt: &str, _size: &str) -> Result<String> {
        Ok("https://img.example/cover.png".to_string())
    }
}

#[derive(Default)]
struct RecordingPublisher {
    published: Mutex<Vec<(String, String, String)>>, // (html, title, digest)
    fail: bool,
}

#[async_trait::async_trait]
impl Publisher for RecordingPublisher {
    async fn upload_image(&self, image_url: &str) -> Result<String> {
        Ok(format!("media-{image_url}"))
    }

    async fn publish(
        &self,
        html: &str,
        title: &str,
        digest: &str,
        _media_id: &str,
    ) -> Result<PublishResult> {
        if self.fail {
            bail!("platform rejected the draft");
        }
        self.published.lock().unwrap().push((
            html.to_string(),
            title.to_string(),
            digest.to_string(),
        ));
        Ok(PublishResult {
            publish_id: "p-1".to_string(),
            url: None,
            status: PublishStatus::Published,
            published_at: Utc::now(),
            platform: "mock".to_string(),
        })
    }
}

#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<(Level, String)>>,
}

impl RecordingNotifier {
    fn titles_at(&self, level: Level) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, t)| t.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, level: Level, title: &str, _body: &str) -> bool {
        self.events.lock().unwrap().push((level, title.to_string()));
        true
    }
}

// ---- fixture ---------------------------------------------------------------

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn test_options() -> PipelineOptions {
    PipelineOptions {
        retry: RetryPolicy::no_retry(),
        summary_width: 2,
        ..Default::default()
    }
}

fn build_pipeline(
    ranker: Arc<dyn RankingProvider>,
    publisher: Arc<RecordingPublisher>,
    notifier: Arc<RecordingNotifier>,
    items_for: HashMap<&'static str, usize>,
) -> DigestPipeline {
    DigestPipeline::builder()
        .collector(Arc::new(ScriptedCollector { items_for }))
        .ranker(ranker)
        .summarizer(Arc::new(EchoSummarizer))
        .renderer(Arc::new(IdListRenderer))
        .image_generator(Arc::new(StaticImageGen))
        .publisher(publisher)
        .notifier(notifier)
        .options(test_options())
        .build()
        .expect("pipeline wiring")
}

fn five_source_descriptors() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor::new("web", "s1"),
        SourceDescriptor::new("web", "down1"),
        SourceDescriptor::new("web", "s2"),
        SourceDescriptor::new("web", "down2"),
        SourceDescriptor::new("web", "s3"),
    ]
}

fn three_live_sources() -> HashMap<&'static str, usize> {
    // 5 + 4 + 3 items; the two "down" identifiers are absent and fail.
    HashMap::from([("s1", 5), ("s2", 4), ("s3", 3)])
}

// ---- scenarios -------------------------------------------------------------

#[tokio::test]
async fn full_run_ranks_selects_and_publishes() {
    init_tracing();
    let publisher = Arc::new(RecordingPublisher::default());
    let notifier = Arc::new(RecordingNotifier::default());
    // s3-1 and s3-2 never appear in the scoring output; s3-0 scores highest.
    let ranker = Arc::new(ScriptedRanker {
        skip: vec!["s3-1", "s3-2"],
        boost: "s3-0",
    });
    let pipeline = build_pipeline(ranker, publisher.clone(), notifier.clone(), three_live_sources());

    let report = pipeline.run(&five_source_descriptors()).await.unwrap();

    assert_eq!(report.stats.success, 3);
    assert_eq!(report.stats.failed, 2);
    assert_eq!(report.stats.success + report.stats.failed, 5);
    assert_eq!(report.stats.content_count, 12);
    assert_eq!(report.selected, 10);
    assert_eq!(report.phase, RunPhase::Done);
    assert!(!report.ranking_skipped);
    assert_eq!(report.publish_status, "published");

    // Two scrape failures surfaced as warnings plus the final summary.
    let warnings = notifier.titles_at(Level::Warning);
    assert_eq!(
        warnings.iter().filter(|t| t.contains("scrape failed")).count(),
        2
    );
    assert!(warnings.iter().any(|t| t.contains("partial failures")));

    // The published order follows the ranked scores; the two ids missing
    // from the scoring output stay at zero and fall out of the top 10.
    let published = publisher.published.lock().unwrap();
    let (html, title, digest) = &published[0];
    let ids: Vec<&str> = html.split(',').collect();
    assert_eq!(ids.len(), 10);
    assert_eq!(ids[0], "s3-0");
    assert_eq!(ids[1], "s1-0");
    assert!(!ids.contains(&"s3-1"));
    assert!(!ids.contains(&"s3-2"));

    assert!(title.contains("AI Daily"));
    assert_eq!(digest, "Top AI stories of the day");
}

#[tokio::test]
async fn provider_failure_degrades_to_collection_order() {
    let publisher = Arc::new(RecordingPublisher::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let pipeline = build_pipeline(
        Arc::new(FailingRanker),
        publisher.clone(),
        notifier.clone(),
        three_live_sources(),
    );

    let report = pipeline.run(&five_source_descriptors()).await.unwrap();

    assert!(report.ranking_skipped);
    assert_eq!(report.phase, RunPhase::Done);

    // Unranked scores are all zero, so the stable sort keeps collection
    // order and the first ten collected items are published.
    let published = publisher.published.lock().unwrap();
    let ids: Vec<&str> = published[0].0.split(',').collect();
    assert_eq!(ids[0], "s1-0");
    assert_eq!(ids[9], "s2-3");

    let errors = notifier.titles_at(Level::Error);
    assert!(errors.iter().any(|t| t.contains("ranking skipped")));
}

#[tokio::test]
async fn unparseable_scores_degrade_to_collection_order() {
    let publisher = Arc::new(RecordingPublisher::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let pipeline = build_pipeline(
        Arc::new(GarbageRanker),
        publisher.clone(),
        notifier.clone(),
        three_live_sources(),
    );

    let report = pipeline.run(&five_source_descriptors()).await.unwrap();
    assert!(report.ranking_skipped);
    assert_eq!(publisher.published.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn zero_collected_items_abort_the_run() {
    let publisher = Arc::new(RecordingPublisher::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let pipeline = build_pipeline(
        Arc::new(ScriptedRanker {
            skip: vec![],
            boost: "",
        }),
        publisher.clone(),
        notifier.clone(),
        HashMap::new(), // every identifier fails
    );

    let err = pipeline.run(&five_source_descriptors()).await.unwrap_err();
    assert!(matches!(err, PipelineError::EmptyCollection));

    let errors = notifier.titles_at(Level::Error);
    assert!(errors.iter().any(|t| t.contains("run aborted")));
    assert!(publisher.published.lock().unwrap().is_empty());
}

#[tokio::test]
async fn publish_failure_propagates_after_notifying() {
    let publisher = Arc::new(RecordingPublisher {
        fail: true,
        ..Default::default()
    });
    let notifier = Arc::new(RecordingNotifier::default());
    let pipeline = build_pipeline(
        Arc::new(ScriptedRanker {
            skip: vec![],
            boost: "s1-0",
        }),
        publisher.clone(),
        notifier.clone(),
        three_live_sources(),
    );

    let err = pipeline.run(&five_source_descriptors()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Publish(_)));

    let errors = notifier.titles_at(Level::Error);
    assert!(errors.iter().any(|t| t.contains("publish failed")));
}

#[tokio::test]
async fn summaries_overwrite_selected_items_only() {
    let publisher = Arc::new(RecordingPublisher::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let pipeline = build_pipeline(
        Arc::new(ScriptedRanker {
            skip: vec!["s3-1", "s3-2"],
            boost: "s3-0",
        }),
        publisher.clone(),
        notifier.clone(),
        three_live_sources(),
    );

    pipeline.run(&five_source_descriptors()).await.unwrap();

    // Rendered items went through summarization; their titles fed the
    // digest title generator.
    let published = publisher.published.lock().unwrap();
    assert!(published[0].0.contains("s3-0"));
    assert_eq!(published[0].2, "Top AI stories of the day");
}
