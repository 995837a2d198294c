// src/pipeline.rs
//! Pipeline controller: sequences collection, ranking, selection and the
//! summarization/publishing hand-off for one run, and owns the run
//! statistics.
//!
//! A run moves `Idle → Collecting → Ranking → Selecting → Done`. Zero
//! collected items abort from `Collecting`; any ranking failure takes the
//! ranking-skipped edge back into `Selecting` with the pre-ranking order.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use tracing::{debug, error, info, warn};

use crate::collect::types::{Collector, ScrapedItem, SourceDescriptor};
use crate::collect::{collect_all, CollectorMap};
use crate::notify::Notifier;
use crate::publish::{ImageGenerator, PublishResult, Publisher, TemplateRenderer};
use crate::rank::{merge_scores, parse_rank_output, sort_by_score, RankingProvider};
use crate::retry::{retry, RetryPolicy};
use crate::schedule::Workflow;
use crate::summarize::{digest_title, summarize_batch, Summarizer, MAX_TITLE_CHARS};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_runs_total", "Completed digest runs.");
        describe_counter!(
            "pipeline_rank_skips_total",
            "Runs that fell back to unranked order."
        );
        describe_gauge!("pipeline_last_run_ts", "Unix ts when a run last completed.");
    });
}

/// Per-run counters, reset each run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub success: usize,
    pub failed: usize,
    pub content_count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Collecting,
    Ranking,
    Selecting,
    Done,
    Aborted,
}

struct RunState {
    phase: RunPhase,
}

impl RunState {
    fn new() -> Self {
        Self {
            phase: RunPhase::Idle,
        }
    }

    fn advance(&mut self, next: RunPhase) {
        debug!(from = ?self.phase, to = ?next, "pipeline transition");
        self.phase = next;
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("no content collected from any source")]
    EmptyCollection,
    #[error("publish failed: {0:#}")]
    Publish(anyhow::Error),
}

#[derive(Clone, Debug)]
pub struct PipelineOptions {
    /// How many items survive selection.
    pub top_n: usize,
    /// Concurrency width of one summarization batch.
    pub summary_width: usize,
    /// Policy for the ranking and title calls.
    pub retry: RetryPolicy,
    pub cover_prompt: String,
    pub cover_size: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            top_n: 10,
            summary_width: 1,
            retry: RetryPolicy::linear_default(),
            cover_prompt: "Cover image for the AI news daily digest".to_string(),
            cover_size: "1440*768".to_string(),
        }
    }
}

/// Terminal report for one run.
#[derive(Debug)]
pub struct RunReport {
    pub stats: RunStats,
    pub phase: RunPhase,
    pub ranking_skipped: bool,
    pub selected: usize,
    pub publish_status: String,
}

pub struct DigestPipeline {
    collectors: CollectorMap,
    ranker: Arc<dyn RankingProvider>,
    summarizer: Arc<dyn Summarizer>,
    renderer: Arc<dyn TemplateRenderer>,
    image_gen: Arc<dyn ImageGenerator>,
    publisher: Arc<dyn Publisher>,
    notifier: Arc<dyn Notifier>,
    options: PipelineOptions,
}

impl DigestPipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Best-effort refresh of every collaborator before a run. Failures are
    /// logged and notified; none abort.
    pub async fn refresh(&self) {
        for (kind, collector) in &self.collectors {
            if let Err(e) = collector.refresh().await {
                warn!(collector = %kind, error = %e, "collector refresh failed");
                self.notifier
                    .warning(
                        "collector refresh failed",
                        &format!("collector: {kind}\nerror: {e:#}"),
                    )
                    .await;
            }
        }
        if let Err(e) = self.summarizer.refresh().await {
            warn!(error = %e, "summarizer refresh failed");
        }
        if let Err(e) = self.image_gen.refresh().await {
            warn!(error = %e, "image generator refresh failed");
        }
        if let Err(e) = self.publisher.refresh().await {
            warn!(error = %e, "publisher refresh failed");
        }
    }

    /// One end-to-end run over the given descriptors.
    pub async fn run(&self, descriptors: &[SourceDescriptor]) -> Result<RunReport, PipelineError> {
        ensure_metrics_described();

        let mut state = RunState::new();
        let mut stats = RunStats::default();

        info!(total = descriptors.len(), "digest run starting");
        self.notifier
            .info("run started", "collecting and processing content")
            .await;

        // 1. Collect, one descriptor at a time.
        state.advance(RunPhase::Collecting);
        let outcome = collect_all(&self.collectors, descriptors, self.notifier.as_ref()).await;
        stats.success = outcome.success;
        stats.failed = outcome.failed;
        stats.content_count = outcome.items.len();
        let mut items = outcome.items;

        if items.is_empty() {
            state.advance(RunPhase::Aborted);
            error!("no content collected, aborting run");
            self.notifier
                .error("run aborted", "no content collected from any source")
                .await;
            return Err(PipelineError::EmptyCollection);
        }

        // 2. Rank. Provider and parse failures both degrade to the
        // pre-ranking order.
        state.advance(RunPhase::Ranking);
        info!(items = items.len(), provider = self.ranker.name(), "ranking content");
        let ranking_skipped = !self.rank_items(&mut items).await;
        if ranking_skipped {
            counter!("pipeline_rank_skips_total").increment(1);
        }

        // 3. Select the top slice.
        state.advance(RunPhase::Selecting);
        sort_by_score(&mut items);
        let selected = self.options.top_n.min(items.len());
        info!(selected, total = items.len(), "top selection complete");

        // 4. Hand-off: summarize the selected subset in bounded batches.
        let (top, _rest) = items.split_at_mut(selected);
        summarize_batch(
            top,
            self.summarizer.as_ref(),
            self.notifier.as_ref(),
            self.options.summary_width,
        )
        .await;

        // Digest title from every collected title (summarized where
        // available). A title failure degrades, per the propagation policy.
        let title = match retry(&self.options.retry, || {
            digest_title(&items, self.summarizer.as_ref())
        })
        .await
        {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "title generation failed, using fallback");
                self.notifier
                    .warning("title generation failed", "using fallback digest title")
                    .await;
                items
                    .first()
                    .map(|i| i.title.chars().take(MAX_TITLE_CHARS).collect())
                    .unwrap_or_else(|| "AI Daily".to_string())
            }
        };
        info!(%title, "digest title ready");

        // 5. Render and publish. Any failure here invalidates the run.
        let publish_result = match self.publish_digest(&items[..selected], &title).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "publish phase failed");
                self.notifier
                    .error("publish failed", &format!("{e:#}"))
                    .await;
                return Err(PipelineError::Publish(e));
            }
        };

        state.advance(RunPhase::Done);
        counter!("pipeline_runs_total").increment(1);
        gauge!("pipeline_last_run_ts").set(Utc::now().timestamp().max(0) as f64);

        let publish_status = publish_result.status.to_string();
        let summary = format!(
            "sources: {}\nsucceeded: {}\nfailed: {}\nitems: {}\npublished: {}",
            descriptors.len(),
            stats.success,
            stats.failed,
            stats.content_count,
            publish_status
        );
        info!(
            %publish_status,
            success = stats.success,
            failed = stats.failed,
            items = stats.content_count,
            "digest run complete"
        );
        if stats.failed > 0 {
            self.notifier
                .warning("run complete (partial failures)", &summary)
                .await;
        } else {
            self.notifier.success("run complete", &summary).await;
        }

        Ok(RunReport {
            stats,
            phase: state.phase,
            ranking_skipped,
            selected,
            publish_status,
        })
    }

    /// Score + parse + merge. Returns whether ranked scores were applied.
    async fn rank_items(&self, items: &mut [ScrapedItem]) -> bool {
        let batch: &[ScrapedItem] = items;
        let raw = retry(&self.options.retry, || self.ranker.score(batch)).await;
        let raw = match raw {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "ranking provider failed, keeping pre-ranking order");
                self.notifier
                    .error("ranking skipped", &format!("provider error: {e}"))
                    .await;
                return false;
            }
        };

        match parse_rank_output(&raw) {
            Ok(results) => {
                merge_scores(items, &results);
                true
            }
            Err(e) => {
                warn!(error = %e, "ranking output unparseable, keeping pre-ranking order");
                self.notifier
                    .error("ranking skipped", &format!("unparseable scoring output: {e}"))
                    .await;
                false
            }
        }
    }

    async fn publish_digest(
        &self,
        top: &[ScrapedItem],
        title: &str,
    ) -> anyhow::Result<PublishResult> {
        let html = self.renderer.render(top).context("rendering digest template")?;

        let image_url = self
            .image_gen
            .generate(&self.options.cover_prompt, &self.options.cover_size)
            .await
            .context("generating cover image")?;
        let media_id = self
            .publisher
            .upload_image(&image_url)
            .await
            .context("uploading cover image")?;

        let headline = format!("{} AI Daily | {}", Utc::now().format("%Y-%m-%d"), title);
        info!(%headline, "publishing digest");
        self.publisher
            .publish(&html, &headline, title, &media_id)
            .await
            .context("publishing digest")
    }
}

/// Binds a pipeline to the descriptor set it runs against, so it can sit
/// in a [`crate::schedule::WorkflowTable`].
pub struct DigestWorkflow {
    pipeline: DigestPipeline,
    descriptors: Vec<SourceDescriptor>,
}

impl DigestWorkflow {
    pub fn new(pipeline: DigestPipeline, descriptors: Vec<SourceDescriptor>) -> Self {
        Self {
            pipeline,
            descriptors,
        }
    }
}

#[async_trait::async_trait]
impl Workflow for DigestWorkflow {
    async fn refresh(&self) {
        self.pipeline.refresh().await;
    }

    async fn process(&self) -> anyhow::Result<()> {
        self.pipeline.run(&self.descriptors).await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct PipelineBuilder {
    collectors: CollectorMap,
    ranker: Option<Arc<dyn RankingProvider>>,
    summarizer: Option<Arc<dyn Summarizer>>,
    renderer: Option<Arc<dyn TemplateRenderer>>,
    image_gen: Option<Arc<dyn ImageGenerator>>,
    publisher: Option<Arc<dyn Publisher>>,
    notifier: Option<Arc<dyn Notifier>>,
    options: Option<PipelineOptions>,
}

impl PipelineBuilder {
    pub fn collector(mut self, collector: Arc<dyn Collector>) -> Self {
        self.collectors
            .insert(collector.kind().to_string(), collector);
        self
    }

    pub fn ranker(mut self, ranker: Arc<dyn RankingProvider>) -> Self {
        self.ranker = Some(ranker);
        self
    }

    pub fn summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn image_generator(mut self, image_gen: Arc<dyn ImageGenerator>) -> Self {
        self.image_gen = Some(image_gen);
        self
    }

    pub fn publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn options(mut self, options: PipelineOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn build(self) -> anyhow::Result<DigestPipeline> {
        Ok(DigestPipeline {
            collectors: self.collectors,
            ranker: self.ranker.context("pipeline needs a ranking provider")?,
            summarizer: self.summarizer.context("pipeline needs a summarizer")?,
            renderer: self.renderer.context("pipeline needs a renderer")?,
            image_gen: self.image_gen.context("pipeline needs an image generator")?,
            publisher: self.publisher.context("pipeline needs a publisher")?,
            notifier: self.notifier.context("pipeline needs a notifier")?,
            options: self.options.unwrap_or_default(),
        })
    }
}
