use async_trait::async_trait;
use metrics::counter;
use tracing::{debug, info, warn};

use crate::dedup::DedupStore;
use crate::error::CollectError;
use crate::fetch::ReportFetcher;
use crate::normalize::record_lines;
use crate::report::{dedup_key, ReportCategory, ReportSource};
use crate::sinks::LineSink;

/// Per-source tally for one cycle, emitted for observability and never
/// persisted. `failed` counts lines that were new but could not be
/// delivered, so a delivery failure is distinguishable from an
/// intentional skip in the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionOutcome {
    pub category: ReportCategory,
    pub total: usize,
    pub skipped: usize,
    pub published: usize,
    pub failed: usize,
}

impl CollectionOutcome {
    fn new(category: ReportCategory) -> CollectionOutcome {
        CollectionOutcome {
            category,
            total: 0,
            skipped: 0,
            published: 0,
            failed: 0,
        }
    }
}

/// One collection cycle across all configured sources. Abstracted so the
/// scheduler can be exercised without real feeds.
#[async_trait]
pub trait Collect: Send {
    async fn collect_and_publish(&self) -> Result<Vec<CollectionOutcome>, CollectError>;
}

/// Orchestrates fetch, normalize, dedup-check and publish for the fixed
/// source set. Owns the per-cycle ephemeral state; the store and sink
/// are long-lived and reused sequentially across cycles.
pub struct ReportCollector<D, S> {
    sources: Vec<ReportSource>,
    fetcher: ReportFetcher,
    store: D,
    sink: S,
}

impl<D: DedupStore, S: LineSink> ReportCollector<D, S> {
    pub fn new(
        sources: Vec<ReportSource>,
        fetcher: ReportFetcher,
        store: D,
        sink: S,
    ) -> ReportCollector<D, S> {
        ReportCollector {
            sources,
            fetcher,
            store,
            sink,
        }
    }

    /// Fetch one source and feed every new line to the sink.
    ///
    /// Lines are processed strictly in body order: a later duplicate in
    /// the same response must observe the mark left by the earlier
    /// occurrence. A store lookup error skips the line, a publish error
    /// is counted and skipped; only a fatal error escapes.
    async fn collect_source(
        &self,
        source: &ReportSource,
    ) -> Result<CollectionOutcome, CollectError> {
        let body = self.fetcher.fetch(&source.url).await?;
        let body = String::from_utf8_lossy(&body);

        let mut outcome = CollectionOutcome::new(source.category);

        for line in record_lines(&body) {
            outcome.total += 1;

            let key = dedup_key(source.category, line);
            match self.store.seen(&key).await {
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(category = %source.category, error = %err, "dedup lookup failed, skipping line");
                    continue;
                }
                Ok(true) => {
                    outcome.skipped += 1;
                    counter!("collector_lines_skipped_total", "category" => source.category.as_str())
                        .increment(1);
                    continue;
                }
                Ok(false) => {}
            }

            // Best-effort: an unmarked key only means the line may be
            // published again next cycle.
            match self.store.mark(&key).await {
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => debug!(category = %source.category, error = %err, "failed to mark line as seen"),
                Ok(()) => {}
            }

            match self.sink.publish(line, source.category).await {
                Ok(()) => outcome.published += 1,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(category = %source.category, error = %err, "failed to publish line");
                    outcome.failed += 1;
                    counter!("collector_publish_failures_total", "category" => source.category.as_str())
                        .increment(1);
                }
            }
        }

        Ok(outcome)
    }
}

#[async_trait]
impl<D: DedupStore, S: LineSink> Collect for ReportCollector<D, S> {
    /// Run one full cycle. Sources are isolated from each other: a fetch
    /// failure loses that source for this cycle and the remaining
    /// sources still run. Only a fatal error aborts the cycle.
    async fn collect_and_publish(&self) -> Result<Vec<CollectionOutcome>, CollectError> {
        let mut outcomes = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            match self.collect_source(source).await {
                Ok(outcome) => {
                    info!(
                        category = %outcome.category,
                        total = outcome.total,
                        skipped = outcome.skipped,
                        published = outcome.published,
                        failed = outcome.failed,
                        "processed report"
                    );
                    outcomes.push(outcome);
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(category = %source.category, error = %err, "failed to collect report source");
                    counter!("collector_fetch_failures_total", "category" => source.category.as_str())
                        .increment(1);
                }
            }
        }

        Ok(outcomes)
    }
}
