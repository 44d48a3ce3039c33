//! Pipeline use case - orchestrates fetch, filter, classify, dedup, persist and dispatch

use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    model::{
        CandidateItem, InsertOutcome, ItemOutcome, ProcessedItem, RunSummary, SeenRecord,
        SkipReason, Source, SourceFailure,
    },
    policy::RecencyPolicy,
    ports::{Clock, DedupStore, FetchError, MessageChannel, SourceFetcher, Translator},
    usecases::{classify::KeywordClassifier, notify::Notifier},
};

/// Configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Sources to poll, names unique
    pub sources: Vec<Source>,
    pub recency: RecencyPolicy,
    /// Maximum sources fetched at the same time
    pub max_concurrent_fetches: usize,
    /// Max items dispatched per iteration (None = unlimited)
    pub max_items_per_run: Option<usize>,
    /// Classify and check, but never persist or send
    pub dry_run: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sources: vec![],
            recency: RecencyPolicy::default(),
            max_concurrent_fetches: 4,
            max_items_per_run: None,
            dry_run: false,
        }
    }
}

/// Pipeline runner.
///
/// Items are recorded in the dedup store before they are sent: a crash
/// between the two loses a notification but never repeats one. An item
/// whose record cannot be written is not sent and is retried next iteration.
pub struct Pipeline<F, D, M, T, Cl>
where
    F: SourceFetcher + ?Sized,
    D: DedupStore + ?Sized,
    M: MessageChannel + ?Sized,
    T: Translator + ?Sized,
    Cl: Clock + ?Sized,
{
    fetcher: Arc<F>,
    store: Arc<D>,
    classifier: Arc<KeywordClassifier>,
    notifier: Notifier<M, T>,
    clock: Arc<Cl>,
    config: PipelineConfig,
    run_lock: Mutex<()>,
}

impl<F, D, M, T, Cl> Pipeline<F, D, M, T, Cl>
where
    F: SourceFetcher + ?Sized,
    D: DedupStore + ?Sized,
    M: MessageChannel + ?Sized,
    T: Translator + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(
        fetcher: Arc<F>,
        store: Arc<D>,
        classifier: Arc<KeywordClassifier>,
        notifier: Notifier<M, T>,
        clock: Arc<Cl>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        validate_sources(&config.sources)?;

        Ok(Self {
            fetcher,
            store,
            classifier,
            notifier,
            clock,
            config,
            run_lock: Mutex::new(()),
        })
    }

    /// Run a single iteration over all sources.
    ///
    /// Iterations never overlap: a call made while another is in flight
    /// returns [`PipelineError::AlreadyRunning`] without doing any work.
    pub async fn run_once(&self) -> Result<RunSummary, PipelineError> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| PipelineError::AlreadyRunning)?;

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline_run", run_id = %run_id);
        self.run_locked(run_id).instrument(span).await
    }

    async fn run_locked(&self, run_id: Uuid) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary::new(run_id, self.clock.now());

        tracing::info!(
            sources = self.config.sources.len(),
            dry_run = self.config.dry_run,
            "Starting pipeline run"
        );

        // Fetch concurrently, then handle sources in configured order
        let fetched: Vec<(&Source, Result<Vec<CandidateItem>, FetchError>)> =
            stream::iter(&self.config.sources)
                .map(|source| async move { (source, self.fetcher.fetch(source).await) })
                .buffered(self.config.max_concurrent_fetches.max(1))
                .collect()
                .await;

        let mut dispatched = 0usize;

        for (source, result) in fetched {
            let items = match result {
                Ok(items) => {
                    tracing::info!(source = %source.name, count = items.len(), "Fetched source");
                    items
                }
                Err(e) => {
                    tracing::warn!(
                        source = %source.name,
                        locator = %source.locator,
                        error = %e,
                        "Source fetch failed, skipping"
                    );
                    summary.failed_sources.push(SourceFailure {
                        source: source.name.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            for item in items {
                let outcome = self.process_item(&item, &mut dispatched).await;
                summary.items.push(ProcessedItem {
                    source: item.source_name.clone(),
                    url: item.url.clone(),
                    outcome,
                });
            }
        }

        tracing::info!(
            dispatched = summary.dispatched(),
            already_seen = summary.skipped(SkipReason::AlreadySeen),
            unclassified = summary.skipped(SkipReason::Unclassified),
            stale = summary.skipped(SkipReason::Stale),
            run_limit = summary.skipped(SkipReason::RunLimit),
            dry_run = summary.skipped(SkipReason::DryRun),
            deferred = summary.deferred(),
            failed_sources = summary.failed_sources.len(),
            "Pipeline run complete"
        );

        Ok(summary)
    }

    /// Process a single item: recency, classify, dedup, persist, dispatch
    async fn process_item(&self, item: &CandidateItem, dispatched: &mut usize) -> ItemOutcome {
        let now = self.clock.now();

        if !self.config.recency.admits(item, now) {
            tracing::debug!(url = %item.url, "Skipping stale item");
            return ItemOutcome::Skipped {
                reason: SkipReason::Stale,
            };
        }

        let Some(category) = self.classifier.classify(&item.title, &item.summary) else {
            tracing::debug!(url = %item.url, "No category matched");
            return ItemOutcome::Skipped {
                reason: SkipReason::Unclassified,
            };
        };

        if let Some(limit) = self.config.max_items_per_run {
            if *dispatched >= limit {
                return ItemOutcome::Skipped {
                    reason: SkipReason::RunLimit,
                };
            }
        }

        match self.store.exists(&item.url).await {
            Ok(true) => {
                return ItemOutcome::Skipped {
                    reason: SkipReason::AlreadySeen,
                };
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(
                    url = %item.url,
                    backend = self.store.backend(),
                    error = %e,
                    "Dedup lookup failed, deferring item"
                );
                return ItemOutcome::Deferred {
                    error: e.to_string(),
                };
            }
        }

        if self.config.dry_run {
            let text = self.notifier.render_message(item, category).await;
            tracing::info!(
                url = %item.url,
                category = %category.id,
                rendered_text = %text,
                "[DRY RUN] Would deliver"
            );
            return ItemOutcome::Skipped {
                reason: SkipReason::DryRun,
            };
        }

        let record = SeenRecord::from_item(item, category, now);
        match self.store.insert(&record).await {
            Ok(InsertOutcome::Inserted) => {}
            Ok(InsertOutcome::AlreadyPresent) => {
                tracing::debug!(url = %item.url, "Record already present, skipping");
                return ItemOutcome::Skipped {
                    reason: SkipReason::AlreadySeen,
                };
            }
            Err(e) => {
                tracing::error!(
                    url = %item.url,
                    backend = self.store.backend(),
                    error = %e,
                    "Failed to record item, notification suppressed until next run"
                );
                return ItemOutcome::Deferred {
                    error: e.to_string(),
                };
            }
        }

        if *dispatched > 0 {
            self.notifier.pause_between_deliveries().await;
        }

        tracing::info!(
            url = %item.url,
            source = %item.source_name,
            category = %category.id,
            "Dispatching item"
        );
        let report = self.notifier.deliver(item, category).await;
        *dispatched += 1;

        ItemOutcome::Dispatched {
            category: category.id.clone(),
            report,
        }
    }
}

/// Reject empty or duplicate source names
pub fn validate_sources(sources: &[Source]) -> Result<(), PipelineError> {
    let mut names = HashSet::new();
    for source in sources {
        if source.name.trim().is_empty() {
            return Err(PipelineError::Config("Source with empty name".to_string()));
        }
        if !names.insert(source.name.as_str()) {
            return Err(PipelineError::Config(format!(
                "Duplicate source name '{}'",
                source.name
            )));
        }
    }
    Ok(())
}

/// Errors from the pipeline
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("A pipeline run is already in progress")]
    AlreadyRunning,
    #[error("Configuration error: {0}")]
    Config(String),
}
