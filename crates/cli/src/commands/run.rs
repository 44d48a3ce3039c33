//! Run command - poll, classify, dedup and notify loop

use anyhow::{Context, Result, bail};
use newsrelay_adapters::{
    dedup::{InMemoryDedupStore, JsonFileDedupStore, RestDedupStore, SqliteDedupStore},
    fetch::HttpSourceFetcher,
    http::{HttpConfig, RetryPolicy, build_client},
    outbox::OutboxChannel,
    telegram::{TELEGRAM_MAX_CHARS, TelegramChannel},
    translate::{GoogleTranslator, NoopTranslator},
};
use newsrelay_domain::{
    DedupStore, MessageChannel, SendError, SystemClock, Translator,
    policy::RecencyPolicy,
    usecases::{
        KeywordClassifier, Notifier, NotifierConfig, Pipeline, PipelineConfig, PipelineError,
        RenderConfig,
    },
};
use reqwest::Client;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::task::Poll;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};

use crate::args::RunArgs;
use crate::commands::classify::{load_secret, load_taxonomy};
use crate::config::{AppConfig, DedupBackend};

pub async fn execute(args: RunArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let dry_run = args.dry_run || config.general.dry_run;

    let sources = config
        .domain_sources()
        .context("Invalid source configuration")?;
    if sources.is_empty() {
        bail!("No sources configured");
    }
    if !dry_run && config.telegram.channels.is_empty() {
        bail!("No Telegram channels configured");
    }

    tracing::info!(
        dry_run = dry_run,
        once = args.once,
        outbox = ?args.outbox,
        sources = sources.len(),
        channels = ?config.telegram.channels,
        "Starting newsrelay run"
    );

    // Build dependencies
    let http_config = http_config(&config);
    let client = build_client(&http_config).context("Failed to build HTTP client")?;

    let fetcher = Arc::new(
        HttpSourceFetcher::new(&http_config, config.general.max_items_per_source)
            .context("Failed to initialize source fetcher")?,
    );

    let store = build_store(&config, client.clone()).await?;
    store
        .health_check()
        .await
        .with_context(|| format!("Dedup store '{}' is unavailable", store.backend()))?;

    let (specs, origin) = load_taxonomy(config.taxonomy.path.as_deref()).await?;
    let classifier =
        Arc::new(KeywordClassifier::compile(&specs).context("Failed to compile taxonomy")?);
    tracing::info!(
        taxonomy = %origin,
        categories = specs.len(),
        patterns = classifier.pattern_count(),
        fingerprint = %classifier.fingerprint(),
        "Taxonomy loaded"
    );

    let channel = build_channel(&config, &args, dry_run, client).await?;
    let translator = build_translator(&config)?;

    let notifier = Notifier::new(
        channel,
        translator,
        NotifierConfig {
            channels: config.telegram.channels.clone(),
            target_language: config
                .translation
                .enabled
                .then(|| config.translation.target_language.clone()),
            delivery_delay: Duration::from_millis(config.telegram.delivery_delay_ms),
            render_config: RenderConfig {
                max_chars: config.telegram.max_chars.min(TELEGRAM_MAX_CHARS),
                link_text: config.telegram.link_text.clone(),
            },
        },
    );

    let pipeline = Pipeline::new(
        fetcher,
        store,
        classifier,
        notifier,
        Arc::new(SystemClock),
        PipelineConfig {
            sources,
            recency: RecencyPolicy::new(config.recency_window()),
            max_concurrent_fetches: config.general.max_concurrent_fetches.max(1),
            max_items_per_run: config.max_items_per_run(),
            dry_run,
        },
    )?;

    // Ctrl+C only raises a flag; an in-flight iteration always completes
    let shutdown = spawn_shutdown_listener().await;

    // Execute
    if args.once {
        tracing::info!("Running single pipeline iteration");
        let summary = pipeline.run_once().await?;
        if summary.dispatched() == 0 && !summary.failed_sources.is_empty() {
            tracing::warn!(
                failed_sources = summary.failed_sources.len(),
                "Nothing dispatched and some sources failed"
            );
        }
        if stop_requested(&shutdown) {
            tracing::info!("Shutdown requested during the iteration");
        }
    } else {
        let poll_interval = Duration::from_secs(config.schedule.poll_interval_secs.max(1));
        let pipeline = &pipeline;

        poll_until_shutdown(poll_interval, shutdown, move || async move {
            match pipeline.run_once().await {
                Ok(summary) => tracing::debug!(run_id = %summary.run_id, "Iteration finished"),
                Err(PipelineError::AlreadyRunning) => {
                    tracing::warn!("Previous iteration still running, skipping tick");
                }
                Err(e) => tracing::error!(error = %e, "Pipeline iteration failed"),
            }
        })
        .await;
    }

    tracing::info!("newsrelay run completed");
    Ok(())
}

/// Install the Ctrl+C handler and return a flag that turns `true` on the signal
async fn spawn_shutdown_listener() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    let mut ctrl_c = Box::pin(tokio::signal::ctrl_c());

    // The first poll registers the OS handler, before any iteration starts
    let early = match futures::poll!(ctrl_c.as_mut()) {
        Poll::Ready(result) => Some(result),
        Poll::Pending => None,
    };

    tokio::spawn(async move {
        let result = match early {
            Some(result) => result,
            None => ctrl_c.await,
        };
        match result {
            Ok(()) => {
                tracing::info!("Shutdown signal received, finishing current iteration");
                let _ = tx.send(true);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                // Keep the sender alive so the flag never reads as closed
                std::future::pending::<()>().await;
            }
        }
    });

    rx
}

fn stop_requested(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow()
}

/// Run `iteration` on every tick until the shutdown flag is raised.
///
/// The flag is checked between iterations only.
async fn poll_until_shutdown<F, Fut>(
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut iteration: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    while !stop_requested(&shutdown) {
        tokio::select! {
            biased;
            _ = shutdown.changed() => {}
            _ = ticker.tick() => iteration().await,
        }
    }

    tracing::info!("Shutting down gracefully");
}

fn http_config(config: &AppConfig) -> HttpConfig {
    HttpConfig {
        timeout: Duration::from_secs(config.http.timeout_secs),
        user_agent: config.http.user_agent.clone(),
        proxy: config
            .http
            .proxy
            .as_ref()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()),
        retry: RetryPolicy {
            max_attempts: config.http.max_attempts.max(1),
            base_delay: Duration::from_millis(config.http.backoff_base_ms),
            ..RetryPolicy::default()
        },
    }
}

/// Open the configured dedup backend
pub(crate) async fn build_store(config: &AppConfig, client: Client) -> Result<Arc<dyn DedupStore>> {
    let store: Arc<dyn DedupStore> = match config.dedup.backend {
        DedupBackend::Sqlite => Arc::new(
            SqliteDedupStore::new(&config.dedup.sqlite_path)
                .await
                .context("Failed to initialize SQLite dedup store")?,
        ),
        DedupBackend::File => Arc::new(
            JsonFileDedupStore::open(config.dedup.file_path.clone(), config.dedup.max_records)
                .await
                .context("Failed to open JSON dedup file")?,
        ),
        DedupBackend::Rest => {
            let base_url = config
                .dedup
                .rest_url
                .as_deref()
                .filter(|url| !url.trim().is_empty())
                .context("dedup.rest_url is required for the rest backend")?;
            let api_key = load_secret(&config.dedup.rest_api_key_env, "the dedup REST API")?;
            Arc::new(RestDedupStore::new(
                client,
                base_url,
                &config.dedup.rest_table,
                api_key,
            ))
        }
        DedupBackend::Memory => {
            tracing::warn!("In-memory dedup store: seen items are forgotten on restart");
            Arc::new(InMemoryDedupStore::new())
        }
    };

    Ok(store)
}

async fn build_channel(
    config: &AppConfig,
    args: &RunArgs,
    dry_run: bool,
    client: Client,
) -> Result<Arc<dyn MessageChannel>> {
    if let Some(path) = &args.outbox {
        let outbox = OutboxChannel::open(path.clone())
            .await
            .context("Failed to open outbox")?;
        tracing::info!(outbox = %outbox.path().display(), "Writing messages to outbox");
        return Ok(Arc::new(outbox));
    }

    if dry_run {
        return Ok(Arc::new(TelegramChannel::disabled()));
    }

    let token = load_secret(&config.telegram.bot_token_env, "the Telegram bot token")?;
    let channel = TelegramChannel::with_api_base(client, token, &config.telegram.api_base);

    match channel.get_me().await {
        Ok(username) => tracing::info!(bot = %username, "Telegram bot authenticated"),
        Err(SendError::Auth(message)) => bail!("Telegram rejected the bot token: {}", message),
        Err(e) => tracing::warn!(error = %e, "Could not verify Telegram bot token"),
    }

    Ok(Arc::new(channel))
}

fn build_translator(config: &AppConfig) -> Result<Arc<dyn Translator>> {
    if !config.translation.enabled {
        return Ok(Arc::new(NoopTranslator));
    }

    let translate_http = HttpConfig {
        timeout: Duration::from_secs(config.translation.timeout_secs),
        ..http_config(config)
    };
    let client = build_client(&translate_http).context("Failed to build translation client")?;

    Ok(Arc::new(GoogleTranslator::with_api_base(
        client,
        &config.translation.api_base,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_http_config_from_app_config() {
        let mut config = AppConfig::default();
        config.http.timeout_secs = 12;
        config.http.max_attempts = 0;
        config.http.backoff_base_ms = 250;
        config.http.proxy = Some("  ".to_string());

        let http = http_config(&config);
        assert_eq!(http.timeout, Duration::from_secs(12));
        assert_eq!(http.retry.max_attempts, 1);
        assert_eq!(http.retry.base_delay, Duration::from_millis(250));
        assert!(http.proxy.is_none());
    }

    #[tokio::test]
    async fn test_build_file_store() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.dedup.backend = DedupBackend::File;
        config.dedup.file_path = dir.path().join("seen.json");

        let store = build_store(&config, Client::new()).await.unwrap();
        assert!(store.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_rest_store_requires_url() {
        let mut config = AppConfig::default();
        config.dedup.backend = DedupBackend::Rest;
        config.dedup.rest_url = None;

        assert!(build_store(&config, Client::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_shutdown_lets_iteration_finish() {
        let (tx, rx) = watch::channel(false);
        let finished = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let counter = finished.clone();
        poll_until_shutdown(Duration::from_millis(5), rx, move || {
            let counter = counter.clone();
            let tx = tx.clone();
            async move {
                // Signal arrives mid-iteration
                tx.send(true).unwrap();
                tokio::time::sleep(Duration::from_millis(20)).await;
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
        })
        .await;

        assert_eq!(finished.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_raised_flag_skips_first_iteration() {
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let mut calls = 0;
        poll_until_shutdown(Duration::from_millis(5), rx, || {
            calls += 1;
            async {}
        })
        .await;

        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn test_shutdown_listener_starts_clear() {
        let shutdown = spawn_shutdown_listener().await;
        assert!(!stop_requested(&shutdown));
    }

    #[tokio::test]
    async fn test_dry_run_without_token_uses_disabled_channel() {
        let config = AppConfig::default();
        let args = RunArgs {
            dry_run: true,
            once: true,
            outbox: None,
        };

        let channel = build_channel(&config, &args, true, Client::new())
            .await
            .unwrap();
        assert_eq!(channel.platform(), "telegram");
    }
}
