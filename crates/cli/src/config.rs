//! Configuration loading and management

use anyhow::{Context, Result};
use newsrelay_adapters::fetch::CompiledRules;
use newsrelay_domain::usecases::pipeline::validate_sources;
use newsrelay_domain::{ScrapeRules, Source};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub http: HttpSection,

    #[serde(default)]
    pub taxonomy: TaxonomyConfig,

    #[serde(default)]
    pub dedup: DedupConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub translation: TranslationConfig,

    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub dry_run: bool,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// 0 means unlimited
    #[serde(default = "default_max_items_per_run")]
    pub max_items_per_run: usize,

    #[serde(default = "default_max_items_per_source")]
    pub max_items_per_source: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// 0 disables the recency filter
    #[serde(default = "default_recency_window")]
    pub recency_window_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSection {
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// http://, https:// or socks5:// proxy for all outbound requests
    #[serde(default)]
    pub proxy: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxonomyConfig {
    /// TOML taxonomy file; the built-in taxonomy is used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupBackend {
    Sqlite,
    File,
    Rest,
    Memory,
}

impl DedupBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            DedupBackend::Sqlite => "sqlite",
            DedupBackend::File => "file",
            DedupBackend::Rest => "rest",
            DedupBackend::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    #[serde(default = "default_dedup_backend")]
    pub backend: DedupBackend,

    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,

    #[serde(default = "default_file_path")]
    pub file_path: PathBuf,

    #[serde(default = "default_max_records")]
    pub max_records: usize,

    /// Project root URL, e.g. `https://your-project.supabase.co`
    #[serde(default)]
    pub rest_url: Option<String>,

    #[serde(default = "default_rest_table")]
    pub rest_table: String,

    #[serde(default = "default_rest_api_key_env")]
    pub rest_api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_bot_token_env")]
    pub bot_token_env: String,

    /// Chat ids or @channel usernames
    #[serde(default)]
    pub channels: Vec<String>,

    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,

    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    #[serde(default = "default_delivery_delay_ms")]
    pub delivery_delay_ms: u64,

    #[serde(default = "default_link_text")]
    pub link_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_target_language")]
    pub target_language: String,

    #[serde(default = "default_translate_api_base")]
    pub api_base: String,

    #[serde(default = "default_translate_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKindConfig {
    Feed,
    Scrape,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,

    #[serde(default = "default_source_kind")]
    pub kind: SourceKindConfig,

    pub url: String,

    /// Scrape selectors; unset fields fall back to generic defaults
    #[serde(default)]
    pub selectors: Option<SelectorsConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorsConfig {
    #[serde(default)]
    pub block: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl SelectorsConfig {
    fn to_rules(&self) -> ScrapeRules {
        let defaults = ScrapeRules::default();
        ScrapeRules {
            block: self.block.clone().unwrap_or(defaults.block),
            title: self.title.clone().unwrap_or(defaults.title),
            link: self.link.clone().unwrap_or(defaults.link),
            summary: self.summary.clone().unwrap_or(defaults.summary),
        }
    }
}

impl SourceConfig {
    /// Convert to a domain source, checking the locator is an http(s) URL
    pub fn to_source(&self) -> Result<Source> {
        let parsed = url::Url::parse(&self.url)
            .with_context(|| format!("Source '{}' has an invalid URL: {}", self.name, self.url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!(
                "Source '{}' URL must be http or https: {}",
                self.name,
                self.url
            );
        }

        Ok(match self.kind {
            SourceKindConfig::Feed => Source::feed(&self.name, &self.url),
            SourceKindConfig::Scrape => {
                let rules = self.selectors.clone().unwrap_or_default().to_rules();
                CompiledRules::compile(&rules)
                    .with_context(|| format!("Source '{}' has invalid selectors", self.name))?;
                Source::scrape(&self.name, &self.url, rules)
            }
        })
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_max_items_per_run() -> usize {
    7
}

fn default_max_items_per_source() -> usize {
    50
}

fn default_poll_interval() -> u64 {
    900
}

fn default_recency_window() -> u64 {
    6 * 60 * 60
}

fn default_http_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_user_agent() -> String {
    newsrelay_adapters::http::DEFAULT_USER_AGENT.to_string()
}

fn default_dedup_backend() -> DedupBackend {
    DedupBackend::Sqlite
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./seen.sqlite")
}

fn default_file_path() -> PathBuf {
    PathBuf::from("./seen_links.json")
}

fn default_max_records() -> usize {
    newsrelay_adapters::dedup::DEFAULT_MAX_RECORDS
}

fn default_rest_table() -> String {
    newsrelay_adapters::dedup::DEFAULT_TABLE.to_string()
}

fn default_rest_api_key_env() -> String {
    "DEDUP_API_KEY".to_string()
}

fn default_bot_token_env() -> String {
    "TELEGRAM_TOKEN".to_string()
}

fn default_telegram_api_base() -> String {
    newsrelay_adapters::telegram::DEFAULT_API_BASE.to_string()
}

fn default_max_chars() -> usize {
    4000
}

fn default_delivery_delay_ms() -> u64 {
    1500
}

fn default_link_text() -> String {
    "Источник".to_string()
}

fn default_target_language() -> String {
    "ru".to_string()
}

fn default_translate_api_base() -> String {
    newsrelay_adapters::translate::DEFAULT_API_BASE.to_string()
}

fn default_translate_timeout() -> u64 {
    15
}

fn default_source_kind() -> SourceKindConfig {
    SourceKindConfig::Feed
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            log_level: default_log_level(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            max_items_per_run: default_max_items_per_run(),
            max_items_per_source: default_max_items_per_source(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            recency_window_secs: default_recency_window(),
        }
    }
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            user_agent: default_user_agent(),
            proxy: None,
        }
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            backend: default_dedup_backend(),
            sqlite_path: default_sqlite_path(),
            file_path: default_file_path(),
            max_records: default_max_records(),
            rest_url: None,
            rest_table: default_rest_table(),
            rest_api_key_env: default_rest_api_key_env(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token_env: default_bot_token_env(),
            channels: vec![],
            api_base: default_telegram_api_base(),
            max_chars: default_max_chars(),
            delivery_delay_ms: default_delivery_delay_ms(),
            link_text: default_link_text(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            target_language: default_target_language(),
            api_base: default_translate_api_base(),
            timeout_secs: default_translate_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        builder = builder.add_source(
            config::Environment::with_prefix("NEWSRELAY")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Domain sources in configured order, with names and URLs validated
    pub fn domain_sources(&self) -> Result<Vec<Source>> {
        let sources = self
            .sources
            .iter()
            .map(SourceConfig::to_source)
            .collect::<Result<Vec<_>>>()?;
        validate_sources(&sources)?;
        Ok(sources)
    }

    /// `None` when the recency filter is disabled
    pub fn recency_window(&self) -> Option<time::Duration> {
        match self.schedule.recency_window_secs {
            0 => None,
            secs => Some(time::Duration::seconds(
                i64::try_from(secs).unwrap_or(i64::MAX),
            )),
        }
    }

    /// `None` when the per-run limit is disabled
    pub fn max_items_per_run(&self) -> Option<usize> {
        match self.general.max_items_per_run {
            0 => None,
            n => Some(n),
        }
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# newsrelay configuration

[general]
dry_run = false
log_level = "info"
max_concurrent_fetches = 4
# 0 = unlimited
max_items_per_run = 7
max_items_per_source = 50

[schedule]
poll_interval_secs = 900
# Items older than this are ignored; 0 disables the filter
recency_window_secs = 21600

[http]
timeout_secs = 30
max_attempts = 3
backoff_base_ms = 1000
# proxy = "socks5://127.0.0.1:1080"

[taxonomy]
# Built-in taxonomy is used when unset. Export it with `newsrelay taxonomy export`.
# path = "./taxonomy.toml"

[dedup]
backend = "sqlite"  # sqlite, file, rest, memory
sqlite_path = "./seen.sqlite"
file_path = "./seen_links.json"
max_records = 5000
# Project root; "/rest/v1/<rest_table>" is appended
# rest_url = "https://your-project.supabase.co"
rest_table = "seen_items"
rest_api_key_env = "DEDUP_API_KEY"

[telegram]
bot_token_env = "TELEGRAM_TOKEN"
channels = ["@your_channel"]
max_chars = 4000
delivery_delay_ms = 1500
link_text = "Источник"

[translation]
enabled = true
target_language = "ru"
timeout_secs = 15

[[sources]]
name = "BBC World"
kind = "feed"
url = "https://feeds.bbci.co.uk/news/world/rss.xml"

[[sources]]
name = "Reuters World"
kind = "feed"
url = "https://www.reutersagency.com/feed/?best-topics=political-general&post_type=best"

# [[sources]]
# name = "Example page"
# kind = "scrape"
# url = "https://example.com/news"
# [sources.selectors]
# block = "article"
# title = "h2"
# link = "a[href]"
# summary = "p"
"#
        .to_string()
    }
}
