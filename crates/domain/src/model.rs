//! Domain models and value objects

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A configured remote origin of candidate items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Unique name within a run, used in logs and messages
    pub name: String,
    /// How the locator is fetched and parsed
    pub kind: SourceKind,
    /// URL of the feed or page
    pub locator: String,
}

impl Source {
    pub fn feed(name: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SourceKind::Feed,
            locator: locator.into(),
        }
    }

    pub fn scrape(name: impl Into<String>, locator: impl Into<String>, rules: ScrapeRules) -> Self {
        Self {
            name: name.into(),
            kind: SourceKind::Scrape(rules),
            locator: locator.into(),
        }
    }
}

/// Fetch strategy for a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceKind {
    /// RSS or Atom syndication document
    Feed,
    /// HTML page with repeating heading + link + paragraph blocks
    Scrape(ScrapeRules),
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Feed => "feed",
            SourceKind::Scrape(_) => "scrape",
        }
    }
}

/// CSS selectors used to pull items out of an HTML page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeRules {
    /// Selector for one repeating item block
    pub block: String,
    /// Selector for the title element inside a block
    pub title: String,
    /// Selector for the link element inside a block (must carry `href`)
    pub link: String,
    /// Selector for the summary element inside a block
    pub summary: String,
}

impl Default for ScrapeRules {
    fn default() -> Self {
        Self {
            block: "article, .post, .item, li".to_string(),
            title: "h1, h2, h3, h4".to_string(),
            link: "a[href]".to_string(),
            summary: "p".to_string(),
        }
    }
}

/// One extracted, not-yet-classified piece of content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub title: String,
    /// Canonical link, never empty
    pub url: String,
    /// Plain-text summary, possibly empty
    pub summary: String,
    /// Publication time reported by the source, if it could be parsed
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    /// When the source was fetched
    #[serde(with = "time::serde::rfc3339")]
    pub fetched_at: OffsetDateTime,
    pub source_name: String,
}

impl CandidateItem {
    /// Publication time, falling back to fetch time when the source gave none
    pub fn effective_published_at(&self) -> OffsetDateTime {
        self.published_at.unwrap_or(self.fetched_at)
    }
}

/// A category definition as written in a taxonomy file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
    /// Stable identifier, `[a-z0-9_]+`
    pub id: String,
    /// Headline shown in messages for items in this category
    pub label: String,
    /// Literal terms matched on word boundaries
    #[serde(default)]
    pub words: Vec<String>,
    /// Literal terms matched anywhere (scripts without word boundaries)
    #[serde(default)]
    pub substrings: Vec<String>,
    /// Raw regular expressions
    #[serde(default)]
    pub regexes: Vec<String>,
}

impl CategorySpec {
    pub fn pattern_count(&self) -> usize {
        self.words.len() + self.substrings.len() + self.regexes.len()
    }
}

/// A taxonomy bucket assigned to an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub label: String,
}

/// Persisted marker that an item URL has been processed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeenRecord {
    /// Canonical URL, the dedup key
    pub url: String,
    pub title: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    pub source_name: String,
    /// Category id
    pub category: String,
    #[serde(with = "time::serde::rfc3339")]
    pub inserted_at: OffsetDateTime,
}

impl SeenRecord {
    pub fn from_item(item: &CandidateItem, category: &Category, inserted_at: OffsetDateTime) -> Self {
        Self {
            url: item.url.clone(),
            title: item.title.clone(),
            description: item.summary.clone(),
            published_at: item.effective_published_at(),
            source_name: item.source_name.clone(),
            category: category.id.clone(),
            inserted_at,
        }
    }
}

/// Result of a dedup store insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new record was written
    Inserted,
    /// The store already held a record for this URL
    AlreadyPresent,
}

/// Delivery outcome for one channel
#[derive(Debug, Clone, Serialize)]
pub struct ChannelOutcome {
    pub channel: String,
    /// Platform message id on success, error text on failure
    pub result: Result<String, String>,
}

/// Per-channel delivery results for one item
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeliveryReport {
    pub outcomes: Vec<ChannelOutcome>,
}

impl DeliveryReport {
    pub fn delivered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.delivered()
    }
}

/// Why an item was not dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Older than the recency window
    Stale,
    /// No category matched
    Unclassified,
    /// Dedup store already has the URL
    AlreadySeen,
    /// Per-run dispatch limit reached
    RunLimit,
    /// Dry run, nothing persisted or sent
    DryRun,
}

/// Processing result for a single candidate item
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// Recorded as seen and handed to the notifier
    Dispatched {
        category: String,
        report: DeliveryReport,
    },
    /// Dropped for this iteration and all later ones (unless the reason is transient)
    Skipped { reason: SkipReason },
    /// Dedup store unavailable; retried on the next iteration
    Deferred { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedItem {
    pub source: String,
    pub url: String,
    pub outcome: ItemOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub error: String,
}

/// Aggregate of one pipeline iteration
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    pub items: Vec<ProcessedItem>,
    pub failed_sources: Vec<SourceFailure>,
}

impl RunSummary {
    pub fn new(run_id: Uuid, started_at: OffsetDateTime) -> Self {
        Self {
            run_id,
            started_at,
            items: vec![],
            failed_sources: vec![],
        }
    }

    pub fn dispatched(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Dispatched { .. }))
    }

    pub fn skipped(&self, reason: SkipReason) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Skipped { reason: r } if *r == reason))
    }

    pub fn deferred(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Deferred { .. }))
    }

    fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.items.iter().filter(|i| pred(&i.outcome)).count()
    }
}

/// Normalize an item link into the dedup key.
///
/// Trims whitespace and drops any `#fragment`. Returns `None` for links that
/// are empty or not http(s).
pub fn canonical_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let without_fragment = match trimmed.find('#') {
        Some(idx) => &trimmed[..idx],
        None => trimmed,
    };

    let lower = without_fragment.to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return None;
    }
    if without_fragment.len() <= "https://".len() {
        return None;
    }

    Some(without_fragment.to_string())
}
