//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{CandidateItem, CategorySpec, InsertOutcome, SeenRecord, Source};

/// Error type for source fetches
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out")]
    Timeout,
    #[error("HTTP status {status}")]
    Status { status: u16 },
    #[error("Response is not an XML document")]
    NotXml,
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid locator '{0}'")]
    InvalidLocator(String),
}

/// Port for turning one configured source into candidate items
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch the items currently published by a source, in document order
    async fn fetch(&self, source: &Source) -> Result<Vec<CandidateItem>, FetchError>;
}

/// Error type for dedup store operations
#[derive(Debug, Error)]
pub enum DedupError {
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Port for the persistent record of already-processed URLs
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Whether a record for this canonical URL exists
    async fn exists(&self, url: &str) -> Result<bool, DedupError>;

    /// Record a URL as seen. A uniqueness conflict is `AlreadyPresent`, not an error
    async fn insert(&self, record: &SeenRecord) -> Result<InsertOutcome, DedupError>;

    /// Verify the backend is reachable
    async fn health_check(&self) -> Result<(), DedupError>;

    /// Backend name for logs (e.g., "sqlite", "file")
    fn backend(&self) -> &'static str;
}

/// Error type for channel sends
#[derive(Debug, Error)]
pub enum SendError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limited, retry after: {0:?}")]
    RateLimited(Option<Duration>),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Content too long: {len} > {max}")]
    ContentTooLong { len: usize, max: usize },
    #[error("Network error: {0}")]
    Network(String),
}

/// Inline formatting of an outgoing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageFormat {
    #[default]
    Html,
    Plain,
}

impl MessageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageFormat::Html => "HTML",
            MessageFormat::Plain => "plain",
        }
    }
}

/// A formatted message addressed to one destination
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    /// Channel identifier (e.g., "@channel" or a chat id)
    pub destination: String,
    pub text: String,
    pub format: MessageFormat,
    /// Link of the item the message is about
    pub item_url: String,
}

/// Result of a successful send
#[derive(Debug, Clone)]
pub struct SentMessage {
    /// Platform-specific message id
    pub id: String,
}

/// Port for a message delivery API
#[async_trait]
pub trait MessageChannel: Send + Sync {
    async fn send(&self, message: &OutgoingMessage) -> Result<SentMessage, SendError>;

    /// Platform name (e.g., "telegram", "outbox")
    fn platform(&self) -> &'static str;
}

/// Error type for translation
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Port for best-effort text translation
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, TranslateError>;
}

/// Error type for taxonomy loading and compilation
#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },
    #[error("Taxonomy has no categories")]
    Empty,
    #[error("Duplicate category ID '{id}'")]
    DuplicateId { id: String },
    #[error("Invalid category ID '{id}': must match [a-z0-9_]+")]
    InvalidId { id: String },
    #[error("Category '{category}' has no patterns")]
    NoPatterns { category: String },
    #[error("Category '{category}' has an empty pattern")]
    EmptyPattern { category: String },
    #[error("Invalid pattern '{pattern}' in category '{category}': {message}")]
    InvalidPattern {
        category: String,
        pattern: String,
        message: String,
    },
}

/// Port for loading the keyword taxonomy
#[async_trait]
pub trait TaxonomyRepo: Send + Sync {
    /// Load category specs in priority order
    async fn load(&self) -> Result<Vec<CategorySpec>, TaxonomyError>;

    /// Human-readable origin of the taxonomy (file path or "builtin")
    fn origin(&self) -> String;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
