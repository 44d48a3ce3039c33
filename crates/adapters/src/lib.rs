//! newsrelay adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `fetch`: HTTP fetcher for RSS/Atom feeds and scraped HTML pages
//! - `dedup`: SQLite, REST, JSON-file and in-memory dedup stores
//! - `telegram`: Telegram Bot API channel
//! - `outbox`: JSONL outbox channel for review mode
//! - `translate`: Google Translate and no-op translators
//! - `taxonomy`: TOML file and built-in taxonomy loaders

mod dedup_file;
mod dedup_memory;
mod dedup_rest;
mod dedup_sqlite;
mod taxonomy_fs;

pub mod fetch;
pub mod http;
pub mod outbox;
pub mod telegram;
pub mod translate;

/// Re-exports for dedup adapters
pub mod dedup {
    pub use crate::dedup_file::{DEFAULT_MAX_RECORDS, JsonFileDedupStore};
    pub use crate::dedup_memory::InMemoryDedupStore;
    pub use crate::dedup_rest::{DEFAULT_TABLE, RestDedupStore};
    pub use crate::dedup_sqlite::SqliteDedupStore;
}

/// Re-exports for taxonomy adapters
pub mod taxonomy {
    pub use crate::taxonomy_fs::{BuiltinTaxonomyRepo, FsTaxonomyRepo, TaxonomyFile, to_toml};
}
