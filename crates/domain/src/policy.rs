//! Admission policies for candidate items

use time::{Duration, OffsetDateTime};

use crate::model::CandidateItem;

/// Whether an item is young enough to process.
///
/// Items without a publication time are always recent; unknown age never
/// suppresses content. Items dated in the future are recent.
pub fn is_recent(item: &CandidateItem, max_age: Duration, now: OffsetDateTime) -> bool {
    match item.published_at {
        Some(published_at) => now - published_at <= max_age,
        None => true,
    }
}

/// Recency window applied by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyPolicy {
    /// `None` disables the filter
    pub max_age: Option<Duration>,
}

impl RecencyPolicy {
    pub fn new(max_age: Option<Duration>) -> Self {
        Self { max_age }
    }

    pub fn admits(&self, item: &CandidateItem, now: OffsetDateTime) -> bool {
        match self.max_age {
            Some(max_age) => is_recent(item, max_age, now),
            None => true,
        }
    }
}

impl Default for RecencyPolicy {
    fn default() -> Self {
        Self {
            max_age: Some(Duration::hours(6)),
        }
    }
}
