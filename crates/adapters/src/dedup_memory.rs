//! In-memory dedup store for testing and dry runs

use async_trait::async_trait;
use newsrelay_domain::{DedupError, DedupStore, InsertOutcome, SeenRecord};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory dedup store implementation
pub struct InMemoryDedupStore {
    records: RwLock<HashMap<String, SeenRecord>>,
}

impl InMemoryDedupStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryDedupStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DedupStore for InMemoryDedupStore {
    async fn exists(&self, url: &str) -> Result<bool, DedupError> {
        let records = self
            .records
            .read()
            .map_err(|e| DedupError::Backend(e.to_string()))?;
        Ok(records.contains_key(url))
    }

    async fn insert(&self, record: &SeenRecord) -> Result<InsertOutcome, DedupError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| DedupError::Backend(e.to_string()))?;
        if records.contains_key(&record.url) {
            return Ok(InsertOutcome::AlreadyPresent);
        }
        records.insert(record.url.clone(), record.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn health_check(&self) -> Result<(), DedupError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
