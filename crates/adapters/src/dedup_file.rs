//! JSON file dedup store, the local fallback backend

use async_trait::async_trait;
use newsrelay_domain::{DedupError, DedupStore, InsertOutcome, SeenRecord};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

pub const DEFAULT_MAX_RECORDS: usize = 5000;

/// One entry on disk. Bare URL strings are accepted for files written by
/// older versions that only kept links.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum FileEntry {
    Record(SeenRecord),
    Url(String),
}

impl FileEntry {
    fn url(&self) -> &str {
        match self {
            FileEntry::Record(record) => &record.url,
            FileEntry::Url(url) => url,
        }
    }
}

struct State {
    /// Oldest first
    entries: VecDeque<FileEntry>,
    urls: HashSet<String>,
}

/// Capped JSON array of records, rewritten atomically on every insert
pub struct JsonFileDedupStore {
    path: PathBuf,
    max_records: usize,
    state: Mutex<State>,
}

impl JsonFileDedupStore {
    /// Load the store from `path`; a missing file starts empty
    pub async fn open(path: impl Into<PathBuf>, max_records: usize) -> Result<Self, DedupError> {
        let path = path.into();
        let max_records = max_records.max(1);

        let mut entries: VecDeque<FileEntry> = match fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => VecDeque::new(),
            Ok(bytes) => serde_json::from_slice::<Vec<FileEntry>>(&bytes)
                .map_err(|e| {
                    DedupError::Serialization(format!("{}: {}", path.display(), e))
                })?
                .into(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => VecDeque::new(),
            Err(e) => return Err(DedupError::Io(e)),
        };

        while entries.len() > max_records {
            entries.pop_front();
        }
        let urls = entries.iter().map(|e| e.url().to_string()).collect();

        tracing::debug!(path = %path.display(), records = entries.len(), "Loaded dedup file");

        Ok(Self {
            path,
            max_records,
            state: Mutex::new(State { entries, urls }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    async fn persist(&self, entries: &VecDeque<FileEntry>) -> Result<(), DedupError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| DedupError::Serialization(e.to_string()))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl DedupStore for JsonFileDedupStore {
    async fn exists(&self, url: &str) -> Result<bool, DedupError> {
        Ok(self.state.lock().await.urls.contains(url))
    }

    async fn insert(&self, record: &SeenRecord) -> Result<InsertOutcome, DedupError> {
        let mut state = self.state.lock().await;
        if state.urls.contains(&record.url) {
            return Ok(InsertOutcome::AlreadyPresent);
        }

        // Commit in memory only once the file is written
        let mut entries = state.entries.clone();
        entries.push_back(FileEntry::Record(record.clone()));
        let mut evicted = Vec::new();
        while entries.len() > self.max_records {
            if let Some(old) = entries.pop_front() {
                evicted.push(old.url().to_string());
            }
        }

        self.persist(&entries).await?;

        for url in &evicted {
            state.urls.remove(url);
        }
        state.urls.insert(record.url.clone());
        state.entries = entries;

        Ok(InsertOutcome::Inserted)
    }

    async fn health_check(&self) -> Result<(), DedupError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).await?;
        let metadata = fs::metadata(&dir).await?;
        if metadata.permissions().readonly() {
            return Err(DedupError::Backend(format!(
                "Directory {} is read-only",
                dir.display()
            )));
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use time::OffsetDateTime;

    fn record(url: &str) -> SeenRecord {
        SeenRecord {
            url: url.to_string(),
            title: "Title".to_string(),
            description: String::new(),
            published_at: OffsetDateTime::now_utc(),
            source_name: "Wire".to_string(),
            category: "military".to_string(),
            inserted_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileDedupStore::open(dir.path().join("seen.json"), 10)
            .await
            .unwrap();

        assert_eq!(store.len().await, 0);
        assert!(!store.exists("https://x/1").await.unwrap());
        store.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_records_persist_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen.json");

        let store = JsonFileDedupStore::open(&path, 10).await.unwrap();
        assert_eq!(
            store.insert(&record("https://x/1")).await.unwrap(),
            InsertOutcome::Inserted
        );
        assert_eq!(
            store.insert(&record("https://x/1")).await.unwrap(),
            InsertOutcome::AlreadyPresent
        );
        drop(store);

        let reopened = JsonFileDedupStore::open(&path, 10).await.unwrap();
        assert!(reopened.exists("https://x/1").await.unwrap());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_oldest_records_are_evicted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen.json");

        let store = JsonFileDedupStore::open(&path, 3).await.unwrap();
        for i in 0..5 {
            store
                .insert(&record(&format!("https://x/{}", i)))
                .await
                .unwrap();
        }

        assert_eq!(store.len().await, 3);
        assert!(!store.exists("https://x/0").await.unwrap());
        assert!(!store.exists("https://x/1").await.unwrap());
        assert!(store.exists("https://x/4").await.unwrap());

        let reopened = JsonFileDedupStore::open(&path, 3).await.unwrap();
        assert_eq!(reopened.len().await, 3);
        assert!(reopened.exists("https://x/2").await.unwrap());
    }

    #[tokio::test]
    async fn test_reads_legacy_url_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen_links.json");
        std::fs::write(&path, r#"["https://old/1", "https://old/2"]"#).unwrap();

        let store = JsonFileDedupStore::open(&path, 10).await.unwrap();
        assert!(store.exists("https://old/1").await.unwrap());

        store.insert(&record("https://x/new")).await.unwrap();
        let reopened = JsonFileDedupStore::open(&path, 10).await.unwrap();
        assert_eq!(reopened.len().await, 3);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen.json");
        std::fs::write(&path, "{not json").unwrap();

        let result = JsonFileDedupStore::open(&path, 10).await;
        assert!(matches!(result, Err(DedupError::Serialization(_))));
    }
}
