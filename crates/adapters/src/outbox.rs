//! Outbox channel for review mode: messages go to a JSONL file instead of a platform

use async_trait::async_trait;
use newsrelay_domain::{MessageChannel, OutgoingMessage, SendError, SentMessage};
use serde::Serialize;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Appends one JSON object per delivered message
pub struct OutboxChannel {
    path: PathBuf,
    file: Mutex<fs::File>,
}

#[derive(Serialize)]
struct OutboxEntry<'a> {
    id: &'a str,
    #[serde(with = "time::serde::rfc3339")]
    written_at: OffsetDateTime,
    destination: &'a str,
    format: &'static str,
    item_url: &'a str,
    text: &'a str,
}

impl OutboxChannel {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, OutboxError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, entry: &OutboxEntry<'_>) -> Result<(), OutboxError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl MessageChannel for OutboxChannel {
    async fn send(&self, message: &OutgoingMessage) -> Result<SentMessage, SendError> {
        let id = Uuid::new_v4().to_string();
        let entry = OutboxEntry {
            id: &id,
            written_at: OffsetDateTime::now_utc(),
            destination: &message.destination,
            format: message.format.as_str(),
            item_url: &message.item_url,
            text: &message.text,
        };

        self.append(&entry)
            .await
            .map_err(|error| SendError::Api(format!("Outbox write failed: {}", error)))?;

        Ok(SentMessage { id })
    }

    fn platform(&self) -> &'static str {
        "outbox"
    }
}
