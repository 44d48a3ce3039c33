//! REST dedup store for PostgREST-style table APIs (e.g., Supabase)

use async_trait::async_trait;
use newsrelay_domain::{DedupError, DedupStore, InsertOutcome, SeenRecord};
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};

pub const DEFAULT_TABLE: &str = "seen_items";

const REST_PREFIX: &str = "/rest/v1";

/// Dedup store backed by a remote `seen_items` table with a unique `url` column
pub struct RestDedupStore {
    client: Client,
    base_url: String,
    table: String,
    api_key: SecretString,
}

impl RestDedupStore {
    /// `base_url` is the project root; a trailing `/rest/v1` is accepted and dropped
    pub fn new(client: Client, base_url: &str, table: &str, api_key: SecretString) -> Self {
        let base_url = base_url.trim_end_matches('/');
        let base_url = base_url
            .strip_suffix(REST_PREFIX)
            .unwrap_or(base_url)
            .trim_end_matches('/');

        Self {
            client,
            base_url: base_url.to_string(),
            table: table.to_string(),
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}{}/{}", self.base_url, REST_PREFIX, self.table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let key = self.api_key.expose_secret();
        request
            .header("apikey", key)
            .header("Authorization", format!("Bearer {}", key))
    }

    async fn error_from(response: reqwest::Response) -> DedupError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        DedupError::Backend(format!("HTTP {}: {}", status.as_u16(), body.trim()))
    }
}

#[async_trait]
impl DedupStore for RestDedupStore {
    async fn exists(&self, url: &str) -> Result<bool, DedupError> {
        let filter = format!("eq.{}", url);
        let response = self
            .authorized(self.client.get(self.endpoint()))
            .query(&[("url", filter.as_str()), ("select", "url"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| DedupError::Backend(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let rows: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| DedupError::Serialization(e.to_string()))?;

        Ok(!rows.is_empty())
    }

    async fn insert(&self, record: &SeenRecord) -> Result<InsertOutcome, DedupError> {
        let response = self
            .authorized(self.client.post(self.endpoint()))
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .map_err(|e| DedupError::Backend(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(InsertOutcome::Inserted),
            StatusCode::CONFLICT => Ok(InsertOutcome::AlreadyPresent),
            _ => Err(Self::error_from(response).await),
        }
    }

    async fn health_check(&self) -> Result<(), DedupError> {
        let response = self
            .authorized(self.client.get(self.endpoint()))
            .query(&[("select", "url"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| DedupError::Backend(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "rest"
    }
}
