//! HTTP source fetcher for feed and scrape sources

mod feed;
mod scrape;

pub use feed::{looks_like_xml, parse_feed};
pub use scrape::{CompiledRules, parse_page};

use async_trait::async_trait;
use newsrelay_domain::{CandidateItem, FetchError, Source, SourceFetcher, SourceKind};
use reqwest::Client;
use scraper::Html;
use time::OffsetDateTime;
use url::Url;

use crate::http::{HttpConfig, RetryPolicy, SOURCE_ACCEPT, build_client, get_with_retry};

/// Fetches configured sources over HTTP
pub struct HttpSourceFetcher {
    client: Client,
    retry: RetryPolicy,
    max_items_per_source: usize,
}

impl HttpSourceFetcher {
    pub fn new(config: &HttpConfig, max_items_per_source: usize) -> Result<Self, FetchError> {
        let client = build_client(config).map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self {
            client,
            retry: config.retry.clone(),
            max_items_per_source,
        })
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn fetch(&self, source: &Source) -> Result<Vec<CandidateItem>, FetchError> {
        let base = Url::parse(source.locator.trim())
            .map_err(|_| FetchError::InvalidLocator(source.locator.clone()))?;

        // Selectors are checked before any network traffic
        let rules = match &source.kind {
            SourceKind::Scrape(rules) => Some(CompiledRules::compile(rules)?),
            SourceKind::Feed => None,
        };

        tracing::debug!(
            source = %source.name,
            kind = source.kind.as_str(),
            url = %base,
            "Fetching source"
        );

        let response = get_with_retry(&self.client, base.as_str(), SOURCE_ACCEPT, &self.retry).await?;
        let fetched_at = OffsetDateTime::now_utc();

        let mut items = match rules {
            None => {
                let body = response.bytes().await.map_err(|e| FetchError::Network(e.to_string()))?;
                parse_feed(&body, &source.name, &base, fetched_at)?
            }
            Some(rules) => {
                let body = response.text().await.map_err(|e| FetchError::Network(e.to_string()))?;
                parse_page(&body, &rules, &source.name, &base, fetched_at)
            }
        };

        if items.len() > self.max_items_per_source {
            tracing::debug!(
                source = %source.name,
                found = items.len(),
                kept = self.max_items_per_source,
                "Truncating source items"
            );
            items.truncate(self.max_items_per_source);
        }

        Ok(items)
    }
}

/// Visible text of an HTML fragment
pub(crate) fn html_to_text(fragment: &str) -> String {
    if !fragment.contains('<') && !fragment.contains('&') {
        return fragment.to_string();
    }
    Html::parse_fragment(fragment)
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsrelay_domain::ScrapeRules;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>T</title><link>https://t.example</link><description>d</description>
<item><title>One</title><link>https://t.example/1</link></item>
<item><title>Two</title><link>https://t.example/2</link></item>
<item><title>Three</title><link>https://t.example/3</link></item>
</channel></rss>"#;

    fn fetcher(max_items: usize) -> HttpSourceFetcher {
        HttpSourceFetcher::new(
            &HttpConfig {
                retry: RetryPolicy {
                    max_attempts: 3,
                    base_delay: Duration::from_millis(10),
                    max_delay: Duration::from_millis(50),
                },
                ..Default::default()
            },
            max_items,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_feed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss"))
            .and(header("user-agent", crate::http::DEFAULT_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .mount(&server)
            .await;

        let source = Source::feed("T", format!("{}/rss", server.uri()));
        let items = fetcher(50).fetch(&source).await.unwrap();

        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Two", "Three"]);
    }

    #[tokio::test]
    async fn test_fetch_feed_respects_item_cap() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .mount(&server)
            .await;

        let source = Source::feed("T", format!("{}/rss", server.uri()));
        let items = fetcher(2).fetch(&source).await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[1].url, "https://t.example/2");
    }

    #[tokio::test]
    async fn test_fetch_feed_retries_transient_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rss"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .mount(&server)
            .await;

        let source = Source::feed("T", format!("{}/rss", server.uri()));
        let items = fetcher(50).fetch(&source).await.unwrap();
        assert_eq!(items.len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_feed_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = Source::feed("T", format!("{}/rss", server.uri()));
        let result = fetcher(50).fetch(&source).await;
        assert!(matches!(result, Err(FetchError::Status { status: 404 })));
    }

    #[tokio::test]
    async fn test_fetch_feed_html_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html><body>Captcha</body></html>"),
            )
            .mount(&server)
            .await;

        let source = Source::feed("T", format!("{}/rss", server.uri()));
        let result = fetcher(50).fetch(&source).await;
        assert!(matches!(result, Err(FetchError::NotXml)));
    }

    #[tokio::test]
    async fn test_fetch_scrape_resolves_relative_links() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><body><article><h2>Missile launch</h2><a href="/story/9">more</a><p>Summary text</p></article></body></html>"#,
            ))
            .mount(&server)
            .await;

        let source = Source::scrape(
            "Page",
            format!("{}/latest", server.uri()),
            ScrapeRules::default(),
        );
        let items = fetcher(50).fetch(&source).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, format!("{}/story/9", server.uri()));
        assert_eq!(items[0].summary, "Summary text");
    }

    #[tokio::test]
    async fn test_invalid_locator() {
        let source = Source::feed("Bad", "not a url");
        let result = fetcher(50).fetch(&source).await;
        assert!(matches!(result, Err(FetchError::InvalidLocator(_))));
    }

    #[test]
    fn test_html_to_text() {
        assert_eq!(
            collapse_whitespace(&html_to_text("<p>Hello <b>world</b></p>")),
            "Hello world"
        );
        assert_eq!(html_to_text("plain text"), "plain text");
        assert_eq!(html_to_text("a &amp; b"), "a & b");
    }
}
