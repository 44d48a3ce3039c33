//! RSS/Atom parsing

use newsrelay_domain::{CandidateItem, FetchError, canonical_url};
use time::OffsetDateTime;
use url::Url;

use super::{collapse_whitespace, html_to_text};

const SNIFF_LEN: usize = 512;

/// Whether a response body plausibly holds an XML syndication document
pub fn looks_like_xml(body: &[u8]) -> bool {
    let head = &body[..body.len().min(SNIFF_LEN)];
    let head = String::from_utf8_lossy(head);
    let head = head.trim_start_matches('\u{feff}').trim_start().to_lowercase();

    head.starts_with("<?xml") || ["<rss", "<feed", "<rdf"].iter().any(|tag| head.contains(tag))
}

/// Parse a feed document into candidate items, in document order
pub fn parse_feed(
    body: &[u8],
    source_name: &str,
    base: &Url,
    fetched_at: OffsetDateTime,
) -> Result<Vec<CandidateItem>, FetchError> {
    if !looks_like_xml(body) {
        return Err(FetchError::NotXml);
    }

    let feed = feed_rs::parser::parse(body).map_err(|e| FetchError::Parse(e.to_string()))?;

    let items = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let title = entry
                .title
                .map(|t| collapse_whitespace(&html_to_text(&t.content)))
                .filter(|t| !t.is_empty())?;

            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))?;
            let url = base
                .join(link.trim())
                .ok()
                .and_then(|u| canonical_url(u.as_str()))?;

            let summary = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .map(|s| collapse_whitespace(&html_to_text(&s)))
                .unwrap_or_default();

            let published_at = entry
                .published
                .or(entry.updated)
                .and_then(|dt| OffsetDateTime::from_unix_timestamp(dt.timestamp()).ok());

            Some(CandidateItem {
                title,
                url,
                summary,
                published_at,
                fetched_at,
                source_name: source_name.to_string(),
            })
        })
        .collect();

    Ok(items)
}
