//! HTML page extraction driven by CSS selectors

use newsrelay_domain::{CandidateItem, FetchError, ScrapeRules, canonical_url};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use time::OffsetDateTime;
use url::Url;

use super::collapse_whitespace;

/// Compiled selectors for one source
pub struct CompiledRules {
    block: Selector,
    title: Selector,
    link: Selector,
    summary: Selector,
}

impl CompiledRules {
    pub fn compile(rules: &ScrapeRules) -> Result<Self, FetchError> {
        Ok(Self {
            block: parse_selector("block", &rules.block)?,
            title: parse_selector("title", &rules.title)?,
            link: parse_selector("link", &rules.link)?,
            summary: parse_selector("summary", &rules.summary)?,
        })
    }
}

fn parse_selector(field: &str, selector: &str) -> Result<Selector, FetchError> {
    Selector::parse(selector)
        .map_err(|e| FetchError::Parse(format!("Invalid {} selector '{}': {}", field, selector, e)))
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Extract items from an HTML page, in document order.
///
/// Blocks without a title or a usable link are skipped. A URL that appears
/// in several blocks (nested selectors) is kept once.
pub fn parse_page(
    html: &str,
    rules: &CompiledRules,
    source_name: &str,
    base: &Url,
    fetched_at: OffsetDateTime,
) -> Vec<CandidateItem> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for block in document.select(&rules.block) {
        let Some(title) = block
            .select(&rules.title)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty())
        else {
            continue;
        };

        let Some(url) = block
            .select(&rules.link)
            .filter_map(|a| a.value().attr("href"))
            .next()
            .and_then(|href| base.join(href.trim()).ok())
            .and_then(|u| canonical_url(u.as_str()))
        else {
            continue;
        };

        if !seen.insert(url.clone()) {
            continue;
        }

        let summary = block
            .select(&rules.summary)
            .next()
            .map(element_text)
            .unwrap_or_default();

        items.push(CandidateItem {
            title,
            url,
            summary,
            published_at: None,
            fetched_at,
            source_name: source_name.to_string(),
        });
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><body>
  <article>
    <h2>Kremlin   comments on talks</h2>
    <a href="/news/1">Read more</a>
    <p>Officials met in Geneva.</p>
  </article>
  <article>
    <h2>No link in this block</h2>
    <p>Skipped entirely.</p>
  </article>
  <article>
    <a href="https://other.example/2">Untitled</a>
  </article>
  <div class="post">
    <h3>Absolute link story</h3>
    <a href="https://other.example/3#comments">Full story</a>
  </div>
  <article>
    <h2>Mail link</h2>
    <a href="mailto:desk@example.com">Contact</a>
  </article>
</body></html>"#;

    fn rules() -> CompiledRules {
        CompiledRules::compile(&ScrapeRules::default()).unwrap()
    }

    #[test]
    fn test_extracts_blocks_with_title_and_link() {
        let base = Url::parse("https://site.example/latest/").unwrap();
        let items = parse_page(PAGE, &rules(), "Site", &base, datetime!(2024-05-01 12:00 UTC));

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Kremlin comments on talks");
        assert_eq!(items[0].url, "https://site.example/news/1");
        assert_eq!(items[0].summary, "Officials met in Geneva.");
        assert_eq!(items[0].published_at, None);

        assert_eq!(items[1].title, "Absolute link story");
        assert_eq!(items[1].url, "https://other.example/3");
        assert_eq!(items[1].summary, "");
    }

    #[test]
    fn test_nested_blocks_yield_one_item() {
        let html = r#"<ul><li><article><h4>Nested</h4><a href="/n">x</a></article></li></ul>"#;
        let base = Url::parse("https://site.example/").unwrap();
        let items = parse_page(html, &rules(), "Site", &base, datetime!(2024-05-01 12:00 UTC));

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://site.example/n");
    }

    #[test]
    fn test_invalid_selector_is_rejected() {
        let rules = ScrapeRules {
            block: "article[".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            CompiledRules::compile(&rules),
            Err(FetchError::Parse(_))
        ));
    }
}
