//! Rendering use case - turns a qualifying item into channel-native message text

use html_escape::{encode_double_quoted_attribute, encode_text};

/// Marker appended to truncated text
pub const ELLIPSIS: &str = "...";

/// Configuration for the renderer
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Hard cap on message length, in characters
    pub max_chars: usize,
    /// Text of the link to the original item
    pub link_text: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_chars: 4000,
            link_text: "Source".to_string(),
        }
    }
}

/// Plain-text fields of a message, before escaping
#[derive(Debug, Clone)]
pub struct MessageParts<'a> {
    pub title: &'a str,
    pub summary: &'a str,
    pub source_name: &'a str,
    pub url: &'a str,
    pub category_label: &'a str,
}

/// Renderer for Telegram-style HTML messages
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn max_chars(&self) -> usize {
        self.config.max_chars
    }

    /// Render a message that never exceeds `max_chars`.
    ///
    /// The summary absorbs truncation first, then the title, so the markup
    /// and the source link survive. A summary with fewer than three
    /// characters of room is dropped, since not even the marker fits. Only a
    /// cap smaller than the markup itself cuts the whole text.
    pub fn render(&self, parts: &MessageParts<'_>) -> String {
        let max_chars = self.config.max_chars;
        let label = encode_text(parts.category_label);
        let tail = format!(
            "<i>{}</i> | <a href=\"{}\">{}</a>",
            encode_text(parts.source_name),
            encode_double_quoted_attribute(parts.url),
            encode_text(&self.config.link_text)
        );
        let title = encode_text(parts.title.trim());

        // Everything except the title and summary, with one "\n\n" before the tail
        let frame = char_len(&compose_head("", &label)) + 2 + char_len(&tail);
        if frame > max_chars {
            return truncate_with_marker(
                &format!("{}\n\n{}", compose_head(&title, &label), tail),
                max_chars,
            );
        }

        let head = compose_head(&fit_escaped(&title, max_chars - frame), &label);

        // Two "\n\n" separators around the summary
        let budget = max_chars.saturating_sub(char_len(&head) + char_len(&tail) + 4);
        let summary = parts.summary.trim();
        if summary.is_empty() || budget < ELLIPSIS.len() {
            return format!("{}\n\n{}", head, tail);
        }

        let body = fit_escaped(&encode_text(summary), budget);
        format!("{}\n\n{}\n\n{}", head, body, tail)
    }
}

fn compose_head(title: &str, label: &str) -> String {
    format!("<b>📰 {}</b>\n\n{}", title, label)
}

/// Fit escaped text into `max_chars`, marking any cut with [`ELLIPSIS`]
fn fit_escaped(text: &str, max_chars: usize) -> String {
    if char_len(text) <= max_chars {
        return text.to_string();
    }
    if max_chars <= ELLIPSIS.len() {
        return ELLIPSIS.chars().take(max_chars).collect();
    }
    format!(
        "{}{}",
        truncate_escaped(text, max_chars - ELLIPSIS.len()),
        ELLIPSIS
    )
}

/// Cut `text` to at most `max_chars` characters, ending with [`ELLIPSIS`] when cut
pub fn truncate_with_marker(text: &str, max_chars: usize) -> String {
    if char_len(text) <= max_chars {
        return text.to_string();
    }

    if max_chars < ELLIPSIS.len() {
        return ELLIPSIS.chars().take(max_chars).collect();
    }

    let mut out: String = text.chars().take(max_chars - ELLIPSIS.len()).collect();
    out.push_str(ELLIPSIS);
    out
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Truncate HTML-escaped text without splitting an entity, preferring a word boundary
fn truncate_escaped(text: &str, max_chars: usize) -> String {
    let cut: String = text.chars().take(max_chars).collect();

    // Drop a dangling, partially cut entity such as "&am"
    let cut = match (cut.rfind('&'), cut.rfind(';')) {
        (Some(amp), Some(semi)) if semi > amp => cut,
        (Some(amp), _) => cut[..amp].to_string(),
        _ => cut,
    };

    // Find a good break point in the last fifth of the text
    let min_break = cut.len() - cut.len() / 5;
    match cut.rfind(char::is_whitespace) {
        Some(idx) if idx >= min_break => cut[..idx].trim_end().to_string(),
        _ => cut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts<'a>(summary: &'a str) -> MessageParts<'a> {
        MessageParts {
            title: "Russia imposes new sanctions",
            summary,
            source_name: "Example Feed",
            url: "https://example.com/1?a=1&b=2",
            category_label: "📊 Sanctions",
        }
    }

    #[test]
    fn test_render_contains_all_parts() {
        let renderer = Renderer::new(RenderConfig::default());
        let text = renderer.render(&parts("The EU adopted a new package."));

        assert!(text.starts_with("<b>📰 Russia imposes new sanctions</b>"));
        assert!(text.contains("📊 Sanctions"));
        assert!(text.contains("The EU adopted a new package."));
        assert!(text.contains("<i>Example Feed</i>"));
        assert!(text.contains("<a href=\"https://example.com/1?a=1&amp;b=2\">Source</a>"));
    }

    #[test]
    fn test_render_escapes_html() {
        let renderer = Renderer::new(RenderConfig::default());
        let text = renderer.render(&MessageParts {
            title: "<script>alert(1)</script> & more",
            ..parts("a < b")
        });

        assert!(text.contains("&lt;script&gt;"));
        assert!(text.contains("&amp; more"));
        assert!(text.contains("a &lt; b"));
        assert!(!text.contains("<script>"));
    }

    #[test]
    fn test_render_omits_empty_summary() {
        let renderer = Renderer::new(RenderConfig::default());
        let text = renderer.render(&parts("   "));

        assert_eq!(text.matches("\n\n").count(), 2);
    }

    #[test]
    fn test_long_summary_is_truncated_within_cap() {
        let renderer = Renderer::new(RenderConfig {
            max_chars: 400,
            ..Default::default()
        });
        let summary = "word ".repeat(500);
        let text = renderer.render(&parts(&summary));

        assert!(text.chars().count() <= 400, "too long: {}", text.chars().count());
        assert!(text.contains(&format!("{}\n\n<i>", ELLIPSIS)));
        assert!(text.ends_with("Source</a>"));
    }

    #[test]
    fn test_truncation_does_not_split_entities() {
        let renderer = Renderer::new(RenderConfig {
            max_chars: 300,
            ..Default::default()
        });
        let summary = "&&&&&&&&".repeat(100);
        let text = renderer.render(&parts(&summary));

        assert!(text.chars().count() <= 300);
        let body = text.split("\n\n").nth(2).unwrap();
        let without_marker = body.strip_suffix(ELLIPSIS).unwrap();
        assert!(without_marker.ends_with("&amp;"));
    }

    #[test]
    fn test_oversized_title_keeps_markup_and_link() {
        let renderer = Renderer::new(RenderConfig::default());
        let long_title = "Missile ".repeat(600);
        let text = renderer.render(&MessageParts {
            title: &long_title,
            ..parts("The launch was reported overnight.")
        });

        assert!(text.chars().count() <= 4000, "too long: {}", text.chars().count());
        assert!(text.starts_with("<b>📰 Missile"));
        assert!(text.contains(&format!("{}</b>", ELLIPSIS)));
        assert_eq!(text.matches("<b>").count(), text.matches("</b>").count());
        assert_eq!(text.matches("<a ").count(), text.matches("</a>").count());
        assert!(text.contains("📊 Sanctions"));
        assert!(text.ends_with("<a href=\"https://example.com/1?a=1&amp;b=2\">Source</a>"));
    }

    #[test]
    fn test_title_truncation_does_not_split_entities() {
        let renderer = Renderer::new(RenderConfig::default());
        let long_title = "&".repeat(2000);
        let text = renderer.render(&MessageParts {
            title: &long_title,
            ..parts("")
        });

        assert!(text.chars().count() <= 4000);
        let title = text
            .strip_prefix("<b>📰 ")
            .and_then(|rest| rest.split("</b>").next())
            .unwrap();
        assert!(title.strip_suffix(ELLIPSIS).unwrap().ends_with("&amp;"));
        assert!(text.ends_with("Source</a>"));
    }

    #[test]
    fn test_tight_summary_budget_keeps_marker() {
        let base_len = Renderer::new(RenderConfig::default())
            .render(&parts(""))
            .chars()
            .count();

        // Exactly three characters of room for the summary
        let renderer = Renderer::new(RenderConfig {
            max_chars: base_len + 2 + ELLIPSIS.len(),
            ..Default::default()
        });
        let text = renderer.render(&parts("The EU adopted a new package."));
        assert!(text.contains(&format!("\n\n{}\n\n<i>", ELLIPSIS)));
        assert!(text.chars().count() <= base_len + 2 + ELLIPSIS.len());

        // Too little room for the marker drops the summary
        let renderer = Renderer::new(RenderConfig {
            max_chars: base_len + 2 + ELLIPSIS.len() - 1,
            ..Default::default()
        });
        let text = renderer.render(&parts("The EU adopted a new package."));
        assert_eq!(text.chars().count(), base_len);
        assert!(!text.contains(ELLIPSIS));
    }

    #[test]
    fn test_cap_below_markup_is_hard_truncated() {
        let renderer = Renderer::new(RenderConfig {
            max_chars: 50,
            ..Default::default()
        });
        let long_title = "T".repeat(200);
        let text = renderer.render(&MessageParts {
            title: &long_title,
            ..parts("summary")
        });

        assert_eq!(text.chars().count(), 50);
        assert!(text.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_truncate_with_marker() {
        assert_eq!(truncate_with_marker("short", 10), "short");

        let long = "x".repeat(5000);
        let cut = truncate_with_marker(&long, 4000);
        assert_eq!(cut.chars().count(), 4000);
        assert!(cut.ends_with(ELLIPSIS));

        let cyrillic = "я".repeat(100);
        let cut = truncate_with_marker(&cyrillic, 10);
        assert_eq!(cut, format!("{}{}", "я".repeat(7), ELLIPSIS));
    }

    #[test]
    fn test_truncate_with_tiny_cap() {
        let cut = truncate_with_marker("abcdef", 2);
        assert_eq!(cut.chars().count(), 2);
    }
}
