//! Translation adapters

use async_trait::async_trait;
use newsrelay_domain::{TranslateError, Translator};
use reqwest::Client;
use serde_json::Value;

pub const DEFAULT_API_BASE: &str = "https://translate.googleapis.com";

/// The public endpoint rejects longer queries
const MAX_QUERY_CHARS: usize = 5000;

/// Google Translate web endpoint (`client=gtx`), no API key required
pub struct GoogleTranslator {
    client: Client,
    api_base: String,
}

impl GoogleTranslator {
    pub fn new(client: Client) -> Self {
        Self::with_api_base(client, DEFAULT_API_BASE)
    }

    pub fn with_api_base(client: Client, api_base: &str) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

/// Concatenate the translated segments of a `translate_a/single` response.
///
/// The body is a nested array; `body[0]` holds `[translated, original, ...]`
/// segments in order.
fn parse_segments(body: &Value) -> Result<String, TranslateError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslateError::InvalidResponse("missing segment list".to_string()))?;

    let text: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if text.trim().is_empty() {
        return Err(TranslateError::InvalidResponse(
            "empty translation".to_string(),
        ));
    }
    Ok(text)
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, TranslateError> {
        if text.chars().count() > MAX_QUERY_CHARS {
            return Err(TranslateError::Api(format!(
                "Text exceeds {} characters",
                MAX_QUERY_CHARS
            )));
        }

        let url = format!("{}/translate_a/single", self.api_base);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target_language),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| TranslateError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TranslateError::Api(format!(
                "HTTP {}",
                response.status().as_u16()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TranslateError::InvalidResponse(e.to_string()))?;

        parse_segments(&body)
    }
}

/// Returns text unchanged; used when translation is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTranslator;

#[async_trait]
impl Translator for NoopTranslator {
    async fn translate(&self, text: &str, _target_language: &str) -> Result<String, TranslateError> {
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_translate_joins_segments() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/translate_a/single"))
            .and(query_param("client", "gtx"))
            .and(query_param("tl", "ru"))
            .and(query_param("q", "Russia imposes new sanctions. Markets fall."))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                [
                    ["Россия вводит новые санкции. ", "Russia imposes new sanctions. ", null, null, 10],
                    ["Рынки падают.", "Markets fall.", null, null, 10]
                ],
                null,
                "en"
            ])))
            .mount(&server)
            .await;

        let translator = GoogleTranslator::with_api_base(Client::new(), &server.uri());
        let text = translator
            .translate("Russia imposes new sanctions. Markets fall.", "ru")
            .await
            .unwrap();

        assert_eq!(text, "Россия вводит новые санкции. Рынки падают.");
    }

    #[tokio::test]
    async fn test_translate_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/translate_a/single"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let translator = GoogleTranslator::with_api_base(Client::new(), &server.uri());
        let result = translator.translate("hello", "ru").await;
        assert!(matches!(result, Err(TranslateError::Api(_))));
    }

    #[test]
    fn test_parse_segments_rejects_unexpected_shape() {
        assert!(parse_segments(&json!({"error": "nope"})).is_err());
        assert!(parse_segments(&json!([[]])).is_err());
    }

    #[tokio::test]
    async fn test_noop_translator() {
        let text = NoopTranslator.translate("unchanged", "ru").await.unwrap();
        assert_eq!(text, "unchanged");
    }
}
