//! Telegram Bot API channel

use async_trait::async_trait;
use newsrelay_domain::{
    MessageChannel, MessageFormat, OutgoingMessage, SendError, SentMessage,
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Hard message limit enforced by the Bot API
pub const TELEGRAM_MAX_CHARS: usize = 4096;

/// Sends messages with the Bot API `sendMessage` method
pub struct TelegramChannel {
    client: Client,
    bot_token: SecretString,
    api_base: String,
    enabled: bool,
}

impl TelegramChannel {
    pub fn new(client: Client, bot_token: SecretString) -> Self {
        Self::with_api_base(client, bot_token, DEFAULT_API_BASE)
    }

    pub fn with_api_base(client: Client, bot_token: SecretString, api_base: &str) -> Self {
        Self {
            client,
            bot_token,
            api_base: api_base.trim_end_matches('/').to_string(),
            enabled: true,
        }
    }

    /// A channel that refuses to send, for dry runs without a bot token
    pub fn disabled() -> Self {
        Self {
            client: Client::new(),
            bot_token: SecretString::new("".into()),
            api_base: String::new(),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base,
            self.bot_token.expose_secret(),
            method
        )
    }

    /// Call `getMe` to confirm the token is valid; returns the bot username
    pub async fn get_me(&self) -> Result<String, SendError> {
        let response = self
            .client
            .get(self.method_url("getMe"))
            .send()
            .await
            .map_err(|e| SendError::Network(redact(&e.to_string(), &self.bot_token)))?;

        if response.status() == 401 || response.status() == 404 {
            return Err(SendError::Auth("Invalid bot token".to_string()));
        }

        let body: ApiResponse<BotUser> = response
            .json()
            .await
            .map_err(|e| SendError::Api(e.to_string()))?;

        match body.result {
            Some(user) if body.ok => Ok(user.username.unwrap_or_default()),
            _ => Err(SendError::Api(
                body.description.unwrap_or_else(|| "getMe failed".to_string()),
            )),
        }
    }
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

#[derive(Deserialize)]
struct MessageResult {
    message_id: i64,
}

#[derive(Deserialize)]
struct BotUser {
    username: Option<String>,
}

/// Keep the token out of error text (reqwest errors include the URL)
fn redact(text: &str, token: &SecretString) -> String {
    let token = token.expose_secret();
    if token.is_empty() {
        return text.to_string();
    }
    text.replace(token, "<redacted>")
}

#[async_trait]
impl MessageChannel for TelegramChannel {
    async fn send(&self, message: &OutgoingMessage) -> Result<SentMessage, SendError> {
        if !self.enabled {
            return Err(SendError::Api("Telegram channel is disabled".to_string()));
        }

        let len = message.text.chars().count();
        if len > TELEGRAM_MAX_CHARS {
            return Err(SendError::ContentTooLong {
                len,
                max: TELEGRAM_MAX_CHARS,
            });
        }

        let request = SendMessageRequest {
            chat_id: &message.destination,
            text: &message.text,
            parse_mode: match message.format {
                MessageFormat::Html => Some(message.format.as_str()),
                MessageFormat::Plain => None,
            },
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&request)
            .send()
            .await
            .map_err(|e| SendError::Network(redact(&e.to_string(), &self.bot_token)))?;

        let status = response.status();
        if status == 401 {
            return Err(SendError::Auth("Invalid bot token".to_string()));
        }

        let body: Option<ApiResponse<MessageResult>> = response.json().await.ok();

        if status == 429 {
            let retry_after = body
                .as_ref()
                .and_then(|b| b.parameters.as_ref())
                .and_then(|p| p.retry_after)
                .map(Duration::from_secs);
            return Err(SendError::RateLimited(retry_after));
        }

        match body {
            Some(ApiResponse {
                ok: true,
                result: Some(result),
                ..
            }) if status.is_success() => Ok(SentMessage {
                id: result.message_id.to_string(),
            }),
            Some(body) => Err(SendError::Api(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.description.unwrap_or_else(|| "request failed".to_string())
            ))),
            None => Err(SendError::Api(format!(
                "HTTP {}: unreadable response",
                status.as_u16()
            ))),
        }
    }

    fn platform(&self) -> &'static str {
        "telegram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message(text: &str) -> OutgoingMessage {
        OutgoingMessage {
            destination: "@newsfeed".to_string(),
            text: text.to_string(),
            format: MessageFormat::Html,
            item_url: "https://x/1".to_string(),
        }
    }

    fn channel(server: &MockServer) -> TelegramChannel {
        TelegramChannel::with_api_base(
            Client::new(),
            SecretString::new("123:abc".into()),
            &server.uri(),
        )
    }

    #[tokio::test]
    async fn test_send_message_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_json(serde_json::json!({
                "chat_id": "@newsfeed",
                "text": "<b>Hello</b>",
                "parse_mode": "HTML",
                "disable_web_page_preview": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": { "message_id": 42, "chat": { "id": -100 } }
            })))
            .mount(&server)
            .await;

        let sent = channel(&server).send(&message("<b>Hello</b>")).await.unwrap();
        assert_eq!(sent.id, "42");
    }

    #[tokio::test]
    async fn test_send_message_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 429,
                "description": "Too Many Requests: retry after 7",
                "parameters": { "retry_after": 7 }
            })))
            .mount(&server)
            .await;

        let result = channel(&server).send(&message("hi")).await;
        assert!(matches!(
            result,
            Err(SendError::RateLimited(Some(d))) if d == Duration::from_secs(7)
        ));
    }

    #[tokio::test]
    async fn test_send_message_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let result = channel(&server).send(&message("hi")).await;
        match result {
            Err(SendError::Api(text)) => assert!(text.contains("chat not found")),
            other => panic!("unexpected result: {:?}", other.map(|m| m.id)),
        }
    }

    #[tokio::test]
    async fn test_send_message_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = channel(&server).send(&message("hi")).await;
        assert!(matches!(result, Err(SendError::Auth(_))));
    }

    #[tokio::test]
    async fn test_oversized_message_is_rejected_locally() {
        let server = MockServer::start().await;
        let text = "x".repeat(TELEGRAM_MAX_CHARS + 1);

        let result = channel(&server).send(&message(&text)).await;
        assert!(matches!(result, Err(SendError::ContentTooLong { .. })));
    }

    #[tokio::test]
    async fn test_get_me() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bot123:abc/getMe"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": { "id": 1, "is_bot": true, "username": "relay_bot" }
            })))
            .mount(&server)
            .await;

        assert_eq!(channel(&server).get_me().await.unwrap(), "relay_bot");
    }

    #[test]
    fn test_redact_hides_token() {
        let token = SecretString::new("123:abc".into());
        assert_eq!(
            redact("error sending request for url (https://api/bot123:abc/sendMessage)", &token),
            "error sending request for url (https://api/bot<redacted>/sendMessage)"
        );
    }

    #[tokio::test]
    async fn test_disabled_channel_refuses_to_send() {
        let channel = TelegramChannel::disabled();

        assert!(!channel.is_enabled());
        let result = channel.send(&message("<b>Hello</b>")).await;
        assert!(matches!(result, Err(SendError::Api(_))));
    }
}
