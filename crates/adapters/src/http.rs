//! Shared HTTP client construction and retrying GET

use newsrelay_domain::FetchError;
use reqwest::{Client, Response, StatusCode, header};
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0";

/// Accept header sent with source fetches
pub const SOURCE_ACCEPT: &str =
    "application/rss+xml, application/atom+xml, application/xml;q=0.9, text/html;q=0.8, */*;q=0.7";

/// Retry behaviour for transient failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after the given (1-based) failed attempt
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// HTTP settings shared by every outbound adapter
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: String,
    /// Proxy URL applied to all schemes (http, https or socks5)
    pub proxy: Option<String>,
    pub retry: RetryPolicy,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// Build a client with the configured timeout, user agent and proxy
pub fn build_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.timeout)
        .user_agent(config.user_agent.clone());

    if let Some(proxy) = &config.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
    }

    builder.build()
}

/// Statuses worth another attempt
pub fn is_transient_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn map_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(error.to_string())
    }
}

/// GET a URL, retrying transient statuses and connection failures.
///
/// Returns the first 2xx response. A non-transient status, or a transient
/// one on the last attempt, becomes `FetchError::Status`.
pub async fn get_with_retry(
    client: &Client,
    url: &str,
    accept: &str,
    policy: &RetryPolicy,
) -> Result<Response, FetchError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let result = client
            .get(url)
            .header(header::ACCEPT, accept)
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .send()
            .await;

        let delay = match result {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                let status = response.status();
                if !is_transient_status(status) || attempt >= max_attempts {
                    return Err(FetchError::Status {
                        status: status.as_u16(),
                    });
                }
                let backoff = policy.backoff(attempt);
                match retry_after(&response) {
                    Some(wait) if status == StatusCode::TOO_MANY_REQUESTS => {
                        wait.min(policy.max_delay)
                    }
                    _ => backoff,
                }
            }
            Err(e) => {
                if !is_transient_error(&e) || attempt >= max_attempts {
                    return Err(map_error(e));
                }
                policy.backoff(attempt)
            }
        };

        tracing::warn!(
            url = %url,
            attempt = attempt,
            delay_ms = delay.as_millis() as u64,
            "Transient fetch failure, retrying"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
