//! HTTP request sending and transport retry
//!
//! Opens a vendor stream. Retries (connection failures, 429 with
//! `Retry-After`) only ever happen before the first byte of a successful
//! response has been handed to a parser; once streaming has started, a
//! failure ends the call.

use reqwest::Client;
use serde::Serialize;
use std::time::{Duration, SystemTime};

use crate::error::{GatewayError, Result};

/// Retry budget for opening a vendor stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub retry_delay_ms: u64,
    pub max_retry_delay_ms: u64,
}

impl RetryPolicy {
    /// Single attempt, no retry.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            retry_delay_ms: 0,
            max_retry_delay_ms: 0,
        }
    }
}

/// Only connection failures are retried
fn is_retryable_error(error: &GatewayError) -> bool {
    match error {
        GatewayError::Llm(msg) => msg.to_lowercase().contains("connection failed"),
        _ => false,
    }
}

/// Parse a `Retry-After` header value
///
/// Accepts either seconds (`120`) or an HTTP date
/// (`Wed, 21 Oct 2015 07:28:00 GMT`). Dates in the past yield 0.
fn parse_retry_after(value: &str) -> Option<u64> {
    if let Ok(secs) = value.parse::<u64>() {
        return Some(secs);
    }

    if let Ok(date) = httpdate::parse_http_date(value) {
        let now = SystemTime::now();
        return Some(date.duration_since(now).map(|d| d.as_secs()).unwrap_or(0));
    }

    None
}

/// Sends one request (handles network-level errors only)
async fn try_send_request<Req: Serialize>(
    client: &Client,
    endpoint: &str,
    headers: &[(&str, &str)],
    request_body: &Req,
    provider_name: &str,
) -> Result<reqwest::Response> {
    let mut req = client
        .post(endpoint)
        .header("Content-Type", "application/json");

    for (key, value) in headers {
        req = req.header(*key, *value);
    }

    tracing::debug!("Sending request to: {}", endpoint);

    req.json(request_body).send().await.map_err(|e| {
        let error_details = e.to_string();

        if e.is_timeout() {
            tracing::debug!("{} API request failed [timeout]: {}", provider_name, error_details);
            GatewayError::Llm(format!(
                "{provider_name} API request timed out: {error_details}"
            ))
        } else if e.is_connect() {
            tracing::debug!(
                "{} API request failed [connection failed]: {}",
                provider_name,
                error_details
            );
            GatewayError::Llm(format!(
                "{provider_name} API connection failed: {error_details}"
            ))
        } else {
            tracing::debug!("{} API request failed: {}", provider_name, error_details);
            GatewayError::Network(e)
        }
    })
}

/// Opens a streaming vendor response
///
/// Returns the response once a 2xx status is received. Any other status is
/// turned into [`GatewayError::LlmApi`] with the body text prefixed by the
/// provider name, so the status code and vendor wording both reach the
/// error classifier.
pub async fn send_streaming_request<Req: Serialize>(
    client: &Client,
    endpoint: &str,
    headers: &[(&str, &str)],
    request_body: &Req,
    provider_name: &str,
    policy: RetryPolicy,
) -> Result<reqwest::Response> {
    let mut attempt = 0;

    loop {
        attempt += 1;

        let response =
            match try_send_request(client, endpoint, headers, request_body, provider_name).await {
                Ok(resp) => resp,
                Err(e) => {
                    if !is_retryable_error(&e) || attempt > policy.max_retries {
                        return Err(e);
                    }

                    let delay = calculate_exponential_backoff(
                        attempt,
                        policy.retry_delay_ms,
                        policy.max_retry_delay_ms,
                    );
                    tracing::warn!(
                        "{} API network error (attempt {}/{}): {}. Retrying in {:.1}s...",
                        provider_name,
                        attempt,
                        policy.max_retries + 1,
                        e,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
            };

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS && attempt <= policy.max_retries {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| {
                    let parsed = parse_retry_after(v);
                    if parsed.is_none() {
                        tracing::warn!("Ignoring invalid Retry-After header: {}", v);
                    }
                    parsed
                });

            let delay = match retry_after {
                Some(secs) if secs.saturating_mul(1000) > policy.max_retry_delay_ms => {
                    let body = read_body(response).await;
                    tracing::warn!(
                        "{} asked to retry after {}s, above the {}ms limit",
                        provider_name,
                        secs,
                        policy.max_retry_delay_ms
                    );
                    return Err(GatewayError::LlmApi {
                        status: 429,
                        message: format!("{provider_name}: {body}"),
                    });
                }
                Some(secs) => Duration::from_secs(secs),
                None => calculate_exponential_backoff(
                    attempt,
                    policy.retry_delay_ms,
                    policy.max_retry_delay_ms,
                ),
            };

            tracing::warn!(
                "{} API rate limited (attempt {}/{}). Retrying in {:.1}s...",
                provider_name,
                attempt,
                policy.max_retries + 1,
                delay.as_secs_f64()
            );
            tokio::time::sleep(delay).await;
            continue;
        }

        tracing::debug!("{} API response status: {}", provider_name, status);

        if !status.is_success() {
            let body = read_body(response).await;
            tracing::debug!("{} API error body: {}", provider_name, body);
            return Err(GatewayError::LlmApi {
                status: status.as_u16(),
                message: format!("{provider_name}: {body}"),
            });
        }

        if attempt > 1 {
            tracing::debug!(
                "{} API request succeeded after {} attempts",
                provider_name,
                attempt
            );
        }

        return Ok(response);
    }
}

async fn read_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|e| format!("<body read error: {}>", e))
}

/// Exponential backoff delay
fn calculate_exponential_backoff(
    attempt: usize,
    retry_delay_ms: u64,
    max_retry_delay_ms: u64,
) -> Duration {
    const MIN_RETRY_DELAY_MS: u64 = 100;
    let multiplier = 1u64.checked_shl((attempt - 1) as u32).unwrap_or(u64::MAX);
    let delay_ms = retry_delay_ms
        .saturating_mul(multiplier)
        .min(max_retry_delay_ms)
        .max(MIN_RETRY_DELAY_MS);
    Duration::from_millis(delay_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::test_utils::ensure_crypto_provider;
    use mockito::Server;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_is_retryable_connection_failed() {
        let err = GatewayError::Llm("Claude API connection failed: refused".to_string());
        assert!(is_retryable_error(&err));
    }

    #[test]
    fn test_is_retryable_other_errors() {
        let err = GatewayError::LlmApi {
            status: 500,
            message: "Claude: Internal server error".to_string(),
        };
        assert!(!is_retryable_error(&err));

        let err = GatewayError::Llm("Claude API request timed out".to_string());
        assert!(!is_retryable_error(&err));
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("120"), Some(120));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), Some(0));
        assert_eq!(parse_retry_after("soon"), None);
    }

    #[test]
    fn test_exponential_backoff() {
        assert_eq!(
            calculate_exponential_backoff(1, 1000, 60_000),
            Duration::from_millis(1000)
        );
        assert_eq!(
            calculate_exponential_backoff(3, 1000, 60_000),
            Duration::from_millis(4000)
        );
        assert_eq!(
            calculate_exponential_backoff(20, 1000, 60_000),
            Duration::from_millis(60_000)
        );
        assert_eq!(
            calculate_exponential_backoff(1, 0, 60_000),
            Duration::from_millis(100)
        );
    }

    #[tokio::test]
    async fn test_non_success_status_becomes_llm_api_error() {
        ensure_crypto_provider();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(401)
            .with_body(r#"{"error":{"message":"invalid x-api-key"}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = Client::new();
        let err = send_streaming_request(
            &client,
            &format!("{}/v1/messages", server.url()),
            &[],
            &serde_json::json!({}),
            "Claude",
            RetryPolicy::none(),
        )
        .await
        .unwrap_err();

        match err {
            GatewayError::LlmApi { status, message } => {
                assert_eq!(status, 401);
                assert!(message.starts_with("Claude: "));
                assert!(message.contains("invalid x-api-key"));
            }
            other => panic!("Expected LlmApi, got {:?}", other),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_429_without_budget_is_not_retried() {
        ensure_crypto_provider();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body("Rate limit reached")
            .expect(1)
            .create_async()
            .await;

        let client = Client::new();
        let err = send_streaming_request(
            &client,
            &format!("{}/v1/chat/completions", server.url()),
            &[],
            &serde_json::json!({}),
            "OpenAI",
            RetryPolicy::none(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, GatewayError::LlmApi { status: 429, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_429_retry_after_above_limit_gives_up() {
        ensure_crypto_provider();
        let mut server = Server::new_async().await;
        let limited = server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_header("Retry-After", "120")
            .with_body("slow down")
            .expect(1)
            .create_async()
            .await;

        let client = Client::new();
        let policy = RetryPolicy {
            max_retries: 3,
            retry_delay_ms: 10,
            max_retry_delay_ms: 1000,
        };

        let err = send_streaming_request(
            &client,
            &format!("{}/v1/chat/completions", server.url()),
            &[],
            &serde_json::json!({}),
            "OpenAI",
            policy,
        )
        .await
        .unwrap_err();

        match err {
            GatewayError::LlmApi { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "OpenAI: slow down");
            }
            other => panic!("Expected LlmApi, got {:?}", other),
        }
        limited.assert_async().await;
    }
}
