use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::base::{RetryPolicy, send_streaming_request};
use super::streaming::process_gemini_stream;
use super::utils::{gemini_stream_endpoint, mask_api_key};
use crate::config::{NetworkConfig, ProvidersConfig};
use crate::error::Result;
use crate::llm::{FragmentSink, StreamingProvider};

/// Google Gemini API adapter
///
/// Streams `POST {base}/v1beta/models/{model}:streamGenerateContent?alt=sse`
/// authenticated with the `x-goog-api-key` header.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    retry: RetryPolicy,
}

// ============================================================================
// Request structure
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    system_instruction: GeminiContent<'a>,
    contents: Vec<GeminiContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

impl GeminiProvider {
    pub fn new(
        api_key: &str,
        model: &str,
        providers: &ProvidersConfig,
        network_config: &NetworkConfig,
    ) -> Result<Self> {
        Ok(Self {
            client: super::create_http_client(network_config)?,
            api_key: api_key.to_string(),
            endpoint: gemini_stream_endpoint(providers.google_base(), model),
            model: model.to_string(),
            retry: network_config.retry_policy(),
        })
    }

    fn build_request<'a>(
        system: &'a str,
        user_message: &'a str,
        max_tokens: u32,
    ) -> GeminiRequest<'a> {
        GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: system }],
            },
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart { text: user_message }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: max_tokens,
            },
        }
    }
}

#[async_trait]
impl StreamingProvider for GeminiProvider {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn stream(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        sink: &mut dyn FragmentSink,
    ) -> Result<String> {
        let request = Self::build_request(system_prompt, user_prompt, max_tokens);

        tracing::debug!(
            "Gemini Streaming API request: model={}, max_output_tokens={}, system_len={}, user_len={}, key={}",
            self.model,
            max_tokens,
            system_prompt.len(),
            user_prompt.len(),
            mask_api_key(&self.api_key)
        );

        let response = send_streaming_request(
            &self.client,
            &self.endpoint,
            &[("x-goog-api-key", self.api_key.as_str())],
            &request,
            "Gemini",
            self.retry,
        )
        .await?;

        process_gemini_stream(response, sink).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::llm::provider::test_utils::{RecordingSink, ensure_crypto_provider, test_providers};
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;

    const STREAM_PATH: &str = "/v1beta/models/gemini-3-flash-preview:streamGenerateContent";

    #[tokio::test]
    async fn test_gemini_streams_parts() {
        ensure_crypto_provider();
        let mut server = Server::new_async().await;
        let body = concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hello\"}],\"role\":\"model\"}}]}\r\n\r\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\" Gemini\"}],\"role\":\"model\"},\"finishReason\":\"STOP\"}]}\r\n\r\n",
        );
        let mock = server
            .mock("POST", STREAM_PATH)
            .match_query(Matcher::UrlEncoded("alt".into(), "sse".into()))
            .match_header("x-goog-api-key", "AIza-test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "systemInstruction": {"parts": [{"text": "sys"}]},
                "contents": [{"role": "user", "parts": [{"text": "hi"}]}],
                "generationConfig": {"maxOutputTokens": 4096}
            })))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await;

        let provider = GeminiProvider::new(
            "AIza-test",
            "gemini-3-flash-preview",
            &test_providers(&server.url()),
            &NetworkConfig::default(),
        )
        .unwrap();

        let mut sink = RecordingSink::default();
        let text = provider.stream("sys", "hi", 4096, &mut sink).await.unwrap();
        assert_eq!(text, "Hello Gemini");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_gemini_safety_blocked() {
        ensure_crypto_provider();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", STREAM_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("data: {\"candidates\":[{\"finishReason\":\"SAFETY\"}]}\n\n")
            .create_async()
            .await;

        let provider = GeminiProvider::new(
            "AIza-test",
            "gemini-3-flash-preview",
            &test_providers(&server.url()),
            &NetworkConfig::default(),
        )
        .unwrap();

        let mut sink = RecordingSink::default();
        let err = provider.stream("sys", "hi", 16, &mut sink).await.unwrap_err();
        match &err {
            GatewayError::LlmContentBlocked { provider, reason } => {
                assert_eq!(provider, "Gemini");
                assert_eq!(reason, "SAFETY");
            }
            _ => panic!("Expected LlmContentBlocked, got: {:?}", err),
        }
        mock.assert_async().await;
    }
}
