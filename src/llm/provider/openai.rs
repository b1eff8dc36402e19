use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::base::{RetryPolicy, send_streaming_request};
use super::streaming::process_openai_stream;
use super::utils::{OPENAI_API_SUFFIX, complete_endpoint, mask_api_key};
use crate::config::{NetworkConfig, ProvidersConfig};
use crate::error::Result;
use crate::llm::{FragmentSink, StreamingProvider};

/// OpenAI Chat Completions adapter (bearer auth)
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<MessagePayload<'a>>,
    max_completion_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct MessagePayload<'a> {
    role: &'a str,
    content: &'a str,
}

impl OpenAIProvider {
    pub fn new(
        api_key: &str,
        model: &str,
        providers: &ProvidersConfig,
        network_config: &NetworkConfig,
    ) -> Result<Self> {
        Ok(Self {
            client: super::create_http_client(network_config)?,
            api_key: api_key.to_string(),
            endpoint: complete_endpoint(providers.openai_base(), OPENAI_API_SUFFIX),
            model: model.to_string(),
            retry: network_config.retry_policy(),
        })
    }
}

#[async_trait]
impl StreamingProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "OpenAI"
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
        let request = OpenAIRequest {
            model: &self.model,
            messages: vec![
                MessagePayload {
                    role: "system",
                    content: system_prompt,
                },
                MessagePayload {
                    role: "user",
                    content: user_prompt,
                },
            ],
            max_completion_tokens: max_tokens,
            stream: true,
        };

        tracing::debug!(
            "OpenAI Streaming API request: model={}, max_completion_tokens={}, system_len={}, user_len={}, key={}",
            self.model,
            max_tokens,
            system_prompt.len(),
            user_prompt.len(),
            mask_api_key(&self.api_key)
        );

        let auth_header = format!("Bearer {}", self.api_key);
        let response = send_streaming_request(
            &self.client,
            &self.endpoint,
            &[("Authorization", auth_header.as_str())],
            &request,
            "OpenAI",
            self.retry,
        )
        .await?;

        process_openai_stream(response, sink).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::llm::provider::test_utils::{RecordingSink, ensure_crypto_provider, test_providers};
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_openai_streams_content() {
        ensure_crypto_provider();
        let mut server = Server::new_async().await;
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"set\"},\"finish_reason\":null}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"cpm\"},\"finish_reason\":null}]}\n\n",
            "data: [DONE]\n\n",
        );
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-proj-test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "gpt-4o",
                "max_completion_tokens": 4096,
                "stream": true,
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "hi"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await;

        let provider = OpenAIProvider::new(
            "sk-proj-test",
            "gpt-4o",
            &test_providers(&server.url()),
            &NetworkConfig::default(),
        )
        .unwrap();

        let mut sink = RecordingSink::default();
        let text = provider.stream("sys", "hi", 4096, &mut sink).await.unwrap();
        assert_eq!(text, "setcpm");
        assert_eq!(sink.fragments, vec!["set", "cpm"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_openai_model_not_found() {
        ensure_crypto_provider();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(404)
            .with_body(r#"{"error":{"message":"The model `gpt-9` does not exist","code":"model_not_found"}}"#)
            .create_async()
            .await;

        let provider = OpenAIProvider::new(
            "sk-proj-test",
            "gpt-9",
            &test_providers(&server.url()),
            &NetworkConfig::default(),
        )
        .unwrap();

        let mut sink = RecordingSink::default();
        let err = provider.stream("sys", "hi", 16, &mut sink).await.unwrap_err();
        assert!(matches!(err, GatewayError::LlmApi { status: 404, .. }));
        mock.assert_async().await;
    }
}
