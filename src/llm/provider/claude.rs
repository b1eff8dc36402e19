use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::base::{RetryPolicy, send_streaming_request};
use super::streaming::process_claude_stream;
use super::utils::{CLAUDE_API_SUFFIX, complete_endpoint, mask_api_key};
use crate::config::{NetworkConfig, ProvidersConfig};
use crate::error::Result;
use crate::llm::{FragmentSink, StreamingProvider};

/// Anthropic Messages API adapter
///
/// Streams `POST {base}/v1/messages` with `x-api-key` and
/// `anthropic-version` headers.
pub struct ClaudeProvider {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    anthropic_version: String,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<MessagePayload<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct MessagePayload<'a> {
    role: &'a str,
    content: &'a str,
}

impl ClaudeProvider {
    pub fn new(
        api_key: &str,
        model: &str,
        providers: &ProvidersConfig,
        network_config: &NetworkConfig,
    ) -> Result<Self> {
        Ok(Self {
            client: super::create_http_client(network_config)?,
            api_key: api_key.to_string(),
            endpoint: complete_endpoint(providers.anthropic_base(), CLAUDE_API_SUFFIX),
            model: model.to_string(),
            anthropic_version: providers.anthropic_version.clone(),
            retry: network_config.retry_policy(),
        })
    }
}

#[async_trait]
impl StreamingProvider for ClaudeProvider {
    fn name(&self) -> &str {
        "Claude"
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
        let request = ClaudeRequest {
            model: &self.model,
            max_tokens,
            system: system_prompt,
            messages: vec![MessagePayload {
                role: "user",
                content: user_prompt,
            }],
            stream: true,
        };

        tracing::debug!(
            "Claude Streaming API request: model={}, max_tokens={}, system_len={}, user_len={}, key={}",
            self.model,
            max_tokens,
            system_prompt.len(),
            user_prompt.len(),
            mask_api_key(&self.api_key)
        );

        let response = send_streaming_request(
            &self.client,
            &self.endpoint,
            &[
                ("x-api-key", self.api_key.as_str()),
                ("anthropic-version", self.anthropic_version.as_str()),
            ],
            &request,
            "Claude",
            self.retry,
        )
        .await?;

        process_claude_stream(response, sink).await
    }
}
