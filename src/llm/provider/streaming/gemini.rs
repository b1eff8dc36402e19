use futures_util::StreamExt;
use reqwest::Response;
use serde::Deserialize;

use super::{LineBuffer, parse_sse_line};
use crate::error::{GatewayError, Result};
use crate::llm::FragmentSink;

/// Gemini streaming response block
#[derive(Debug, Deserialize)]
struct GeminiStreamChunk {
    pub candidates: Option<Vec<GeminiStreamCandidate>>,
    pub error: Option<GeminiStreamError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiStreamCandidate {
    pub content: Option<GeminiStreamContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiStreamContent {
    pub parts: Option<Vec<GeminiStreamPart>>,
}

#[derive(Debug, Deserialize)]
struct GeminiStreamPart {
    pub text: Option<String>,
}

/// Error object Gemini may send in place of a chunk
#[derive(Debug, Deserialize)]
struct GeminiStreamError {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

/// Handling Gemini streaming responses
///
/// Gemini SSE format (use `?alt=sse`):
/// ```text
/// data: {"candidates":[{"content":{"parts":[{"text":"Hello"}],"role":"model"}}]}
///
/// data: {"candidates":[{"content":{"parts":[{"text":" world"}],"role":"model"},"finishReason":"STOP"}]}
/// ```
///
/// Any finish reason other than `STOP`/`MAX_TOKENS` is reported as
/// [`GatewayError::LlmContentBlocked`].
pub async fn process_gemini_stream(
    response: Response,
    sink: &mut dyn FragmentSink,
) -> Result<String> {
    let mut stream = response.bytes_stream();
    let mut buffer = LineBuffer::default();
    let mut full_text = String::new();
    let mut parse_errors = 0usize;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(GatewayError::Network)?;
        buffer.extend(&chunk);

        while let Some(line) = buffer.next_line() {
            let Some(data) = parse_sse_line(&line) else {
                continue;
            };

            let chunk = match serde_json::from_str::<GeminiStreamChunk>(data) {
                Ok(chunk) => chunk,
                Err(e) => {
                    parse_errors += 1;
                    tracing::warn!("Failed to parse Gemini SSE data: {}, line: {}", e, data);
                    continue;
                }
            };

            if let Some(error) = chunk.error {
                return Err(GatewayError::LlmApi {
                    status: error.code,
                    message: format!("Gemini: {}", error.message),
                });
            }

            let Some(candidate) = chunk.candidates.as_ref().and_then(|c| c.first()) else {
                continue;
            };

            if let Some(parts) = candidate.content.as_ref().and_then(|c| c.parts.as_ref()) {
                for text in parts.iter().filter_map(|p| p.text.as_deref()) {
                    if !text.is_empty() {
                        sink.push(text).await?;
                        full_text.push_str(text);
                    }
                }
            }

            // Any finishReason ends the stream
            if let Some(reason) = &candidate.finish_reason {
                match reason.as_str() {
                    "STOP" => {}
                    "MAX_TOKENS" => tracing::warn!("Gemini stream truncated (MAX_TOKENS)"),
                    _ => {
                        tracing::warn!("Gemini stream ended with non-STOP reason: {}", reason);
                        return Err(GatewayError::LlmContentBlocked {
                            provider: "Gemini".to_string(),
                            reason: reason.clone(),
                        });
                    }
                }
                if parse_errors > 0 {
                    tracing::warn!("Gemini stream finished with {} unparseable events", parse_errors);
                }
                return Ok(full_text);
            }
        }
    }

    // The stream ended without a finishReason
    if parse_errors > 0 {
        tracing::warn!("Gemini stream ended with {} unparseable events", parse_errors);
    }
    Ok(full_text)
}
