use futures_util::StreamExt;
use reqwest::Response;

use super::{LineBuffer, parse_sse_line};
use crate::error::{GatewayError, Result};
use crate::llm::FragmentSink;

/// delta structure of OpenAI streaming response
#[derive(Debug, serde::Deserialize)]
struct OpenAIDelta {
    #[serde(default)]
    pub choices: Vec<OpenAIDeltaChoice>,
}

#[derive(Debug, serde::Deserialize)]
struct OpenAIDeltaChoice {
    pub delta: OpenAIDeltaContent,
    pub finish_reason: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct OpenAIDeltaContent {
    pub content: Option<String>,
}

/// Handling OpenAI streaming responses
///
/// SSE format:
/// ```text
/// data: {"id":"...","choices":[{"delta":{"content":"Hello"}}]}
///
/// data: {"id":"...","choices":[{"delta":{"content":" world"}}]}
///
/// data: [DONE]
/// ```
///
/// Ends on `[DONE]` or the first `finish_reason`. Returns the concatenated text.
pub async fn process_openai_stream(
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

            if data == "[DONE]" {
                log_parse_errors(parse_errors);
                return Ok(full_text);
            }

            match serde_json::from_str::<OpenAIDelta>(data) {
                Ok(delta) => {
                    if let Some(choice) = delta.choices.first() {
                        if let Some(content) = &choice.delta.content
                            && !content.is_empty()
                        {
                            sink.push(content).await?;
                            full_text.push_str(content);
                        }
                        if let Some(reason) = &choice.finish_reason {
                            tracing::debug!("OpenAI stream finished: {}", reason);
                            log_parse_errors(parse_errors);
                            return Ok(full_text);
                        }
                    }
                }
                Err(e) => {
                    parse_errors += 1;
                    tracing::warn!("Failed to parse SSE data: {}, line: {}", e, data);
                }
            }
        }
    }

    // Stream ended without [DONE]
    if parse_errors > 0 {
        return Err(GatewayError::LlmStreamTruncated {
            provider: "OpenAI".to_string(),
            detail: format!("stream ended without [DONE] ({parse_errors} unparseable events)"),
        });
    }
    Ok(full_text)
}

fn log_parse_errors(parse_errors: usize) {
    if parse_errors > 0 {
        tracing::warn!("OpenAI stream finished with {} unparseable events", parse_errors);
    }
}
