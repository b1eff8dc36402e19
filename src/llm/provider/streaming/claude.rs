use futures_util::StreamExt;
use reqwest::Response;
use serde::Deserialize;

use super::{LineBuffer, parse_sse_line};
use crate::error::{GatewayError, Result};
use crate::llm::FragmentSink;

/// Claude SSE event type
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ClaudeSSEEvent {
    #[serde(rename = "content_block_delta")]
    ContentBlockDelta { delta: ClaudeTextDelta },
    #[serde(rename = "message_stop")]
    MessageStop,
    #[serde(rename = "error")]
    Error { error: ClaudeStreamError },
    #[serde(other)]
    Other,
}

/// Claude text increment
#[derive(Debug, Deserialize)]
struct ClaudeTextDelta {
    #[serde(rename = "type")]
    pub delta_type: String,
    #[serde(default)]
    pub text: String,
}

/// Error reported inside an otherwise successful (200) stream
#[derive(Debug, Deserialize)]
struct ClaudeStreamError {
    #[serde(rename = "type", default)]
    pub error_type: String,
    #[serde(default)]
    pub message: String,
}

/// Handling Claude streaming responses
///
/// Claude SSE format:
/// ```text
/// event: message_start
/// data: {"type":"message_start","message":{"id":"..."}}
///
/// event: content_block_delta
/// data: {"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hello"}}
///
/// event: message_stop
/// data: {"type":"message_stop"}
/// ```
///
/// Only `text_delta` deltas become fragments. Returns the concatenated text.
pub async fn process_claude_stream(
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

            match serde_json::from_str::<ClaudeSSEEvent>(data) {
                Ok(ClaudeSSEEvent::ContentBlockDelta { delta }) => {
                    if delta.delta_type == "text_delta" && !delta.text.is_empty() {
                        sink.push(&delta.text).await?;
                        full_text.push_str(&delta.text);
                    }
                }
                Ok(ClaudeSSEEvent::MessageStop) => {
                    if parse_errors > 0 {
                        tracing::warn!("Claude stream finished with {} unparseable events", parse_errors);
                    }
                    return Ok(full_text);
                }
                Ok(ClaudeSSEEvent::Error { error }) => {
                    tracing::debug!("Claude stream error event: {:?}", error);
                    return Err(GatewayError::Llm(format!(
                        "Claude: {}: {}",
                        error.error_type, error.message
                    )));
                }
                Ok(ClaudeSSEEvent::Other) => {}
                Err(e) => {
                    parse_errors += 1;
                    tracing::warn!("Failed to parse Claude SSE data: {}, line: {}", e, data);
                }
            }
        }
    }

    // Stream ended but message_stop was not received
    let detail = if parse_errors > 0 {
        format!("stream ended without message_stop ({parse_errors} unparseable events)")
    } else {
        "stream ended without message_stop".to_string()
    };
    Err(GatewayError::LlmStreamTruncated {
        provider: "Claude".to_string(),
        detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::test_utils::{ClosedSink, RecordingSink, sse_response};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_claude_sse_event_parse() {
        let delta_json =
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}"#;
        let event: ClaudeSSEEvent = serde_json::from_str(delta_json).unwrap();
        match event {
            ClaudeSSEEvent::ContentBlockDelta { delta } => {
                assert_eq!(delta.delta_type, "text_delta");
                assert_eq!(delta.text, "Hi");
            }
            _ => panic!("unexpected event: {:?}", event),
        }

        let stop_json = r#"{"type":"message_stop"}"#;
        let event: ClaudeSSEEvent = serde_json::from_str(stop_json).unwrap();
        assert!(matches!(event, ClaudeSSEEvent::MessageStop));

        let ping_json = r#"{"type":"ping"}"#;
        let event: ClaudeSSEEvent = serde_json::from_str(ping_json).unwrap();
        assert!(matches!(event, ClaudeSSEEvent::Other));
    }

    #[tokio::test]
    async fn test_claude_multiple_deltas_then_stop() {
        let body = concat!(
            "event: message_start\n",
            "data: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_1\"}}\n\n",
            "event: content_block_delta\n",
            "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"setcpm\"}}\n\n",
            "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"(30)\"}}\n\n",
            "data: {\"type\":\"message_stop\"}\n\n",
        );
        let mut sink = RecordingSink::default();
        let text = process_claude_stream(sse_response(body), &mut sink)
            .await
            .unwrap();

        assert_eq!(text, "setcpm(30)");
        assert_eq!(sink.fragments, vec!["setcpm", "(30)"]);
    }

    #[tokio::test]
    async fn test_claude_ignores_non_text_deltas() {
        let body = concat!(
            "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\"{}\"}}\n\n",
            "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"\"}}\n\n",
            "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"ok\"}}\n\n",
            "data: {\"type\":\"message_stop\"}\n\n",
        );
        let mut sink = RecordingSink::default();
        let text = process_claude_stream(sse_response(body), &mut sink)
            .await
            .unwrap();
        assert_eq!(text, "ok");
        assert_eq!(sink.fragments, vec!["ok"]);
    }

    /// Stream ends after valid deltas but WITHOUT message_stop → LlmStreamTruncated.
    #[tokio::test]
    async fn test_claude_truncated_without_stop() {
        let body = "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"partial\"}}\n\n";
        let mut sink = RecordingSink::default();
        let result = process_claude_stream(sse_response(body), &mut sink).await;

        assert!(
            matches!(result, Err(GatewayError::LlmStreamTruncated { ref provider, .. }) if provider == "Claude"),
            "Expected LlmStreamTruncated, got {:?}",
            result
        );
        // Delta was delivered before the stream ended
        assert_eq!(sink.fragments, vec!["partial"]);
    }

    #[tokio::test]
    async fn test_claude_truncated_all_parse_errors() {
        let body = "data: not-valid-json\n\ndata: also-broken\n\n";
        let mut sink = RecordingSink::default();
        let result = process_claude_stream(sse_response(body), &mut sink).await;

        match result {
            Err(GatewayError::LlmStreamTruncated { provider, detail }) => {
                assert_eq!(provider, "Claude");
                assert!(detail.contains("2 unparseable"));
            }
            other => panic!("Expected LlmStreamTruncated, got {:?}", other),
        }
        assert!(sink.fragments.is_empty());
    }

    #[tokio::test]
    async fn test_claude_error_event() {
        let body = concat!(
            "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"a\"}}\n\n",
            "event: error\n",
            "data: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n\n",
        );
        let mut sink = RecordingSink::default();
        let err = process_claude_stream(sse_response(body), &mut sink)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "LLM provider error: Claude: overloaded_error: Overloaded");
        assert_eq!(sink.fragments, vec!["a"]);
    }

    #[tokio::test]
    async fn test_claude_sink_failure_stops_reading() {
        let body = concat!(
            "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"a\"}}\n\n",
            "data: {\"type\":\"message_stop\"}\n\n",
        );
        let result = process_claude_stream(sse_response(body), &mut ClosedSink).await;
        assert!(matches!(result, Err(GatewayError::ClientDisconnected)));
    }
}
