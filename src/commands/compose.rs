use futures_util::StreamExt;
use tokio::sync::mpsc;

use super::options::{API_KEY_ENV, ComposeOptions};
use crate::config::AppConfig;
use crate::constants::stream::EVENT_CHANNEL_CAPACITY;
use crate::error::{GatewayError, Result};
use crate::gateway::extract::extract_code;
use crate::gateway::{ComposePayload, WireEvent};
use crate::llm::provider::create_http_client;
use crate::llm::provider::streaming::{LineBuffer, parse_sse_line};
use crate::ui::{self, StreamingOutput};

/// Posts one composition request and renders the event stream.
///
/// Returns the text of the final attempt. With `--output`, the extracted
/// code (or the whole text when there is no code block) is written to disk.
pub async fn run(options: &ComposeOptions<'_>, config: &AppConfig) -> Result<String> {
    let api_key = options.resolve_api_key().ok_or_else(|| {
        GatewayError::Config(format!(
            "No API key given. Pass --api-key or set {API_KEY_ENV}."
        ))
    })?;

    let current_code = match options.edit_file {
        Some(path) => Some(std::fs::read_to_string(path)?),
        None => None,
    };

    let payload = ComposePayload {
        prompt: Some(options.prompt.clone()),
        mode: Some(options.mode()),
        current_code,
        chat_history: None,
        model: options.model.map(str::to_string),
        api_key: Some(api_key),
    };

    let url = options.endpoint(&config.client);
    ui::step("compose", &format!("POST {url}"), options.colored);

    let client = create_http_client(&config.network)?;
    let response = client.post(url).json(&payload).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GatewayError::LlmApi {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }

    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let reader = tokio::spawn(read_events(response, tx));

    let mut output = StreamingOutput::new(options.colored);
    let rendered = output.process(rx).await;
    let read = reader
        .await
        .map_err(|e| GatewayError::Other(format!("event reader task failed: {e}")))?;

    let text = match (rendered, read) {
        (Ok(text), _) => text,
        // The reader's own failure explains the early close better.
        (Err(GatewayError::LlmStreamTruncated { .. }), Err(read_err)) => return Err(read_err),
        (Err(e), _) => return Err(e),
    };

    if let Some(path) = options.output {
        let code = extract_code(&text).unwrap_or_else(|| text.trim());
        std::fs::write(path, code)?;
        ui::success(&format!("Saved to {}", path.display()), options.colored);
    }

    Ok(text)
}

/// Forwards decoded events until a terminal one or end of body.
///
/// Unknown payloads are skipped. Stops quietly once the receiver is gone.
pub async fn read_events(response: reqwest::Response, tx: mpsc::Sender<WireEvent>) -> Result<()> {
    let mut stream = response.bytes_stream();
    let mut buffer = LineBuffer::default();

    while let Some(chunk) = stream.next().await {
        buffer.extend(&chunk?);

        while let Some(line) = buffer.next_line() {
            let Some(data) = parse_sse_line(&line) else {
                continue;
            };
            let Some(event) = WireEvent::decode(data) else {
                tracing::debug!("Ignoring unknown event payload: {}", data);
                continue;
            };

            let terminal = event.is_terminal();
            if tx.send(event).await.is_err() || terminal {
                return Ok(());
            }
        }
    }

    Ok(())
}

/// `{"error": "..."}` bodies yield their message; anything else is passed through.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
