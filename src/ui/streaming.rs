//! Terminal rendering of a compose event stream
//!
//! Prints deltas as they arrive (typewriter effect), shows status lines, and
//! honours `clear` by discarding everything shown for the abandoned attempt.

use std::io::{self, Write};

use colored::Colorize;
use tokio::sync::mpsc;

use crate::error::{GatewayError, Result};
use crate::gateway::WireEvent;

/// Streaming text renderer
pub struct StreamingOutput {
    buffer: String,
    colored: bool,
    cleared: usize,
}

impl StreamingOutput {
    pub fn new(colored: bool) -> Self {
        Self {
            buffer: String::new(),
            colored,
            cleared: 0,
        }
    }

    /// Text of the current attempt.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// How many times the server asked to discard the output so far.
    pub fn cleared(&self) -> usize {
        self.cleared
    }

    /// Applies one event. Returns `Ok(true)` once the stream is finished.
    pub fn apply(&mut self, event: WireEvent) -> Result<bool> {
        match event {
            WireEvent::Delta(text) => {
                self.buffer.push_str(&text);
                if self.colored {
                    print!("{}", text.yellow());
                } else {
                    print!("{}", text);
                }
                io::stdout().flush().ok();
                Ok(false)
            }
            WireEvent::Status(status) => {
                println!();
                super::step("status", &status, self.colored);
                Ok(false)
            }
            WireEvent::Clear => {
                self.buffer.clear();
                self.cleared += 1;
                println!();
                super::warning("discarding previous attempt", self.colored);
                Ok(false)
            }
            WireEvent::Done => {
                println!();
                Ok(true)
            }
            WireEvent::Error(message) => {
                println!();
                super::error(&message, self.colored);
                Err(GatewayError::Llm(message))
            }
        }
    }

    /// Renders events until the stream finishes
    ///
    /// Returns the text of the final attempt. A channel that closes before a
    /// terminal event is reported as a truncated stream.
    pub async fn process(&mut self, mut receiver: mpsc::Receiver<WireEvent>) -> Result<String> {
        while let Some(event) = receiver.recv().await {
            if self.apply(event)? {
                return Ok(self.buffer.clone());
            }
        }

        println!();
        Err(GatewayError::LlmStreamTruncated {
            provider: "gateway".to_string(),
            detail: "event stream closed without [DONE]".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn feed(events: Vec<WireEvent>) -> (StreamingOutput, Result<String>) {
        let (tx, rx) = mpsc::channel(16);
        for event in events {
            tx.send(event).await.unwrap();
        }
        drop(tx);
        let mut output = StreamingOutput::new(false);
        let result = output.process(rx).await;
        (output, result)
    }

    #[tokio::test]
    async fn test_clear_discards_first_attempt() {
        let (output, result) = feed(vec![
            WireEvent::Delta("bad ".to_string()),
            WireEvent::Delta("code".to_string()),
            WireEvent::Status("simplifying...".to_string()),
            WireEvent::Clear,
            WireEvent::Delta("good".to_string()),
            WireEvent::Done,
        ])
        .await;

        assert_eq!(result.unwrap(), "good");
        assert_eq!(output.cleared(), 1);
    }

    #[tokio::test]
    async fn test_error_event_fails() {
        let (_, result) = feed(vec![
            WireEvent::Delta("x".to_string()),
            WireEvent::Error("stream error".to_string()),
        ])
        .await;

        match result {
            Err(GatewayError::Llm(msg)) => assert_eq!(msg, "stream error"),
            other => panic!("Expected Llm error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_done_is_truncation() {
        let (output, result) = feed(vec![WireEvent::Delta("half".to_string())]).await;
        assert!(matches!(result, Err(GatewayError::LlmStreamTruncated { .. })));
        assert_eq!(output.text(), "half");
    }
}
