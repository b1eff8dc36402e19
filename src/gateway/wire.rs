//! Outbound event-stream frames.
//!
//! Every frame is `data: <payload>\n\n`. Payloads are JSON objects except the
//! terminal marker, which is the bare `[DONE]` sentinel.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Terminal sentinel, written without JSON wrapping.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One event produced by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireEvent {
    Delta(String),
    Status(String),
    Clear,
    Error(String),
    Done,
}

#[derive(Debug, Serialize, Deserialize)]
struct DeltaBody {
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Payload {
    ContentBlockDelta { delta: DeltaBody },
    Status { status: String },
    Clear,
    Error { error: ErrorBody },
}

impl WireEvent {
    /// Serializes the event into one complete frame.
    pub fn encode(&self) -> Result<Bytes> {
        let payload = match self {
            WireEvent::Done => return Ok(Bytes::from(format!("data: {DONE_SENTINEL}\n\n"))),
            WireEvent::Delta(text) => Payload::ContentBlockDelta {
                delta: DeltaBody { text: text.clone() },
            },
            WireEvent::Status(status) => Payload::Status {
                status: status.clone(),
            },
            WireEvent::Clear => Payload::Clear,
            WireEvent::Error(message) => Payload::Error {
                error: ErrorBody {
                    message: message.clone(),
                },
            },
        };
        let json = serde_json::to_string(&payload)?;
        Ok(Bytes::from(format!("data: {json}\n\n")))
    }

    /// Parses the data portion of one frame (the text after `data: `).
    ///
    /// Returns `None` for payloads this protocol does not define.
    pub fn decode(data: &str) -> Option<WireEvent> {
        let data = data.trim();
        if data == DONE_SENTINEL {
            return Some(WireEvent::Done);
        }
        let payload: Payload = serde_json::from_str(data).ok()?;
        Some(match payload {
            Payload::ContentBlockDelta { delta } => WireEvent::Delta(delta.text),
            Payload::Status { status } => WireEvent::Status(status),
            Payload::Clear => WireEvent::Clear,
            Payload::Error { error } => WireEvent::Error(error.message),
        })
    }

    /// Whether no further frames may follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WireEvent::Done | WireEvent::Error(_))
    }
}
