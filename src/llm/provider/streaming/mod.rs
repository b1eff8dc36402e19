//! SSE (Server-Sent Events) parsing module
//!
//! Normalises the streaming responses of Claude, OpenAI and Gemini into plain
//! text fragments pushed to a [`FragmentSink`](crate::llm::FragmentSink).

pub mod claude;
pub mod gemini;
pub mod openai;

pub use claude::process_claude_stream;
pub use gemini::process_gemini_stream;
pub use openai::process_openai_stream;

/// Parse SSE lines and extract data content
pub(crate) fn parse_sse_line(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

/// Byte buffer that yields complete lines.
///
/// Bytes are kept raw until a full line is available so a multi-byte
/// character split across two network chunks is decoded correctly.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    bytes: Vec<u8>,
}

impl LineBuffer {
    pub(crate) fn extend(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    /// Next complete line, trimmed (handles `\r\n`). `None` until a `\n` arrives.
    pub(crate) fn next_line(&mut self) -> Option<String> {
        let pos = self.bytes.iter().position(|b| *b == b'\n')?;
        let line: Vec<u8> = self.bytes.drain(..=pos).collect();
        Some(String::from_utf8_lossy(&line).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_sse_line() {
        assert_eq!(parse_sse_line("data: {\"a\":1}"), Some("{\"a\":1}"));
        assert_eq!(parse_sse_line("data:[DONE]"), Some("[DONE]"));
        assert_eq!(parse_sse_line("event: message_stop"), None);
    }

    #[test]
    fn test_line_buffer_joins_split_multibyte() {
        let text = "data: é\n";
        let bytes = text.as_bytes();
        // 'é' is two bytes; split between them
        let split = text.find('é').unwrap() + 1;

        let mut buffer = LineBuffer::default();
        buffer.extend(&bytes[..split]);
        assert_eq!(buffer.next_line(), None);
        buffer.extend(&bytes[split..]);
        assert_eq!(buffer.next_line().as_deref(), Some("data: é"));
        assert_eq!(buffer.next_line(), None);
    }

    #[test]
    fn test_line_buffer_crlf() {
        let mut buffer = LineBuffer::default();
        buffer.extend(b"data: a\r\n\r\ndata: b\n");
        assert_eq!(buffer.next_line().as_deref(), Some("data: a"));
        assert_eq!(buffer.next_line().as_deref(), Some(""));
        assert_eq!(buffer.next_line().as_deref(), Some("data: b"));
    }
}
