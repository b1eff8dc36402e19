//! Shared request plumbing for the vendor adapters.
//!
//! - `retry` - opens a vendor stream, with optional transport retry before the first byte

pub mod retry;

pub use retry::{RetryPolicy, send_streaming_request};
