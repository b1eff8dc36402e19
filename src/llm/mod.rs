//! LLM abstractions shared by the gateway and the vendor adapters.
//!
//! Adapters only know how to turn a `(system, user)` prompt pair into an
//! ordered sequence of text fragments. Where the fragments go is decided by
//! the caller through [`FragmentSink`].

/// Built-in provider implementations and factory helpers.
pub mod provider;

use async_trait::async_trait;

use crate::error::Result;

/// Receiver of incremental text produced by a provider.
///
/// Returning an error from [`push`](FragmentSink::push) aborts the vendor
/// stream: adapters propagate it out of their read loop and drop the
/// in-flight response.
#[async_trait]
pub trait FragmentSink: Send {
    async fn push(&mut self, fragment: &str) -> Result<()>;
}

/// Uniform streaming interface implemented by every vendor adapter.
///
/// # Contract
/// - Fragments are pushed in the order the vendor produced them; empty
///   fragments are never pushed.
/// - On success the full concatenated text is returned.
/// - Any vendor, transport or sink failure ends the call with `Err`. The
///   adapter never retries after the vendor stream has started.
///
/// # Built-In Implementations
/// - [`ClaudeProvider`](provider::claude::ClaudeProvider) - Anthropic Messages API
/// - [`OpenAIProvider`](provider::openai::OpenAIProvider) - OpenAI Chat Completions
/// - [`GeminiProvider`](provider::gemini::GeminiProvider) - Google Gemini
#[async_trait]
pub trait StreamingProvider: Send + Sync {
    /// Provider name (used for logs and error messages).
    fn name(&self) -> &str;

    /// Model identifier forwarded to the vendor.
    fn model(&self) -> &str;

    /// Streams one generation into `sink` and returns the accumulated text.
    async fn stream(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        sink: &mut dyn FragmentSink,
    ) -> Result<String>;
}
