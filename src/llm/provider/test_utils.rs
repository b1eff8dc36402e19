//! Test doubles for the streaming layer
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration tests under `tests/`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::ProviderFactory;
use crate::config::ProvidersConfig;
use crate::error::{GatewayError, Result};
use crate::gateway::classifier::ProviderTag;
use crate::llm::{FragmentSink, StreamingProvider};

/// Installs the rustls crypto provider for tests
///
/// reqwest 0.13 with `rustls-no-provider` needs a process-wide provider.
/// `main` installs it for the binary; tests call this instead. Repeated
/// calls are harmless.
pub fn ensure_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Points every vendor at `base_url` (e.g. a `mockito::Server`).
pub fn test_providers(base_url: &str) -> ProvidersConfig {
    ProvidersConfig {
        anthropic_endpoint: Some(base_url.to_string()),
        openai_endpoint: Some(base_url.to_string()),
        google_endpoint: Some(base_url.to_string()),
        ..ProvidersConfig::default()
    }
}

/// Wraps a literal SSE body into a `reqwest::Response`.
pub fn sse_response(body: &str) -> reqwest::Response {
    http::Response::builder()
        .status(200)
        .body(bytes::Bytes::from(body.to_string()))
        .expect("static response parts are valid")
        .into()
}

/// Sink that records every fragment it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub fragments: Vec<String>,
}

#[async_trait]
impl FragmentSink for RecordingSink {
    async fn push(&mut self, fragment: &str) -> Result<()> {
        self.fragments.push(fragment.to_string());
        Ok(())
    }
}

/// Sink whose reader is gone.
#[derive(Debug, Default)]
pub struct ClosedSink;

#[async_trait]
impl FragmentSink for ClosedSink {
    async fn push(&mut self, _fragment: &str) -> Result<()> {
        Err(GatewayError::ClientDisconnected)
    }
}

/// What one scripted call produces.
#[derive(Debug, Clone)]
pub enum Script {
    /// Push these fragments, then succeed.
    Fragments(Vec<String>),
    /// Push these fragments, then fail with `GatewayError::Llm(message)`.
    FailAfter(Vec<String>, String),
    /// Panic inside the call.
    Panic,
}

impl Script {
    /// Emits `text` as fragments of at most `chunk` characters.
    pub fn chunked(text: &str, chunk: usize) -> Self {
        let chars: Vec<char> = text.chars().collect();
        Script::Fragments(chars.chunks(chunk).map(|c| c.iter().collect()).collect())
    }

    pub fn fail(message: &str) -> Self {
        Script::FailAfter(Vec::new(), message.to_string())
    }
}

/// Prompts received by one scripted call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
}

/// Provider that plays back one [`Script`] per call.
///
/// Calls beyond the scripted ones fail, which makes an unexpected extra
/// vendor call visible in tests.
pub struct ScriptedProvider {
    name: String,
    model: String,
    scripts: Mutex<VecDeque<Script>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl ScriptedProvider {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            name: "Scripted".to_string(),
            model: "scripted-model".to_string(),
            scripts: Mutex::new(scripts.into()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared handle to the recorded calls, usable after the provider is moved.
    pub fn calls(&self) -> Arc<Mutex<Vec<RecordedCall>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl StreamingProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
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
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(RecordedCall {
                system_prompt: system_prompt.to_string(),
                user_prompt: user_prompt.to_string(),
                max_tokens,
            });

        let script = self
            .scripts
            .lock()
            .expect("scripts lock poisoned")
            .pop_front()
            .ok_or_else(|| GatewayError::Other("no script left for this call".to_string()))?;

        let (fragments, failure) = match script {
            Script::Fragments(fragments) => (fragments, None),
            Script::FailAfter(fragments, message) => (fragments, Some(message)),
            Script::Panic => panic!("scripted provider panic"),
        };

        let mut text = String::new();
        for fragment in &fragments {
            sink.push(fragment).await?;
            text.push_str(fragment);
        }

        match failure {
            Some(message) => Err(GatewayError::Llm(message)),
            None => Ok(text),
        }
    }
}

/// Factory handing out [`ScriptedProvider`]s that share one script queue
/// per request.
///
/// Each `create` call takes the next queued script list. Every call is
/// recorded, so tests can assert that no adapter was built for a request
/// rejected up front.
#[derive(Default)]
pub struct ScriptedProviderFactory {
    requests: Mutex<VecDeque<Vec<Script>>>,
    created: Mutex<Vec<(ProviderTag, String)>>,
    calls: Mutex<Vec<Arc<Mutex<Vec<RecordedCall>>>>>,
}

impl ScriptedProviderFactory {
    pub fn new(requests: Vec<Vec<Script>>) -> Self {
        Self {
            requests: Mutex::new(requests.into()),
            ..Self::default()
        }
    }

    /// `(provider, model)` of every adapter built so far.
    pub fn created(&self) -> Vec<(ProviderTag, String)> {
        self.created.lock().expect("created lock poisoned").clone()
    }

    /// Vendor calls made by the adapter of the `index`-th request.
    pub fn calls_for(&self, index: usize) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .get(index)
            .map(|calls| calls.lock().expect("calls lock poisoned").clone())
            .unwrap_or_default()
    }
}

impl ProviderFactory for ScriptedProviderFactory {
    fn create(
        &self,
        provider: ProviderTag,
        model: &str,
        _api_key: &str,
    ) -> Result<Box<dyn StreamingProvider>> {
        self.created
            .lock()
            .expect("created lock poisoned")
            .push((provider, model.to_string()));

        let scripts = self
            .requests
            .lock()
            .expect("requests lock poisoned")
            .pop_front()
            .unwrap_or_default();
        let scripted = ScriptedProvider::new(scripts);
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(scripted.calls());
        Ok(Box::new(scripted))
    }
}
