//! Streaming orchestration with a single validation-gated retry.
//!
//! One [`Orchestrator`] serves one request. It drives the first attempt,
//! forwards every fragment as a `delta` event, validates the extracted code
//! once, and at most once re-runs the adapter with a corrective prompt:
//!
//! ```text
//! FirstAttempt --(code present and invalid)--> RetryAttempt --> Done
//! FirstAttempt --(no code, or valid code)----> Done
//! any state ----(adapter error)--------------> Failed
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use super::extract::extract_code;
use super::prompt::PromptBuilder;
use super::request::GenerationRequest;
use super::validator::{CodeValidator, ValidationLimits, ValidationOutcome};
use super::wire::WireEvent;
use crate::error::{ClassifiedFailure, GatewayError, Result};
use crate::llm::{FragmentSink, StreamingProvider};

/// Destination of outbound wire events.
///
/// Implementations must return [`GatewayError::ClientDisconnected`] once the
/// reader is gone.
#[async_trait]
pub trait EventSink: Send {
    async fn emit(&mut self, event: WireEvent) -> Result<()>;
}

/// Encodes events into frames and hands them to the HTTP body.
pub struct ChannelEventSink {
    tx: mpsc::Sender<Bytes>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<Bytes>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl EventSink for ChannelEventSink {
    async fn emit(&mut self, event: WireEvent) -> Result<()> {
        let frame = event.encode()?;
        self.tx
            .send(frame)
            .await
            .map_err(|_| GatewayError::ClientDisconnected)
    }
}

/// Turns adapter fragments into `delta` events.
struct DeltaForwarder<'a> {
    events: &'a mut dyn EventSink,
}

#[async_trait]
impl FragmentSink for DeltaForwarder<'_> {
    async fn push(&mut self, fragment: &str) -> Result<()> {
        self.events.emit(WireEvent::Delta(fragment.to_string())).await
    }
}

/// Which pass an attempt was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptKind {
    First,
    Corrective,
}

/// One generation pass. Owns its own accumulated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamAttempt {
    pub kind: AttemptKind,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub text: String,
}

/// Everything a completed request produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    /// One or two attempts, in order.
    pub attempts: Vec<StreamAttempt>,
    /// Verdict on the first attempt's code; `None` when it had no code block.
    pub validation: Option<ValidationOutcome>,
}

/// How a driven request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed(Transcript),
    /// An upstream failure was classified and sent as an `error` event.
    Failed(ClassifiedFailure),
    /// The client went away; nothing more was sent.
    Disconnected,
}

/// Per-request tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    pub max_tokens: u32,
    pub limits: ValidationLimits,
    pub retry_status: String,
}

enum Phase {
    FirstAttempt,
    RetryAttempt { user_prompt: String },
    Done,
}

pub struct Orchestrator {
    provider: Box<dyn StreamingProvider>,
    prompts: Arc<dyn PromptBuilder>,
    validator: Arc<dyn CodeValidator>,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        provider: Box<dyn StreamingProvider>,
        prompts: Arc<dyn PromptBuilder>,
        validator: Arc<dyn CodeValidator>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            provider,
            prompts,
            validator,
            settings,
        }
    }

    /// Runs the state machine and emits the terminal `[DONE]` marker.
    ///
    /// Errors are returned unclassified; see [`drive`](Self::drive).
    pub async fn run(
        &self,
        request: &GenerationRequest,
        events: &mut dyn EventSink,
    ) -> Result<Transcript> {
        tracing::info!(
            "Composing with {} (model={}, mode={:?}, history={})",
            self.provider.name(),
            self.provider.model(),
            request.mode,
            request.chat_history.len()
        );

        let system_prompt = self.prompts.system_prompt().to_string();
        let mut transcript = Transcript::default();
        let mut phase = Phase::FirstAttempt;

        loop {
            phase = match phase {
                Phase::FirstAttempt => {
                    let user_prompt = self.prompts.user_prompt(request);
                    let attempt = self
                        .attempt(AttemptKind::First, &system_prompt, user_prompt, events)
                        .await?;
                    let next = self
                        .judge_first_attempt(&attempt, request, &mut transcript, events)
                        .await?;
                    transcript.attempts.push(attempt);
                    next
                }
                Phase::RetryAttempt { user_prompt } => {
                    let attempt = self
                        .attempt(AttemptKind::Corrective, &system_prompt, user_prompt, events)
                        .await?;
                    transcript.attempts.push(attempt);
                    Phase::Done
                }
                Phase::Done => break,
            };
        }

        events.emit(WireEvent::Done).await?;
        Ok(transcript)
    }

    /// Runs the request and turns any failure into its final wire form.
    pub async fn drive(&self, request: &GenerationRequest, events: &mut dyn EventSink) -> Outcome {
        match self.run(request, events).await {
            Ok(transcript) => Outcome::Completed(transcript),
            Err(GatewayError::ClientDisconnected) => {
                tracing::info!("Client disconnected, abandoning {} stream", self.provider.name());
                Outcome::Disconnected
            }
            Err(e) => {
                let failure = e.classify();
                tracing::error!(
                    "{} generation failed ({:?}): {}",
                    self.provider.name(),
                    failure.kind,
                    e
                );
                if events.emit(WireEvent::Error(failure.message.clone())).await.is_err() {
                    tracing::debug!("Error event not delivered: client already gone");
                }
                Outcome::Failed(failure)
            }
        }
    }

    async fn attempt(
        &self,
        kind: AttemptKind,
        system_prompt: &str,
        user_prompt: String,
        events: &mut dyn EventSink,
    ) -> Result<StreamAttempt> {
        tracing::debug!(
            "{:?} attempt: system_len={}, user_len={}, max_tokens={}",
            kind,
            system_prompt.len(),
            user_prompt.len(),
            self.settings.max_tokens
        );

        let mut forwarder = DeltaForwarder { events };
        let text = self
            .provider
            .stream(
                system_prompt,
                &user_prompt,
                self.settings.max_tokens,
                &mut forwarder,
            )
            .await?;

        tracing::debug!("{:?} attempt finished: {} chars", kind, text.len());

        Ok(StreamAttempt {
            kind,
            system_prompt: system_prompt.to_string(),
            user_prompt,
            max_tokens: self.settings.max_tokens,
            text,
        })
    }

    /// Validates the first attempt once and decides whether to retry.
    async fn judge_first_attempt(
        &self,
        attempt: &StreamAttempt,
        request: &GenerationRequest,
        transcript: &mut Transcript,
        events: &mut dyn EventSink,
    ) -> Result<Phase> {
        let Some(code) = extract_code(&attempt.text) else {
            tracing::debug!("No code block in first attempt, skipping validation");
            return Ok(Phase::Done);
        };

        let outcome = self.validator.validate(code, &self.settings.limits);
        let next = if outcome.valid {
            Phase::Done
        } else {
            tracing::info!(
                "First attempt failed validation ({} issues), retrying once",
                outcome.issues.len()
            );
            events
                .emit(WireEvent::Status(self.settings.retry_status.clone()))
                .await?;
            events.emit(WireEvent::Clear).await?;
            Phase::RetryAttempt {
                user_prompt: self.prompts.retry_prompt(request, &outcome.issues),
            }
        };

        transcript.validation = Some(outcome);
        Ok(next)
    }
}

/// Runs `orchestrator` on its own task and returns the frame receiver.
///
/// Generation happens in an inner task so a panic inside an adapter still
/// ends the stream with a generic `error` event instead of silence.
pub fn spawn_generation(
    orchestrator: Orchestrator,
    request: GenerationRequest,
    capacity: usize,
) -> mpsc::Receiver<Bytes> {
    let (tx, rx) = mpsc::channel(capacity);
    let fallback_tx = tx.clone();

    tokio::spawn(async move {
        let inner = tokio::spawn(async move {
            let mut events = ChannelEventSink::new(tx);
            orchestrator.drive(&request, &mut events).await
        });

        match inner.await {
            Ok(outcome) => {
                tracing::debug!("Generation task finished: {:?}", outcome_label(&outcome));
            }
            Err(join_error) => {
                let failure = ClassifiedFailure::unclassified();
                tracing::error!("Generation task aborted: {}", join_error);
                let mut events = ChannelEventSink::new(fallback_tx);
                if events.emit(WireEvent::Error(failure.message)).await.is_err() {
                    tracing::debug!("Fallback error event not delivered: client already gone");
                }
            }
        }
    });

    rx
}

fn outcome_label(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Completed(_) => "completed",
        Outcome::Failed(_) => "failed",
        Outcome::Disconnected => "disconnected",
    }
}
