//! Request-to-stream pipeline: classification, prompting, orchestration and
//! the outbound wire format.

pub mod classifier;
pub mod extract;
pub mod orchestrator;
pub mod prompt;
pub mod request;
pub mod validator;
pub mod wire;

pub use classifier::{ProviderSelection, ProviderTag};
pub use orchestrator::{
    ChannelEventSink, EventSink, Orchestrator, OrchestratorSettings, Outcome, spawn_generation,
};
pub use prompt::{PromptBuilder, StrudelPromptBuilder};
pub use request::{CodeMarker, ComposePayload, GenerationRequest, Mode};
pub use validator::{CodeValidator, StrudelValidator, ValidationLimits};
pub use wire::WireEvent;
