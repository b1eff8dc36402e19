use thiserror::Error;

use crate::constants::messages;
use crate::gateway::classifier::ProviderTag;

pub type Result<T> = std::result::Result<T, GatewayError>;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM provider error: {0}")]
    Llm(String),

    /// Non-2xx status returned by a vendor API.
    #[error("API error ({status}): {message}")]
    LlmApi { status: u16, message: String },

    /// Vendor stream ended before its completion marker.
    #[error("{provider} stream truncated: {detail}")]
    LlmStreamTruncated { provider: String, detail: String },

    /// Vendor stopped generating for a safety/recitation reason.
    #[error("{provider} blocked the response (finish reason: {reason})")]
    LlmContentBlocked { provider: String, reason: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Configuration parsing error: {0}")]
    ConfigParse(#[from] config::ConfigError),

    /// The outbound event stream has no reader any more.
    #[error("client disconnected")]
    ClientDisconnected,

    #[error("{0}")]
    Other(String),
}

/// Stable user-facing category of an upstream failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    Auth,
    RateLimited,
    Model,
    Generic,
    Unclassified,
}

/// An upstream failure after classification, ready for the `error` wire event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFailure {
    pub kind: UpstreamErrorKind,
    pub message: String,
}

impl ClassifiedFailure {
    /// Failure with no usable error shape (panicked or aborted generation task).
    pub fn unclassified() -> Self {
        Self {
            kind: UpstreamErrorKind::Unclassified,
            message: messages::UNCLASSIFIED_STREAM_ERROR.to_string(),
        }
    }
}

const AUTH_SIGNATURES: &[&str] = &[
    "authentication",
    "invalid api key",
    "invalid x-api-key",
    "401",
    "unauthorized",
];

const RATE_LIMIT_SIGNATURES: &[&str] = &["429", "rate limit", "rate_limit"];

const MODEL_SIGNATURES: &[&str] = &["model", "not found", "does not exist"];

impl GatewayError {
    /// Maps the error onto the fixed upstream taxonomy.
    ///
    /// Matching runs on the lowercased error text; the first matching
    /// category wins (auth, then rate limit, then model).
    pub fn classify(&self) -> ClassifiedFailure {
        let raw = self.raw_message();
        let lowered = raw.to_lowercase();
        let matches_any = |signatures: &[&str]| signatures.iter().any(|s| lowered.contains(s));

        if matches_any(AUTH_SIGNATURES) {
            ClassifiedFailure {
                kind: UpstreamErrorKind::Auth,
                message: messages::INVALID_API_KEY.to_string(),
            }
        } else if matches_any(RATE_LIMIT_SIGNATURES) {
            ClassifiedFailure {
                kind: UpstreamErrorKind::RateLimited,
                message: format!("Rate limit exceeded: {raw}. Wait a moment and try again."),
            }
        } else if matches_any(MODEL_SIGNATURES) {
            ClassifiedFailure {
                kind: UpstreamErrorKind::Model,
                message: format!("Model error: {raw}. Please select a valid model in Settings."),
            }
        } else {
            ClassifiedFailure {
                kind: UpstreamErrorKind::Generic,
                message: raw,
            }
        }
    }

    /// Vendor-facing text without the wrapper prefixes added by `Display`.
    fn raw_message(&self) -> String {
        match self {
            GatewayError::Llm(msg) | GatewayError::Other(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Failures detected before the event stream is opened.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("No API key configured. Please add your API key and choose a model in Settings.")]
    MissingCredential,

    #[error(
        "You selected a {} model but provided a {} API key. Please update your API key in Settings to match the selected model.",
        selected.display_name(),
        credential.display_name()
    )]
    ProviderKeyMismatch {
        selected: ProviderTag,
        credential: ProviderTag,
    },

    #[error("missing prompt")]
    MissingPrompt,

    #[error("invalid request body: {0}")]
    InvalidBody(String),
}

impl RequestError {
    /// HTTP status used for the JSON error response.
    pub fn status_code(&self) -> u16 {
        match self {
            RequestError::MissingCredential => 401,
            _ => 400,
        }
    }
}
