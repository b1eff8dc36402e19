//! Generation settings: model default, token budget, history window.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::generation::{
    DEFAULT_HISTORY_LIMIT, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_RETRY_STATUS,
};
use crate::error::{GatewayError, Result};

/// Generation configuration.
///
/// # Example
/// ```toml
/// [generation]
/// default_model = "claude-sonnet-4-20250514"
/// max_tokens = 4096
/// history_limit = 6
/// retry_status = "simplifying..."
/// system_prompt_path = "/etc/strudel/system.txt"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// Model used when a request names none.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Token budget for every vendor call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Chat history window: first message plus the last `history_limit - 1`.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Phrase sent in the `status` event before the corrective pass.
    #[serde(default = "default_retry_status")]
    pub retry_status: String,

    /// Optional file replacing the built-in system prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_path: Option<PathBuf>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            max_tokens: default_max_tokens(),
            history_limit: default_history_limit(),
            retry_status: default_retry_status(),
            system_prompt_path: None,
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_model.trim().is_empty() {
            return Err(GatewayError::Config(
                "generation.default_model cannot be empty".into(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(GatewayError::Config(
                "generation.max_tokens cannot be 0".into(),
            ));
        }
        if self.history_limit == 0 {
            return Err(GatewayError::Config(
                "generation.history_limit cannot be 0".into(),
            ));
        }
        Ok(())
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_retry_status() -> String {
    DEFAULT_RETRY_STATUS.to_string()
}
