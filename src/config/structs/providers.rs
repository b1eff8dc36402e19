//! Vendor endpoint overrides.
//!
//! Credentials are never configured here: every request carries its own key.

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};
use crate::llm::provider::utils::{
    DEFAULT_ANTHROPIC_VERSION, DEFAULT_CLAUDE_BASE, DEFAULT_GEMINI_BASE, DEFAULT_OPENAI_BASE,
};

/// Provider endpoint configuration.
///
/// # Example
/// ```toml
/// [providers]
/// anthropic_endpoint = "https://api.anthropic.com"
/// openai_endpoint = "https://my-proxy.example.com/v1"
/// google_endpoint = "https://generativelanguage.googleapis.com"
/// anthropic_version = "2023-06-01"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProvidersConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic_endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_endpoint: Option<String>,

    /// Value of the `anthropic-version` header.
    #[serde(default = "default_anthropic_version")]
    pub anthropic_version: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            anthropic_endpoint: None,
            openai_endpoint: None,
            google_endpoint: None,
            anthropic_version: default_anthropic_version(),
        }
    }
}

impl ProvidersConfig {
    pub fn anthropic_base(&self) -> &str {
        self.anthropic_endpoint.as_deref().unwrap_or(DEFAULT_CLAUDE_BASE)
    }

    pub fn openai_base(&self) -> &str {
        self.openai_endpoint.as_deref().unwrap_or(DEFAULT_OPENAI_BASE)
    }

    pub fn google_base(&self) -> &str {
        self.google_endpoint.as_deref().unwrap_or(DEFAULT_GEMINI_BASE)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, endpoint) in [
            ("anthropic_endpoint", &self.anthropic_endpoint),
            ("openai_endpoint", &self.openai_endpoint),
            ("google_endpoint", &self.google_endpoint),
        ] {
            if let Some(url) = endpoint
                && !(url.starts_with("http://") || url.starts_with("https://"))
            {
                return Err(GatewayError::Config(format!(
                    "providers.{name} must be an http(s) URL, got '{url}'"
                )));
            }
        }
        Ok(())
    }
}

fn default_anthropic_version() -> String {
    DEFAULT_ANTHROPIC_VERSION.to_string()
}
