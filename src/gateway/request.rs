//! Inbound composition requests.

use serde::{Deserialize, Serialize};

use super::classifier::{ProviderSelection, classify};
use crate::error::RequestError;

/// Generation mode requested by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    New,
    Edit,
}

/// Speaker of a prior conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Marks a history turn that produced code.
///
/// Clients send either a boolean flag or the generated code itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodeMarker {
    Flag(bool),
    Code(String),
}

impl CodeMarker {
    fn is_set(&self) -> bool {
        match self {
            CodeMarker::Flag(flag) => *flag,
            CodeMarker::Code(code) => !code.is_empty(),
        }
    }
}

/// One turn of prior conversation supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Only its presence matters here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeMarker>,
}

impl ChatMessage {
    /// Whether this turn carried generated code.
    pub fn has_code(&self) -> bool {
        self.code.as_ref().is_some_and(CodeMarker::is_set)
    }
}

/// JSON body of `POST /api/compose`.
///
/// Every field is optional at the serde level so that missing values map
/// onto the specific [`RequestError`] variants instead of a generic
/// deserialization failure. Unknown fields (e.g. `sessionId`) are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_history: Option<Vec<ChatMessage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// A validated, read-only composition request.
#[derive(Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub mode: Mode,
    pub current_code: Option<String>,
    pub chat_history: Vec<ChatMessage>,
    pub model: String,
    pub api_key: String,
}

impl std::fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use crate::llm::provider::utils::mask_api_key;
        f.debug_struct("GenerationRequest")
            .field("prompt", &self.prompt)
            .field("mode", &self.mode)
            .field("current_code", &self.current_code)
            .field("chat_history", &self.chat_history)
            .field("model", &self.model)
            .field("api_key", &mask_api_key(&self.api_key))
            .finish()
    }
}

impl GenerationRequest {
    /// Current code to embed, only in edit mode and only when non-blank.
    pub fn edit_code(&self) -> Option<&str> {
        match (self.mode, self.current_code.as_deref()) {
            (Mode::Edit, Some(code)) if !code.trim().is_empty() => Some(code),
            _ => None,
        }
    }
}

impl ComposePayload {
    /// Validates the payload and resolves the provider.
    ///
    /// Checks run in a fixed order: credential presence (401), provider/key
    /// mismatch (400), prompt presence (400).
    pub fn into_request(
        self,
        default_model: &str,
    ) -> Result<(GenerationRequest, ProviderSelection), RequestError> {
        let api_key = self
            .api_key
            .filter(|k| !k.is_empty())
            .ok_or(RequestError::MissingCredential)?;

        let model = self
            .model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default_model.to_string());

        let selection = classify(&model, &api_key)?;

        let prompt = self
            .prompt
            .filter(|p| !p.trim().is_empty())
            .ok_or(RequestError::MissingPrompt)?;

        let request = GenerationRequest {
            prompt,
            mode: self.mode.unwrap_or_default(),
            current_code: self.current_code,
            chat_history: self.chat_history.unwrap_or_default(),
            model,
            api_key,
        };

        Ok((request, selection))
    }
}
