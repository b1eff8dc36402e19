//! Provider routing decisions.
//!
//! Pure functions over the model identifier and the credential string; no
//! network access and no prompt text is involved.

use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// Vendor family a model or credential belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderTag {
    Anthropic,
    #[serde(rename = "openai")]
    OpenAI,
    Google,
}

impl ProviderTag {
    /// Human-readable vendor name used in user-facing messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderTag::Anthropic => "Anthropic",
            ProviderTag::OpenAI => "OpenAI",
            ProviderTag::Google => "Google",
        }
    }
}

impl std::fmt::Display for ProviderTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderTag::Anthropic => write!(f, "anthropic"),
            ProviderTag::OpenAI => write!(f, "openai"),
            ProviderTag::Google => write!(f, "google"),
        }
    }
}

/// Provider implied by the shape of a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialProvider {
    Known(ProviderTag),
    Unknown,
}

/// Resolved routing decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderSelection {
    /// Provider that will serve the request.
    pub provider: ProviderTag,
    /// Provider the credential looks like it belongs to.
    pub credential: CredentialProvider,
}

const OPENAI_MODEL_PREFIXES: &[&str] = &["gpt-", "o1", "o3"];
const GOOGLE_MODEL_PREFIX: &str = "gemini-";

const ANTHROPIC_KEY_PREFIX: &str = "sk-ant-";
// `sk-proj-` keys also start with `sk-`; listed for clarity.
const OPENAI_KEY_PREFIXES: &[&str] = &["sk-proj-", "sk-"];
const GOOGLE_KEY_PREFIX: &str = "AIza";

/// Infers the provider from a model identifier; anything unrecognised is Anthropic.
pub fn provider_from_model(model: &str) -> ProviderTag {
    if OPENAI_MODEL_PREFIXES.iter().any(|p| model.starts_with(p)) {
        ProviderTag::OpenAI
    } else if model.starts_with(GOOGLE_MODEL_PREFIX) {
        ProviderTag::Google
    } else {
        ProviderTag::Anthropic
    }
}

/// Infers the provider from the credential prefix.
pub fn provider_from_credential(credential: &str) -> CredentialProvider {
    // Anthropic first: its prefix is itself `sk-`-shaped.
    if credential.starts_with(ANTHROPIC_KEY_PREFIX) {
        CredentialProvider::Known(ProviderTag::Anthropic)
    } else if OPENAI_KEY_PREFIXES.iter().any(|p| credential.starts_with(p)) {
        CredentialProvider::Known(ProviderTag::OpenAI)
    } else if credential.starts_with(GOOGLE_KEY_PREFIX) {
        CredentialProvider::Known(ProviderTag::Google)
    } else {
        CredentialProvider::Unknown
    }
}

/// Resolves the provider and rejects credentials that clearly belong to another vendor.
///
/// An unrecognised credential shape is always accepted; the vendor call
/// itself will then fail authentication if the key is wrong.
pub fn classify(model: &str, credential: &str) -> Result<ProviderSelection, RequestError> {
    let provider = provider_from_model(model);
    let credential_provider = provider_from_credential(credential);

    if let CredentialProvider::Known(key_provider) = credential_provider
        && key_provider != provider
    {
        return Err(RequestError::ProviderKeyMismatch {
            selected: provider,
            credential: key_provider,
        });
    }

    Ok(ProviderSelection {
        provider,
        credential: credential_provider,
    })
}
