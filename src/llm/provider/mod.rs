pub mod base;
pub mod claude;
pub mod gemini;
pub mod openai;
pub mod streaming;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::Client;

use crate::config::{NetworkConfig, ProvidersConfig};
use crate::error::{GatewayError, Result};
use crate::gateway::classifier::ProviderTag;
use crate::llm::StreamingProvider;

/// Global HTTP client (shared connection pool)
static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

/// Error text from a failed first construction, so later calls fail fast
static HTTP_CLIENT_ERROR: OnceLock<String> = OnceLock::new();

/// Get or create the global HTTP client
///
/// Every adapter shares one connection pool. The `NetworkConfig` of the
/// first call decides the timeouts. Credentials are never stored on the
/// client; each adapter sends its own key per request.
pub(crate) fn create_http_client(network_config: &NetworkConfig) -> Result<Client> {
    if let Some(client) = HTTP_CLIENT.get() {
        return Ok(client.clone());
    }

    if let Some(err_msg) = HTTP_CLIENT_ERROR.get() {
        return Err(GatewayError::Llm(format!(
            "HTTP client initialization failed earlier: {err_msg}"
        )));
    }

    let user_agent = format!(
        "{}/{} ({})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    );

    match Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(network_config.request_timeout))
        .connect_timeout(Duration::from_secs(network_config.connect_timeout))
        .build()
    {
        Ok(client) => {
            let _ = HTTP_CLIENT.set(client.clone());
            Ok(client)
        }
        Err(e) => {
            let err_msg = e.to_string();
            let _ = HTTP_CLIENT_ERROR.set(err_msg.clone());
            Err(GatewayError::Llm(format!(
                "Failed to create HTTP client: {err_msg}"
            )))
        }
    }
}

/// Builds a per-request adapter for the resolved provider.
///
/// The server holds one factory; the adapter it returns lives for exactly
/// one composition request and carries that request's credential.
pub trait ProviderFactory: Send + Sync {
    fn create(
        &self,
        provider: ProviderTag,
        model: &str,
        api_key: &str,
    ) -> Result<Box<dyn StreamingProvider>>;
}

/// Factory producing the real HTTP adapters.
pub struct HttpProviderFactory {
    providers: ProvidersConfig,
    network: NetworkConfig,
}

impl HttpProviderFactory {
    pub fn new(providers: ProvidersConfig, network: NetworkConfig) -> Self {
        Self { providers, network }
    }
}

impl ProviderFactory for HttpProviderFactory {
    fn create(
        &self,
        provider: ProviderTag,
        model: &str,
        api_key: &str,
    ) -> Result<Box<dyn StreamingProvider>> {
        tracing::debug!(
            "Creating {} adapter: model={}, key={}",
            provider,
            model,
            utils::mask_api_key(api_key)
        );

        match provider {
            ProviderTag::Anthropic => Ok(Box::new(claude::ClaudeProvider::new(
                api_key,
                model,
                &self.providers,
                &self.network,
            )?)),
            ProviderTag::OpenAI => Ok(Box::new(openai::OpenAIProvider::new(
                api_key,
                model,
                &self.providers,
                &self.network,
            )?)),
            ProviderTag::Google => Ok(Box::new(gemini::GeminiProvider::new(
                api_key,
                model,
                &self.providers,
                &self.network,
            )?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::test_utils::ensure_crypto_provider;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_factory_builds_adapter_per_provider() {
        ensure_crypto_provider();
        let factory = HttpProviderFactory::new(ProvidersConfig::default(), NetworkConfig::default());

        let cases = [
            (ProviderTag::Anthropic, "claude-sonnet-4-20250514", "Claude"),
            (ProviderTag::OpenAI, "gpt-4o", "OpenAI"),
            (ProviderTag::Google, "gemini-3-flash-preview", "Gemini"),
        ];
        for (tag, model, name) in cases {
            let adapter = factory.create(tag, model, "key").unwrap();
            assert_eq!(adapter.name(), name);
            assert_eq!(adapter.model(), model);
        }
    }
}
