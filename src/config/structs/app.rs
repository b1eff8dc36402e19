//! Top-level application configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::generation::GenerationConfig;
use super::network::NetworkConfig;
use super::providers::ProvidersConfig;
use super::server::{ClientConfig, ServerConfig};
use super::validation::ValidationConfig;

/// Application configuration.
///
/// Effective configuration is merged from multiple sources (low to high):
/// 1. Rust defaults (`Default` + `serde(default)`)
/// 2. User-level config file (platform-specific config directory)
/// 3. `STRUDEL_GATEWAY__*` environment variables
///
/// # Configuration File Locations
/// - Linux: `~/.config/strudel-gateway/config.toml`
/// - macOS: `~/Library/Application Support/strudel-gateway/config.toml`
/// - Windows: `%APPDATA%\strudel-gateway\config\config.toml`
///
/// # Example
/// ```toml
/// [server]
/// bind = "127.0.0.1:3000"
///
/// [generation]
/// default_model = "claude-sonnet-4-20250514"
///
/// [validation]
/// max_voices = 6
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub client: ClientConfig,
}

impl AppConfig {
    /// Validates configuration consistency.
    pub fn validate(&self) -> Result<()> {
        self.server.bind_addr()?;
        self.generation.validate()?;
        self.validation.validate()?;
        self.providers.validate()?;
        self.network.validate()?;
        Ok(())
    }
}
