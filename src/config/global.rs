// Global configuration singleton
//
// OnceLock + ArcSwap: loaded once at startup, read lock-free afterwards.

use arc_swap::ArcSwap;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use super::loader;
use super::structs::AppConfig;
use crate::error::{GatewayError, Result};

static CONFIG: OnceLock<ArcSwap<AppConfig>> = OnceLock::new();

/// Initialize global configuration (called once at startup)
///
/// Subsequent calls are ignored.
pub fn init_config() -> Result<()> {
    init_config_from(loader::get_config_path().as_deref())
}

/// Like [`init_config`], reading `config_path` instead of the user config file.
pub fn init_config_from(config_path: Option<&Path>) -> Result<()> {
    tracing::debug!("Initializing global configuration...");
    let config = loader::load_config_from(config_path)?;
    CONFIG.get_or_init(|| {
        tracing::info!("Configuration loaded successfully");
        ArcSwap::from_pointee(config)
    });
    Ok(())
}

/// Get global configuration (cheap `Arc` clone)
///
/// Errors if [`init_config`] has not been called.
pub fn get_config() -> Result<Arc<AppConfig>> {
    CONFIG.get().map(|c| c.load_full()).ok_or_else(|| {
        GatewayError::Config("Config not initialized. Call init_config() first.".to_string())
    })
}
