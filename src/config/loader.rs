// Configuration loading
//
// Reads the user config file and `STRUDEL_GATEWAY__*` environment variables.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use super::structs::AppConfig;
use crate::error::Result;

const APP_NAME: &str = "strudel-gateway";
const ENV_PREFIX: &str = "STRUDEL_GATEWAY";

/// Loads the application configuration
///
/// Priority (high to low):
/// 1. Environment variables (`STRUDEL_GATEWAY__*`, double underscore for nesting)
///    - e.g. `STRUDEL_GATEWAY__SERVER__BIND=0.0.0.0:8080`
///    - e.g. `STRUDEL_GATEWAY__GENERATION__MAX_TOKENS=2048`
/// 2. Config file (`~/.config/strudel-gateway/config.toml`)
/// 3. Defaults (`Default` impls and `serde(default)` attributes)
pub fn load_config() -> Result<AppConfig> {
    load_config_from(get_config_path().as_deref())
}

/// Same as [`load_config`] with an explicit config file location.
pub fn load_config_from(config_path: Option<&Path>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path
        && path.exists()
    {
        tracing::debug!("Loading config file: {}", path.display());
        builder = builder.add_source(File::from(path));
    }

    // Double underscore separates nesting levels so single underscores in
    // field names survive: STRUDEL_GATEWAY__NETWORK__MAX_RETRIES -> network.max_retries
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let app_config: AppConfig = config.try_deserialize()?;
    app_config.validate()?;

    Ok(app_config)
}

/// `~/.config/strudel-gateway/config.toml` (platform specific)
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Platform config directory for this application
pub fn get_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}
