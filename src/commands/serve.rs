use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::server::{self, AppState};

/// Starts the composition server and blocks until shutdown.
pub async fn run(config: Arc<AppConfig>, bind_override: Option<&str>) -> Result<()> {
    let config = match bind_override {
        Some(bind) => {
            let mut config = (*config).clone();
            config.server.bind = bind.to_string();
            config.server.bind_addr()?;
            Arc::new(config)
        }
        None => config,
    };

    tracing::info!(
        "Default model {}, max_tokens {}, history_limit {}",
        config.generation.default_model,
        config.generation.max_tokens,
        config.generation.history_limit
    );

    let state = AppState::from_config(config)?;
    server::serve(state).await
}
