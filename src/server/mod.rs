//! HTTP surface: `POST /api/compose` (plus its `/api/claude` alias) and
//! `GET /health`.

pub mod handlers;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::Result;
use crate::gateway::{CodeValidator, PromptBuilder, StrudelPromptBuilder, StrudelValidator};
use crate::llm::provider::{HttpProviderFactory, ProviderFactory};

/// Shared, read-only server state. Cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub providers: Arc<dyn ProviderFactory>,
    pub prompts: Arc<dyn PromptBuilder>,
    pub validator: Arc<dyn CodeValidator>,
}

impl AppState {
    /// State backed by the real vendor adapters and the default rule set.
    pub fn from_config(config: Arc<AppConfig>) -> Result<Self> {
        let mut prompts = StrudelPromptBuilder::new(config.generation.history_limit);
        if let Some(path) = &config.generation.system_prompt_path {
            prompts = prompts.with_system_prompt_file(path)?;
        }

        Ok(Self {
            providers: Arc::new(HttpProviderFactory::new(
                config.providers.clone(),
                config.network.clone(),
            )),
            prompts: Arc::new(prompts),
            validator: Arc::new(StrudelValidator),
            config,
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/compose", post(handlers::compose))
        .route("/api/claude", post(handlers::compose))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `server.bind` and serves until Ctrl-C.
pub async fn serve(state: AppState) -> Result<()> {
    let addr = state.config.server.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received, draining connections"),
        Err(e) => tracing::warn!("Failed to listen for Ctrl-C: {}", e),
    }
}
