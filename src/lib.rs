//! # strudel-gateway
//!
//! Streaming composition gateway for [Strudel](https://strudel.cc) live-coding
//! music.
//!
//! A client posts a natural-language request (plus, when editing, the current
//! code and a short chat history). The gateway picks the vendor from the model
//! name, streams the answer back as server-sent events, validates the code it
//! finds, and at most once re-runs generation with a corrective prompt.
//!
//! ## Features
//! - **Multiple vendors**: Anthropic Claude, OpenAI, Google Gemini
//! - **Caller-supplied credentials**: keys arrive per request and are never stored
//! - **Validation-gated retry**: one corrective pass for code that breaks the rules
//! - **Stable error taxonomy**: auth, rate limit, model and generic failures
//!
//! ## Quick start
//! ```bash
//! strudel-gateway serve
//! strudel-gateway compose --api-key sk-ant-... "slow dub techno with a warm pad"
//! ```
//!
//! ## Library use
//! ```no_run
//! use std::sync::Arc;
//! use strudel_gateway::config::AppConfig;
//! use strudel_gateway::server::{AppState, create_router};
//!
//! # fn example() -> strudel_gateway::error::Result<()> {
//! let state = AppState::from_config(Arc::new(AppConfig::default()))?;
//! let router = create_router(state);
//! # let _ = router;
//! # Ok(())
//! # }
//! ```
//!
//! ## Core modules
//! - [`gateway`] - Classification, prompts, validation, orchestration, wire format
//! - [`llm`] - Vendor streaming adapters
//! - [`server`] - HTTP endpoints
//! - [`commands`] - CLI commands
//! - [`config`] - Layered configuration
//! - [`error`] - Error types and upstream failure classification
//! - [`ui`] - Terminal output

pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod llm;
pub mod server;
pub mod ui;
