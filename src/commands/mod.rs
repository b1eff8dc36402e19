//! Command implementations.
//!
//! # Modules
//! - `serve` - Run the composition server.
//! - `compose` - Stream one composition from a running server.
//! - `config` - Inspect configuration.
//! - `options` - Command option structs.
//!
//! # Architecture
//! ```text
//! CLI (cli.rs)
//!   ├── commands/serve.rs   ─> server/ ─> gateway/orchestrator.rs ─> llm/provider/*
//!   ├── commands/compose.rs ─> ui/streaming.rs
//!   └── commands/config.rs
//! ```

/// Composition client.
pub mod compose;
/// Configuration inspection.
pub mod config;
/// Shared command option structs.
pub mod options;
/// Composition server.
pub mod serve;

pub use options::ComposeOptions;
