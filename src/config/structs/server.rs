//! HTTP server and CLI client settings.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

/// Server configuration.
///
/// # Example
/// ```toml
/// [server]
/// bind = "0.0.0.0:3000"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind.parse().map_err(|e| {
            GatewayError::Config(format!("server.bind '{}' is not a socket address: {}", self.bind, e))
        })
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

/// `compose` client configuration.
///
/// # Example
/// ```toml
/// [client]
/// url = "http://127.0.0.1:3000/api/compose"
/// colored = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientConfig {
    #[serde(default = "default_client_url")]
    pub url: String,

    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_client_url(),
            colored: true,
        }
    }
}

fn default_client_url() -> String {
    "http://127.0.0.1:3000/api/compose".to_string()
}

fn default_true() -> bool {
    true
}
