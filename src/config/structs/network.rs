//! Network and HTTP configuration structures.

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};
use crate::llm::provider::base::RetryPolicy;

/// Network configuration.
///
/// Controls timeout and transport-retry behavior for vendor requests.
///
/// # Fields
/// - `request_timeout`: HTTP request timeout in seconds, covering the whole stream (default: `300`)
/// - `connect_timeout`: HTTP connect timeout in seconds (default: `10`)
/// - `max_retries`: transport retries before the first byte of a vendor stream (default: `0`)
/// - `retry_delay_ms`: initial retry delay in milliseconds (default: `1000`)
/// - `max_retry_delay_ms`: max retry delay in milliseconds (default: `60000`)
///
/// # Example
/// ```toml
/// [network]
/// request_timeout = 300
/// connect_timeout = 10
/// max_retries = 0
/// retry_delay_ms = 1000
/// max_retry_delay_ms = 60000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// HTTP request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// HTTP connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Transport retries when opening a vendor stream. `0` disables retry.
    #[serde(default)]
    pub max_retries: usize,

    /// Initial retry delay in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Maximum retry delay in milliseconds.
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            max_retries: 0,
            retry_delay_ms: default_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
        }
    }
}

impl NetworkConfig {
    /// Validates network configuration.
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout == 0 {
            return Err(GatewayError::Config(
                "network.request_timeout cannot be 0".into(),
            ));
        }
        if self.connect_timeout == 0 {
            return Err(GatewayError::Config(
                "network.connect_timeout cannot be 0".into(),
            ));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            retry_delay_ms: self.retry_delay_ms,
            max_retry_delay_ms: self.max_retry_delay_ms,
        }
    }
}

fn default_request_timeout() -> u64 {
    300
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_max_retry_delay_ms() -> u64 {
    60_000 // 60 seconds
}
