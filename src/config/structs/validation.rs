//! Thresholds handed to the output validator.

use serde::{Deserialize, Serialize};

use crate::constants::validation::{DEFAULT_MAX_LINES, DEFAULT_MAX_RANDOM_USAGE, DEFAULT_MAX_VOICES};
use crate::error::{GatewayError, Result};
use crate::gateway::validator::ValidationLimits;

/// Validation configuration.
///
/// # Example
/// ```toml
/// [validation]
/// max_voices = 6
/// max_lines = 80
/// max_random_usage = 4
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ValidationConfig {
    #[serde(default = "default_max_voices")]
    pub max_voices: usize,

    #[serde(default = "default_max_lines")]
    pub max_lines: usize,

    #[serde(default = "default_max_random_usage")]
    pub max_random_usage: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_voices: DEFAULT_MAX_VOICES,
            max_lines: DEFAULT_MAX_LINES,
            max_random_usage: DEFAULT_MAX_RANDOM_USAGE,
        }
    }
}

impl ValidationConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("max_voices", self.max_voices),
            ("max_lines", self.max_lines),
            ("max_random_usage", self.max_random_usage),
        ] {
            if value == 0 {
                return Err(GatewayError::Config(format!(
                    "validation.{name} cannot be 0"
                )));
            }
        }
        Ok(())
    }

    pub fn limits(&self) -> ValidationLimits {
        ValidationLimits {
            max_voices: self.max_voices,
            max_lines: self.max_lines,
            max_random_usage: self.max_random_usage,
        }
    }
}

fn default_max_voices() -> usize {
    DEFAULT_MAX_VOICES
}

fn default_max_lines() -> usize {
    DEFAULT_MAX_LINES
}

fn default_max_random_usage() -> usize {
    DEFAULT_MAX_RANDOM_USAGE
}
