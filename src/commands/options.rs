//! Command option structures
//!
//! Built from parsed CLI arguments and handed to the command implementations.

use std::path::{Path, PathBuf};

use crate::config::ClientConfig;
use crate::gateway::Mode;

/// Environment variable consulted when `--api-key` is not given.
pub const API_KEY_ENV: &str = "STRUDEL_API_KEY";

/// `compose` command options
///
/// # Example
/// ```no_run
/// use strudel_gateway::commands::options::ComposeOptions;
///
/// let options = ComposeOptions {
///     prompt: "slow dub techno with a warm pad".to_string(),
///     edit_file: None,
///     model: Some("gpt-4o"),
///     api_key: None,
///     output: None,
///     url: None,
///     colored: true,
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ComposeOptions<'a> {
    pub prompt: String,
    /// File holding the code to edit; `None` composes a new piece
    pub edit_file: Option<&'a Path>,
    pub model: Option<&'a str>,
    /// Explicit key; [`API_KEY_ENV`] is used when `None`
    pub api_key: Option<&'a str>,
    pub output: Option<&'a Path>,
    /// Endpoint override; `client.url` when `None`
    pub url: Option<&'a str>,
    pub colored: bool,
}

impl<'a> ComposeOptions<'a> {
    pub fn from_cli(
        prompt: &[String],
        edit_file: Option<&'a PathBuf>,
        model: Option<&'a str>,
        api_key: Option<&'a str>,
        output: Option<&'a PathBuf>,
        url: Option<&'a str>,
        client: &ClientConfig,
    ) -> Self {
        Self {
            prompt: prompt.join(" "),
            edit_file: edit_file.map(PathBuf::as_path),
            model,
            api_key,
            output: output.map(PathBuf::as_path),
            url,
            colored: client.colored,
        }
    }

    pub fn mode(&self) -> Mode {
        if self.edit_file.is_some() {
            Mode::Edit
        } else {
            Mode::New
        }
    }

    /// Explicit key first, then the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .map(str::to_string)
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.is_empty())
    }

    pub fn endpoint<'c>(&'c self, client: &'c ClientConfig) -> &'c str {
        self.url.unwrap_or(&client.url)
    }
}
