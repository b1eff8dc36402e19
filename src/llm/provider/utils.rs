//! Provider utility functions
//!
//! Contains common functions such as URL processing and key masking

/// Claude API endpoint suffix
pub const CLAUDE_API_SUFFIX: &str = "/v1/messages";

/// OpenAI API endpoint suffix
pub const OPENAI_API_SUFFIX: &str = "/v1/chat/completions";

/// Gemini API path prefix (model and method are appended per request)
pub const GEMINI_API_PREFIX: &str = "/v1beta/models";

/// Claude default base URL
pub const DEFAULT_CLAUDE_BASE: &str = "https://api.anthropic.com";

/// OpenAI default base URL
pub const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com";

/// Gemini default base URL
pub const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com";

/// Default `anthropic-version` header value
pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";

/// Smart completion of an API endpoint
///
/// # Behavior
/// 1. Remove trailing slashes
/// 2. If the URL already ends with the suffix (or a leading part of it), only the rest is appended
/// 3. A base URL with two or more path segments is treated as a custom full endpoint
///
/// # Example
/// ```
/// use strudel_gateway::llm::provider::utils::complete_endpoint;
///
/// assert_eq!(
///     complete_endpoint("https://api.openai.com", "/v1/chat/completions"),
///     "https://api.openai.com/v1/chat/completions"
/// );
///
/// assert_eq!(
///     complete_endpoint("https://proxy.local/v1", "/v1/chat/completions"),
///     "https://proxy.local/v1/chat/completions"
/// );
/// ```
pub fn complete_endpoint(base_url: &str, expected_suffix: &str) -> String {
    let url = base_url.trim_end_matches('/');
    let suffix = expected_suffix.trim_start_matches('/');

    if url.ends_with(suffix) {
        return url.to_string();
    }

    // e.g. url "https://api.com/v1" with suffix "v1/chat/completions"
    // only needs "chat/completions"
    let suffix_parts: Vec<&str> = suffix.split('/').collect();
    for i in 0..suffix_parts.len() {
        let partial_suffix = suffix_parts[..=i].join("/");
        if url.ends_with(&partial_suffix) {
            let remaining_suffix = suffix_parts[i + 1..].join("/");
            if remaining_suffix.is_empty() {
                return url.to_string();
            }
            return format!("{}/{}", url, remaining_suffix);
        }
    }

    if is_complete_api_path(url) {
        return url.to_string();
    }

    format!("{}/{}", url, suffix)
}

/// Path depth >= 2 is considered a user-defined complete path
fn is_complete_api_path(url: &str) -> bool {
    let path = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .and_then(|rest| rest.split_once('/'))
        .map(|(_, path)| path)
        .unwrap_or("");

    path.split('/').filter(|s| !s.is_empty()).count() >= 2
}

/// Builds the Gemini streaming URL for `model`.
///
/// ```
/// use strudel_gateway::llm::provider::utils::gemini_stream_endpoint;
///
/// assert_eq!(
///     gemini_stream_endpoint("https://generativelanguage.googleapis.com/", "gemini-3-flash-preview"),
///     "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-flash-preview:streamGenerateContent?alt=sse"
/// );
/// ```
pub fn gemini_stream_endpoint(base_url: &str, model: &str) -> String {
    format!(
        "{}{}/{}:streamGenerateContent?alt=sse",
        base_url.trim_end_matches('/'),
        GEMINI_API_PREFIX,
        model
    )
}

/// Mask API key to prevent log leaks
///
/// # Rule
/// - more than 8 characters: first 4 + `...` + last 4
/// - otherwise: `****`
///
/// Works on characters, so non-ASCII input never splits a code point.
///
/// # Example
/// ```
/// use strudel_gateway::llm::provider::utils::mask_api_key;
///
/// assert_eq!(mask_api_key("sk-ant-api03-abcdefgh"), "sk-a...efgh");
/// assert_eq!(mask_api_key("short"), "****");
/// ```
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "****".to_string()
    }
}
