//! Global constants

/// Generation defaults
pub mod generation {
    /// Model used when the request names none
    pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

    /// Token budget handed to every vendor call
    pub const DEFAULT_MAX_TOKENS: u32 = 4096;

    /// Chat history window (first message + last N-1)
    pub const DEFAULT_HISTORY_LIMIT: usize = 6;

    /// Status phrase sent before the corrective pass
    pub const DEFAULT_RETRY_STATUS: &str = "simplifying...";
}

/// Code extraction
pub mod extract {
    /// Fenced regions whose trimmed content is this short or shorter are skipped
    pub const MIN_CODE_LENGTH: usize = 30;
}

/// Validation thresholds
pub mod validation {
    pub const DEFAULT_MAX_VOICES: usize = 6;
    pub const DEFAULT_MAX_LINES: usize = 80;
    pub const DEFAULT_MAX_RANDOM_USAGE: usize = 4;
}

/// Buffering
pub mod stream {
    /// Outbound frames buffered between the generation task and the HTTP body
    pub const EVENT_CHANNEL_CAPACITY: usize = 64;
}

/// Fixed user-facing messages
pub mod messages {
    pub const INVALID_API_KEY: &str =
        "This API key does not exist. Please check your API key in Settings.";

    pub const UNCLASSIFIED_STREAM_ERROR: &str = "stream error";
}
