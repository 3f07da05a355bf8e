//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Retry engine constants
pub mod retry {
    /// Attempts on the primary model before fallbacks are consulted
    pub const DEFAULT_MAX_RETRIES: u32 = 2;

    /// Base delay between primary retries (milliseconds)
    pub const BASE_DELAY_MS: u64 = 250;

    /// Maximum delay between retries (seconds)
    pub const MAX_DELAY_SECS: u64 = 10;

    /// Backoff multiplier
    pub const BACKOFF_FACTOR: f64 = 2.0;
}

/// HTTP/Network constants
pub mod network {
    /// Default Ollama endpoint
    pub const DEFAULT_API_BASE: &str = "http://localhost:11434";

    /// Per-call model timeout (milliseconds)
    pub const MODEL_CALL_TIMEOUT_MS: u64 = 120_000;

    /// Health probe timeout (seconds)
    pub const HEALTH_TIMEOUT_SECS: u64 = 2;
}

/// HTTP API surface constants
pub mod server {
    /// Default bind address
    pub const DEFAULT_HOST: &str = "127.0.0.1";

    /// Default port
    pub const DEFAULT_PORT: u16 = 5000;

    /// Maximum accepted prompt length (characters)
    pub const MAX_PROMPT_CHARS: usize = 50_000;
}

/// History store constants
pub mod history {
    /// Entries kept before the oldest are trimmed
    pub const DEFAULT_MAX_ENTRIES: usize = 50;
}

/// Pipeline constants
pub mod pipeline {
    /// Sentinel the presenter model is instructed to prefix its output with.
    /// Everything up to and including this marker is stripped from the
    /// comprehensive result.
    pub const PRESENTER_MARKER: &str = "PRESENT TO USER:";

    /// Phrases that flag a prompt as expecting a literal final answer,
    /// switching auto mode to the solve shortcut.
    pub const SOLVE_CUES: [&str; 5] = [
        "return only",
        "output format",
        "exactly the sample output",
        "answer key",
        "final answers",
    ];

    /// Model used by boost mode's self-critique round-trips
    pub const DEFAULT_BOOST_MODEL: &str = "mistral:latest";
}
