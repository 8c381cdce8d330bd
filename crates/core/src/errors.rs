use thiserror::Error;

/// Unified error type for the entire coinfolio-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Upstream providers ──────────────────────────────────────────
    /// Network failure, timeout or non-success status from a provider.
    /// Recoverable through stale-cache fallback where a cache exists.
    #[error("Upstream unavailable ({provider}): {message}")]
    UpstreamUnavailable {
        provider: String,
        message: String,
    },

    // ── Client-facing ───────────────────────────────────────────────
    /// Record absent, or not owned by the requesting user.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // ── Internal consistency ────────────────────────────────────────
    /// Unsupported currency pair, missing price mid-valuation, etc.
    /// Aborts the enclosing valuation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    // ── Configuration / serialization / files ───────────────────────
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("File I/O error: {0}")]
    FileIO(String),
}

impl CoreError {
    pub fn upstream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::UpstreamUnavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// True for failures a stale cache entry may paper over.
    pub fn is_upstream(&self) -> bool {
        matches!(self, CoreError::UpstreamUnavailable { .. })
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Strip query parameters: reqwest errors carry the full URL, and
        // provider URLs may include keys or long id lists.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        let message = if e.is_timeout() {
            format!("request timed out: {sanitized}")
        } else {
            sanitized
        };
        CoreError::UpstreamUnavailable {
            provider: "http".into(),
            message,
        }
    }
}
