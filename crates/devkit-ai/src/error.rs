use thiserror::Error;

/// Every way an AI request can fail. Callers match on the variant to pick
/// a message; none of them are retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AiError {
    #[error("AI is not configured: set GEMINI_API_KEY or run `devkit config set-key <key>`")]
    NotConfigured,

    #[error("API key rejected: {0}")]
    Auth(String),

    #[error("rate limit reached, wait a moment and try again: {0}")]
    RateLimit(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("AI request failed: {0}")]
    Unknown(String),
}
