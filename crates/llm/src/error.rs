//! Error types for the llm crate.

use thiserror::Error;

/// Errors raised while talking to a language model provider.
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    #[error("LLM provider not configured: {env_var} is not set")]
    NotConfigured { env_var: String },

    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("LLM API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM request timed out")]
    Timeout,

    #[error("LLM response parse error: {reason}")]
    ResponseParse { reason: String },
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// Result alias for provider calls.
pub type LlmResult<T> = Result<T, LlmError>;
