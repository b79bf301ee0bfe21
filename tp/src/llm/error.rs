//! Text-generation collaborator errors

use std::time::Duration;
use thiserror::Error;

/// Errors raised by a text-generation collaborator call
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API key not found: set the {env} environment variable")]
    MissingApiKey { env: String },

    #[error("Unknown LLM provider '{0}'. Supported: groq, openai, anthropic")]
    UnknownProvider(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// HTTP statuses the client loop may retry when `max-retries` is non-zero
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 500 | 502 | 503 | 504 | 529)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_names_env_var() {
        let err = LlmError::MissingApiKey {
            env: "GROQ_API_KEY".to_string(),
        };
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(502));
        assert!(!is_retryable_status(429));
        assert!(!is_retryable_status(400));
    }
}
