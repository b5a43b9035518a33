//! Provider error types.

use reqwest::StatusCode;
use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Rejected by provider: {0}")]
    Rejected(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ProviderError {
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Map a non-success HTTP status to the matching variant.
    ///
    /// 429 and 5xx (including the Anthropic 529 overload status) are
    /// transient; other 4xx responses will fail the same way on retry.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        if status == StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited(format!("{}: {}", status, body))
        } else if status.is_server_error() {
            Self::Unavailable(format!("{}: {}", status, body))
        } else {
            Self::Rejected(format!("{}: {}", status, body))
        }
    }

    /// Whether a retry has a chance of succeeding.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::Timeout(_)
                | ProviderError::RateLimited(_)
                | ProviderError::Unavailable(_)
                | ProviderError::Network(_)
        )
    }
}
