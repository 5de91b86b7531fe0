//! Error types for the PromptLab domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all PromptLab operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Reasoning chain errors ---
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether sending the same request again could succeed.
    ///
    /// Authentication failures and 4xx rejections are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::RateLimited { .. }
            | Self::Timeout(_)
            | Self::Network(_)
            | Self::InvalidResponse(_) => true,
            Self::AuthenticationFailed(_) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Cannot generate improved thinking: no previous THINK step found for evaluation")]
    NoPreviousThink,

    #[error("Conversation has no steps")]
    EmptyConversation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn server_errors_are_retryable() {
        let err = ProviderError::ApiError {
            status_code: 503,
            message: "unavailable".into(),
        };
        assert!(err.is_retryable());
        assert!(ProviderError::Network("reset".into()).is_retryable());
        assert!(ProviderError::RateLimited { retry_after_secs: 5 }.is_retryable());
    }

    #[test]
    fn client_errors_are_final() {
        let err = ProviderError::ApiError {
            status_code: 400,
            message: "bad request".into(),
        };
        assert!(!err.is_retryable());
        assert!(!ProviderError::AuthenticationFailed("bad key".into()).is_retryable());
    }

    #[test]
    fn chain_error_wraps_into_top_level() {
        let err: Error = ChainError::NoPreviousThink.into();
        assert!(err.to_string().contains("THINK"));
    }
}
