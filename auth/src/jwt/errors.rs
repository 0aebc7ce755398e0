use thiserror::Error;

/// Error type for session token operations.
#[derive(Debug, Clone, Error)]
pub enum JwtError {
    #[error("Failed to encode session token: {0}")]
    EncodingFailed(String),

    #[error("Session token is expired")]
    TokenExpired,

    #[error("Session token is invalid: {0}")]
    InvalidToken(String),
}
