use thiserror::Error;

use crate::domain::errors::ValidationErrors;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for display name validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserNameError {
    #[error("can't be blank")]
    Blank,

    #[error("is too long (maximum is {max} characters)")]
    TooLong { max: usize, actual: usize },
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("can't be blank")]
    Blank,

    #[error("is too long (maximum is {max} characters)")]
    TooLong { max: usize, actual: usize },

    #[error("is invalid: {0}")]
    InvalidFormat(String),
}

/// Error for plaintext password rule failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordRuleError {
    #[error("can't be blank")]
    Blank,

    #[error("is too short (minimum is {min} characters)")]
    TooShort { min: usize, actual: usize },
}

/// Error for Role parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("Unknown role: {0}")]
    Unknown(String),
}

/// Error for mail delivery operations
#[derive(Debug, Clone, Error)]
pub enum MailerError {
    #[error("Failed to build message: {0}")]
    InvalidMessage(String),

    #[error("Failed to deliver message: {0}")]
    DeliveryFailed(String),
}

/// Top-level error for all account operations
#[derive(Debug, Clone, Error)]
pub enum AccountError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Invalid user ID: {0}")]
    InvalidUserId(#[from] UserIdError),

    // Domain-level errors
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account not activated")]
    NotActivated,

    #[error("Invalid activation link")]
    InvalidActivationLink,

    #[error("Invalid password reset link")]
    InvalidResetLink,

    #[error("Password reset has expired")]
    ExpiredToken,

    // Infrastructure errors
    #[error("Digest computation failed: {0}")]
    Hashing(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<ValidationErrors> for AccountError {
    fn from(errors: ValidationErrors) -> Self {
        AccountError::Validation(errors)
    }
}

impl From<auth::PasswordError> for AccountError {
    fn from(err: auth::PasswordError) -> Self {
        AccountError::Hashing(err.to_string())
    }
}
