use thiserror::Error;

use crate::domain::borrow_request::models::BorrowStatus;
use crate::domain::errors::ValidationErrors;

/// Error for BorrowRequestId and BookId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for status parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatusError {
    #[error("Unknown status: {0}")]
    Unknown(String),
}

/// Date checks applied before a request is persisted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DateRangeError {
    /// One or both dates are missing; ordering was not evaluated.
    #[error("borrowed date and return date can't be blank")]
    Blank {
        borrowed_date_missing: bool,
        return_date_missing: bool,
    },

    #[error("return date must be after the borrowed date")]
    InvalidRange,
}

/// A status change outside the legal transition table.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Cannot move a borrow request from {from} to {to}")]
pub struct InvalidTransition {
    pub from: BorrowStatus,
    pub to: BorrowStatus,
}

/// Top-level error for all borrow request operations
#[derive(Debug, Clone, Error)]
pub enum BorrowRequestError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Invalid identifier: {0}")]
    InvalidId(#[from] IdError),

    #[error("Invalid status: {0}")]
    InvalidStatus(#[from] StatusError),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("Borrow request not found: {0}")]
    NotFound(String),

    #[error("Borrow request {0} was changed concurrently")]
    Conflict(String),

    // Infrastructure errors
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<ValidationErrors> for BorrowRequestError {
    fn from(errors: ValidationErrors) -> Self {
        BorrowRequestError::Validation(errors)
    }
}
