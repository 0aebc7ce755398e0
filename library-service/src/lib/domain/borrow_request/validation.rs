//! Checks a borrow request must pass before it is persisted.
//!
//! Presence is checked first. The ordering rule only runs once both dates
//! are known to exist, so a blank date never produces a second, confusing
//! range error.

use chrono::NaiveDate;

use crate::domain::borrow_request::errors::DateRangeError;
use crate::domain::borrow_request::models::CreateBorrowRequestCommand;
use crate::domain::errors::ValidationErrors;

pub const BLANK_MESSAGE: &str = "can't be blank";
pub const INVALID_RANGE_MESSAGE: &str = "must be after the borrowed date";

/// Dates that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorrowPeriod {
    pub borrowed_date: NaiveDate,
    pub return_date: NaiveDate,
}

/// Validate a pair of optional dates.
///
/// # Errors
/// * `Blank` - Either date is missing
/// * `InvalidRange` - `return_date` is not strictly after `borrowed_date`
pub fn validate_dates(
    borrowed_date: Option<NaiveDate>,
    return_date: Option<NaiveDate>,
) -> Result<BorrowPeriod, DateRangeError> {
    let (borrowed_date, return_date) = match (borrowed_date, return_date) {
        (Some(borrowed_date), Some(return_date)) => (borrowed_date, return_date),
        (borrowed_date, return_date) => {
            return Err(DateRangeError::Blank {
                borrowed_date_missing: borrowed_date.is_none(),
                return_date_missing: return_date.is_none(),
            })
        }
    };

    if return_date <= borrowed_date {
        return Err(DateRangeError::InvalidRange);
    }

    Ok(BorrowPeriod {
        borrowed_date,
        return_date,
    })
}

impl From<DateRangeError> for ValidationErrors {
    fn from(err: DateRangeError) -> Self {
        let mut errors = ValidationErrors::new();
        match err {
            DateRangeError::Blank {
                borrowed_date_missing,
                return_date_missing,
            } => {
                if borrowed_date_missing {
                    errors.add("borrowed_date", BLANK_MESSAGE);
                }
                if return_date_missing {
                    errors.add("return_date", BLANK_MESSAGE);
                }
            }
            DateRangeError::InvalidRange => errors.add("return_date", INVALID_RANGE_MESSAGE),
        }
        errors
    }
}

/// Validate a creation command into its borrow period.
///
/// # Errors
/// Field map keyed by `borrowed_date` and/or `return_date`
pub fn validate(command: &CreateBorrowRequestCommand) -> Result<BorrowPeriod, ValidationErrors> {
    validate_dates(command.borrowed_date, command.return_date).map_err(ValidationErrors::from)
}
