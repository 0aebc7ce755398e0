use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::borrow_request::errors::IdError;
use crate::domain::borrow_request::errors::InvalidTransition;
use crate::domain::borrow_request::errors::StatusError;
use crate::domain::user::models::UserId;

/// Borrow request unique identifier value object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BorrowRequestId(pub Uuid);

impl BorrowRequestId {
    /// Generate a new random borrow request ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a borrow request ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, IdError> {
        Uuid::parse_str(s)
            .map(BorrowRequestId)
            .map_err(|e| IdError::InvalidFormat(e.to_string()))
    }
}

impl Default for BorrowRequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BorrowRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Book reference. Books themselves are managed elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BookId(pub Uuid);

impl BookId {
    /// Parse a book ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, IdError> {
        Uuid::parse_str(s)
            .map(BookId)
            .map_err(|e| IdError::InvalidFormat(e.to_string()))
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Status of a borrow request.
///
/// Declaration order is the sort order and matches the stored codes.
///
/// ```text
/// pending ──> ready ──> borrowed ──> returned
///    │          │
///    └──────────┴──> rejected | cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BorrowStatus {
    Pending,
    Ready,
    Borrowed,
    Returned,
    Rejected,
    Cancelled,
}

impl BorrowStatus {
    pub const ALL: [BorrowStatus; 6] = [
        BorrowStatus::Pending,
        BorrowStatus::Ready,
        BorrowStatus::Borrowed,
        BorrowStatus::Returned,
        BorrowStatus::Rejected,
        BorrowStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowStatus::Pending => "pending",
            BorrowStatus::Ready => "ready",
            BorrowStatus::Borrowed => "borrowed",
            BorrowStatus::Returned => "returned",
            BorrowStatus::Rejected => "rejected",
            BorrowStatus::Cancelled => "cancelled",
        }
    }

    pub fn code(&self) -> i16 {
        match self {
            BorrowStatus::Pending => 0,
            BorrowStatus::Ready => 1,
            BorrowStatus::Borrowed => 2,
            BorrowStatus::Returned => 3,
            BorrowStatus::Rejected => 4,
            BorrowStatus::Cancelled => 5,
        }
    }

    /// # Errors
    /// * `Unknown` - Code outside 0..=5
    pub fn from_code(code: i16) -> Result<Self, StatusError> {
        Self::ALL
            .into_iter()
            .find(|status| status.code() == code)
            .ok_or_else(|| StatusError::Unknown(code.to_string()))
    }

    /// No transition leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BorrowStatus::Returned | BorrowStatus::Rejected | BorrowStatus::Cancelled
        )
    }

    /// Active requests are those neither rejected nor cancelled.
    pub fn is_active(&self) -> bool {
        !matches!(self, BorrowStatus::Rejected | BorrowStatus::Cancelled)
    }

    /// Statuses reachable in one step from `self`.
    pub fn next_statuses(&self) -> &'static [BorrowStatus] {
        match self {
            BorrowStatus::Pending => &[
                BorrowStatus::Ready,
                BorrowStatus::Rejected,
                BorrowStatus::Cancelled,
            ],
            BorrowStatus::Ready => &[
                BorrowStatus::Borrowed,
                BorrowStatus::Rejected,
                BorrowStatus::Cancelled,
            ],
            BorrowStatus::Borrowed => &[BorrowStatus::Returned],
            BorrowStatus::Returned | BorrowStatus::Rejected | BorrowStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: BorrowStatus) -> bool {
        self.next_statuses().contains(&next)
    }

    /// Validate a single step of the lifecycle.
    ///
    /// # Errors
    /// * `InvalidTransition` - `next` is not reachable from `self`
    pub fn transition_to(self, next: BorrowStatus) -> Result<BorrowStatus, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl FromStr for BorrowStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| StatusError::Unknown(s.to_string()))
    }
}

impl fmt::Display for BorrowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Borrow request aggregate.
///
/// `user_id` is `None` once the requesting user has been deleted; the
/// request itself is kept. `version` increases on every status write and
/// guards concurrent transitions.
#[derive(Debug, Clone, PartialEq)]
pub struct BorrowRequest {
    pub id: BorrowRequestId,
    pub user_id: Option<UserId>,
    pub book_id: BookId,
    pub borrowed_date: NaiveDate,
    pub return_date: NaiveDate,
    pub status: BorrowStatus,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BorrowRequest {
    /// A new request in `pending`.
    pub fn pending(
        user_id: UserId,
        book_id: BookId,
        borrowed_date: NaiveDate,
        return_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BorrowRequestId::new(),
            user_id: Some(user_id),
            book_id,
            borrowed_date,
            return_date,
            status: BorrowStatus::Pending,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.user_id.as_ref() == Some(user_id)
    }
}

/// Command to open a borrow request.
///
/// Dates are optional here because blank input is a validation error
/// reported to the caller, not a parse failure.
#[derive(Debug, Clone)]
pub struct CreateBorrowRequestCommand {
    pub user_id: UserId,
    pub book_id: BookId,
    pub borrowed_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    use BorrowStatus::*;

    #[test]
    fn test_happy_path() {
        let status = Pending.transition_to(Ready).unwrap();
        let status = status.transition_to(Borrowed).unwrap();
        let status = status.transition_to(Returned).unwrap();
        assert!(status.is_terminal());
    }

    #[test]
    fn test_backwards_transition_rejected() {
        assert_eq!(
            Borrowed.transition_to(Ready),
            Err(InvalidTransition {
                from: Borrowed,
                to: Ready
            })
        );
    }

    #[test]
    fn test_terminal_statuses_have_no_exit() {
        for terminal in [Returned, Rejected, Cancelled] {
            assert!(terminal.is_terminal());
            for next in BorrowStatus::ALL {
                assert!(terminal.transition_to(next).is_err());
            }
        }
    }

    #[test]
    fn test_transition_table() {
        let legal = [
            (Pending, Ready),
            (Ready, Borrowed),
            (Borrowed, Returned),
            (Pending, Rejected),
            (Pending, Cancelled),
            (Ready, Rejected),
            (Ready, Cancelled),
        ];

        for from in BorrowStatus::ALL {
            for to in BorrowStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    legal.contains(&(from, to)),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_skipping_steps_rejected() {
        assert!(Pending.transition_to(Returned).is_err());
        assert!(Pending.transition_to(Borrowed).is_err());
        assert!(Borrowed.transition_to(Cancelled).is_err());
        assert!(Pending.transition_to(Pending).is_err());
    }

    #[test]
    fn test_active_statuses() {
        let inactive: Vec<BorrowStatus> = BorrowStatus::ALL
            .into_iter()
            .filter(|status| !status.is_active())
            .collect();
        assert_eq!(inactive, vec![Rejected, Cancelled]);
    }

    #[test]
    fn test_codes_and_names() {
        for status in BorrowStatus::ALL {
            assert_eq!(BorrowStatus::from_code(status.code()), Ok(status));
            assert_eq!(status.as_str().parse::<BorrowStatus>(), Ok(status));
        }
        assert!(BorrowStatus::from_code(6).is_err());
        assert!("lost".parse::<BorrowStatus>().is_err());
        assert!(Pending < Ready && Rejected < Cancelled);
    }
}
