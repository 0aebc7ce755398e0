use std::str::FromStr;

use crate::domain::borrow_request::errors::StatusError;
use crate::domain::borrow_request::models::BookId;
use crate::domain::borrow_request::models::BorrowRequest;
use crate::domain::user::models::UserId;

/// Read-only, composable view over a set of borrow requests.
///
/// Every combinator consumes the view and returns a new one; the
/// underlying slice is never touched. Orderings are stable.
///
/// ```ignore
/// let mine = BorrowRequestQuery::new(&requests)
///     .by_user(user_id)
///     .active_only()
///     .ordered_by_return_date();
/// ```
#[derive(Debug, Clone)]
pub struct BorrowRequestQuery<'a> {
    items: Vec<&'a BorrowRequest>,
}

impl<'a> BorrowRequestQuery<'a> {
    pub fn new(requests: &'a [BorrowRequest]) -> Self {
        Self {
            items: requests.iter().collect(),
        }
    }

    pub fn by_user(self, user_id: UserId) -> Self {
        self.filter(|request| request.is_owned_by(&user_id))
    }

    pub fn by_book(self, book_id: BookId) -> Self {
        self.filter(|request| request.book_id == book_id)
    }

    /// Drop rejected and cancelled requests.
    pub fn active_only(self) -> Self {
        self.filter(BorrowRequest::is_active)
    }

    pub fn ordered_by_status(mut self) -> Self {
        self.items.sort_by_key(|request| request.status);
        self
    }

    pub fn ordered_by_borrowed_date(mut self) -> Self {
        self.items.sort_by_key(|request| request.borrowed_date);
        self
    }

    pub fn ordered_by_return_date(mut self) -> Self {
        self.items.sort_by_key(|request| request.return_date);
        self
    }

    pub fn ordered_by(self, order: BorrowRequestOrder) -> Self {
        match order {
            BorrowRequestOrder::Status => self.ordered_by_status(),
            BorrowRequestOrder::BorrowedDate => self.ordered_by_borrowed_date(),
            BorrowRequestOrder::ReturnDate => self.ordered_by_return_date(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a BorrowRequest> + '_ {
        self.items.iter().copied()
    }

    /// Owned copies of the selected requests, in view order.
    pub fn to_vec(&self) -> Vec<BorrowRequest> {
        self.items.iter().map(|request| (*request).clone()).collect()
    }

    fn filter(mut self, predicate: impl Fn(&BorrowRequest) -> bool) -> Self {
        self.items.retain(|request| predicate(*request));
        self
    }
}

/// Sort keys accepted by list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowRequestOrder {
    Status,
    BorrowedDate,
    ReturnDate,
}

impl BorrowRequestOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowRequestOrder::Status => "status",
            BorrowRequestOrder::BorrowedDate => "borrowed_date",
            BorrowRequestOrder::ReturnDate => "return_date",
        }
    }
}

impl FromStr for BorrowRequestOrder {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status" => Ok(BorrowRequestOrder::Status),
            "borrowed_date" => Ok(BorrowRequestOrder::BorrowedDate),
            "return_date" => Ok(BorrowRequestOrder::ReturnDate),
            other => Err(StatusError::Unknown(format!("order {}", other))),
        }
    }
}

/// Declarative form of a query, shared by the repository and in-memory views.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BorrowRequestFilter {
    pub user_id: Option<UserId>,
    pub book_id: Option<BookId>,
    pub active_only: bool,
    pub order: Option<BorrowRequestOrder>,
}

impl BorrowRequestFilter {
    pub fn by_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn by_book(mut self, book_id: BookId) -> Self {
        self.book_id = Some(book_id);
        self
    }

    pub fn active_only(mut self) -> Self {
        self.active_only = true;
        self
    }

    pub fn ordered_by(mut self, order: BorrowRequestOrder) -> Self {
        self.order = Some(order);
        self
    }

    /// Evaluate the filter over an in-memory slice.
    pub fn apply<'a>(&self, requests: &'a [BorrowRequest]) -> BorrowRequestQuery<'a> {
        let mut query = BorrowRequestQuery::new(requests);
        if let Some(user_id) = self.user_id {
            query = query.by_user(user_id);
        }
        if let Some(book_id) = self.book_id {
            query = query.by_book(book_id);
        }
        if self.active_only {
            query = query.active_only();
        }
        if let Some(order) = self.order {
            query = query.ordered_by(order);
        }
        query
    }
}
