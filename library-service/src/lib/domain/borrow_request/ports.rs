use async_trait::async_trait;

use crate::domain::borrow_request::errors::BorrowRequestError;
use crate::domain::borrow_request::models::BorrowRequest;
use crate::domain::borrow_request::models::BorrowRequestId;
use crate::domain::borrow_request::models::BorrowStatus;
use crate::domain::borrow_request::models::CreateBorrowRequestCommand;
use crate::domain::borrow_request::query::BorrowRequestFilter;

/// Port for borrow request operations.
#[async_trait]
pub trait BorrowServicePort: Send + Sync + 'static {
    /// Open a new request in `pending`.
    ///
    /// # Errors
    /// * `Validation` - Blank dates or return date not after borrowed date
    /// * `DatabaseError` - Database operation failed
    async fn create_request(
        &self,
        command: CreateBorrowRequestCommand,
    ) -> Result<BorrowRequest, BorrowRequestError>;

    /// Retrieve a request by identifier.
    ///
    /// # Errors
    /// * `NotFound` - Request does not exist
    async fn get_request(&self, id: &BorrowRequestId) -> Result<BorrowRequest, BorrowRequestError>;

    /// List requests matching a filter, in the filter's order.
    async fn list_requests(
        &self,
        filter: &BorrowRequestFilter,
    ) -> Result<Vec<BorrowRequest>, BorrowRequestError>;

    /// Move a request one step along the lifecycle.
    ///
    /// # Errors
    /// * `NotFound` - Request does not exist
    /// * `InvalidTransition` - `next` is not reachable from the current status
    /// * `Conflict` - Another writer changed the request first
    async fn change_status(
        &self,
        id: &BorrowRequestId,
        next: BorrowStatus,
    ) -> Result<BorrowRequest, BorrowRequestError>;

    /// Remove a request.
    ///
    /// # Errors
    /// * `NotFound` - Request does not exist
    async fn delete_request(&self, id: &BorrowRequestId) -> Result<(), BorrowRequestError>;
}

/// Persistence operations for the borrow request aggregate.
#[async_trait]
pub trait BorrowRequestRepository: Send + Sync + 'static {
    async fn create(&self, request: BorrowRequest) -> Result<BorrowRequest, BorrowRequestError>;

    /// # Returns
    /// Optional request (None if not found)
    async fn find_by_id(
        &self,
        id: &BorrowRequestId,
    ) -> Result<Option<BorrowRequest>, BorrowRequestError>;

    async fn find_where(
        &self,
        filter: &BorrowRequestFilter,
    ) -> Result<Vec<BorrowRequest>, BorrowRequestError>;

    /// Write `next` only if the stored row still has `expected` status and
    /// `expected_version`. Bumps the version on success.
    ///
    /// # Errors
    /// * `Conflict` - Stored status or version no longer match
    /// * `NotFound` - Row was deleted since it was loaded
    async fn compare_and_set_status(
        &self,
        id: &BorrowRequestId,
        expected: BorrowStatus,
        expected_version: i64,
        next: BorrowStatus,
    ) -> Result<BorrowRequest, BorrowRequestError>;

    /// # Errors
    /// * `NotFound` - Request does not exist
    async fn delete(&self, id: &BorrowRequestId) -> Result<(), BorrowRequestError>;
}
