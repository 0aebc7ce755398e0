use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::borrow_request::errors::BorrowRequestError;
use crate::domain::borrow_request::models::BorrowRequest;
use crate::domain::borrow_request::models::BorrowRequestId;
use crate::domain::borrow_request::models::BorrowStatus;
use crate::domain::borrow_request::models::CreateBorrowRequestCommand;
use crate::domain::borrow_request::ports::BorrowRequestRepository;
use crate::domain::borrow_request::ports::BorrowServicePort;
use crate::domain::borrow_request::query::BorrowRequestFilter;
use crate::domain::borrow_request::validation;

/// Domain service implementation for borrow request operations.
pub struct BorrowService<R>
where
    R: BorrowRequestRepository,
{
    repository: Arc<R>,
}

impl<R> BorrowService<R>
where
    R: BorrowRequestRepository,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    async fn load(&self, id: &BorrowRequestId) -> Result<BorrowRequest, BorrowRequestError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| BorrowRequestError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl<R> BorrowServicePort for BorrowService<R>
where
    R: BorrowRequestRepository,
{
    async fn create_request(
        &self,
        command: CreateBorrowRequestCommand,
    ) -> Result<BorrowRequest, BorrowRequestError> {
        let period = validation::validate(&command)?;

        let request = BorrowRequest::pending(
            command.user_id,
            command.book_id,
            period.borrowed_date,
            period.return_date,
            Utc::now(),
        );

        let created = self.repository.create(request).await?;
        tracing::info!(
            borrow_request_id = %created.id,
            user_id = %command.user_id,
            book_id = %created.book_id,
            "Borrow request created"
        );
        Ok(created)
    }

    async fn get_request(&self, id: &BorrowRequestId) -> Result<BorrowRequest, BorrowRequestError> {
        self.load(id).await
    }

    async fn list_requests(
        &self,
        filter: &BorrowRequestFilter,
    ) -> Result<Vec<BorrowRequest>, BorrowRequestError> {
        self.repository.find_where(filter).await
    }

    async fn change_status(
        &self,
        id: &BorrowRequestId,
        next: BorrowStatus,
    ) -> Result<BorrowRequest, BorrowRequestError> {
        let current = self.load(id).await?;
        let next = current.status.transition_to(next)?;

        let updated = self
            .repository
            .compare_and_set_status(id, current.status, current.version, next)
            .await?;

        tracing::info!(
            borrow_request_id = %id,
            from = %current.status,
            to = %next,
            "Borrow request status changed"
        );
        Ok(updated)
    }

    async fn delete_request(&self, id: &BorrowRequestId) -> Result<(), BorrowRequestError> {
        self.repository.delete(id).await?;
        tracing::info!(borrow_request_id = %id, "Borrow request deleted");
        Ok(())
    }
}
