use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Postgres;
use sqlx::QueryBuilder;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::borrow_request::errors::BorrowRequestError;
use crate::domain::borrow_request::models::BookId;
use crate::domain::borrow_request::models::BorrowRequest;
use crate::domain::borrow_request::models::BorrowRequestId;
use crate::domain::borrow_request::models::BorrowStatus;
use crate::domain::borrow_request::ports::BorrowRequestRepository;
use crate::domain::borrow_request::query::BorrowRequestFilter;
use crate::domain::borrow_request::query::BorrowRequestOrder;
use crate::domain::user::models::UserId;

const BORROW_REQUEST_COLUMNS: &str =
    "id, user_id, book_id, borrowed_date, return_date, status, version, created_at, updated_at";

pub struct PostgresBorrowRequestRepository {
    pool: PgPool,
}

impl PostgresBorrowRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_request(row: &PgRow) -> Result<BorrowRequest, BorrowRequestError> {
        let status = BorrowStatus::from_code(row.get("status"))?;
        let user_id: Option<Uuid> = row.get("user_id");

        Ok(BorrowRequest {
            id: BorrowRequestId(row.get("id")),
            user_id: user_id.map(UserId),
            book_id: BookId(row.get("book_id")),
            borrowed_date: row.get("borrowed_date"),
            return_date: row.get("return_date"),
            status,
            version: row.get("version"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    /// Ties on the sort column fall back to insertion order.
    fn order_clause(order: Option<BorrowRequestOrder>) -> &'static str {
        match order {
            Some(BorrowRequestOrder::Status) => " ORDER BY status, created_at",
            Some(BorrowRequestOrder::BorrowedDate) => " ORDER BY borrowed_date, created_at",
            Some(BorrowRequestOrder::ReturnDate) => " ORDER BY return_date, created_at",
            None => " ORDER BY created_at",
        }
    }
}

fn db_error(e: sqlx::Error) -> BorrowRequestError {
    BorrowRequestError::DatabaseError(e.to_string())
}

#[async_trait]
impl BorrowRequestRepository for PostgresBorrowRequestRepository {
    async fn create(&self, request: BorrowRequest) -> Result<BorrowRequest, BorrowRequestError> {
        sqlx::query(
            r#"
            INSERT INTO borrow_requests (
                id, user_id, book_id, borrowed_date, return_date,
                status, version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(request.id.0)
        .bind(request.user_id.map(|id| id.0))
        .bind(request.book_id.0)
        .bind(request.borrowed_date)
        .bind(request.return_date)
        .bind(request.status.code())
        .bind(request.version)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(request)
    }

    async fn find_by_id(
        &self,
        id: &BorrowRequestId,
    ) -> Result<Option<BorrowRequest>, BorrowRequestError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM borrow_requests WHERE id = $1",
            BORROW_REQUEST_COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.as_ref().map(Self::row_to_request).transpose()
    }

    async fn find_where(
        &self,
        filter: &BorrowRequestFilter,
    ) -> Result<Vec<BorrowRequest>, BorrowRequestError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM borrow_requests WHERE TRUE",
            BORROW_REQUEST_COLUMNS
        ));

        if let Some(user_id) = filter.user_id {
            builder.push(" AND user_id = ").push_bind(user_id.0);
        }
        if let Some(book_id) = filter.book_id {
            builder.push(" AND book_id = ").push_bind(book_id.0);
        }
        if filter.active_only {
            builder
                .push(" AND status NOT IN (")
                .push_bind(BorrowStatus::Rejected.code())
                .push(", ")
                .push_bind(BorrowStatus::Cancelled.code())
                .push(")");
        }
        builder.push(Self::order_clause(filter.order));

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter().map(Self::row_to_request).collect()
    }

    async fn compare_and_set_status(
        &self,
        id: &BorrowRequestId,
        expected: BorrowStatus,
        expected_version: i64,
        next: BorrowStatus,
    ) -> Result<BorrowRequest, BorrowRequestError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE borrow_requests
            SET status = $4, version = version + 1, updated_at = $5
            WHERE id = $1 AND status = $2 AND version = $3
            RETURNING {}
            "#,
            BORROW_REQUEST_COLUMNS
        ))
        .bind(id.0)
        .bind(expected.code())
        .bind(expected_version)
        .bind(next.code())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match row {
            Some(row) => Self::row_to_request(&row),
            None => match self.find_by_id(id).await? {
                Some(_) => Err(BorrowRequestError::Conflict(id.to_string())),
                None => Err(BorrowRequestError::NotFound(id.to_string())),
            },
        }
    }

    async fn delete(&self, id: &BorrowRequestId) -> Result<(), BorrowRequestError> {
        let result = sqlx::query("DELETE FROM borrow_requests WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(BorrowRequestError::NotFound(id.to_string()));
        }

        Ok(())
    }
}
