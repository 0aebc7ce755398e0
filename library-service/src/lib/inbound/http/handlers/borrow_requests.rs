use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use chrono::DateTime;
use chrono::NaiveDate;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::borrow_request::errors::BorrowRequestError;
use crate::domain::borrow_request::models::BookId;
use crate::domain::borrow_request::models::BorrowRequest;
use crate::domain::borrow_request::models::BorrowRequestId;
use crate::domain::borrow_request::models::BorrowStatus;
use crate::domain::borrow_request::models::CreateBorrowRequestCommand;
use crate::domain::borrow_request::query::BorrowRequestFilter;
use crate::domain::borrow_request::query::BorrowRequestOrder;
use crate::domain::user::models::UserId;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

/// Open a request for the caller.
pub async fn create_borrow_request(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(body): Json<CreateBorrowRequestBody>,
) -> Result<ApiSuccess<BorrowRequestData>, ApiError> {
    let command = body.into_command(caller.user_id)?;

    state
        .borrow_service
        .create_request(command)
        .await
        .map_err(ApiError::from)
        .map(|ref request| ApiSuccess::new(StatusCode::CREATED, request.into()))
}

/// List requests. Non-admin callers only ever see their own.
pub async fn list_borrow_requests(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Query(params): Query<ListBorrowRequestsParams>,
) -> Result<ApiSuccess<Vec<BorrowRequestData>>, ApiError> {
    let filter = params.into_filter(&caller)?;

    let requests = state.borrow_service.list_requests(&filter).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        requests.iter().map(BorrowRequestData::from).collect(),
    ))
}

pub async fn get_borrow_request(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<BorrowRequestData>, ApiError> {
    let id = BorrowRequestId::from_string(&id).map_err(BorrowRequestError::from)?;

    let request = state.borrow_service.get_request(&id).await?;
    ensure_visible(&caller, &request)?;

    Ok(ApiSuccess::new(StatusCode::OK, (&request).into()))
}

/// Move a request along its lifecycle. Owners may only cancel; admins may
/// make any legal transition.
pub async fn change_borrow_request_status(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(body): Json<ChangeStatusBody>,
) -> Result<ApiSuccess<BorrowRequestData>, ApiError> {
    let id = BorrowRequestId::from_string(&id).map_err(BorrowRequestError::from)?;
    let next: BorrowStatus = body.status.parse().map_err(BorrowRequestError::from)?;

    if !caller.is_admin() {
        let request = state.borrow_service.get_request(&id).await?;
        ensure_visible(&caller, &request)?;
        if next != BorrowStatus::Cancelled {
            return Err(ApiError::Forbidden(
                "Only an admin can change the status of a borrow request".to_string(),
            ));
        }
    }

    state
        .borrow_service
        .change_status(&id, next)
        .await
        .map_err(ApiError::from)
        .map(|ref request| ApiSuccess::new(StatusCode::OK, request.into()))
}

pub async fn delete_borrow_request(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<()>, ApiError> {
    if !caller.is_admin() {
        return Err(ApiError::Forbidden("Admin privileges required".to_string()));
    }

    let id = BorrowRequestId::from_string(&id).map_err(BorrowRequestError::from)?;

    state
        .borrow_service
        .delete_request(&id)
        .await
        .map_err(ApiError::from)
        .map(|_| ApiSuccess::new(StatusCode::OK, ()))
}

fn ensure_visible(caller: &AuthenticatedUser, request: &BorrowRequest) -> Result<(), ApiError> {
    if caller.is_admin() || request.is_owned_by(&caller.user_id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Borrow request belongs to another user".to_string(),
        ))
    }
}

/// Dates arrive as `YYYY-MM-DD`. Empty or unparseable values count as blank.
fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateBorrowRequestBody {
    book_id: String,
    borrowed_date: Option<String>,
    return_date: Option<String>,
}

impl CreateBorrowRequestBody {
    fn into_command(self, user_id: UserId) -> Result<CreateBorrowRequestCommand, ApiError> {
        let book_id = BookId::from_string(&self.book_id).map_err(BorrowRequestError::from)?;

        Ok(CreateBorrowRequestCommand {
            user_id,
            book_id,
            borrowed_date: parse_date(self.borrowed_date.as_deref()),
            return_date: parse_date(self.return_date.as_deref()),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListBorrowRequestsParams {
    user_id: Option<String>,
    book_id: Option<String>,
    #[serde(default)]
    active: bool,
    order: Option<String>,
}

impl ListBorrowRequestsParams {
    fn into_filter(self, caller: &AuthenticatedUser) -> Result<BorrowRequestFilter, ApiError> {
        let mut filter = BorrowRequestFilter::default();

        let requested_user = self
            .user_id
            .as_deref()
            .map(UserId::from_string)
            .transpose()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        match requested_user {
            Some(user_id) if caller.can_act_for(&user_id) => filter = filter.by_user(user_id),
            Some(_) => {
                return Err(ApiError::Forbidden(
                    "Cannot list another user's borrow requests".to_string(),
                ))
            }
            None if !caller.is_admin() => filter = filter.by_user(caller.user_id),
            None => {}
        }

        if let Some(book_id) = self.book_id.as_deref() {
            filter = filter.by_book(BookId::from_string(book_id).map_err(BorrowRequestError::from)?);
        }
        if self.active {
            filter = filter.active_only();
        }
        if let Some(order) = self.order.as_deref() {
            let order: BorrowRequestOrder = order
                .parse()
                .map_err(|_| ApiError::BadRequest(format!("Unknown order: {}", order)))?;
            filter = filter.ordered_by(order);
        }

        Ok(filter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangeStatusBody {
    status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BorrowRequestData {
    pub id: String,
    pub user_id: Option<String>,
    pub book_id: String,
    pub borrowed_date: NaiveDate,
    pub return_date: NaiveDate,
    pub status: String,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&BorrowRequest> for BorrowRequestData {
    fn from(request: &BorrowRequest) -> Self {
        Self {
            id: request.id.to_string(),
            user_id: request.user_id.map(|id| id.to_string()),
            book_id: request.book_id.to_string(),
            borrowed_date: request.borrowed_date,
            return_date: request.return_date,
            status: request.status.as_str().to_string(),
            version: request.version,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}
