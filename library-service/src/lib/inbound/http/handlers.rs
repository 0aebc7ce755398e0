use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::borrow_request::errors::BorrowRequestError;
use crate::domain::errors::ValidationErrors;
use crate::user::errors::AccountError;

pub mod account_activations;
pub mod borrow_requests;
pub mod password_resets;
pub mod sessions;
pub mod users;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    UnprocessableEntity(String),
    Validation(ValidationErrors),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    Forbidden(String),
    Gone(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(errors) => {
                let status = StatusCode::UNPROCESSABLE_ENTITY;
                let body = ApiResponseBody::new_validation_error(status, errors);
                return (status, Json(body)).into_response();
            }
            ApiError::InternalServerError(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Gone(msg) => (StatusCode::GONE, msg),
        };

        (status, Json(ApiResponseBody::new_error(status, message))).into_response()
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(errors) => ApiError::Validation(errors),
            AccountError::NotFound(_) => ApiError::NotFound(err.to_string()),
            AccountError::EmailAlreadyExists(_) => ApiError::Conflict(err.to_string()),
            AccountError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AccountError::NotActivated => ApiError::Forbidden(
                "Account not activated. Check your email for the activation link.".to_string(),
            ),
            AccountError::InvalidActivationLink | AccountError::InvalidResetLink => {
                ApiError::NotFound(err.to_string())
            }
            AccountError::ExpiredToken => ApiError::Gone(err.to_string()),
            AccountError::InvalidUserId(_) => ApiError::BadRequest(err.to_string()),
            AccountError::Hashing(_) | AccountError::DatabaseError(_) => {
                ApiError::InternalServerError(err.to_string())
            }
        }
    }
}

impl From<BorrowRequestError> for ApiError {
    fn from(err: BorrowRequestError) -> Self {
        match err {
            BorrowRequestError::Validation(errors) => ApiError::Validation(errors),
            BorrowRequestError::InvalidId(_) => ApiError::BadRequest(err.to_string()),
            BorrowRequestError::InvalidStatus(_) => ApiError::UnprocessableEntity(err.to_string()),
            BorrowRequestError::NotFound(_) => ApiError::NotFound(err.to_string()),
            BorrowRequestError::InvalidTransition(_) | BorrowRequestError::Conflict(_) => {
                ApiError::Conflict(err.to_string())
            }
            BorrowRequestError::DatabaseError(_) => {
                ApiError::InternalServerError(err.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData {
                message,
                fields: None,
            },
        }
    }

    pub fn new_validation_error(status_code: StatusCode, errors: ValidationErrors) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData {
                message: "Validation failed".to_string(),
                fields: Some(errors.fields().clone()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}
