use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::users::UserData;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::user::models::UserId;
use crate::inbound::http::router::AppState;
use crate::user::errors::AccountError;

/// Mail a reset link to the owner of `email`.
pub async fn create_password_reset(
    State(state): State<AppState>,
    Json(body): Json<CreatePasswordResetRequest>,
) -> Result<ApiSuccess<PasswordResetData>, ApiError> {
    state
        .account_service
        .forgot_password(&body.email)
        .await
        .map_err(|e| match e {
            AccountError::NotFound(_) => ApiError::NotFound("Email address not found".to_string()),
            other => ApiError::from(other),
        })?;

    Ok(ApiSuccess::new(
        StatusCode::ACCEPTED,
        PasswordResetData {
            message: "Email sent with password reset instructions".to_string(),
        },
    ))
}

/// Set a new password from an emailed reset link.
pub async fn update_password_reset(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(body): Json<UpdatePasswordResetRequest>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    let user_id = UserId::from_string(&body.user_id)
        .map_err(|_| ApiError::from(AccountError::InvalidResetLink))?;

    state
        .account_service
        .reset_password(&user_id, &token, body.password)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatePasswordResetRequest {
    email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdatePasswordResetRequest {
    user_id: String,
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordResetData {
    pub message: String,
}
