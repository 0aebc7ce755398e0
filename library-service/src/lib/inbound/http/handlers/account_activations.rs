use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::sessions::issue_session;
use super::sessions::SessionData;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::user::models::UserId;
use crate::inbound::http::router::AppState;

/// Follow an activation link. A successful activation also logs the user in.
pub async fn activate_account(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(body): Json<ActivateAccountRequest>,
) -> Result<ApiSuccess<SessionData>, ApiError> {
    let user_id =
        UserId::from_string(&body.user_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let user = state
        .account_service
        .activate_with_token(&user_id, &token)
        .await?;

    let session = issue_session(&state, &user)?;
    Ok(ApiSuccess::new(StatusCode::OK, session))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActivateAccountRequest {
    user_id: String,
}
