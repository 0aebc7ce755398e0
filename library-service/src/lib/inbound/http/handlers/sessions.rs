use auth::SessionClaims;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::users::UserData;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;
use crate::user::errors::AccountError;

/// Password login. With `remember_me` a persistent-login token is issued;
/// without it any previous one is revoked.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequestBody>,
) -> Result<ApiSuccess<SessionData>, ApiError> {
    let user = state
        .account_service
        .authenticate(&body.email, &body.password)
        .await?;

    if !user.activated {
        return Err(AccountError::NotActivated.into());
    }

    let remember_token = if body.remember_me {
        Some(state.account_service.remember(&user.id).await?)
    } else {
        state.account_service.forget(&user.id).await?;
        None
    };

    let mut session = issue_session(&state, &user)?;
    session.remember_token = remember_token;

    tracing::info!(user_id = %user.id, remember_me = body.remember_me, "User logged in");
    Ok(ApiSuccess::new(StatusCode::OK, session))
}

/// Persistent login from a stored remember token.
pub async fn login_remembered(
    State(state): State<AppState>,
    Json(body): Json<RememberedLoginRequestBody>,
) -> Result<ApiSuccess<SessionData>, ApiError> {
    let user_id = UserId::from_string(&body.user_id)
        .map_err(|_| ApiError::from(AccountError::InvalidCredentials))?;

    let user = state
        .account_service
        .login_with_remember_token(&user_id, &body.remember_token)
        .await?;

    if !user.activated {
        return Err(AccountError::NotActivated.into());
    }

    let session = issue_session(&state, &user)?;
    Ok(ApiSuccess::new(StatusCode::OK, session))
}

/// Revoke the caller's persistent login.
pub async fn logout(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
) -> Result<ApiSuccess<()>, ApiError> {
    state.account_service.forget(&caller.user_id).await?;
    tracing::info!(user_id = %caller.user_id, "User logged out");
    Ok(ApiSuccess::new(StatusCode::OK, ()))
}

pub(crate) fn issue_session(state: &AppState, user: &User) -> Result<SessionData, ApiError> {
    let claims = SessionClaims::for_user(
        user.id,
        user.name.as_str(),
        user.role.as_str(),
        state.jwt_expiration_hours,
    );

    let token = state
        .authenticator
        .issue_session(&claims)
        .map_err(|e| ApiError::InternalServerError(format!("Token generation failed: {}", e)))?;

    Ok(SessionData {
        user: user.into(),
        token,
        remember_token: None,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequestBody {
    email: String,
    password: String,
    #[serde(default)]
    remember_me: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RememberedLoginRequestBody {
    user_id: String,
    remember_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionData {
    pub user: UserData,
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remember_token: Option<String>,
}
