use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::account_activations::activate_account;
use super::handlers::borrow_requests::change_borrow_request_status;
use super::handlers::borrow_requests::create_borrow_request;
use super::handlers::borrow_requests::delete_borrow_request;
use super::handlers::borrow_requests::get_borrow_request;
use super::handlers::borrow_requests::list_borrow_requests;
use super::handlers::password_resets::create_password_reset;
use super::handlers::password_resets::update_password_reset;
use super::handlers::sessions::login;
use super::handlers::sessions::login_remembered;
use super::handlers::sessions::logout;
use super::handlers::users::delete_user;
use super::handlers::users::get_user;
use super::handlers::users::register_user;
use super::middleware::authenticate as auth_middleware;
use crate::domain::borrow_request::ports::BorrowServicePort;
use crate::domain::user::ports::AccountServicePort;

#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<dyn AccountServicePort>,
    pub borrow_service: Arc<dyn BorrowServicePort>,
    pub authenticator: Arc<Authenticator>,
    pub jwt_expiration_hours: i64,
}

pub fn create_router(
    account_service: Arc<dyn AccountServicePort>,
    borrow_service: Arc<dyn BorrowServicePort>,
    authenticator: Arc<Authenticator>,
    jwt_expiration_hours: i64,
) -> Router {
    let state = AppState {
        account_service,
        borrow_service,
        authenticator,
        jwt_expiration_hours,
    };

    let public_routes = Router::new()
        .route("/api/users", post(register_user))
        .route("/api/account_activations/:token", post(activate_account))
        .route("/api/login", post(login))
        .route("/api/login/remembered", post(login_remembered))
        .route("/api/password_resets", post(create_password_reset))
        .route("/api/password_resets/:token", patch(update_password_reset));

    let protected_routes = Router::new()
        .route("/api/logout", delete(logout))
        .route("/api/users/:user_id", get(get_user).delete(delete_user))
        .route(
            "/api/borrow_requests",
            get(list_borrow_requests).post(create_borrow_request),
        )
        .route(
            "/api/borrow_requests/:borrow_request_id",
            get(get_borrow_request).delete(delete_borrow_request),
        )
        .route(
            "/api/borrow_requests/:borrow_request_id/status",
            patch(change_borrow_request_status),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
