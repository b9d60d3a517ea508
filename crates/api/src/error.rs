//! Unified error handling for the API.
//!
//! Every handler returns [`AppError`]; its `IntoResponse` impl turns the
//! typed error into the JSON body `{"message": ...}` the frontend expects.
//! Anything mapping to a 5xx is captured in Sentry and collapsed to a bare
//! "Server error" so internals never leak to clients.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::email::EmailError;
use crate::services::orders::OrderFlowError;

/// Convenience alias used by the handlers.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication or account error.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Purchase flow error.
    #[error("Order error: {0}")]
    Orders(#[from] OrderFlowError),

    /// Email rendering or delivery failed.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Request is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Conflicts with the current state of a resource.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Catch-all; the payload is for logs, clients see "Server error".
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The HTTP status and client-facing message for this error.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Database(err) => repository_response(err),
            Self::Auth(err) => auth_response(err),
            Self::Orders(err) => order_response(err),
            Self::Email(_) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_owned())
            }
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
            Self::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message.clone()),
            Self::Forbidden(message) => (StatusCode::FORBIDDEN, message.clone()),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Self::Conflict(message) => (StatusCode::CONFLICT, message.clone()),
        }
    }
}

fn repository_response(err: &RepositoryError) -> (StatusCode, String) {
    match err {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_owned()),
        RepositoryError::Conflict(message) => (StatusCode::CONFLICT, message.clone()),
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_owned())
        }
    }
}

fn auth_response(err: &AuthError) -> (StatusCode, String) {
    match err {
        // Wrong password and unknown user are indistinguishable on login.
        AuthError::InvalidCredentials | AuthError::UserNotFound => {
            (StatusCode::UNAUTHORIZED, "Invalid credentials".to_owned())
        }
        AuthError::UserAlreadyExists => {
            (StatusCode::CONFLICT, "User already exists".to_owned())
        }
        AuthError::InvalidEmail(_) => {
            (StatusCode::BAD_REQUEST, "Invalid email address".to_owned())
        }
        AuthError::WeakPassword(message) => (StatusCode::BAD_REQUEST, message.clone()),
        AuthError::InvalidToken => {
            (StatusCode::UNAUTHORIZED, "Not authorized, token failed".to_owned())
        }
        AuthError::Repository(err) => repository_response(err),
        AuthError::TokenCreation | AuthError::PasswordHash => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_owned())
        }
    }
}

fn order_response(err: &OrderFlowError) -> (StatusCode, String) {
    match err {
        OrderFlowError::EmptyOrder => (
            StatusCode::BAD_REQUEST,
            "Order must include at least one car.".to_owned(),
        ),
        OrderFlowError::InvalidItem(_) => (
            StatusCode::BAD_REQUEST,
            "Each car must have a valid price.".to_owned(),
        ),
        OrderFlowError::ModelNotFound => (StatusCode::NOT_FOUND, "Model not found".to_owned()),
        OrderFlowError::OutOfStock { model } => {
            (StatusCode::CONFLICT, format!("{model} is out of stock"))
        }
        OrderFlowError::UnknownDiscount => (
            StatusCode::NOT_FOUND,
            "Invalid or inactive discount code".to_owned(),
        ),
        OrderFlowError::NoPendingOrder => (
            StatusCode::NOT_FOUND,
            "No pending order found. Please start again.".to_owned(),
        ),
        OrderFlowError::InvalidPin => {
            (StatusCode::BAD_REQUEST, "Invalid or expired PIN.".to_owned())
        }
        OrderFlowError::Repository(err) => repository_response(err),
        OrderFlowError::Email(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_owned())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        // 5xx goes to Sentry; the event id lands in the log line
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "API request error"
            );
        }

        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_of(err: AppError) -> (StatusCode, String) {
        err.status_and_message()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order 123".to_string());
        assert_eq!(err.to_string(), "Not found: order 123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_plain_variants_map_to_their_statuses() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                AppError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_login_failures_return_401_with_shared_message() {
        let (status, message) = response_of(AppError::Auth(AuthError::InvalidCredentials));
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message, "Invalid credentials");

        let (status, message) = response_of(AppError::Auth(AuthError::UserNotFound));
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message, "Invalid credentials");
    }

    #[test]
    fn test_weak_password_surfaces_its_own_message() {
        let err = AppError::Auth(AuthError::WeakPassword(
            "Password must be at least 6 characters long".to_string(),
        ));
        let (status, message) = response_of(err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Password must be at least 6 characters long");
    }

    #[test]
    fn test_bad_token_returns_401() {
        let (status, message) = response_of(AppError::Auth(AuthError::InvalidToken));
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message, "Not authorized, token failed");
    }

    #[test]
    fn test_order_flow_statuses() {
        let (status, message) = response_of(AppError::Orders(OrderFlowError::NoPendingOrder));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(message, "No pending order found. Please start again.");

        let (status, message) = response_of(AppError::Orders(OrderFlowError::InvalidPin));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Invalid or expired PIN.");

        let (status, message) = response_of(AppError::Orders(OrderFlowError::OutOfStock {
            model: "GT Coupe".to_string(),
        }));
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(message, "GT Coupe is out of stock");

        let (status, _) = response_of(AppError::Orders(OrderFlowError::UnknownDiscount));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_repository_conflict_keeps_its_message() {
        let err = AppError::Database(RepositoryError::Conflict(
            "User already exists".to_string(),
        ));
        let (status, message) = response_of(err);
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(message, "User already exists");
    }

    #[test]
    fn test_server_errors_are_sanitized() {
        let (status, message) =
            response_of(AppError::Internal("connection pool exhausted".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Server error");

        let (_, message) = response_of(AppError::Database(RepositoryError::DataCorruption(
            "order 7 has a partial discount snapshot".to_string(),
        )));
        assert_eq!(message, "Server error");
    }
}
