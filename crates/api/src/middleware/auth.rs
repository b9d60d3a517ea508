//! Authentication extractors for route handlers.
//!
//! Protected handlers take [`CurrentUser`] (any signed-in user) or
//! [`AdminUser`] (admin role required) as an argument; the extractors
//! verify the bearer token and load the account, so handlers never touch
//! raw tokens.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use prestige_core::UserRole;

use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::User;
use crate::services::auth;
use crate::state::AppState;

/// Extractor that requires a valid `Authorization: Bearer` token.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(CurrentUser(user): CurrentUser) -> impl IntoResponse {
///     Json(UserResponse::from(user))
/// }
/// ```
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_owned()))?;

        let user_id = auth::verify_token(token, &state.config().jwt_secret)?;

        // A valid token for a since-deleted account is rejected the same
        // way as a bad signature.
        let user = UserRepository::new(state.pool())
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Not authorized, token failed".to_owned()))?;

        Ok(Self(user))
    }
}

/// Extractor that requires the admin role on top of [`CurrentUser`].
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if user.role != UserRole::Admin {
            return Err(AppError::Forbidden("Not authorized as admin".to_owned()));
        }

        Ok(Self(user))
    }
}

/// Pull the token out of the `Authorization` header.
///
/// The scheme prefix is matched case-sensitively, as `Bearer `.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
