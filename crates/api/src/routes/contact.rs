//! Public contact form: anyone can write in, admins read the inbox.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use prestige_core::Email;

use crate::db::ContactMessageRepository;
use crate::error::{AppError, Result};
use crate::middleware::AdminUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

/// Accept a contact form submission.
///
/// POST /contact
#[instrument(skip(state, request))]
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<ContactRequest>,
) -> Result<impl IntoResponse> {
    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::BadRequest("Name is required".to_owned()))?;
    let email = request
        .email
        .as_deref()
        .and_then(|raw| Email::parse(raw).ok())
        .ok_or_else(|| AppError::BadRequest("Valid email is required".to_owned()))?;
    let message = request
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::BadRequest("Message is required".to_owned()))?;

    ContactMessageRepository::new(state.pool())
        .create(name, &email, message)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Message sent successfully!" })),
    ))
}

/// List contact form submissions, newest first.
///
/// GET /contact
pub async fn list(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<impl IntoResponse> {
    let messages = ContactMessageRepository::new(state.pool()).list().await?;
    Ok(Json(messages))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_request_tolerates_missing_fields() {
        let request: ContactRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.name.is_none());
        assert!(request.email.is_none());
        assert!(request.message.is_none());
    }
}
