//! Registration, login, cart, and password-reset route handlers.
//!
//! Registration is a two-step exchange mirroring checkout: `register`
//! parks the sign-up (password already hashed) in `pending_registrations`
//! with an emailed PIN, and `verify_pin` turns it into a real account.
//! PIN emails are awaited so the client learns about delivery failures;
//! the welcome and security-alert emails are best-effort and only logged.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, response::IntoResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use prestige_core::{Email, UserRole};

use crate::db::registrations::NewRegistration;
use crate::db::users::NewUser;
use crate::db::{RegistrationRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{AuthUser, UserResponse};
use crate::services::{auth, email, pins};
use crate::state::AppState;

/// Reject a missing or blank field with the given message.
fn required<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::BadRequest(message.to_owned())),
    }
}

// =============================================================================
// Registration
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

/// Start a registration: park the sign-up and email a verification PIN.
///
/// POST /auth/register
#[instrument(skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let first_name = required(request.first_name.as_deref(), "First name is required")?.trim();
    let last_name = required(request.last_name.as_deref(), "Last name is required")?.trim();
    let raw_email = required(request.email.as_deref(), "Username is required")?;
    let password = request.password.as_deref().unwrap_or_default();
    auth::validate_password(password)?;
    let phone_number = required(request.phone_number.as_deref(), "Phone number is required")?;
    let address = required(request.address.as_deref(), "Address is required")?;

    let email = Email::parse(raw_email).map_err(auth::AuthError::InvalidEmail)?;

    let users = UserRepository::new(state.pool());
    if users.find_by_email(&email).await?.is_some() {
        return Err(auth::AuthError::UserAlreadyExists.into());
    }

    // The plaintext never leaves this handler.
    let password_hash = auth::hash_password(password)?;

    let pin = pins::generate_pin();
    let registration = NewRegistration {
        first_name,
        last_name,
        email: &email,
        password_hash: &password_hash,
        phone_number,
        address,
        pin: &pin,
        pin_expires: pins::expiry_from(Utc::now()),
    };
    RegistrationRepository::new(state.pool())
        .create(&registration)
        .await?;

    // The entry survives a failed send; resend-pin recovers from here.
    let message = email::registration_pin_email(&email, first_name, &pin)?;
    state.notifier().send(message).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Registration successful! A verification PIN has been sent to your email. \
                        Please verify to complete registration."
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct VerifyPinRequest {
    pub email: Option<String>,
    pub pin: Option<String>,
}

/// Verify the emailed PIN and create the account.
///
/// POST /auth/verify-pin
#[instrument(skip(state, request))]
pub async fn verify_pin(
    State(state): State<AppState>,
    Json(request): Json<VerifyPinRequest>,
) -> Result<impl IntoResponse> {
    let raw_email = required(request.email.as_deref(), "Email and PIN required")?;
    let pin = required(request.pin.as_deref(), "Email and PIN required")?;
    let email = Email::parse(raw_email).map_err(auth::AuthError::InvalidEmail)?;

    let registrations = RegistrationRepository::new(state.pool());
    let pending = registrations
        .find_by_email(&email)
        .await?
        .ok_or_else(|| {
            AppError::NotFound("No pending verification found for this email.".to_owned())
        })?;

    if !pending.accepts(pin, Utc::now()) {
        return Err(AppError::BadRequest("Invalid or expired PIN".to_owned()));
    }

    let users = UserRepository::new(state.pool());
    if users.find_by_email(&email).await?.is_some() {
        // Stale pending row for an account that exists; clean it up.
        registrations.delete_by_email(&email).await?;
        return Err(auth::AuthError::UserAlreadyExists.into());
    }

    let user = users
        .create(&NewUser {
            first_name: &pending.first_name,
            last_name: &pending.last_name,
            email: &pending.email,
            password_hash: &pending.password_hash,
            phone_number: &pending.phone_number,
            address: &pending.address,
            role: UserRole::User,
        })
        .await?;
    registrations.delete_by_email(&email).await?;

    match email::welcome_email(&user.email, &user.first_name) {
        Ok(message) => {
            if let Err(e) = state.notifier().send(message).await {
                tracing::warn!(email = %user.email, "Failed to send welcome email: {e}");
            }
        }
        Err(e) => tracing::warn!("Failed to render welcome email: {e}"),
    }

    let token = auth::issue_token(user.id, &state.config().jwt_secret)?;
    Ok(Json(json!({
        "token": token,
        "user": AuthUser::from(&user),
    })))
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: Option<String>,
}

/// Issue a fresh registration PIN and re-send the email.
///
/// POST /auth/resend-pin
#[instrument(skip(state, request))]
pub async fn resend_pin(
    State(state): State<AppState>,
    Json(request): Json<EmailRequest>,
) -> Result<impl IntoResponse> {
    let raw_email = required(request.email.as_deref(), "Email required")?;
    let email = Email::parse(raw_email).map_err(auth::AuthError::InvalidEmail)?;

    let registrations = RegistrationRepository::new(state.pool());
    let pending = registrations
        .find_by_email(&email)
        .await?
        .ok_or_else(|| {
            AppError::NotFound("No pending verification found for this email.".to_owned())
        })?;

    let pin = pins::generate_pin();
    registrations
        .update_pin(&email, &pin, pins::expiry_from(Utc::now()))
        .await?;

    let message = email::resend_pin_email(&email, &pending.first_name, &pin)?;
    state.notifier().send(message).await?;

    Ok(Json(json!({
        "message": "A new verification PIN has been sent to your email."
    })))
}

/// Abandon a pending registration.
///
/// POST /auth/cancel-registration
#[instrument(skip(state, request))]
pub async fn cancel_registration(
    State(state): State<AppState>,
    Json(request): Json<EmailRequest>,
) -> Result<impl IntoResponse> {
    let raw_email = required(request.email.as_deref(), "Email required")?;
    let email = Email::parse(raw_email).map_err(auth::AuthError::InvalidEmail)?;

    let deleted = RegistrationRepository::new(state.pool())
        .delete_by_email(&email)
        .await?;
    if !deleted {
        return Err(AppError::NotFound(
            "No pending registration found".to_owned(),
        ));
    }

    Ok(Json(json!({ "message": "Registration canceled" })))
}

// =============================================================================
// Login & current user
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Log in with email and password.
///
/// POST /auth/login
///
/// An unknown email and a wrong password produce the same response.
#[instrument(skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let raw_email = required(request.email.as_deref(), "Username is required")?;
    let password = required(request.password.as_deref(), "Password is required")?;

    // A malformed email can't match any account.
    let email =
        Email::parse(raw_email).map_err(|_| AppError::Auth(auth::AuthError::InvalidCredentials))?;

    let user = UserRepository::new(state.pool())
        .find_by_email(&email)
        .await?
        .ok_or(auth::AuthError::InvalidCredentials)?;

    auth::verify_password(password, &user.password_hash)?;

    let token = auth::issue_token(user.id, &state.config().jwt_secret)?;
    Ok(Json(json!({
        "token": token,
        "user": AuthUser::from(&user),
    })))
}

/// Return the current user, credentials excluded.
///
/// GET /auth/me
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CartRequest {
    pub cart: Option<serde_json::Value>,
}

/// Return the stored cart.
///
/// GET /auth/cart
pub async fn get_cart(CurrentUser(user): CurrentUser) -> Json<serde_json::Value> {
    Json(json!({ "cart": user.cart }))
}

/// Replace the stored cart wholesale.
///
/// POST /auth/cart
///
/// The payload is opaque to the backend; a missing `cart` clears it.
#[instrument(skip(state, user, request))]
pub async fn update_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CartRequest>,
) -> Result<impl IntoResponse> {
    let cart = request.cart.unwrap_or_else(|| json!([]));
    let cart = UserRepository::new(state.pool())
        .update_cart(user.id, &cart)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;

    Ok(Json(json!({ "cart": cart })))
}

/// Clear the stored cart.
///
/// DELETE /auth/cart
#[instrument(skip(state, user))]
pub async fn clear_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse> {
    let cart = UserRepository::new(state.pool())
        .update_cart(user.id, &json!([]))
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;

    Ok(Json(json!({ "cart": cart })))
}

// =============================================================================
// Password reset
// =============================================================================

/// Email a password-reset PIN.
///
/// POST /auth/send-reset-pin
#[instrument(skip(state, request))]
pub async fn send_reset_pin(
    State(state): State<AppState>,
    Json(request): Json<EmailRequest>,
) -> Result<impl IntoResponse> {
    let raw_email = required(request.email.as_deref(), "Email required")?;
    let no_user = || AppError::NotFound("No user found with this email.".to_owned());
    let email = Email::parse(raw_email).map_err(|_| no_user())?;

    let user = UserRepository::new(state.pool())
        .find_by_email(&email)
        .await?
        .ok_or_else(no_user)?;

    let pin = pins::generate_pin();
    RegistrationRepository::new(state.pool())
        .upsert_reset_pin(&email, &pin, pins::expiry_from(Utc::now()))
        .await?;

    let message = email::reset_pin_email(&email, &user.first_name, &pin)?;
    state.notifier().send(message).await?;

    Ok(Json(json!({ "message": "Reset PIN sent to your email." })))
}

#[derive(Debug, Deserialize)]
pub struct VerifyResetPinRequest {
    pub email: Option<String>,
    pub pin: Option<String>,
}

/// Check a reset PIN without consuming it.
///
/// POST /auth/verify-reset-pin
#[instrument(skip(state, request))]
pub async fn verify_reset_pin(
    State(state): State<AppState>,
    Json(request): Json<VerifyResetPinRequest>,
) -> Result<impl IntoResponse> {
    let raw_email = required(request.email.as_deref(), "Email and PIN required")?;
    let pin = required(request.pin.as_deref(), "Email and PIN required")?;

    check_reset_pin(&state, raw_email, pin).await?;

    Ok(Json(json!({ "message": "PIN verified." })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub email: Option<String>,
    pub pin: Option<String>,
    pub new_password: Option<String>,
}

/// Reset the password using a verified PIN.
///
/// POST /auth/change-password
#[instrument(skip(state, request))]
pub async fn change_password(
    State(state): State<AppState>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse> {
    let raw_email = required(request.email.as_deref(), "All fields required.")?;
    let pin = required(request.pin.as_deref(), "All fields required.")?;
    let new_password = required(request.new_password.as_deref(), "All fields required.")?;

    // The PIN is re-validated here; verify-reset-pin is only a preflight.
    let email = check_reset_pin(&state, raw_email, pin).await?;

    auth::validate_password(new_password)?;
    let password_hash = auth::hash_password(new_password)?;

    let users = UserRepository::new(state.pool());
    let user = users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("No user found.".to_owned()))?;
    users.update_password(user.id, &password_hash).await?;

    RegistrationRepository::new(state.pool())
        .delete_reset_pin(&email)
        .await?;

    match email::password_changed_email(&user.email, &user.first_name) {
        Ok(message) => {
            if let Err(e) = state.notifier().send(message).await {
                tracing::warn!(email = %user.email, "Failed to send password reset alert: {e}");
            }
        }
        Err(e) => tracing::warn!("Failed to render password reset alert: {e}"),
    }

    Ok(Json(json!({ "message": "Password changed successfully." })))
}

/// Validate a reset PIN for an email.
///
/// An unparseable email, a missing row, a wrong PIN, and an expired PIN
/// all collapse into the same rejection.
async fn check_reset_pin(state: &AppState, raw_email: &str, pin: &str) -> Result<Email> {
    let invalid = || AppError::BadRequest("Invalid or expired PIN.".to_owned());
    let email = Email::parse(raw_email).map_err(|_| invalid())?;

    let reset = RegistrationRepository::new(state.pool())
        .find_reset_pin(&email)
        .await?
        .ok_or_else(invalid)?;

    if !reset.accepts(pin, Utc::now()) {
        return Err(invalid());
    }

    Ok(email)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_required_accepts_non_blank() {
        assert_eq!(required(Some("Ava"), "First name is required").ok(), Some("Ava"));
    }

    #[test]
    fn test_required_rejects_missing_and_blank() {
        for value in [None, Some(""), Some("   ")] {
            let err = required(value, "First name is required").unwrap_err();
            assert_eq!(err.to_string(), "Bad request: First name is required");
        }
    }

    #[test]
    fn test_register_request_is_camel_case() {
        let request: RegisterRequest = serde_json::from_value(json!({
            "firstName": "Ava",
            "lastName": "Marsh",
            "email": "ava@example.com",
            "password": "hunter22",
            "phoneNumber": "+15550100",
            "address": "1 Harbor Way"
        }))
        .expect("payload should deserialize");

        assert_eq!(request.first_name.as_deref(), Some("Ava"));
        assert_eq!(request.phone_number.as_deref(), Some("+15550100"));
    }
}
