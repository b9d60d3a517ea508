//! User profile and admin user-management route handlers.

use axum::extract::{Path, State};
use axum::{Json, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use prestige_core::{Email, UserId, UserRole};

use crate::db::UserRepository;
use crate::db::users::ProfileChanges;
use crate::error::{AppError, Result};
use crate::middleware::{AdminUser, CurrentUser};
use crate::models::UserResponse;
use crate::services::auth;
use crate::state::AppState;

/// Validate an optional field: absent is fine, blank is not.
fn optional<'a>(value: Option<&'a str>, message: &str) -> Result<Option<&'a str>> {
    match value {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Err(AppError::BadRequest(message.to_owned())),
        Some(value) => Ok(Some(value)),
    }
}

/// Length check for a replacement password, with this endpoint's wording.
fn validate_new_password(password: &str) -> Result<()> {
    if password.len() < auth::MIN_PASSWORD_LENGTH {
        return Err(AppError::BadRequest(
            "New password must be at least 6 characters long".to_owned(),
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl UpdateProfileRequest {
    /// Validate the provided fields and turn them into column changes.
    ///
    /// `allow_email` is off for the admin by-ID update, which never
    /// touches the email.
    fn to_changes(
        &self,
        allow_email: bool,
    ) -> Result<(ProfileChanges<'_>, Option<Email>, Option<String>)> {
        let first_name =
            optional(self.first_name.as_deref(), "First name cannot be empty")?.map(str::trim);
        let last_name =
            optional(self.last_name.as_deref(), "Last name cannot be empty")?.map(str::trim);
        let phone_number = optional(self.phone_number.as_deref(), "Phone number cannot be empty")?;
        let address = optional(self.address.as_deref(), "Address cannot be empty")?;

        let email = if allow_email {
            self.email
                .as_deref()
                .map(|raw| {
                    Email::parse(raw).map_err(|_| {
                        AppError::BadRequest("Please enter a valid email".to_owned())
                    })
                })
                .transpose()?
        } else {
            None
        };

        let password_hash = self
            .password
            .as_deref()
            .map(|password| {
                validate_new_password(password)?;
                auth::hash_password(password).map_err(AppError::Auth)
            })
            .transpose()?;

        Ok((
            ProfileChanges {
                first_name,
                last_name,
                phone_number,
                address,
                email: None, // set by the caller; the owned Email must outlive these borrows
                password_hash: None,
            },
            email,
            password_hash,
        ))
    }
}

// =============================================================================
// Own profile
// =============================================================================

/// Return the caller's profile.
///
/// GET /users/profile
pub async fn profile(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

/// Partially update the caller's profile.
///
/// PUT /users/profile
#[instrument(skip(state, user, request))]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse> {
    let (mut changes, email, password_hash) = request.to_changes(true)?;
    changes.email = email.as_ref();
    changes.password_hash = password_hash.as_deref();

    let updated = UserRepository::new(state.pool())
        .update_profile(user.id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;

    Ok(Json(UserResponse::from(updated)))
}

/// Delete the caller's account.
///
/// DELETE /users/profile
#[instrument(skip(state, user))]
pub async fn delete_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse> {
    UserRepository::new(state.pool()).delete(user.id).await?;
    Ok(Json(json!({ "message": "User account deleted successfully" })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// Change the caller's password, verifying the current one.
///
/// PUT /users/change-password
#[instrument(skip(state, user, request))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse> {
    let current = request
        .current_password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("Current password is required".to_owned()))?;
    let new_password = request.new_password.as_deref().unwrap_or_default();
    validate_new_password(new_password)?;

    if auth::verify_password(current, &user.password_hash).is_err() {
        return Err(AppError::BadRequest(
            "Current password is incorrect".to_owned(),
        ));
    }

    let password_hash = auth::hash_password(new_password)?;
    UserRepository::new(state.pool())
        .update_password(user.id, &password_hash)
        .await?;

    Ok(Json(json!({ "message": "Password updated successfully" })))
}

// =============================================================================
// Admin user management
// =============================================================================

/// List every user, credentials excluded.
///
/// GET /users
pub async fn list(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<impl IntoResponse> {
    let users = UserRepository::new(state.pool()).list().await?;
    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(users))
}

/// Fetch one user by ID.
///
/// GET /users/{id}
pub async fn show(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse> {
    let user = UserRepository::new(state.pool())
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;

    Ok(Json(UserResponse::from(user)))
}

/// Partially update a user by ID. The email is left alone.
///
/// PUT /users/{id}
#[instrument(skip(state, request))]
pub async fn update(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<UserId>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse> {
    let (mut changes, _, password_hash) = request.to_changes(false)?;
    changes.password_hash = password_hash.as_deref();

    let updated = UserRepository::new(state.pool())
        .update_profile(id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;

    Ok(Json(UserResponse::from(updated)))
}

/// Delete a user by ID.
///
/// DELETE /users/{id}
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse> {
    let deleted = UserRepository::new(state.pool()).delete(id).await?;
    if !deleted {
        return Err(AppError::NotFound("User not found".to_owned()));
    }

    Ok(Json(json!({ "message": "User deleted successfully" })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Option<String>,
}

/// Change a user's role.
///
/// PUT /users/{id}/role
#[instrument(skip(state, request))]
pub async fn update_role(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<UserId>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse> {
    let role = match request.role.as_deref() {
        Some("user") => UserRole::User,
        Some("admin") => UserRole::Admin,
        _ => {
            return Err(AppError::BadRequest(
                "Role must be 'user' or 'admin'".to_owned(),
            ));
        }
    };

    let user = UserRepository::new(state.pool())
        .update_role(id, role)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;

    Ok(Json(UserResponse::from(user)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_passes_through_absent_fields() {
        assert_eq!(optional(None, "x").unwrap(), None);
        assert_eq!(optional(Some("Ava"), "x").unwrap(), Some("Ava"));
    }

    #[test]
    fn test_optional_rejects_blank_values() {
        let err = optional(Some("  "), "First name cannot be empty").unwrap_err();
        assert_eq!(err.to_string(), "Bad request: First name cannot be empty");
    }

    #[test]
    fn test_short_replacement_password_rejected() {
        let err = validate_new_password("12345").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Bad request: New password must be at least 6 characters long"
        );
        assert!(validate_new_password("123456").is_ok());
    }

    #[test]
    fn test_admin_update_ignores_email_field() {
        let request: UpdateProfileRequest = serde_json::from_value(json!({
            "email": "new@example.com",
            "firstName": "Ava"
        }))
        .unwrap();

        let (_, email, _) = request.to_changes(false).unwrap();
        assert!(email.is_none());

        let (_, email, _) = request.to_changes(true).unwrap();
        assert_eq!(email.unwrap().as_str(), "new@example.com");
    }
}
