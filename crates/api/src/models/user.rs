//! User row and response types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use prestige_core::{Email, UserId, UserRole};

/// A customer account as stored in the `users` table.
///
/// The password hash never leaves this type: both response shapes below
/// omit it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub password_hash: String,
    pub phone_number: String,
    pub address: String,
    pub role: UserRole,
    /// Opaque cart payload owned by the frontend (always a JSON array).
    pub cart: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The user's display name, as snapshotted onto orders.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Full profile view, returned by profile and admin user endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub role: UserRole,
    pub cart: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email.into_inner(),
            phone_number: user.phone_number,
            address: user.address,
            role: user.role,
            cart: user.cart,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Compact user payload embedded in login and verification responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: UserRole,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.as_str().to_owned(),
            role: user.role,
        }
    }
}
