//! Reads and writes for the users table.

use sqlx::PgPool;

use prestige_core::{Email, UserId, UserRole};

use super::{RepositoryError, unique_conflict};
use crate::models::User;

const USER_COLUMNS: &str = "id, first_name, last_name, email, password_hash, \
     phone_number, address, role, cart, created_at, updated_at";

/// Fields required to insert a new user row.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a Email,
    pub password_hash: &'a str,
    pub phone_number: &'a str,
    pub address: &'a str,
    pub role: UserRole,
}

/// Optional profile fields for a partial update.
///
/// `None` leaves the column untouched.
#[derive(Debug, Default)]
pub struct ProfileChanges<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub phone_number: Option<&'a str>,
    pub address: Option<&'a str>,
    pub email: Option<&'a Email>,
    pub password_hash: Option<&'a str>,
}

/// Query handle over the users table.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Look up a user by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Look up a user by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(user)
    }

    /// List all users, oldest account first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let users =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
                .fetch_all(self.pool)
                .await?;

        Ok(users)
    }

    /// Create a new user with an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` when the email is already taken.
    /// Returns `RepositoryError::Database` for anything else.
    pub async fn create(&self, new_user: &NewUser<'_>) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users \
                 (first_name, last_name, email, password_hash, phone_number, address, role) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(new_user.first_name)
        .bind(new_user.last_name)
        .bind(new_user.email)
        .bind(new_user.password_hash)
        .bind(new_user.phone_number)
        .bind(new_user.address)
        .bind(new_user.role)
        .fetch_one(self.pool)
        .await
        .map_err(|e| unique_conflict(e, "User already exists"))?;

        Ok(user)
    }

    /// Apply a partial profile update.
    ///
    /// Returns the updated user, or `None` if the user doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a new email is already taken.
    /// Returns `RepositoryError::Database` for anything else.
    pub async fn update_profile(
        &self,
        id: UserId,
        changes: &ProfileChanges<'_>,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
                 first_name = COALESCE($2, first_name), \
                 last_name = COALESCE($3, last_name), \
                 phone_number = COALESCE($4, phone_number), \
                 address = COALESCE($5, address), \
                 email = COALESCE($6, email), \
                 password_hash = COALESCE($7, password_hash), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.phone_number)
        .bind(changes.address)
        .bind(changes.email)
        .bind(changes.password_hash)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| unique_conflict(e, "Email already in use"))?;

        Ok(user)
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` when no such user exists.
    /// Returns `RepositoryError::Database` for anything else.
    pub async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Change a user's role.
    ///
    /// Returns the updated user, or `None` if the user doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn update_role(
        &self,
        id: UserId,
        role: UserRole,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Replace a user's cart wholesale.
    ///
    /// Returns the stored cart, or `None` if the user doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn update_cart(
        &self,
        id: UserId,
        cart: &serde_json::Value,
    ) -> Result<Option<serde_json::Value>, RepositoryError> {
        let cart = sqlx::query_scalar::<_, serde_json::Value>(
            "UPDATE users SET cart = $2, updated_at = NOW() WHERE id = $1 RETURNING cart",
        )
        .bind(id)
        .bind(cart)
        .fetch_optional(self.pool)
        .await?;

        Ok(cart)
    }

    /// Delete a user. Returns `false` if no row matched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
