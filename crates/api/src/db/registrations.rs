//! Pending registrations and password reset PINs.
//!
//! Both tables hold short-lived rows keyed by email. A pending registration
//! stores the full sign-up payload (password already hashed) until the user
//! verifies the emailed PIN; a reset PIN row stores only the PIN itself.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use prestige_core::Email;

use super::{RepositoryError, unique_conflict};
use crate::models::{PasswordResetPin, PendingRegistration};

const PENDING_COLUMNS: &str = "id, first_name, last_name, email, password_hash, \
     phone_number, address, pin, pin_expires, created_at";

/// Fields captured at sign-up, held until the email PIN is verified.
#[derive(Debug)]
pub struct NewRegistration<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a Email,
    pub password_hash: &'a str,
    pub phone_number: &'a str,
    pub address: &'a str,
    pub pin: &'a str,
    pub pin_expires: DateTime<Utc>,
}

/// Query handle over both verification tables.
pub struct RegistrationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RegistrationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the pending registration for an email, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<PendingRegistration>, RepositoryError> {
        let pending = sqlx::query_as::<_, PendingRegistration>(&format!(
            "SELECT {PENDING_COLUMNS} FROM pending_registrations WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(pending)
    }

    /// Store a new pending registration.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a registration is already
    /// pending for this email.
    /// Returns `RepositoryError::Database` for anything else.
    pub async fn create(
        &self,
        registration: &NewRegistration<'_>,
    ) -> Result<PendingRegistration, RepositoryError> {
        let pending = sqlx::query_as::<_, PendingRegistration>(&format!(
            "INSERT INTO pending_registrations \
                 (first_name, last_name, email, password_hash, phone_number, address, \
                  pin, pin_expires) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {PENDING_COLUMNS}"
        ))
        .bind(registration.first_name)
        .bind(registration.last_name)
        .bind(registration.email)
        .bind(registration.password_hash)
        .bind(registration.phone_number)
        .bind(registration.address)
        .bind(registration.pin)
        .bind(registration.pin_expires)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            unique_conflict(
                e,
                "A verification is already pending for this email. \
                 Please check your email for the PIN or wait for it to expire.",
            )
        })?;

        Ok(pending)
    }

    /// Issue a fresh PIN for an existing pending registration.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no registration is pending
    /// for this email.
    /// Returns `RepositoryError::Database` for anything else.
    pub async fn update_pin(
        &self,
        email: &Email,
        pin: &str,
        pin_expires: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE pending_registrations SET pin = $2, pin_expires = $3 WHERE email = $1",
        )
        .bind(email)
        .bind(pin)
        .bind(pin_expires)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Remove the pending registration for an email.
    ///
    /// # Returns
    ///
    /// Returns `true` if a row was deleted, `false` if none was pending.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn delete_by_email(&self, email: &Email) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM pending_registrations WHERE email = $1")
            .bind(email)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Store a password reset PIN, replacing any previous one for the email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn upsert_reset_pin(
        &self,
        email: &Email,
        pin: &str,
        pin_expires: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO password_reset_pins (email, pin, pin_expires) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (email) DO UPDATE \
                 SET pin = EXCLUDED.pin, \
                     pin_expires = EXCLUDED.pin_expires, \
                     created_at = NOW()",
        )
        .bind(email)
        .bind(pin)
        .bind(pin_expires)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Get the stored reset PIN for an email, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn find_reset_pin(
        &self,
        email: &Email,
    ) -> Result<Option<PasswordResetPin>, RepositoryError> {
        let reset = sqlx::query_as::<_, PasswordResetPin>(
            "SELECT email, pin, pin_expires, created_at \
             FROM password_reset_pins WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(reset)
    }

    /// Remove the reset PIN for an email once it has been used.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn delete_reset_pin(&self, email: &Email) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM password_reset_pins WHERE email = $1")
            .bind(email)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
