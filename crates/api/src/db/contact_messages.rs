//! Reads and writes for the contact_messages table.

use sqlx::PgPool;

use prestige_core::Email;

use super::RepositoryError;
use crate::models::ContactMessage;

/// Query handle over the contact_messages table.
pub struct ContactMessageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContactMessageRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a contact form submission.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn create(
        &self,
        name: &str,
        email: &Email,
        message: &str,
    ) -> Result<ContactMessage, RepositoryError> {
        let message = sqlx::query_as::<_, ContactMessage>(
            "INSERT INTO contact_messages (name, email, message) \
             VALUES ($1, $2, $3) \
             RETURNING id, name, email, message, created_at",
        )
        .bind(name)
        .bind(email)
        .bind(message)
        .fetch_one(self.pool)
        .await?;

        Ok(message)
    }

    /// List all submissions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn list(&self) -> Result<Vec<ContactMessage>, RepositoryError> {
        let messages = sqlx::query_as::<_, ContactMessage>(
            "SELECT id, name, email, message, created_at \
             FROM contact_messages ORDER BY created_at DESC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(messages)
    }
}
