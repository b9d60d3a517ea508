//! Reads and writes for the discounts table.

use sqlx::PgPool;

use prestige_core::DiscountId;

use super::{RepositoryError, unique_conflict};
use crate::models::Discount;

const DISCOUNT_COLUMNS: &str = "id, code, percentage, description, is_active, \
     created_at, updated_at";

/// Fields required to insert a new discount code.
///
/// The code is trimmed and uppercased on insert.
#[derive(Debug)]
pub struct NewDiscount<'a> {
    pub code: &'a str,
    pub percentage: i16,
    pub description: &'a str,
    pub is_active: bool,
}

/// Optional discount fields for a partial update.
///
/// `None` leaves the column untouched. The code itself is immutable.
#[derive(Debug, Default)]
pub struct DiscountChanges<'a> {
    pub percentage: Option<i16>,
    pub description: Option<&'a str>,
    pub is_active: Option<bool>,
}

/// Query handle over the discounts table.
pub struct DiscountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DiscountRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all discount codes, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn list(&self) -> Result<Vec<Discount>, RepositoryError> {
        let discounts = sqlx::query_as::<_, Discount>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(discounts)
    }

    /// Look up an active discount by code, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn find_active_by_code(
        &self,
        code: &str,
    ) -> Result<Option<Discount>, RepositoryError> {
        let discount = sqlx::query_as::<_, Discount>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts \
             WHERE code = UPPER(TRIM($1)) AND is_active"
        ))
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        Ok(discount)
    }

    /// Create a new discount code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code already exists.
    /// Returns `RepositoryError::Database` for anything else.
    pub async fn create(&self, new_discount: &NewDiscount<'_>) -> Result<Discount, RepositoryError> {
        let discount = sqlx::query_as::<_, Discount>(&format!(
            "INSERT INTO discounts (code, percentage, description, is_active) \
             VALUES (UPPER(TRIM($1)), $2, $3, $4) \
             RETURNING {DISCOUNT_COLUMNS}"
        ))
        .bind(new_discount.code)
        .bind(new_discount.percentage)
        .bind(new_discount.description)
        .bind(new_discount.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| unique_conflict(e, "Discount code already exists"))?;

        Ok(discount)
    }

    /// Apply a partial discount update.
    ///
    /// Returns the updated discount, or `None` if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn update(
        &self,
        id: DiscountId,
        changes: &DiscountChanges<'_>,
    ) -> Result<Option<Discount>, RepositoryError> {
        let discount = sqlx::query_as::<_, Discount>(&format!(
            "UPDATE discounts SET \
                 percentage = COALESCE($2, percentage), \
                 description = COALESCE($3, description), \
                 is_active = COALESCE($4, is_active), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {DISCOUNT_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.percentage)
        .bind(changes.description)
        .bind(changes.is_active)
        .fetch_optional(self.pool)
        .await?;

        Ok(discount)
    }

    /// Delete a discount code.
    ///
    /// # Returns
    ///
    /// Returns `true` if the discount was deleted, `false` if it didn't
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn delete(&self, id: DiscountId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM discounts WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
