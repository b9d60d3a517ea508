//! Reads and writes for the customizations catalog.

use rust_decimal::Decimal;
use sqlx::PgPool;

use prestige_core::{CustomizationId, VehicleId};

use super::RepositoryError;
use crate::models::Customization;

const CUSTOMIZATION_COLUMNS: &str = "id, name, description, price, category, \
     compatible_models, created_at, updated_at";

/// Fields required to insert a new customization option.
#[derive(Debug)]
pub struct NewCustomization<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub price: Decimal,
    pub category: &'a str,
    pub compatible_models: &'a [i32],
}

/// Optional customization fields for a partial update.
///
/// `None` leaves the column untouched.
#[derive(Debug, Default)]
pub struct CustomizationChanges<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub price: Option<Decimal>,
    pub category: Option<&'a str>,
    pub compatible_models: Option<&'a [i32]>,
}

/// Query handle over the customizations table.
pub struct CustomizationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomizationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List the full customization catalog, grouped by category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn list(&self) -> Result<Vec<Customization>, RepositoryError> {
        let customizations = sqlx::query_as::<_, Customization>(&format!(
            "SELECT {CUSTOMIZATION_COLUMNS} FROM customizations ORDER BY category, name"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(customizations)
    }

    /// Fetch one customization by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn find_by_id(
        &self,
        id: CustomizationId,
    ) -> Result<Option<Customization>, RepositoryError> {
        let customization = sqlx::query_as::<_, Customization>(&format!(
            "SELECT {CUSTOMIZATION_COLUMNS} FROM customizations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(customization)
    }

    /// List customizations in one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn list_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Customization>, RepositoryError> {
        let customizations = sqlx::query_as::<_, Customization>(&format!(
            "SELECT {CUSTOMIZATION_COLUMNS} FROM customizations \
             WHERE category = $1 ORDER BY name"
        ))
        .bind(category)
        .fetch_all(self.pool)
        .await?;

        Ok(customizations)
    }

    /// List customizations compatible with a vehicle.
    ///
    /// An empty `compatible_models` array means the option fits every
    /// vehicle.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn list_for_vehicle(
        &self,
        vehicle_id: VehicleId,
    ) -> Result<Vec<Customization>, RepositoryError> {
        let customizations = sqlx::query_as::<_, Customization>(&format!(
            "SELECT {CUSTOMIZATION_COLUMNS} FROM customizations \
             WHERE cardinality(compatible_models) = 0 \
                OR $1 = ANY(compatible_models) \
             ORDER BY category, name"
        ))
        .bind(vehicle_id)
        .fetch_all(self.pool)
        .await?;

        Ok(customizations)
    }

    /// Create a new customization option.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn create(
        &self,
        new_customization: &NewCustomization<'_>,
    ) -> Result<Customization, RepositoryError> {
        let customization = sqlx::query_as::<_, Customization>(&format!(
            "INSERT INTO customizations \
                 (name, description, price, category, compatible_models) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {CUSTOMIZATION_COLUMNS}"
        ))
        .bind(new_customization.name)
        .bind(new_customization.description)
        .bind(new_customization.price)
        .bind(new_customization.category)
        .bind(new_customization.compatible_models)
        .fetch_one(self.pool)
        .await?;

        Ok(customization)
    }

    /// Apply a partial customization update.
    ///
    /// Returns the updated customization, or `None` if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn update(
        &self,
        id: CustomizationId,
        changes: &CustomizationChanges<'_>,
    ) -> Result<Option<Customization>, RepositoryError> {
        let customization = sqlx::query_as::<_, Customization>(&format!(
            "UPDATE customizations SET \
                 name = COALESCE($2, name), \
                 description = COALESCE($3, description), \
                 price = COALESCE($4, price), \
                 category = COALESCE($5, category), \
                 compatible_models = COALESCE($6, compatible_models), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {CUSTOMIZATION_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.price)
        .bind(changes.category)
        .bind(changes.compatible_models)
        .fetch_optional(self.pool)
        .await?;

        Ok(customization)
    }

    /// Delete a customization option.
    ///
    /// # Returns
    ///
    /// Returns `true` if the customization was deleted, `false` if it
    /// didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn delete(&self, id: CustomizationId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM customizations WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
