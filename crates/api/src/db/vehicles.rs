//! Reads and writes for the vehicles table.
//!
//! Vehicles are soft deleted: `delete` flips `is_active` off so historical
//! orders keep a valid reference, and the public listing filters to active
//! rows only.

use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use prestige_core::VehicleId;

use super::{RepositoryError, unique_conflict};
use crate::models::{Specifications, Vehicle};

const VEHICLE_COLUMNS: &str = "id, name, year, base_price, image_url, description, \
     features, specifications, stock, is_active, created_at, updated_at";

/// Fields required to insert a new vehicle row.
#[derive(Debug)]
pub struct NewVehicle<'a> {
    pub name: &'a str,
    pub year: i32,
    pub base_price: Decimal,
    pub image_url: &'a str,
    pub description: &'a str,
    pub features: &'a [String],
    pub specifications: &'a Specifications,
    pub stock: i32,
}

/// Optional vehicle fields for a partial update.
///
/// `None` leaves the column untouched.
#[derive(Debug, Default)]
pub struct VehicleChanges<'a> {
    pub name: Option<&'a str>,
    pub year: Option<i32>,
    pub base_price: Option<Decimal>,
    pub image_url: Option<&'a str>,
    pub description: Option<&'a str>,
    pub features: Option<&'a [String]>,
    pub specifications: Option<&'a Specifications>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
}

/// Query handle over the vehicles table.
pub struct VehicleRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VehicleRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active vehicles, alphabetical by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn list(&self) -> Result<Vec<Vehicle>, RepositoryError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE is_active ORDER BY name"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(vehicles)
    }

    /// Fetch one vehicle by id, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn find_by_id(&self, id: VehicleId) -> Result<Option<Vehicle>, RepositoryError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(vehicle)
    }

    /// Create a new vehicle.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is already taken.
    /// Returns `RepositoryError::Database` for anything else.
    pub async fn create(&self, new_vehicle: &NewVehicle<'_>) -> Result<Vehicle, RepositoryError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            "INSERT INTO vehicles \
                 (name, year, base_price, image_url, description, features, \
                  specifications, stock) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {VEHICLE_COLUMNS}"
        ))
        .bind(new_vehicle.name)
        .bind(new_vehicle.year)
        .bind(new_vehicle.base_price)
        .bind(new_vehicle.image_url)
        .bind(new_vehicle.description)
        .bind(new_vehicle.features)
        .bind(Json(new_vehicle.specifications))
        .bind(new_vehicle.stock)
        .fetch_one(self.pool)
        .await
        .map_err(|e| unique_conflict(e, "A model with this name already exists"))?;

        Ok(vehicle)
    }

    /// Apply a partial vehicle update.
    ///
    /// Returns the updated vehicle, or `None` if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a new name is already taken.
    /// Returns `RepositoryError::Database` for anything else.
    pub async fn update(
        &self,
        id: VehicleId,
        changes: &VehicleChanges<'_>,
    ) -> Result<Option<Vehicle>, RepositoryError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            "UPDATE vehicles SET \
                 name = COALESCE($2, name), \
                 year = COALESCE($3, year), \
                 base_price = COALESCE($4, base_price), \
                 image_url = COALESCE($5, image_url), \
                 description = COALESCE($6, description), \
                 features = COALESCE($7, features), \
                 specifications = COALESCE($8, specifications), \
                 stock = COALESCE($9, stock), \
                 is_active = COALESCE($10, is_active), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {VEHICLE_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.year)
        .bind(changes.base_price)
        .bind(changes.image_url)
        .bind(changes.description)
        .bind(changes.features)
        .bind(changes.specifications.map(Json))
        .bind(changes.stock)
        .bind(changes.is_active)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| unique_conflict(e, "A model with this name already exists"))?;

        Ok(vehicle)
    }

    /// Soft delete a vehicle by marking it inactive.
    ///
    /// # Returns
    ///
    /// Returns `true` if the vehicle existed, `false` otherwise.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn soft_delete(&self, id: VehicleId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("UPDATE vehicles SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Set a vehicle's stock to an absolute count.
    ///
    /// Returns the updated vehicle, or `None` if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn set_stock(
        &self,
        id: VehicleId,
        stock: i32,
    ) -> Result<Option<Vehicle>, RepositoryError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            "UPDATE vehicles SET stock = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {VEHICLE_COLUMNS}"
        ))
        .bind(id)
        .bind(stock)
        .fetch_optional(self.pool)
        .await?;

        Ok(vehicle)
    }
}
