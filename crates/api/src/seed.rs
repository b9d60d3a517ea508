//! Catalog seeding from a YAML file.
//!
//! The CLI parses a catalog file into [`CatalogConfig`], checks it with
//! [`validate_config`], and inserts it with [`seed_catalog`]. Keys are
//! camelCase to match the API's JSON surface, so a catalog entry looks
//! like the body of `POST /vehicles`:
//!
//! ```yaml
//! vehicles:
//!   - name: 911 Carrera
//!     year: 2024
//!     basePrice: "117100"
//!     imageUrl: /images/911-carrera.jpg
//!     description: The iconic rear-engine sports car.
//!     features: [Sport Chrono Package, PASM]
//!     specifications:
//!       engine: 3.0L Twin-Turbo Flat-6
//!       horsepower: 379
//!       zeroToSixty: 4.0s
//!       topSpeed: 182 mph
//!     stock: 5
//! discounts:
//!   - code: THANKYOU
//!     percentage: 2
//!     description: Thank you discount
//! ```

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

use crate::db::customizations::NewCustomization;
use crate::db::discounts::NewDiscount;
use crate::db::vehicles::NewVehicle;
use crate::db::{
    CustomizationRepository, DiscountRepository, RepositoryError, VehicleRepository,
};
use crate::models::Specifications;

/// A vehicle entry in the catalog file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSeed {
    pub name: String,
    pub year: i32,
    pub base_price: Decimal,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub specifications: Specifications,
    #[serde(default)]
    pub stock: i32,
}

/// A discount entry in the catalog file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountSeed {
    pub code: String,
    pub percentage: i16,
    pub description: String,
    /// Defaults to active when omitted.
    pub active: Option<bool>,
}

/// A customization entry in the catalog file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationSeed {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    #[serde(default)]
    pub compatible_models: Vec<i32>,
}

/// The parsed catalog file. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogConfig {
    pub vehicles: Vec<VehicleSeed>,
    pub discounts: Vec<DiscountSeed>,
    pub customizations: Vec<CustomizationSeed>,
}

impl CatalogConfig {
    /// Total number of entries across all sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vehicles.len() + self.discounts.len() + self.customizations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Check a parsed catalog for entries the database would reject.
///
/// Returns one message per problem; an empty vector means the catalog
/// is safe to insert.
#[must_use]
pub fn validate_config(config: &CatalogConfig) -> Vec<String> {
    let mut errors = Vec::new();

    for (i, vehicle) in config.vehicles.iter().enumerate() {
        if vehicle.name.trim().is_empty() {
            errors.push(format!("vehicles[{i}]: name is empty"));
        }
        if vehicle.year < 1900 {
            errors.push(format!(
                "vehicles[{i}] ({}): year must be 1900 or later",
                vehicle.name
            ));
        }
        if vehicle.base_price <= Decimal::ZERO {
            errors.push(format!(
                "vehicles[{i}] ({}): basePrice must be positive",
                vehicle.name
            ));
        }
        if vehicle.stock < 0 {
            errors.push(format!(
                "vehicles[{i}] ({}): stock cannot be negative",
                vehicle.name
            ));
        }
    }

    for (i, discount) in config.discounts.iter().enumerate() {
        if discount.code.trim().is_empty() {
            errors.push(format!("discounts[{i}]: code is empty"));
        }
        if !(1..=100).contains(&discount.percentage) {
            errors.push(format!(
                "discounts[{i}] ({}): percentage must be between 1 and 100",
                discount.code
            ));
        }
        if discount.description.trim().is_empty() {
            errors.push(format!(
                "discounts[{i}] ({}): description is empty",
                discount.code
            ));
        }
    }

    for (i, customization) in config.customizations.iter().enumerate() {
        if customization.name.trim().is_empty() {
            errors.push(format!("customizations[{i}]: name is empty"));
        }
        if customization.price < Decimal::ZERO {
            errors.push(format!(
                "customizations[{i}] ({}): price cannot be negative",
                customization.name
            ));
        }
        if customization.category.trim().is_empty() {
            errors.push(format!(
                "customizations[{i}] ({}): category is empty",
                customization.name
            ));
        }
    }

    errors
}

/// Counts reported after a seeding run.
#[derive(Debug, Default)]
pub struct SeedSummary {
    pub vehicles_inserted: usize,
    pub vehicles_skipped: usize,
    pub discounts_inserted: usize,
    pub discounts_skipped: usize,
    pub customizations_inserted: usize,
    pub customizations_skipped: usize,
}

/// Insert a catalog into the database.
///
/// Re-running is safe: vehicles and discounts that already exist (by
/// name and code) are skipped, and customizations are matched by name.
/// With `clear_existing` the customization, discount, and vehicle
/// tables are emptied first; clearing fails if confirmed orders still
/// reference a vehicle.
///
/// # Errors
///
/// Returns `RepositoryError::Database` when a query fails.
pub async fn seed_catalog(
    pool: &PgPool,
    config: &CatalogConfig,
    clear_existing: bool,
) -> Result<SeedSummary, RepositoryError> {
    if clear_existing {
        // Vehicles last: order items may still reference them, and that
        // failure should surface before anything else is half-cleared.
        sqlx::query("DELETE FROM customizations").execute(pool).await?;
        sqlx::query("DELETE FROM discounts").execute(pool).await?;
        sqlx::query("DELETE FROM vehicles").execute(pool).await?;
        info!("Cleared existing catalog rows");
    }

    let mut summary = SeedSummary::default();

    let vehicles = VehicleRepository::new(pool);
    for entry in &config.vehicles {
        let result = vehicles
            .create(&NewVehicle {
                name: &entry.name,
                year: entry.year,
                base_price: entry.base_price,
                image_url: &entry.image_url,
                description: &entry.description,
                features: &entry.features,
                specifications: &entry.specifications,
                stock: entry.stock,
            })
            .await;
        match result {
            Ok(_) => summary.vehicles_inserted += 1,
            Err(RepositoryError::Conflict(_)) => summary.vehicles_skipped += 1,
            Err(e) => return Err(e),
        }
    }

    let discounts = DiscountRepository::new(pool);
    for entry in &config.discounts {
        let result = discounts
            .create(&NewDiscount {
                code: &entry.code,
                percentage: entry.percentage,
                description: &entry.description,
                is_active: entry.active.unwrap_or(true),
            })
            .await;
        match result {
            Ok(_) => summary.discounts_inserted += 1,
            Err(RepositoryError::Conflict(_)) => summary.discounts_skipped += 1,
            Err(e) => return Err(e),
        }
    }

    let customizations = CustomizationRepository::new(pool);
    // Customizations have no unique column; match by name to stay idempotent.
    let existing: HashSet<String> = customizations
        .list()
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    for entry in &config.customizations {
        if existing.contains(&entry.name) {
            summary.customizations_skipped += 1;
            continue;
        }
        customizations
            .create(&NewCustomization {
                name: &entry.name,
                description: &entry.description,
                price: entry.price,
                category: &entry.category,
                compatible_models: &entry.compatible_models,
            })
            .await?;
        summary.customizations_inserted += 1;
    }

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn vehicle(name: &str) -> VehicleSeed {
        VehicleSeed {
            name: name.to_owned(),
            year: 2024,
            base_price: Decimal::from(117_100),
            image_url: String::new(),
            description: String::new(),
            features: Vec::new(),
            specifications: Specifications::default(),
            stock: 3,
        }
    }

    #[test]
    fn valid_catalog_has_no_errors() {
        let config = CatalogConfig {
            vehicles: vec![vehicle("911 Carrera")],
            discounts: vec![DiscountSeed {
                code: "THANKYOU".to_owned(),
                percentage: 2,
                description: "Thank you discount".to_owned(),
                active: None,
            }],
            customizations: vec![CustomizationSeed {
                name: "Sport Exhaust".to_owned(),
                description: "Titanium exhaust system".to_owned(),
                price: Decimal::from(3_490),
                category: "performance".to_owned(),
                compatible_models: vec![1, 2],
            }],
        };

        assert!(validate_config(&config).is_empty());
        assert_eq!(config.len(), 3);
    }

    #[test]
    fn bad_entries_are_each_reported() {
        let mut too_old = vehicle("Pre-war");
        too_old.year = 1885;
        let mut free = vehicle("Freebie");
        free.base_price = Decimal::ZERO;

        let config = CatalogConfig {
            vehicles: vec![too_old, free],
            discounts: vec![DiscountSeed {
                code: String::new(),
                percentage: 150,
                description: "Half off".to_owned(),
                active: Some(true),
            }],
            customizations: Vec::new(),
        };

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 4);
        assert!(errors[0].contains("year must be 1900 or later"));
        assert!(errors[1].contains("basePrice must be positive"));
        assert!(errors[2].contains("code is empty"));
        assert!(errors[3].contains("percentage must be between 1 and 100"));
    }

    #[test]
    fn empty_catalog_is_empty() {
        let config = CatalogConfig::default();
        assert!(config.is_empty());
        assert!(validate_config(&config).is_empty());
    }
}
