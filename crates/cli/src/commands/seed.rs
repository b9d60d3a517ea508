//! Seed the catalog from a YAML file.
//!
//! The file holds vehicles, discount codes, and customization options
//! in the same camelCase shape the admin API accepts. See
//! [`prestige_api::seed`] for the format.

use std::path::Path;

use secrecy::SecretString;
use tracing::{error, info};

use prestige_api::db;
use prestige_api::seed::{CatalogConfig, seed_catalog, validate_config};

/// Load the catalog file at `file_path` into the database.
///
/// With `clear_existing` set, catalog tables are emptied first.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the file cannot be
/// read or parsed, validation fails, or an insert fails.
pub async fn vehicles(
    file_path: &str,
    clear_existing: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("API_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "API_DATABASE_URL not set")?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "reading catalog");

    // Parse and validate everything before touching the database.
    let content = tokio::fs::read_to_string(path).await?;
    let config: CatalogConfig = serde_yaml::from_str(&content)?;

    let errors = validate_config(&config);
    if !errors.is_empty() {
        error!("catalog rejected:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    info!(entries = config.len(), "catalog validated");

    let pool = db::create_pool(&database_url).await?;

    let summary = seed_catalog(&pool, &config, clear_existing).await?;

    info!(
        "vehicles: {} inserted, {} skipped",
        summary.vehicles_inserted, summary.vehicles_skipped
    );
    info!(
        "discounts: {} inserted, {} skipped",
        summary.discounts_inserted, summary.discounts_skipped
    );
    info!(
        "customizations: {} inserted, {} skipped",
        summary.customizations_inserted, summary.customizations_skipped
    );

    Ok(())
}
