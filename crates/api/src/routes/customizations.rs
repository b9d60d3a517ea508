//! Customization catalog route handlers.
//!
//! Reads are public so the configurator can render without a login;
//! writes are admin only.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, response::IntoResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use prestige_core::{CustomizationId, VehicleId};

use crate::db::CustomizationRepository;
use crate::db::customizations::{CustomizationChanges, NewCustomization};
use crate::error::{AppError, Result};
use crate::middleware::AdminUser;
use crate::state::AppState;

fn bad_request(message: &str) -> AppError {
    AppError::BadRequest(message.to_owned())
}

/// List the whole customization catalog.
///
/// GET /customizations
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let customizations = CustomizationRepository::new(state.pool()).list().await?;
    Ok(Json(customizations))
}

/// Fetch a single customization.
///
/// GET /customizations/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<CustomizationId>,
) -> Result<impl IntoResponse> {
    let customization = CustomizationRepository::new(state.pool())
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Customization not found".to_owned()))?;

    Ok(Json(customization))
}

/// List customizations in one category.
///
/// GET /customizations/category/{category}
pub async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<impl IntoResponse> {
    let customizations = CustomizationRepository::new(state.pool())
        .list_by_category(&category)
        .await?;
    Ok(Json(customizations))
}

/// List customizations that fit a vehicle.
///
/// GET /customizations/vehicle/{vehicle_id}
pub async fn for_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<VehicleId>,
) -> Result<impl IntoResponse> {
    let customizations = CustomizationRepository::new(state.pool())
        .list_for_vehicle(vehicle_id)
        .await?;
    Ok(Json(customizations))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomizationRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub compatible_models: Option<Vec<i32>>,
}

/// Add a customization option.
///
/// POST /customizations
#[instrument(skip(state, request))]
pub async fn create(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(request): Json<CreateCustomizationRequest>,
) -> Result<impl IntoResponse> {
    let name = request
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| bad_request("Name is required"))?;
    let description = request
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .ok_or_else(|| bad_request("Description is required"))?;
    let price = request
        .price
        .ok_or_else(|| bad_request("Price must be a number"))?;
    let category = request
        .category
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| bad_request("Category is required"))?;
    let compatible_models = request
        .compatible_models
        .as_deref()
        .ok_or_else(|| bad_request("Compatible models must be an array"))?;

    let customization = CustomizationRepository::new(state.pool())
        .create(&NewCustomization {
            name,
            description,
            price,
            category,
            compatible_models,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(customization)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomizationRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub compatible_models: Option<Vec<i32>>,
}

/// Partially update a customization option.
///
/// PUT /customizations/{id}
#[instrument(skip(state, request))]
pub async fn update(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<CustomizationId>,
    Json(request): Json<UpdateCustomizationRequest>,
) -> Result<impl IntoResponse> {
    let name = match request.name.as_deref() {
        Some("") => return Err(bad_request("Name cannot be empty")),
        other => other,
    };
    let description = match request.description.as_deref() {
        Some("") => return Err(bad_request("Description cannot be empty")),
        other => other,
    };
    let category = match request.category.as_deref() {
        Some("") => return Err(bad_request("Category cannot be empty")),
        other => other,
    };

    let customization = CustomizationRepository::new(state.pool())
        .update(
            id,
            &CustomizationChanges {
                name,
                description,
                price: request.price,
                category,
                compatible_models: request.compatible_models.as_deref(),
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Customization not found".to_owned()))?;

    Ok(Json(customization))
}

/// Delete a customization option.
///
/// DELETE /customizations/{id}
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<CustomizationId>,
) -> Result<impl IntoResponse> {
    let deleted = CustomizationRepository::new(state.pool()).delete(id).await?;
    if !deleted {
        return Err(AppError::NotFound("Customization not found".to_owned()));
    }

    Ok(Json(json!({ "message": "Customization deleted successfully" })))
}
