//! Vehicle catalog route handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, response::IntoResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use prestige_core::VehicleId;

use crate::db::VehicleRepository;
use crate::db::vehicles::{NewVehicle, VehicleChanges};
use crate::error::{AppError, Result};
use crate::middleware::AdminUser;
use crate::models::{Specifications, VehicleResponse};
use crate::state::AppState;

fn bad_request(message: &str) -> AppError {
    AppError::BadRequest(message.to_owned())
}

fn validate_stock(stock: i32) -> Result<i32> {
    if stock < 0 {
        return Err(bad_request("Stock cannot be negative"));
    }
    Ok(stock)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleRequest {
    pub name: Option<String>,
    pub year: i32,
    pub base_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    pub specifications: Option<Specifications>,
    pub stock: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicleRequest {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub base_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub features: Option<Vec<String>>,
    pub specifications: Option<Specifications>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SetStockRequest {
    pub stock: Option<i32>,
}

/// List the active catalog.
///
/// GET /vehicles
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let vehicles = VehicleRepository::new(state.pool()).list().await?;
    let vehicles: Vec<VehicleResponse> = vehicles.into_iter().map(VehicleResponse::from).collect();
    Ok(Json(vehicles))
}

/// Fetch a single vehicle, active or not.
///
/// GET /vehicles/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<VehicleId>,
) -> Result<impl IntoResponse> {
    let vehicle = VehicleRepository::new(state.pool())
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Model not found".to_owned()))?;

    Ok(Json(VehicleResponse::from(vehicle)))
}

/// Add a vehicle to the catalog.
///
/// POST /vehicles
#[instrument(skip(state, request))]
pub async fn create(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(request): Json<CreateVehicleRequest>,
) -> Result<impl IntoResponse> {
    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| bad_request("Name is required"))?;
    let description = request
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .ok_or_else(|| bad_request("Description is required"))?;
    let base_price = request
        .base_price
        .ok_or_else(|| bad_request("Base price must be a number"))?;
    let image_url = request
        .image_url
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| bad_request("Image URL is required"))?;
    let specifications = request
        .specifications
        .as_ref()
        .ok_or_else(|| bad_request("Specifications must be an object"))?;
    let stock = request
        .stock
        .ok_or_else(|| bad_request("Stock must be a number"))?;
    let stock = validate_stock(stock)?;

    let vehicle = VehicleRepository::new(state.pool())
        .create(&NewVehicle {
            name,
            year: request.year,
            base_price,
            image_url,
            description,
            features: &request.features,
            specifications,
            stock,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(VehicleResponse::from(vehicle))))
}

/// Partially update a vehicle.
///
/// PUT /vehicles/{id}
#[instrument(skip(state, request))]
pub async fn update(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<VehicleId>,
    Json(request): Json<UpdateVehicleRequest>,
) -> Result<impl IntoResponse> {
    let name = match request.name.as_deref().map(str::trim) {
        Some("") => return Err(bad_request("Name is required")),
        other => other,
    };
    let stock = request.stock.map(validate_stock).transpose()?;

    let vehicle = VehicleRepository::new(state.pool())
        .update(
            id,
            &VehicleChanges {
                name,
                year: request.year,
                base_price: request.base_price,
                image_url: request.image_url.as_deref(),
                description: request.description.as_deref(),
                features: request.features.as_deref(),
                specifications: request.specifications.as_ref(),
                stock,
                is_active: request.is_active,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Model not found".to_owned()))?;

    Ok(Json(VehicleResponse::from(vehicle)))
}

/// Retire a vehicle from the catalog.
///
/// DELETE /vehicles/{id}
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<VehicleId>,
) -> Result<impl IntoResponse> {
    let deleted = VehicleRepository::new(state.pool()).soft_delete(id).await?;
    if !deleted {
        return Err(AppError::NotFound("Model not found".to_owned()));
    }

    Ok(Json(json!({ "message": "Model deleted successfully" })))
}

/// Set a vehicle's stock to an absolute count.
///
/// PATCH /vehicles/{id}/stock
#[instrument(skip(state, request))]
pub async fn set_stock(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<VehicleId>,
    Json(request): Json<SetStockRequest>,
) -> Result<impl IntoResponse> {
    let stock = request
        .stock
        .ok_or_else(|| bad_request("Stock must be a number"))?;
    let stock = validate_stock(stock)?;

    let vehicle = VehicleRepository::new(state.pool())
        .set_stock(id, stock)
        .await?
        .ok_or_else(|| AppError::NotFound("Model not found".to_owned()))?;

    Ok(Json(VehicleResponse::from(vehicle)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_stock_rejected() {
        let err = validate_stock(-1).unwrap_err();
        assert_eq!(err.to_string(), "Bad request: Stock cannot be negative");
        assert_eq!(validate_stock(0).unwrap(), 0);
    }

    #[test]
    fn test_create_request_defaults_features() {
        let request: CreateVehicleRequest = serde_json::from_value(json!({
            "name": "911 GT3",
            "year": 2026,
            "basePrice": "185000",
            "imageUrl": "/img/gt3.jpg",
            "description": "Track-focused",
            "specifications": { "engine": "4.0L flat-six" },
            "stock": 3
        }))
        .unwrap();

        assert!(request.features.is_empty());
        assert_eq!(request.base_price.unwrap(), Decimal::from(185_000));
    }

    #[test]
    fn test_update_request_is_fully_optional() {
        let request: UpdateVehicleRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.name.is_none());
        assert!(request.stock.is_none());
        assert!(request.is_active.is_none());
    }
}
